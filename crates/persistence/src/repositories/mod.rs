//! Repository implementations for database operations.

pub mod group;
pub mod member;
pub mod safety_status;

pub use group::GroupRepository;
pub use member::MemberRepository;
pub use safety_status::SafetyStatusRepository;
