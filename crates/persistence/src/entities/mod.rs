//! Database entity definitions.
//!
//! Entities map directly to database rows and are converted into domain models.

pub mod group;
pub mod member;
pub mod safety_status;

pub use group::GroupEntity;
pub use member::MemberWithGroupEntity;
pub use safety_status::SafetyStatusEntity;
