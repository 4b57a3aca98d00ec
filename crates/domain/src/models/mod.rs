//! Domain models for Safe Circle.

pub mod group;
pub mod identity;
pub mod member;
pub mod position;
pub mod roster;
pub mod safety_status;

pub use group::Group;
pub use identity::{Identity, IdentityChange};
pub use member::{Member, MemberWithGroup};
pub use position::DevicePosition;
pub use roster::{DisplayMode, Roster, RosterEntry, RosterSnapshot, SubscriptionHealth};
pub use safety_status::{SafetyState, SafetyStatus, StatusInsertPayload};
