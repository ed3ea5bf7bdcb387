pub mod event;
pub mod group;
pub mod participant;

pub use event::{Event, EventSnapshot, ModelError, SharePlan};
pub use group::{Group, GroupRecord};
pub use participant::Participant;
