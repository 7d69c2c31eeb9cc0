// ============================================================================
// Unit of Work
// ============================================================================
//
// Coordinates object pairs across downstream managers:
// - State: NEW -> MANAGED per root object, REFERENCED for counterparts
// - Schedule: insert/update/remove lists keyed by (object, reference field)
// - Bind: pre event, manager persist, post event, common-field sync
// - Commit: one flush per manager, then the post events, then the lists drain
//
// ============================================================================

pub mod coordinator;
pub mod schedule;
pub mod state;

pub use coordinator::UnitOfWork;
pub use schedule::{ReferenceSchedule, ScheduleKey, ScheduleKind, ScheduledReference};
pub use state::ObjectState;
