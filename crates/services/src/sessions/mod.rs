mod progress;
mod queries;
mod service;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use progress::SessionProgress;
pub use service::ExamSession;
pub use view::{ResultId, ResultListItem, ResultView, ResultViewService};
pub use workflow::{AttemptOutcome, AttemptService};
