mod ids;
mod result;
mod session;
mod test;

pub use ids::{OptionId, ParseIdError, QuestionId, TestId};
pub use result::{AnswerVerdict, QuestionOutcome, ResultError, ResultRecord, Score};
pub use session::{SessionSnapshot, SessionStatus};
pub use test::{AnswerOption, Question, TestDefinition, TestDefinitionError};
