#![forbid(unsafe_code)]

pub mod model;
pub mod scorer;
pub mod time;

pub use model::{
    AnswerOption, AnswerVerdict, OptionId, Question, QuestionId, QuestionOutcome, ResultError,
    ResultRecord, Score, SessionSnapshot, SessionStatus, TestDefinition, TestDefinitionError,
    TestId,
};
pub use scorer::{ScoreError, score_answers, score_session};
pub use time::Clock;
