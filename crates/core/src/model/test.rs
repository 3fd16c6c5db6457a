use thiserror::Error;

use crate::model::ids::{OptionId, QuestionId, TestId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TestDefinitionError {
    #[error("test title cannot be empty")]
    EmptyTitle,

    #[error("test category cannot be empty")]
    EmptyCategory,

    #[error("test level cannot be empty")]
    EmptyLevel,

    #[error("test duration must be > 0 seconds")]
    InvalidDuration,

    #[error("test must contain at least one question")]
    NoQuestions,

    #[error("duplicate question id {question}")]
    DuplicateQuestionId { question: QuestionId },

    #[error("question {question} has an empty prompt")]
    EmptyQuestionText { question: QuestionId },

    #[error("question {question} needs at least 2 options, got {found}")]
    TooFewOptions { question: QuestionId, found: usize },

    #[error("question {question} has an option with an empty id")]
    EmptyOptionId { question: QuestionId },

    #[error("question {question} has an option with empty text")]
    EmptyOptionText { question: QuestionId },

    #[error("duplicate option id {option} in question {question}")]
    DuplicateOptionId {
        question: QuestionId,
        option: OptionId,
    },

    #[error("correct answer of question {question} is not one of its options")]
    CorrectAnswerNotAnOption { question: QuestionId },
}

//
// ─── OPTIONS ───────────────────────────────────────────────────────────────────
//

/// One selectable choice of a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOption {
    id: OptionId,
    text: String,
}

impl AnswerOption {
    /// Creates an option. Validation happens when the option is attached to a
    /// `Question`, so the question id can be reported alongside the failure.
    #[must_use]
    pub fn new(id: OptionId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &OptionId {
        &self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single multiple-choice question with exactly one correct option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    text: String,
    options: Vec<AnswerOption>,
    correct_answer: OptionId,
}

impl Question {
    /// Creates a new question.
    ///
    /// Option order is significant and preserved for display.
    ///
    /// # Errors
    ///
    /// Returns `TestDefinitionError` if the prompt is empty, fewer than two
    /// options are given, option ids/texts are empty or duplicated, or
    /// `correct_answer` does not name one of the options.
    pub fn new(
        id: QuestionId,
        text: impl Into<String>,
        options: Vec<AnswerOption>,
        correct_answer: OptionId,
    ) -> Result<Self, TestDefinitionError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(TestDefinitionError::EmptyQuestionText { question: id });
        }
        if options.len() < 2 {
            return Err(TestDefinitionError::TooFewOptions {
                question: id,
                found: options.len(),
            });
        }

        let mut seen: Vec<&OptionId> = Vec::with_capacity(options.len());
        for option in &options {
            if option.id.as_str().trim().is_empty() {
                return Err(TestDefinitionError::EmptyOptionId { question: id });
            }
            if option.text.trim().is_empty() {
                return Err(TestDefinitionError::EmptyOptionText { question: id });
            }
            if seen.contains(&&option.id) {
                return Err(TestDefinitionError::DuplicateOptionId {
                    question: id,
                    option: option.id.clone(),
                });
            }
            seen.push(&option.id);
        }

        if !options.iter().any(|option| option.id == correct_answer) {
            return Err(TestDefinitionError::CorrectAnswerNotAnOption { question: id });
        }

        Ok(Self {
            id,
            text: text.trim().to_owned(),
            options,
            correct_answer,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[AnswerOption] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> &OptionId {
        &self.correct_answer
    }

    /// Look up an option of this question by id.
    #[must_use]
    pub fn option(&self, id: &OptionId) -> Option<&AnswerOption> {
        self.options.iter().find(|option| option.id == *id)
    }

    #[must_use]
    pub fn has_option(&self, id: &OptionId) -> bool {
        self.option(id).is_some()
    }

    /// Whether the given option id is this question's correct answer.
    #[must_use]
    pub fn is_correct(&self, id: &OptionId) -> bool {
        self.correct_answer == *id
    }
}

//
// ─── TEST DEFINITION ───────────────────────────────────────────────────────────
//

/// An immutable, validated exam definition.
///
/// Question order is significant: it defines navigation order and display
/// numbering for one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestDefinition {
    id: TestId,
    title: String,
    category: String,
    level: String,
    duration_seconds: u32,
    questions: Vec<Question>,
}

impl TestDefinition {
    /// Creates a new test definition.
    ///
    /// This constructor is the only way to obtain a `TestDefinition`; storage
    /// rehydration goes through it as well, so a definition in hand always
    /// satisfies every invariant below.
    ///
    /// # Errors
    ///
    /// Returns `TestDefinitionError` if any descriptive field is empty, the
    /// duration is zero, the question list is empty, or a question id repeats.
    pub fn new(
        id: TestId,
        title: impl Into<String>,
        category: impl Into<String>,
        level: impl Into<String>,
        duration_seconds: u32,
        questions: Vec<Question>,
    ) -> Result<Self, TestDefinitionError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(TestDefinitionError::EmptyTitle);
        }
        let category = category.into();
        if category.trim().is_empty() {
            return Err(TestDefinitionError::EmptyCategory);
        }
        let level = level.into();
        if level.trim().is_empty() {
            return Err(TestDefinitionError::EmptyLevel);
        }
        if duration_seconds == 0 {
            return Err(TestDefinitionError::InvalidDuration);
        }
        if questions.is_empty() {
            return Err(TestDefinitionError::NoQuestions);
        }

        let mut seen: Vec<QuestionId> = Vec::with_capacity(questions.len());
        for question in &questions {
            if seen.contains(&question.id) {
                return Err(TestDefinitionError::DuplicateQuestionId {
                    question: question.id,
                });
            }
            seen.push(question.id);
        }

        Ok(Self {
            id,
            title: title.trim().to_owned(),
            category: category.trim().to_owned(),
            level: level.trim().to_owned(),
            duration_seconds,
            questions,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> TestId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn level(&self) -> &str {
        &self.level
    }

    /// Total time budget for one attempt, in seconds.
    #[must_use]
    pub fn duration_seconds(&self) -> u32 {
        self.duration_seconds
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Look up a question by id.
    #[must_use]
    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|question| question.id == id)
    }

    /// Question at the given navigation position, if in bounds.
    #[must_use]
    pub fn question_at(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn contains_question(&self, id: QuestionId) -> bool {
        self.question(id).is_some()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn option(id: &str, text: &str) -> AnswerOption {
        AnswerOption::new(OptionId::new(id), text)
    }

    fn question(id: u64) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Question {id}?"),
            vec![option("a", "first"), option("b", "second")],
            OptionId::new("a"),
        )
        .unwrap()
    }

    #[test]
    fn question_rejects_empty_prompt() {
        let err = Question::new(
            QuestionId::new(1),
            "   ",
            vec![option("a", "first"), option("b", "second")],
            OptionId::new("a"),
        )
        .unwrap_err();
        assert_eq!(
            err,
            TestDefinitionError::EmptyQuestionText {
                question: QuestionId::new(1)
            }
        );
    }

    #[test]
    fn question_rejects_single_option() {
        let err = Question::new(
            QuestionId::new(1),
            "Pick one",
            vec![option("a", "only")],
            OptionId::new("a"),
        )
        .unwrap_err();
        assert_eq!(
            err,
            TestDefinitionError::TooFewOptions {
                question: QuestionId::new(1),
                found: 1
            }
        );
    }

    #[test]
    fn question_rejects_duplicate_option_ids() {
        let err = Question::new(
            QuestionId::new(3),
            "Pick one",
            vec![option("a", "first"), option("a", "second")],
            OptionId::new("a"),
        )
        .unwrap_err();
        assert_eq!(
            err,
            TestDefinitionError::DuplicateOptionId {
                question: QuestionId::new(3),
                option: OptionId::new("a")
            }
        );
    }

    #[test]
    fn question_rejects_unknown_correct_answer() {
        let err = Question::new(
            QuestionId::new(1),
            "Pick one",
            vec![option("a", "first"), option("b", "second")],
            OptionId::new("z"),
        )
        .unwrap_err();
        assert_eq!(
            err,
            TestDefinitionError::CorrectAnswerNotAnOption {
                question: QuestionId::new(1)
            }
        );
    }

    #[test]
    fn question_lookup_and_correctness() {
        let q = question(1);
        assert!(q.has_option(&OptionId::new("b")));
        assert!(!q.has_option(&OptionId::new("z")));
        assert!(q.is_correct(&OptionId::new("a")));
        assert!(!q.is_correct(&OptionId::new("b")));
        assert_eq!(q.option(&OptionId::new("b")).unwrap().text(), "second");
    }

    #[test]
    fn definition_rejects_empty_metadata() {
        let err = TestDefinition::new(TestId::new(1), " ", "Academic", "Medium", 60, vec![
            question(1),
        ])
        .unwrap_err();
        assert_eq!(err, TestDefinitionError::EmptyTitle);

        let err = TestDefinition::new(TestId::new(1), "Maths", "", "Medium", 60, vec![question(1)])
            .unwrap_err();
        assert_eq!(err, TestDefinitionError::EmptyCategory);

        let err = TestDefinition::new(TestId::new(1), "Maths", "Academic", "\t", 60, vec![
            question(1),
        ])
        .unwrap_err();
        assert_eq!(err, TestDefinitionError::EmptyLevel);
    }

    #[test]
    fn definition_rejects_zero_duration() {
        let err = TestDefinition::new(TestId::new(1), "Maths", "Academic", "Medium", 0, vec![
            question(1),
        ])
        .unwrap_err();
        assert_eq!(err, TestDefinitionError::InvalidDuration);
    }

    #[test]
    fn definition_rejects_empty_question_list() {
        let err = TestDefinition::new(TestId::new(1), "Maths", "Academic", "Medium", 60, Vec::new())
            .unwrap_err();
        assert_eq!(err, TestDefinitionError::NoQuestions);
    }

    #[test]
    fn definition_rejects_duplicate_question_ids() {
        let err = TestDefinition::new(TestId::new(1), "Maths", "Academic", "Medium", 60, vec![
            question(1),
            question(1),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            TestDefinitionError::DuplicateQuestionId {
                question: QuestionId::new(1)
            }
        );
    }

    #[test]
    fn definition_happy_path_preserves_order() {
        let test = TestDefinition::new(
            TestId::new(9),
            "  Mathematics ",
            "Academic",
            "Medium",
            2700,
            vec![question(2), question(1), question(3)],
        )
        .unwrap();

        assert_eq!(test.title(), "Mathematics");
        assert_eq!(test.question_count(), 3);
        assert_eq!(test.question_at(0).unwrap().id(), QuestionId::new(2));
        assert_eq!(test.question_at(2).unwrap().id(), QuestionId::new(3));
        assert!(test.contains_question(QuestionId::new(1)));
        assert!(!test.contains_question(QuestionId::new(4)));
    }
}
