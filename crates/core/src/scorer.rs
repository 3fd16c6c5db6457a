use std::collections::BTreeMap;
use thiserror::Error;

use crate::model::{
    AnswerVerdict, OptionId, QuestionId, QuestionOutcome, ResultRecord, Score, SessionSnapshot,
    SessionStatus, TestDefinition,
};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScoreError {
    #[error("session must be completed before scoring, status is {status:?}")]
    SessionNotFinalized { status: SessionStatus },
}

//
// ─── SCORER ────────────────────────────────────────────────────────────────────
//

/// Score a finalized session snapshot against its test definition.
///
/// This is the only supported path from an attempt to a [`ResultRecord`];
/// callers hand over the snapshot of a session whose status is `Completed`.
///
/// # Errors
///
/// Returns `ScoreError::SessionNotFinalized` if the snapshot's status is not
/// `Completed` — the caller invoked the API out of order.
pub fn score_session(
    test: &TestDefinition,
    snapshot: &SessionSnapshot,
) -> Result<ResultRecord, ScoreError> {
    if snapshot.status != SessionStatus::Completed {
        return Err(ScoreError::SessionNotFinalized {
            status: snapshot.status,
        });
    }

    Ok(score_answers(
        test,
        &snapshot.answers,
        snapshot.time_spent_seconds(test.duration_seconds()),
    ))
}

/// Score a raw answer set against a test definition.
///
/// Pure and side-effect free: walks the questions in definition order,
/// compares each against the selected option (absent means unanswered), and
/// aggregates the counts into a round-half-up percentage. Also used to
/// re-score persisted attempts for the results view, which is why it does not
/// require a session.
#[must_use]
pub fn score_answers(
    test: &TestDefinition,
    answers: &BTreeMap<QuestionId, OptionId>,
    time_spent_seconds: u32,
) -> ResultRecord {
    let mut correct = 0_u32;
    let mut breakdown = Vec::with_capacity(test.question_count());

    for question in test.questions() {
        let selected = answers.get(&question.id()).cloned();
        let verdict = match &selected {
            Some(option) if question.is_correct(option) => AnswerVerdict::Correct,
            Some(_) => AnswerVerdict::Incorrect,
            None => AnswerVerdict::Unanswered,
        };
        if verdict.is_correct() {
            correct = correct.saturating_add(1);
        }
        breakdown.push(QuestionOutcome {
            question_id: question.id(),
            selected,
            verdict,
        });
    }

    // Unknown question ids cannot appear in `answers` here: the session
    // controller rejects them at record time, and re-scored persisted answers
    // that reference dropped questions simply score as if never given.
    let total = u32::try_from(test.question_count()).unwrap_or(u32::MAX);
    let answers = answers
        .iter()
        .filter(|(id, _)| test.contains_question(**id))
        .map(|(id, option)| (*id, option.clone()))
        .collect();

    ResultRecord::new(
        test.id(),
        answers,
        time_spent_seconds,
        Score::new(correct, total),
        breakdown,
    )
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnswerOption, Question, TestId};

    fn question(id: u64, correct: &str) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Question {id}?"),
            vec![
                AnswerOption::new(OptionId::new("a"), "option a"),
                AnswerOption::new(OptionId::new("b"), "option b"),
                AnswerOption::new(OptionId::new("c"), "option c"),
                AnswerOption::new(OptionId::new("d"), "option d"),
            ],
            OptionId::new(correct),
        )
        .unwrap()
    }

    /// Five questions with correct answers `[a, b, a, a, d]`.
    fn five_question_test() -> TestDefinition {
        TestDefinition::new(TestId::new(1), "Mathematics", "Academic", "Medium", 2700, vec![
            question(1, "a"),
            question(2, "b"),
            question(3, "a"),
            question(4, "a"),
            question(5, "d"),
        ])
        .unwrap()
    }

    fn answer(id: u64, option: &str) -> (QuestionId, OptionId) {
        (QuestionId::new(id), OptionId::new(option))
    }

    #[test]
    fn scores_partial_answer_set_with_breakdown() {
        let test = five_question_test();
        let answers: BTreeMap<_, _> = [
            answer(1, "a"),
            answer(2, "b"),
            answer(3, "c"),
            answer(5, "d"),
        ]
        .into_iter()
        .collect();

        let record = score_answers(&test, &answers, 900);

        assert_eq!(record.score().correct(), 3);
        assert_eq!(record.score().total(), 5);
        assert_eq!(record.score().percentage(), 60);
        assert_eq!(record.time_spent_seconds(), 900);

        assert_eq!(
            record.outcome_for(QuestionId::new(3)).unwrap().verdict,
            AnswerVerdict::Incorrect
        );
        assert_eq!(
            record.outcome_for(QuestionId::new(4)).unwrap().verdict,
            AnswerVerdict::Unanswered
        );
        assert_eq!(record.outcome_for(QuestionId::new(4)).unwrap().selected, None);
    }

    #[test]
    fn breakdown_follows_definition_order() {
        let test = five_question_test();
        let record = score_answers(&test, &BTreeMap::new(), 0);

        let order: Vec<u64> = record
            .breakdown()
            .iter()
            .map(|outcome| outcome.question_id.value())
            .collect();
        assert_eq!(order, vec![1, 2, 3, 4, 5]);
        assert!(
            record
                .breakdown()
                .iter()
                .all(|outcome| outcome.verdict == AnswerVerdict::Unanswered)
        );
        assert_eq!(record.score().percentage(), 0);
    }

    #[test]
    fn unanswered_scores_like_incorrect() {
        let test = five_question_test();

        let unanswered: BTreeMap<_, _> = [answer(1, "a"), answer(2, "b")].into_iter().collect();
        let wrong: BTreeMap<_, _> = [
            answer(1, "a"),
            answer(2, "b"),
            answer(3, "b"),
            answer(4, "b"),
            answer(5, "a"),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            score_answers(&test, &unanswered, 0).score(),
            score_answers(&test, &wrong, 0).score()
        );
    }

    #[test]
    fn boundary_rounding_is_half_up() {
        let test = TestDefinition::new(TestId::new(2), "Rounding", "Academic", "Easy", 60, vec![
            question(1, "a"),
            question(2, "a"),
            question(3, "a"),
        ])
        .unwrap();
        let answers: BTreeMap<_, _> = [answer(1, "a"), answer(2, "a")].into_iter().collect();
        assert_eq!(score_answers(&test, &answers, 10).score().percentage(), 67);

        let test = TestDefinition::new(TestId::new(3), "Rounding", "Academic", "Easy", 60, vec![
            question(1, "a"),
            question(2, "a"),
            question(3, "a"),
            question(4, "a"),
            question(5, "a"),
            question(6, "a"),
            question(7, "a"),
            question(8, "a"),
        ])
        .unwrap();
        let answers: BTreeMap<_, _> = [answer(1, "a")].into_iter().collect();
        assert_eq!(score_answers(&test, &answers, 10).score().percentage(), 13);
    }

    #[test]
    fn score_session_requires_completion() {
        let test = five_question_test();
        for status in [SessionStatus::InProgress, SessionStatus::AwaitingConfirmation] {
            let snapshot = SessionSnapshot {
                current_index: 0,
                answers: BTreeMap::new(),
                remaining_seconds: 100,
                status,
            };
            let err = score_session(&test, &snapshot).unwrap_err();
            assert_eq!(err, ScoreError::SessionNotFinalized { status });
        }
    }

    #[test]
    fn score_session_uses_remaining_time() {
        let test = five_question_test();
        let snapshot = SessionSnapshot {
            current_index: 4,
            answers: [answer(1, "a")].into_iter().collect(),
            remaining_seconds: 2100,
            status: SessionStatus::Completed,
        };

        let record = score_session(&test, &snapshot).unwrap();
        assert_eq!(record.time_spent_seconds(), 600);
        assert_eq!(record.score().correct(), 1);
        assert_eq!(record.test_id(), TestId::new(1));
    }

    #[test]
    fn stale_answers_outside_definition_are_dropped() {
        let test = five_question_test();
        let answers: BTreeMap<_, _> = [answer(1, "a"), answer(99, "a")].into_iter().collect();

        let record = score_answers(&test, &answers, 5);
        assert_eq!(record.score().correct(), 1);
        assert!(!record.answers().contains_key(&QuestionId::new(99)));
    }
}
