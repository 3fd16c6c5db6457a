use exam_core::model::{AnswerOption, OptionId, Question, TestDefinition, TestId};
use sqlx::Row;
use std::collections::BTreeMap;

use super::SqliteRepository;
use super::mapping::{id_to_i64, question_id_from_i64, ser, u32_from_i64};
use crate::repository::{StorageError, TestRepository};

impl SqliteRepository {
    /// Load and reassemble one test definition. Rows go back through the
    /// validating `TestDefinition` constructor, so corrupted data surfaces as
    /// a serialization error instead of an invalid domain value.
    async fn load_test(&self, id: i64) -> Result<Option<TestDefinition>, StorageError> {
        let Some(test_row) = sqlx::query(
            r"
                SELECT id, title, category, level, duration_seconds
                FROM tests
                WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?
        else {
            return Ok(None);
        };

        let question_rows = sqlx::query(
            r"
                SELECT id, prompt, correct_option
                FROM questions
                WHERE test_id = ?1
                ORDER BY position ASC
            ",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let option_rows = sqlx::query(
            r"
                SELECT question_id, option_id, label
                FROM question_options
                WHERE test_id = ?1
                ORDER BY question_id ASC, position ASC
            ",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut options_by_question: BTreeMap<i64, Vec<AnswerOption>> = BTreeMap::new();
        for row in &option_rows {
            let question_id: i64 = row.try_get("question_id").map_err(ser)?;
            let option_id: String = row.try_get("option_id").map_err(ser)?;
            let label: String = row.try_get("label").map_err(ser)?;
            options_by_question
                .entry(question_id)
                .or_default()
                .push(AnswerOption::new(OptionId::new(option_id), label));
        }

        let mut questions = Vec::with_capacity(question_rows.len());
        for row in &question_rows {
            let raw_id: i64 = row.try_get("id").map_err(ser)?;
            let prompt: String = row.try_get("prompt").map_err(ser)?;
            let correct: String = row.try_get("correct_option").map_err(ser)?;
            let options = options_by_question.remove(&raw_id).unwrap_or_default();
            questions.push(
                Question::new(
                    question_id_from_i64(raw_id)?,
                    prompt,
                    options,
                    OptionId::new(correct),
                )
                .map_err(ser)?,
            );
        }

        let duration_seconds = u32_from_i64(
            "duration_seconds",
            test_row.try_get::<i64, _>("duration_seconds").map_err(ser)?,
        )?;

        let test = TestDefinition::new(
            super::mapping::test_id_from_i64(test_row.try_get::<i64, _>("id").map_err(ser)?)?,
            test_row.try_get::<String, _>("title").map_err(ser)?,
            test_row.try_get::<String, _>("category").map_err(ser)?,
            test_row.try_get::<String, _>("level").map_err(ser)?,
            duration_seconds,
            questions,
        )
        .map_err(ser)?;

        Ok(Some(test))
    }

    async fn list_ids(&self, sql: &str, bind: Option<&str>) -> Result<Vec<i64>, StorageError> {
        let mut query = sqlx::query(sql);
        if let Some(value) = bind {
            query = query.bind(value);
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
            ids.push(row.try_get::<i64, _>("id").map_err(ser)?);
        }
        Ok(ids)
    }

    async fn collect_tests(&self, ids: Vec<i64>) -> Result<Vec<TestDefinition>, StorageError> {
        let mut tests = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(test) = self.load_test(id).await? {
                tests.push(test);
            }
        }
        Ok(tests)
    }
}

#[async_trait::async_trait]
impl TestRepository for SqliteRepository {
    async fn upsert_test(&self, test: &TestDefinition) -> Result<(), StorageError> {
        let test_id = id_to_i64("test_id", test.id().value())?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query(
            r"
                INSERT INTO tests (id, title, category, level, duration_seconds)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(id) DO UPDATE SET
                    title = excluded.title,
                    category = excluded.category,
                    level = excluded.level,
                    duration_seconds = excluded.duration_seconds
            ",
        )
        .bind(test_id)
        .bind(test.title())
        .bind(test.category())
        .bind(test.level())
        .bind(i64::from(test.duration_seconds()))
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        // Replace the question set wholesale; options cascade.
        sqlx::query("DELETE FROM questions WHERE test_id = ?1")
            .bind(test_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        for (position, question) in test.questions().iter().enumerate() {
            let question_id = id_to_i64("question_id", question.id().value())?;
            let position = i64::try_from(position)
                .map_err(|_| StorageError::Serialization("position overflow".into()))?;

            sqlx::query(
                r"
                    INSERT INTO questions (id, test_id, position, prompt, correct_option)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                ",
            )
            .bind(question_id)
            .bind(test_id)
            .bind(position)
            .bind(question.text())
            .bind(question.correct_answer().as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

            for (option_position, option) in question.options().iter().enumerate() {
                let option_position = i64::try_from(option_position)
                    .map_err(|_| StorageError::Serialization("position overflow".into()))?;
                sqlx::query(
                    r"
                        INSERT INTO question_options
                            (question_id, test_id, option_id, position, label)
                        VALUES (?1, ?2, ?3, ?4, ?5)
                    ",
                )
                .bind(question_id)
                .bind(test_id)
                .bind(option.id().as_str())
                .bind(option_position)
                .bind(option.text())
                .execute(&mut *tx)
                .await
                .map_err(|e| StorageError::Connection(e.to_string()))?;
            }
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }

    async fn get_test(&self, id: TestId) -> Result<Option<TestDefinition>, StorageError> {
        self.load_test(id_to_i64("test_id", id.value())?).await
    }

    async fn list_tests(&self, limit: u32) -> Result<Vec<TestDefinition>, StorageError> {
        let rows = sqlx::query("SELECT id FROM tests ORDER BY id ASC LIMIT ?1")
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
            ids.push(row.try_get::<i64, _>("id").map_err(ser)?);
        }
        self.collect_tests(ids).await
    }

    async fn list_tests_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<TestDefinition>, StorageError> {
        let ids = self
            .list_ids(
                "SELECT id FROM tests WHERE category = ?1 ORDER BY id ASC",
                Some(category),
            )
            .await?;
        self.collect_tests(ids).await
    }
}
