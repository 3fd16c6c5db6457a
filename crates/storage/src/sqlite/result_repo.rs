use exam_core::model::TestId;

use super::SqliteRepository;
use super::mapping::{answers_to_json, id_to_i64, map_attempt_row};
use crate::repository::{AttemptRecord, AttemptRow, ResultRepository, StorageError};

#[async_trait::async_trait]
impl ResultRepository for SqliteRepository {
    async fn append_result(&self, record: &AttemptRecord) -> Result<i64, StorageError> {
        let test_id = id_to_i64("test_id", record.test_id.value())?;
        let answers = answers_to_json(&record.answers)?;

        let res = sqlx::query(
            r"
                INSERT INTO attempt_results (test_id, answers, time_spent_seconds, completed_at)
                VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(test_id)
        .bind(answers)
        .bind(i64::from(record.time_spent_seconds))
        .bind(record.completed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(res.last_insert_rowid())
    }

    async fn get_result(&self, id: i64) -> Result<AttemptRecord, StorageError> {
        let row = sqlx::query(
            r"
                SELECT id, test_id, answers, time_spent_seconds, completed_at
                FROM attempt_results
                WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .ok_or(StorageError::NotFound)?;

        Ok(map_attempt_row(&row)?.record)
    }

    async fn latest_result(&self, test_id: TestId) -> Result<Option<AttemptRow>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT id, test_id, answers, time_spent_seconds, completed_at
                FROM attempt_results
                WHERE test_id = ?1
                ORDER BY completed_at DESC, id DESC
                LIMIT 1
            ",
        )
        .bind(id_to_i64("test_id", test_id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_attempt_row).transpose()
    }

    async fn list_results(
        &self,
        test_id: TestId,
        completed_from: Option<chrono::DateTime<chrono::Utc>>,
        completed_until: Option<chrono::DateTime<chrono::Utc>>,
        limit: u32,
    ) -> Result<Vec<AttemptRow>, StorageError> {
        let mut sql = String::from(
            r"
                SELECT id, test_id, answers, time_spent_seconds, completed_at
                FROM attempt_results
                WHERE test_id = ?1
            ",
        );

        let mut bind_index = 2;
        if completed_from.is_some() {
            sql.push_str(" AND completed_at >= ?");
            sql.push_str(&bind_index.to_string());
            bind_index += 1;
        }
        if completed_until.is_some() {
            sql.push_str(" AND completed_at <= ?");
            sql.push_str(&bind_index.to_string());
            bind_index += 1;
        }
        sql.push_str(" ORDER BY completed_at DESC, id DESC");
        sql.push_str(" LIMIT ?");
        sql.push_str(&bind_index.to_string());

        let mut query = sqlx::query(&sql).bind(id_to_i64("test_id", test_id.value())?);
        if let Some(from) = completed_from {
            query = query.bind(from);
        }
        if let Some(until) = completed_until {
            query = query.bind(until);
        }
        query = query.bind(i64::from(limit));

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_attempt_row(&row)?);
        }

        Ok(out)
    }
}
