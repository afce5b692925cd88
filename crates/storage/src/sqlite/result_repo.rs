use serde_json::Value;
use sqlx::Row;
use wellness_core::model::{SessionId, SessionResult, TemplateId};

use super::{
    SqliteRepository,
    mapping::{from_json, ser, to_json},
};
use crate::repository::{SessionResultRecord, SessionResultRepository, StorageError};

fn map_result_row(row: &sqlx::sqlite::SqliteRow) -> Result<SessionResult, StorageError> {
    let answers_json: String = row.try_get("answers").map_err(ser)?;
    let path_json: String = row.try_get("path_taken").map_err(ser)?;

    let record = SessionResultRecord {
        session_id: row.try_get("session_id").map_err(ser)?,
        template_id: row.try_get("template_id").map_err(ser)?,
        template_title: row.try_get("template_title").map_err(ser)?,
        completed_at: row.try_get("completed_at").map_err(ser)?,
        answers: from_json::<serde_json::Map<String, Value>>("answers", &answers_json)?,
        path_taken: from_json("path_taken", &path_json)?,
    };
    record.into_result()
}

#[async_trait::async_trait]
impl SessionResultRepository for SqliteRepository {
    async fn append_result(&self, result: &SessionResult) -> Result<(), StorageError> {
        let record = SessionResultRecord::from_result(result)?;
        let answers = to_json("answers", &record.answers)?;
        let path_taken = to_json("path_taken", &record.path_taken)?;

        sqlx::query(
            r"
                INSERT INTO session_results (
                    session_id, template_id, template_title, completed_at, answers, path_taken
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(&record.session_id)
        .bind(&record.template_id)
        .bind(&record.template_title)
        .bind(record.completed_at)
        .bind(answers)
        .bind(path_taken)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict,
            _ => StorageError::Connection(e.to_string()),
        })?;

        Ok(())
    }

    async fn get_result(&self, id: &SessionId) -> Result<Option<SessionResult>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT session_id, template_id, template_title, completed_at, answers, path_taken
                FROM session_results
                WHERE session_id = ?1
            ",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_result_row).transpose()
    }

    async fn list_results(&self, limit: u32) -> Result<Vec<SessionResult>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT session_id, template_id, template_title, completed_at, answers, path_taken
                FROM session_results
                ORDER BY completed_at DESC, session_id DESC
                LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            results.push(map_result_row(&row)?);
        }
        Ok(results)
    }

    async fn list_results_for_template(
        &self,
        template_id: &TemplateId,
        limit: u32,
    ) -> Result<Vec<SessionResult>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT session_id, template_id, template_title, completed_at, answers, path_taken
                FROM session_results
                WHERE template_id = ?1
                ORDER BY completed_at DESC, session_id DESC
                LIMIT ?2
            ",
        )
        .bind(template_id.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            results.push(map_result_row(&row)?);
        }
        Ok(results)
    }
}
