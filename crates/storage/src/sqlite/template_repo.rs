use sqlx::Row;
use wellness_core::model::{Template, TemplateId};

use super::{
    SqliteRepository,
    mapping::{from_json, ser, to_json, version_from_i64},
};
use crate::repository::{QuestionRecord, StorageError, TemplateRecord, TemplateRepository};

fn map_template_row(row: &sqlx::sqlite::SqliteRow) -> Result<Template, StorageError> {
    let questions_json: String = row.try_get("questions").map_err(ser)?;
    let questions: Vec<QuestionRecord> = from_json("questions", &questions_json)?;

    let record = TemplateRecord {
        id: row.try_get("id").map_err(ser)?,
        title: row.try_get("title").map_err(ser)?,
        description: row.try_get("description").map_err(ser)?,
        version: version_from_i64(row.try_get::<i64, _>("version").map_err(ser)?)?,
        created_at: row.try_get("created_at").map_err(ser)?,
        updated_at: row.try_get("updated_at").map_err(ser)?,
        questions,
    };
    record.into_template()
}

#[async_trait::async_trait]
impl TemplateRepository for SqliteRepository {
    async fn upsert_template(&self, template: &Template) -> Result<(), StorageError> {
        let record = TemplateRecord::from_template(template);
        let questions = to_json("questions", &record.questions)?;

        sqlx::query(
            r"
                INSERT INTO session_templates (
                    id, title, description, version, created_at, updated_at, questions
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(id) DO UPDATE SET
                    title = excluded.title,
                    description = excluded.description,
                    version = excluded.version,
                    created_at = excluded.created_at,
                    updated_at = excluded.updated_at,
                    questions = excluded.questions
            ",
        )
        .bind(&record.id)
        .bind(&record.title)
        .bind(&record.description)
        .bind(i64::from(record.version))
        .bind(record.created_at)
        .bind(record.updated_at)
        .bind(questions)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn get_template(&self, id: &TemplateId) -> Result<Option<Template>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT id, title, description, version, created_at, updated_at, questions
                FROM session_templates
                WHERE id = ?1
            ",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_template_row).transpose()
    }

    async fn list_templates(&self) -> Result<Vec<Template>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, title, description, version, created_at, updated_at, questions
                FROM session_templates
                ORDER BY updated_at DESC, id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut templates = Vec::with_capacity(rows.len());
        for row in rows {
            templates.push(map_template_row(&row)?);
        }
        Ok(templates)
    }

    async fn delete_template(&self, id: &TemplateId) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM session_templates WHERE id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }
}
