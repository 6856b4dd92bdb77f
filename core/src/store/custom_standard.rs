//! Store methods for custom standards and the per-template selection.

use super::AssessmentStore;
use crate::{
    custom_standard::{CustomStandard, CustomStandardDraft},
    error::ScoringResult,
    layer::OverrideSet,
    source::CustomStandardSource,
    types::{CustomStandardId, TemplateId},
};
use chrono::{DateTime, Utc};
use rusqlite::{params, types::Type, OptionalExtension, Row};

const CUSTOM_STANDARD_COLUMNS: &str =
    "custom_standard_id, institution_id, template_id, code, name, description,
     category_weights, aspect_configs, sub_aspect_configs, is_active, created_at, updated_at";

fn json_column<T: serde::de::DeserializeOwned>(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn custom_standard_row(row: &Row<'_>) -> rusqlite::Result<CustomStandard> {
    Ok(CustomStandard {
        custom_standard_id: row.get(0)?,
        institution_id: row.get(1)?,
        template_id: row.get(2)?,
        code: row.get(3)?,
        name: row.get(4)?,
        description: row.get(5)?,
        settings: OverrideSet {
            category_weights: json_column(row, 6)?,
            aspects: json_column(row, 7)?,
            sub_aspects: json_column(row, 8)?,
        },
        is_active: row.get::<_, i64>(9)? != 0,
        created_at: timestamp_column(row, 10)?,
        updated_at: timestamp_column(row, 11)?,
    })
}

impl CustomStandardSource for AssessmentStore {
    fn insert_custom_standard(
        &self,
        draft: &CustomStandardDraft,
    ) -> ScoringResult<CustomStandardId> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO custom_standard (
                institution_id, template_id, code, name, description,
                category_weights, aspect_configs, sub_aspect_configs,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
            params![
                draft.institution_id,
                draft.template_id,
                draft.code,
                draft.name,
                draft.description,
                serde_json::to_string(&draft.settings.category_weights)?,
                serde_json::to_string(&draft.settings.aspects)?,
                serde_json::to_string(&draft.settings.sub_aspects)?,
                draft.is_active as i64,
                now,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        log::info!(
            "custom standard {id} '{}' saved for template {}",
            draft.code,
            draft.template_id
        );
        Ok(id)
    }

    fn update_custom_standard(
        &self,
        id: CustomStandardId,
        draft: &CustomStandardDraft,
    ) -> ScoringResult<bool> {
        let changed = self.conn.execute(
            "UPDATE custom_standard SET
                institution_id = ?2, template_id = ?3, code = ?4, name = ?5, description = ?6,
                category_weights = ?7, aspect_configs = ?8, sub_aspect_configs = ?9,
                is_active = ?10, updated_at = ?11
             WHERE custom_standard_id = ?1",
            params![
                id,
                draft.institution_id,
                draft.template_id,
                draft.code,
                draft.name,
                draft.description,
                serde_json::to_string(&draft.settings.category_weights)?,
                serde_json::to_string(&draft.settings.aspects)?,
                serde_json::to_string(&draft.settings.sub_aspects)?,
                draft.is_active as i64,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(changed > 0)
    }

    fn delete_custom_standard(&self, id: CustomStandardId) -> ScoringResult<bool> {
        self.conn.execute(
            "DELETE FROM custom_standard_selection WHERE custom_standard_id = ?1",
            params![id],
        )?;
        let changed = self.conn.execute(
            "DELETE FROM custom_standard WHERE custom_standard_id = ?1",
            params![id],
        )?;
        Ok(changed > 0)
    }

    fn custom_standard(&self, id: CustomStandardId) -> ScoringResult<Option<CustomStandard>> {
        let sql = format!(
            "SELECT {CUSTOM_STANDARD_COLUMNS} FROM custom_standard WHERE custom_standard_id = ?1"
        );
        let standard = self
            .conn
            .query_row(&sql, params![id], custom_standard_row)
            .optional()?;
        Ok(standard)
    }

    fn custom_standards_for_template(
        &self,
        template_id: TemplateId,
    ) -> ScoringResult<Vec<CustomStandard>> {
        let sql = format!(
            "SELECT {CUSTOM_STANDARD_COLUMNS} FROM custom_standard
             WHERE template_id = ?1
             ORDER BY code ASC, custom_standard_id ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![template_id], custom_standard_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn select_custom_standard(
        &self,
        template_id: TemplateId,
        id: Option<CustomStandardId>,
    ) -> ScoringResult<()> {
        match id {
            Some(id) => {
                self.conn.execute(
                    "INSERT OR REPLACE INTO custom_standard_selection (template_id, custom_standard_id)
                     VALUES (?1, ?2)",
                    params![template_id, id],
                )?;
            }
            None => {
                self.conn.execute(
                    "DELETE FROM custom_standard_selection WHERE template_id = ?1",
                    params![template_id],
                )?;
            }
        }
        Ok(())
    }

    fn selected_custom_standard_id(
        &self,
        template_id: TemplateId,
    ) -> ScoringResult<Option<CustomStandardId>> {
        let id = self
            .conn
            .query_row(
                "SELECT custom_standard_id FROM custom_standard_selection WHERE template_id = ?1",
                params![template_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }
}
