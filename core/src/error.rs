use crate::types::{CustomStandardId, TemplateId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Template {template_id} not found")]
    TemplateNotFound { template_id: TemplateId },

    #[error("Custom standard {id} not found")]
    CustomStandardNotFound { id: CustomStandardId },

    #[error("Custom standard {id} belongs to template {actual}, not {expected}")]
    TemplateMismatch {
        id: CustomStandardId,
        expected: TemplateId,
        actual: TemplateId,
    },

    #[error("Import rejected: {0}")]
    Import(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type ScoringResult<T> = Result<T, ScoringError>;
