//! Store methods for template structure.

use super::AssessmentStore;
use crate::{
    catalog::{Aspect, Category, SubAspect, Template, TemplateCatalog},
    error::ScoringResult,
    source::CatalogSource,
    types::{AspectId, CategoryId, Code, SubAspectId, TemplateId},
};
use rusqlite::{params, OptionalExtension};
use std::collections::HashMap;

impl AssessmentStore {
    // ── Authoring ─────────────────────────────────────────────────

    pub fn insert_template(&self, code: &str, name: &str) -> ScoringResult<TemplateId> {
        self.conn.execute(
            "INSERT INTO assessment_template (code, name) VALUES (?1, ?2)",
            params![code, name],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn template_id_by_code(&self, code: &str) -> ScoringResult<Option<TemplateId>> {
        let id = self
            .conn
            .query_row(
                "SELECT template_id FROM assessment_template WHERE code = ?1",
                params![code],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    pub fn insert_category(
        &self,
        template_id: TemplateId,
        code: &str,
        name: &str,
        weight_percentage: f64,
        order: i64,
    ) -> ScoringResult<CategoryId> {
        self.conn.execute(
            "INSERT INTO category_type (template_id, code, name, weight_percentage, sort_order)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![template_id, code, name, weight_percentage, order],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn insert_aspect(
        &self,
        template_id: TemplateId,
        category_id: CategoryId,
        code: &str,
        name: &str,
        weight_percentage: f64,
        standard_rating: Option<f64>,
        order: i64,
    ) -> ScoringResult<AspectId> {
        self.conn.execute(
            "INSERT INTO aspect (template_id, category_id, code, name, weight_percentage,
                                 standard_rating, sort_order)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![template_id, category_id, code, name, weight_percentage, standard_rating, order],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn insert_sub_aspect(
        &self,
        template_id: TemplateId,
        aspect_id: AspectId,
        code: &str,
        name: &str,
        standard_rating: i64,
        order: i64,
    ) -> ScoringResult<SubAspectId> {
        self.conn.execute(
            "INSERT INTO sub_aspect (template_id, aspect_id, code, name, standard_rating, sort_order)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![template_id, aspect_id, code, name, standard_rating, order],
        )?;
        Ok(self.conn.last_insert_rowid())
    }
}

impl CatalogSource for AssessmentStore {
    fn load_template_catalog(
        &self,
        template_id: TemplateId,
    ) -> ScoringResult<Option<TemplateCatalog>> {
        let template = self
            .conn
            .query_row(
                "SELECT template_id, code, name FROM assessment_template WHERE template_id = ?1",
                params![template_id],
                |row| {
                    Ok(Template {
                        template_id: row.get(0)?,
                        code: Code::new(row.get::<_, String>(1)?),
                        name: row.get(2)?,
                    })
                },
            )
            .optional()?;
        let Some(template) = template else {
            return Ok(None);
        };

        let mut sub_stmt = self.conn.prepare(
            "SELECT sub_aspect_id, aspect_id, code, name, standard_rating, sort_order
             FROM sub_aspect WHERE template_id = ?1
             ORDER BY sort_order ASC, sub_aspect_id ASC",
        )?;
        let mut subs_by_aspect: HashMap<AspectId, Vec<SubAspect>> = HashMap::new();
        let subs = sub_stmt
            .query_map(params![template_id], |row| {
                Ok(SubAspect {
                    sub_aspect_id: row.get(0)?,
                    aspect_id: row.get(1)?,
                    code: Code::new(row.get::<_, String>(2)?),
                    name: row.get(3)?,
                    standard_rating: row.get(4)?,
                    order: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        for sub in subs {
            subs_by_aspect.entry(sub.aspect_id).or_default().push(sub);
        }

        let mut aspect_stmt = self.conn.prepare(
            "SELECT aspect_id, category_id, code, name, weight_percentage, standard_rating, sort_order
             FROM aspect WHERE template_id = ?1
             ORDER BY sort_order ASC, aspect_id ASC",
        )?;
        let mut aspects_by_category: HashMap<CategoryId, Vec<Aspect>> = HashMap::new();
        let aspects = aspect_stmt
            .query_map(params![template_id], |row| {
                Ok(Aspect {
                    aspect_id: row.get(0)?,
                    template_id,
                    category_id: row.get(1)?,
                    code: Code::new(row.get::<_, String>(2)?),
                    name: row.get(3)?,
                    weight_percentage: row.get(4)?,
                    standard_rating: row.get(5)?,
                    order: row.get(6)?,
                    sub_aspects: Vec::new(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        for mut aspect in aspects {
            aspect.sub_aspects = subs_by_aspect.remove(&aspect.aspect_id).unwrap_or_default();
            aspects_by_category
                .entry(aspect.category_id)
                .or_default()
                .push(aspect);
        }

        let mut category_stmt = self.conn.prepare(
            "SELECT category_id, code, name, weight_percentage, sort_order
             FROM category_type WHERE template_id = ?1
             ORDER BY sort_order ASC, category_id ASC",
        )?;
        let categories = category_stmt
            .query_map(params![template_id], |row| {
                Ok(Category {
                    category_id: row.get(0)?,
                    template_id,
                    code: Code::new(row.get::<_, String>(1)?),
                    name: row.get(2)?,
                    weight_percentage: row.get(3)?,
                    order: row.get(4)?,
                    aspects: Vec::new(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|mut category| {
                category.aspects = aspects_by_category
                    .remove(&category.category_id)
                    .unwrap_or_default();
                category
            })
            .collect();

        Ok(Some(TemplateCatalog { template, categories }))
    }

    fn template_id_for_aspect(&self, aspect_id: AspectId) -> ScoringResult<Option<TemplateId>> {
        let id = self
            .conn
            .query_row(
                "SELECT template_id FROM aspect WHERE aspect_id = ?1",
                params![aspect_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }
}
