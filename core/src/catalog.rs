//! Template structure (category → aspect → sub-aspect) and the
//! read-through catalog cache in front of it.
//!
//! Ranking and statistics touch the same template once per participant;
//! the cache turns those repeated structural lookups into one load per
//! template. There is no expiry: callers invalidate explicitly.

use crate::{
    error::ScoringResult,
    source::CatalogSource,
    types::{AspectId, CategoryId, Code, SubAspectId, TemplateId},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Template {
    pub template_id: TemplateId,
    pub code: Code,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub category_id: CategoryId,
    pub template_id: TemplateId,
    pub code: Code,
    pub name: String,
    pub weight_percentage: f64,
    pub order: i64,
    pub aspects: Vec<Aspect>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Aspect {
    pub aspect_id: AspectId,
    pub template_id: TemplateId,
    pub category_id: CategoryId,
    pub code: Code,
    pub name: String,
    pub weight_percentage: f64,
    /// Only meaningful when the aspect has no sub-aspects.
    pub standard_rating: Option<f64>,
    pub order: i64,
    pub sub_aspects: Vec<SubAspect>,
}

impl Aspect {
    pub fn has_sub_aspects(&self) -> bool {
        !self.sub_aspects.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubAspect {
    pub sub_aspect_id: SubAspectId,
    pub aspect_id: AspectId,
    pub code: Code,
    pub name: String,
    pub standard_rating: i64,
    pub order: i64,
}

/// The full structure of one template, categories and children in `order`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemplateCatalog {
    pub template: Template,
    pub categories: Vec<Category>,
}

impl TemplateCatalog {
    pub fn template_id(&self) -> TemplateId {
        self.template.template_id
    }

    pub fn category_by_code(&self, code: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.code.as_str() == code)
    }

    pub fn category_by_id(&self, category_id: CategoryId) -> Option<&Category> {
        self.categories.iter().find(|c| c.category_id == category_id)
    }

    pub fn aspects(&self) -> impl Iterator<Item = &Aspect> {
        self.categories.iter().flat_map(|c| c.aspects.iter())
    }

    pub fn aspect_by_code(&self, code: &str) -> Option<&Aspect> {
        self.aspects().find(|a| a.code.as_str() == code)
    }

    pub fn aspect_by_id(&self, aspect_id: AspectId) -> Option<&Aspect> {
        self.aspects().find(|a| a.aspect_id == aspect_id)
    }

    pub fn sub_aspect_by_code(&self, code: &str) -> Option<&SubAspect> {
        self.aspects()
            .flat_map(|a| a.sub_aspects.iter())
            .find(|s| s.code.as_str() == code)
    }

    /// Sort categories, aspects and sub-aspects by their `order` field.
    /// Stores hand back rows already ordered; fixtures may not.
    pub fn normalize_order(&mut self) {
        self.categories.sort_by_key(|c| (c.order, c.category_id));
        for category in &mut self.categories {
            category.aspects.sort_by_key(|a| (a.order, a.aspect_id));
            for aspect in &mut category.aspects {
                aspect.sub_aspects.sort_by_key(|s| (s.order, s.sub_aspect_id));
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct CatalogCache {
    templates: HashMap<TemplateId, Arc<TemplateCatalog>>,
    aspect_index: HashMap<AspectId, TemplateId>,
    loads: u64,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and cache the full tree for `template_id`.
    /// Returns `None` (and caches nothing) when the template does not exist.
    pub fn preload_by_template(
        &mut self,
        source: &dyn CatalogSource,
        template_id: TemplateId,
    ) -> ScoringResult<Option<Arc<TemplateCatalog>>> {
        if let Some(catalog) = self.templates.get(&template_id) {
            return Ok(Some(Arc::clone(catalog)));
        }

        self.loads += 1;
        let Some(mut catalog) = source.load_template_catalog(template_id)? else {
            log::warn!("catalog: template {template_id} not found");
            return Ok(None);
        };
        catalog.normalize_order();

        for aspect in catalog.aspects() {
            self.aspect_index.insert(aspect.aspect_id, template_id);
        }
        let catalog = Arc::new(catalog);
        self.templates.insert(template_id, Arc::clone(&catalog));
        log::debug!("catalog: loaded template {template_id}");
        Ok(Some(catalog))
    }

    pub fn get_by_id(
        &mut self,
        source: &dyn CatalogSource,
        aspect_id: AspectId,
    ) -> ScoringResult<Option<Aspect>> {
        let template_id = match self.aspect_index.get(&aspect_id) {
            Some(id) => *id,
            None => match source.template_id_for_aspect(aspect_id)? {
                Some(id) => id,
                None => return Ok(None),
            },
        };
        Ok(self
            .preload_by_template(source, template_id)?
            .and_then(|catalog| catalog.aspect_by_id(aspect_id).cloned()))
    }

    pub fn get_by_code(
        &mut self,
        source: &dyn CatalogSource,
        template_id: TemplateId,
        code: &str,
    ) -> ScoringResult<Option<Aspect>> {
        Ok(self
            .preload_by_template(source, template_id)?
            .and_then(|catalog| catalog.aspect_by_code(code).cloned()))
    }

    pub fn clear_cache(&mut self) {
        self.templates.clear();
        self.aspect_index.clear();
    }

    pub fn clear_template(&mut self, template_id: TemplateId) {
        self.templates.remove(&template_id);
        self.aspect_index.retain(|_, t| *t != template_id);
    }

    pub fn is_cached(&self, template_id: TemplateId) -> bool {
        self.templates.contains_key(&template_id)
    }

    /// Number of times the source was asked for a template tree.
    pub fn load_count(&self) -> u64 {
        self.loads
    }
}
