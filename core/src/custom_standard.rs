//! Institution-authored custom standards: the middle override layer.
//!
//! Validation runs at save time only. Reads never reject a standard;
//! a persisted standard is resolved as-is even if the template changed
//! underneath it.

use crate::{
    catalog::TemplateCatalog,
    config::{EngineConfig, ValidationRules},
    context::ConfigurationContext,
    layer::{AspectSettings, OverrideSet, SubAspectSettings},
    resolver::StandardResolver,
    types::{CustomStandardId, InstitutionId, TemplateId},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomStandard {
    pub custom_standard_id: CustomStandardId,
    pub institution_id: InstitutionId,
    pub template_id: TemplateId,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub settings: OverrideSet,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A custom standard that has not been persisted yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomStandardDraft {
    pub institution_id: InstitutionId,
    pub template_id: TemplateId,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub settings: OverrideSet,
    pub is_active: bool,
}

impl CustomStandardDraft {
    /// Seed a draft with every baseline value of the template, so the
    /// author edits a complete standard rather than a sparse diff.
    pub fn from_baseline(
        catalog: &TemplateCatalog,
        institution_id: InstitutionId,
        code: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        let mut settings = OverrideSet::default();
        for category in &catalog.categories {
            settings
                .category_weights
                .insert(category.code.clone(), Some(category.weight_percentage));
            for aspect in &category.aspects {
                settings.aspects.insert(
                    aspect.code.clone(),
                    AspectSettings {
                        weight: Some(aspect.weight_percentage),
                        active: Some(true),
                        rating: if aspect.has_sub_aspects() {
                            None
                        } else {
                            aspect.standard_rating
                        },
                    },
                );
                for sub in &aspect.sub_aspects {
                    settings.sub_aspects.insert(
                        sub.code.clone(),
                        SubAspectSettings {
                            active: Some(true),
                            rating: Some(sub.standard_rating),
                        },
                    );
                }
            }
        }

        Self {
            institution_id,
            template_id: catalog.template_id(),
            code: code.into(),
            name: name.into(),
            description: None,
            settings,
            is_active: true,
        }
    }

    /// View the draft as if it were persisted, for resolution previews.
    pub fn preview(&self) -> CustomStandard {
        let now = Utc::now();
        CustomStandard {
            custom_standard_id: 0,
            institution_id: self.institution_id,
            template_id: self.template_id,
            code: self.code.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            settings: self.settings.clone(),
            is_active: self.is_active,
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<&CustomStandard> for CustomStandardDraft {
    fn from(standard: &CustomStandard) -> Self {
        Self {
            institution_id: standard.institution_id,
            template_id: standard.template_id,
            code: standard.code.clone(),
            name: standard.name.clone(),
            description: standard.description.clone(),
            settings: standard.settings.clone(),
            is_active: standard.is_active,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    fn error(&mut self, message: String) {
        self.errors.push(message);
    }

    fn warning(&mut self, message: String) {
        self.warnings.push(message);
    }
}

/// Outcome of a save: either the stored id or the reasons it was refused.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SaveOutcome {
    pub custom_standard_id: Option<CustomStandardId>,
    pub validation: ValidationResult,
}

fn sums_to(total: f64, rules: &ValidationRules) -> bool {
    total.is_finite() && (total - rules.weight_total).abs() <= rules.weight_tolerance
}

pub fn validate(
    catalog: &TemplateCatalog,
    draft: &CustomStandardDraft,
    config: &EngineConfig,
) -> ValidationResult {
    let rules = &config.validation;
    let scale = config.rating_scale;
    let mut result = ValidationResult::default();

    if draft.code.trim().is_empty() {
        result.error("Code must not be empty".into());
    }
    if draft.name.trim().is_empty() {
        result.error("Name must not be empty".into());
    }
    if draft.template_id != catalog.template_id() {
        result.error(format!(
            "Standard targets template {} but was validated against template {}",
            draft.template_id,
            catalog.template_id()
        ));
        result.valid = false;
        return result;
    }

    let settings = &draft.settings;
    for (code, weight) in &settings.category_weights {
        if catalog.category_by_code(code.as_str()).is_none() {
            result.error(format!("Unknown category code '{code}'"));
        }
        match weight {
            Some(w) if !w.is_finite() => {
                result.error(format!("Category '{code}' weight is not a finite number"))
            }
            Some(w) if *w < 0.0 => result.error(format!("Category '{code}' has a negative weight")),
            _ => {}
        }
    }
    for (code, aspect) in &settings.aspects {
        if catalog.aspect_by_code(code.as_str()).is_none() {
            result.error(format!("Unknown aspect code '{code}'"));
        }
        match aspect.weight {
            Some(w) if !w.is_finite() => {
                result.error(format!("Aspect '{code}' weight is not a finite number"))
            }
            Some(w) if w < 0.0 => result.error(format!("Aspect '{code}' has a negative weight")),
            _ => {}
        }
        if let Some(rating) = aspect.rating {
            if !(scale.min as f64..=scale.max as f64).contains(&rating) {
                result.error(format!(
                    "Aspect '{code}' rating {rating} is outside {}..={}",
                    scale.min, scale.max
                ));
            }
        }
    }
    for (code, sub) in &settings.sub_aspects {
        if catalog.sub_aspect_by_code(code.as_str()).is_none() {
            result.error(format!("Unknown sub-aspect code '{code}'"));
        }
        if let Some(rating) = sub.rating {
            if !scale.contains(rating) {
                result.error(format!(
                    "Sub-aspect '{code}' rating {rating} is outside {}..={}",
                    scale.min, scale.max
                ));
            }
        }
    }

    let context = ConfigurationContext::baseline(catalog.template_id())
        .with_custom_standard(Some(draft.preview()));
    let resolver = StandardResolver::new(catalog, &context);

    let category_total: f64 = catalog
        .categories
        .iter()
        .map(|c| resolver.resolve_category_weight(c.code.as_str()))
        .sum();
    if !sums_to(category_total, rules) {
        result.error(format!(
            "Category weights sum to {category_total:.2}, expected {:.2}",
            rules.weight_total
        ));
    }

    for category in &catalog.categories {
        let active: Vec<_> = category
            .aspects
            .iter()
            .filter(|a| resolver.resolve_aspect_active(a.code.as_str()))
            .collect();

        if active.len() < rules.min_active_aspects_per_category {
            result.error(format!(
                "Category '{}' has {} active aspects, at least {} required",
                category.code,
                active.len(),
                rules.min_active_aspects_per_category
            ));
        }

        if !active.is_empty() {
            let aspect_total: f64 = active
                .iter()
                .map(|a| resolver.resolve_aspect_weight(a.code.as_str()))
                .sum();
            if !sums_to(aspect_total, rules) {
                result.error(format!(
                    "Active aspect weights in category '{}' sum to {aspect_total:.2}, expected {:.2}",
                    category.code, rules.weight_total
                ));
            }
        }

        for aspect in active.iter().filter(|a| a.has_sub_aspects()) {
            let any_active = aspect
                .sub_aspects
                .iter()
                .any(|s| resolver.resolve_sub_aspect_active(s.code.as_str()));
            if !any_active {
                result.warning(format!(
                    "Aspect '{}' has no active sub-aspects; its own rating will be used",
                    aspect.code
                ));
            }
        }
    }

    result.valid = result.errors.is_empty();
    result
}
