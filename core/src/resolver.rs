//! Standard resolution over the three layers.
//!
//! RULE: every engine (individual, ranking, statistics, import, fingerprint)
//! obtains weights, active flags and standard ratings through this type.
//! Nothing else reads `weight_percentage` or `standard_rating` for scoring.

use crate::{
    catalog::{Aspect, TemplateCatalog},
    context::ConfigurationContext,
    layer::{pick, Layer, OverrideSet, Resolved},
    types::Code,
};
use serde::Serialize;

pub struct StandardResolver<'a> {
    catalog: &'a TemplateCatalog,
    session: Option<&'a OverrideSet>,
    custom: Option<&'a OverrideSet>,
}

impl<'a> StandardResolver<'a> {
    /// Bind a resolver to one template. A context built for a different
    /// template contributes nothing and every value falls back to baseline.
    pub fn new(catalog: &'a TemplateCatalog, context: &'a ConfigurationContext) -> Self {
        if context.template_id != catalog.template_id() {
            log::warn!(
                "resolver: context for template {} applied to template {}, using baseline",
                context.template_id,
                catalog.template_id()
            );
            return Self { catalog, session: None, custom: None };
        }
        Self {
            catalog,
            session: Some(&context.session),
            custom: context.custom_settings(),
        }
    }

    pub fn catalog(&self) -> &'a TemplateCatalog {
        self.catalog
    }

    fn layered<T>(
        &self,
        read: impl Fn(&OverrideSet) -> Option<T>,
        baseline: T,
    ) -> Resolved<T> {
        pick(
            self.session.and_then(&read),
            self.custom.and_then(&read),
            baseline,
        )
    }

    pub fn category_weight(&self, code: &str) -> Resolved<f64> {
        let baseline = self
            .catalog
            .category_by_code(code)
            .map(|c| c.weight_percentage)
            .unwrap_or(0.0);
        self.layered(|o| o.category_weight(code), baseline)
    }

    pub fn aspect_weight(&self, code: &str) -> Resolved<f64> {
        let baseline = self
            .catalog
            .aspect_by_code(code)
            .map(|a| a.weight_percentage)
            .unwrap_or(0.0);
        self.layered(|o| o.aspect_weight(code), baseline)
    }

    pub fn aspect_active(&self, code: &str) -> Resolved<bool> {
        self.layered(|o| o.aspect_active(code), true)
    }

    pub fn aspect_rating(&self, code: &str) -> Resolved<f64> {
        let baseline = self
            .catalog
            .aspect_by_code(code)
            .and_then(|a| a.standard_rating)
            .unwrap_or(0.0);
        self.layered(|o| o.aspect_rating(code), baseline)
    }

    pub fn sub_aspect_active(&self, code: &str) -> Resolved<bool> {
        self.layered(|o| o.sub_aspect_active(code), true)
    }

    pub fn sub_aspect_rating(&self, code: &str) -> Resolved<i64> {
        let baseline = self
            .catalog
            .sub_aspect_by_code(code)
            .map(|s| s.standard_rating)
            .unwrap_or(0);
        self.layered(|o| o.sub_aspect_rating(code), baseline)
    }

    pub fn resolve_category_weight(&self, code: &str) -> f64 {
        self.category_weight(code).value
    }

    pub fn resolve_aspect_weight(&self, code: &str) -> f64 {
        self.aspect_weight(code).value
    }

    pub fn resolve_aspect_active(&self, code: &str) -> bool {
        self.aspect_active(code).value
    }

    pub fn resolve_aspect_rating(&self, code: &str) -> f64 {
        self.aspect_rating(code).value
    }

    pub fn resolve_sub_aspect_active(&self, code: &str) -> bool {
        self.sub_aspect_active(code).value
    }

    pub fn resolve_sub_aspect_rating(&self, code: &str) -> i64 {
        self.sub_aspect_rating(code).value
    }

    /// Unrounded standard rating of an aspect.
    ///
    /// With sub-aspects: mean of the resolved ratings of the active ones,
    /// or the aspect's own resolved rating when none is active.
    /// Without sub-aspects: the aspect's own resolved rating.
    pub fn resolve_aspect_standard_rating(&self, aspect: &Aspect) -> f64 {
        if !aspect.has_sub_aspects() {
            return self.resolve_aspect_rating(aspect.code.as_str());
        }

        let (sum, count) = aspect
            .sub_aspects
            .iter()
            .filter(|s| self.resolve_sub_aspect_active(s.code.as_str()))
            .fold((0i64, 0usize), |(sum, count), s| {
                (sum + self.resolve_sub_aspect_rating(s.code.as_str()), count + 1)
            });

        if count == 0 {
            log::debug!(
                "resolver: aspect {} has no active sub-aspects, using its own rating",
                aspect.code
            );
            return self.resolve_aspect_rating(aspect.code.as_str());
        }
        sum as f64 / count as f64
    }

    /// The whole resolved tree, with the layer each value came from.
    pub fn effective_standard(&self) -> EffectiveStandard {
        let categories = self
            .catalog
            .categories
            .iter()
            .map(|category| EffectiveCategory {
                code: category.code.clone(),
                name: category.name.clone(),
                weight: self.category_weight(category.code.as_str()),
                aspects: category
                    .aspects
                    .iter()
                    .map(|aspect| self.effective_aspect(aspect))
                    .collect(),
            })
            .collect();

        EffectiveStandard {
            template_id: self.catalog.template_id(),
            categories,
        }
    }

    fn effective_aspect(&self, aspect: &Aspect) -> EffectiveAspect {
        let code = aspect.code.as_str();
        EffectiveAspect {
            code: aspect.code.clone(),
            name: aspect.name.clone(),
            weight: self.aspect_weight(code),
            active: self.aspect_active(code),
            rating: self.aspect_rating(code),
            standard_rating: self.resolve_aspect_standard_rating(aspect),
            sub_aspects: aspect
                .sub_aspects
                .iter()
                .map(|sub| EffectiveSubAspect {
                    code: sub.code.clone(),
                    name: sub.name.clone(),
                    active: self.sub_aspect_active(sub.code.as_str()),
                    rating: self.sub_aspect_rating(sub.code.as_str()),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectiveStandard {
    pub template_id: crate::types::TemplateId,
    pub categories: Vec<EffectiveCategory>,
}

impl EffectiveStandard {
    /// Layers that contributed at least one value.
    pub fn contributing_layers(&self) -> Vec<Layer> {
        let mut layers: Vec<Layer> = Vec::new();
        let mut note = |layer: Layer| {
            if !layers.contains(&layer) {
                layers.push(layer);
            }
        };
        for category in &self.categories {
            note(category.weight.layer);
            for aspect in &category.aspects {
                note(aspect.weight.layer);
                note(aspect.active.layer);
                note(aspect.rating.layer);
                for sub in &aspect.sub_aspects {
                    note(sub.active.layer);
                    note(sub.rating.layer);
                }
            }
        }
        layers.sort();
        layers
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectiveCategory {
    pub code: Code,
    pub name: String,
    pub weight: Resolved<f64>,
    pub aspects: Vec<EffectiveAspect>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectiveAspect {
    pub code: Code,
    pub name: String,
    pub weight: Resolved<f64>,
    pub active: Resolved<bool>,
    pub rating: Resolved<f64>,
    pub standard_rating: f64,
    pub sub_aspects: Vec<EffectiveSubAspect>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectiveSubAspect {
    pub code: Code,
    pub name: String,
    pub active: Resolved<bool>,
    pub rating: Resolved<i64>,
}
