//! Override layers.
//!
//! Priority is fixed: Session > CustomStandard > Baseline.
//! Session adjustments and custom standards share one shape, `OverrideSet`.
//! Every value is an `Option`: a key that is present with `None` means
//! "no override at this layer", never zero.

use crate::types::Code;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Baseline,
    CustomStandard,
    Session,
}

impl Layer {
    pub fn as_str(self) -> &'static str {
        match self {
            Layer::Baseline => "baseline",
            Layer::CustomStandard => "custom_standard",
            Layer::Session => "session",
        }
    }
}

/// A resolved value and the layer it came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Resolved<T> {
    pub value: T,
    pub layer: Layer,
}

/// First present value wins, in priority order.
pub fn pick<T>(session: Option<T>, custom: Option<T>, baseline: T) -> Resolved<T> {
    if let Some(value) = session {
        return Resolved { value, layer: Layer::Session };
    }
    if let Some(value) = custom {
        return Resolved { value, layer: Layer::CustomStandard };
    }
    Resolved { value: baseline, layer: Layer::Baseline }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AspectSettings {
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub active: Option<bool>,
    /// Direct standard rating; ignored for aspects with sub-aspects.
    #[serde(default)]
    pub rating: Option<f64>,
}

impl AspectSettings {
    pub fn is_empty(&self) -> bool {
        self.weight.is_none() && self.active.is_none() && self.rating.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubAspectSettings {
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub rating: Option<i64>,
}

impl SubAspectSettings {
    pub fn is_empty(&self) -> bool {
        self.active.is_none() && self.rating.is_none()
    }
}

/// Overrides for one template at one layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverrideSet {
    #[serde(default)]
    pub category_weights: BTreeMap<Code, Option<f64>>,
    #[serde(default)]
    pub aspects: BTreeMap<Code, AspectSettings>,
    #[serde(default)]
    pub sub_aspects: BTreeMap<Code, SubAspectSettings>,
}

impl OverrideSet {
    /// True when no key carries an actual override value.
    pub fn is_empty(&self) -> bool {
        self.category_weights.values().all(Option::is_none)
            && self.aspects.values().all(AspectSettings::is_empty)
            && self.sub_aspects.values().all(SubAspectSettings::is_empty)
    }

    pub fn category_weight(&self, code: &str) -> Option<f64> {
        self.category_weights.get(code).copied().flatten()
    }

    pub fn aspect_weight(&self, code: &str) -> Option<f64> {
        self.aspects.get(code).and_then(|s| s.weight)
    }

    pub fn aspect_active(&self, code: &str) -> Option<bool> {
        self.aspects.get(code).and_then(|s| s.active)
    }

    pub fn aspect_rating(&self, code: &str) -> Option<f64> {
        self.aspects.get(code).and_then(|s| s.rating)
    }

    pub fn sub_aspect_active(&self, code: &str) -> Option<bool> {
        self.sub_aspects.get(code).and_then(|s| s.active)
    }

    pub fn sub_aspect_rating(&self, code: &str) -> Option<i64> {
        self.sub_aspects.get(code).and_then(|s| s.rating)
    }

    pub fn set_category_weight(&mut self, code: Code, weight: Option<f64>) {
        self.category_weights.insert(code, weight);
    }

    pub fn set_aspect_weight(&mut self, code: Code, weight: Option<f64>) {
        self.aspects.entry(code).or_default().weight = weight;
    }

    pub fn set_aspect_active(&mut self, code: Code, active: Option<bool>) {
        self.aspects.entry(code).or_default().active = active;
    }

    pub fn set_aspect_rating(&mut self, code: Code, rating: Option<f64>) {
        self.aspects.entry(code).or_default().rating = rating;
    }

    pub fn set_sub_aspect_active(&mut self, code: Code, active: Option<bool>) {
        self.sub_aspects.entry(code).or_default().active = active;
    }

    pub fn set_sub_aspect_rating(&mut self, code: Code, rating: Option<i64>) {
        self.sub_aspects.entry(code).or_default().rating = rating;
    }
}
