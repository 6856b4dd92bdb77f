//! Configuration fingerprint.
//!
//! A SHA-256 over the effective configuration of one template. Cached
//! rankings and statistics are keyed by it, so any weight, active-flag or
//! rating change anywhere in the three layers moves results to a new key.
//! Tolerance is not part of it: tolerance is applied after the cache.

use crate::{
    catalog::TemplateCatalog, context::ConfigurationContext, resolver::StandardResolver,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn fingerprint(catalog: &TemplateCatalog, context: &ConfigurationContext) -> Fingerprint {
    let resolver = StandardResolver::new(catalog, context);
    let effective = resolver.effective_standard();
    let mut hasher = Sha256::new();

    let mut line = |text: String| {
        hasher.update(text.as_bytes());
        hasher.update(b"\n");
    };

    line(format!("template:{}", catalog.template_id()));
    line(format!("layer:{}", context.active_layer().as_str()));
    match &context.custom_standard {
        Some(standard) => line(format!(
            "custom:{}:{}",
            standard.custom_standard_id,
            standard.updated_at.to_rfc3339()
        )),
        None => line("custom:none".to_string()),
    }

    // f64 values are hashed by bit pattern so 20 and 20.000001 differ.
    for category in &effective.categories {
        line(format!(
            "category:{}:{:016x}",
            category.code,
            category.weight.value.to_bits()
        ));
        for aspect in &category.aspects {
            line(format!(
                "aspect:{}:{:016x}:{}:{:016x}",
                aspect.code,
                aspect.weight.value.to_bits(),
                aspect.active.value,
                aspect.standard_rating.to_bits()
            ));
            for sub in &aspect.sub_aspects {
                line(format!(
                    "sub:{}:{}:{}",
                    sub.code, sub.active.value, sub.rating.value
                ));
            }
        }
    }

    Fingerprint(format!("{:x}", hasher.finalize()))
}
