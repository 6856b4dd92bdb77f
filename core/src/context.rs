//! The configuration a resolver reads from: one template's session
//! overrides plus the custom standard selected for that template.

use crate::{
    custom_standard::CustomStandard,
    error::ScoringResult,
    layer::{Layer, OverrideSet},
    source::{CustomStandardSource, SessionCarrier},
    types::{CustomStandardId, TemplateId},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationContext {
    pub template_id: TemplateId,
    pub session: OverrideSet,
    pub custom_standard: Option<CustomStandard>,
}

impl ConfigurationContext {
    /// No overrides at all: every value resolves to the template baseline.
    pub fn baseline(template_id: TemplateId) -> Self {
        Self {
            template_id,
            session: OverrideSet::default(),
            custom_standard: None,
        }
    }

    pub fn with_session(mut self, session: OverrideSet) -> Self {
        self.session = session;
        self
    }

    pub fn with_custom_standard(mut self, standard: Option<CustomStandard>) -> Self {
        self.custom_standard = standard;
        self
    }

    /// Assemble the context for `template_id` from the session carrier and
    /// the selected custom standard. A selected standard that is inactive or
    /// belongs to another template is skipped.
    pub fn load(
        template_id: TemplateId,
        session: &dyn SessionCarrier,
        standards: &dyn CustomStandardSource,
    ) -> ScoringResult<Self> {
        let custom_standard = match standards.selected_custom_standard_id(template_id)? {
            Some(id) => match standards.custom_standard(id)? {
                Some(standard) if standard.template_id != template_id => {
                    log::warn!(
                        "context: selected standard {id} belongs to template {}, ignoring for template {template_id}",
                        standard.template_id
                    );
                    None
                }
                Some(standard) if !standard.is_active => {
                    log::warn!("context: selected standard {id} is inactive, using baseline");
                    None
                }
                Some(standard) => Some(standard),
                None => {
                    log::warn!("context: selected standard {id} no longer exists");
                    None
                }
            },
            None => None,
        };

        Ok(Self {
            template_id,
            session: session.adjustments(template_id),
            custom_standard,
        })
    }

    pub fn custom_settings(&self) -> Option<&OverrideSet> {
        self.custom_standard.as_ref().map(|s| &s.settings)
    }

    pub fn custom_standard_id(&self) -> Option<CustomStandardId> {
        self.custom_standard.as_ref().map(|s| s.custom_standard_id)
    }

    /// The highest layer that carries at least one override.
    pub fn active_layer(&self) -> Layer {
        if !self.session.is_empty() {
            Layer::Session
        } else if self.custom_standard.is_some() {
            Layer::CustomStandard
        } else {
            Layer::Baseline
        }
    }
}
