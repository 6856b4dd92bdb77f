//! In-memory session carrier for the session override layer.

use crate::{layer::OverrideSet, source::SessionCarrier, types::TemplateId};
use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
pub struct InMemorySessionCarrier {
    entries: HashMap<TemplateId, OverrideSet>,
}

impl InMemorySessionCarrier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionCarrier for InMemorySessionCarrier {
    fn adjustments(&self, template_id: TemplateId) -> OverrideSet {
        self.entries.get(&template_id).cloned().unwrap_or_default()
    }

    fn store_adjustments(&mut self, template_id: TemplateId, adjustments: OverrideSet) {
        if adjustments.is_empty() {
            self.entries.remove(&template_id);
        } else {
            self.entries.insert(template_id, adjustments);
        }
    }

    fn clear(&mut self, template_id: TemplateId) {
        self.entries.remove(&template_id);
    }
}
