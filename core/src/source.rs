//! Traits at the seams between the scoring core and its collaborators.
//!
//! RULE: engines depend on these traits, never on a concrete store.
//! `store::AssessmentStore` implements the three data-store traits over
//! SQLite; `session::InMemorySessionCarrier` implements `SessionCarrier`.

use crate::{
    assessment::{AspectAssessment, Participant, Position},
    catalog::TemplateCatalog,
    custom_standard::{CustomStandard, CustomStandardDraft},
    error::ScoringResult,
    layer::OverrideSet,
    types::{
        AspectId, CustomStandardId, EventId, ParticipantId, PositionId, TemplateId,
    },
};

pub trait CatalogSource {
    /// The full template tree, or `None` if the template does not exist.
    fn load_template_catalog(&self, template_id: TemplateId)
        -> ScoringResult<Option<TemplateCatalog>>;

    fn template_id_for_aspect(&self, aspect_id: AspectId) -> ScoringResult<Option<TemplateId>>;
}

pub trait AssessmentSource {
    fn participant(&self, participant_id: ParticipantId) -> ScoringResult<Option<Participant>>;

    fn position(&self, position_id: PositionId) -> ScoringResult<Option<Position>>;

    /// Participants of one position in one event, ordered by id.
    fn participants_in_scope(
        &self,
        event_id: EventId,
        position_id: PositionId,
    ) -> ScoringResult<Vec<Participant>>;

    fn participant_aspect_assessments(
        &self,
        participant_id: ParticipantId,
        aspect_ids: &[AspectId],
    ) -> ScoringResult<Vec<AspectAssessment>>;

    /// Every row for `aspect_ids` belonging to participants of the scope.
    fn scope_aspect_assessments(
        &self,
        event_id: EventId,
        position_id: PositionId,
        aspect_ids: &[AspectId],
    ) -> ScoringResult<Vec<AspectAssessment>>;
}

pub trait CustomStandardSource {
    fn insert_custom_standard(&self, draft: &CustomStandardDraft)
        -> ScoringResult<CustomStandardId>;

    /// Overwrite content and bump `updated_at`. Returns false if the id is unknown.
    fn update_custom_standard(
        &self,
        id: CustomStandardId,
        draft: &CustomStandardDraft,
    ) -> ScoringResult<bool>;

    fn delete_custom_standard(&self, id: CustomStandardId) -> ScoringResult<bool>;

    fn custom_standard(&self, id: CustomStandardId) -> ScoringResult<Option<CustomStandard>>;

    fn custom_standards_for_template(
        &self,
        template_id: TemplateId,
    ) -> ScoringResult<Vec<CustomStandard>>;

    /// `None` deselects, restoring the baseline for the template.
    fn select_custom_standard(
        &self,
        template_id: TemplateId,
        id: Option<CustomStandardId>,
    ) -> ScoringResult<()>;

    fn selected_custom_standard_id(
        &self,
        template_id: TemplateId,
    ) -> ScoringResult<Option<CustomStandardId>>;
}

/// Everything the engine facade reads and writes through.
pub trait StandardsSource: CatalogSource + AssessmentSource + CustomStandardSource {}

impl<T: CatalogSource + AssessmentSource + CustomStandardSource> StandardsSource for T {}

/// Per-user session storage for the top override layer, namespaced by template.
pub trait SessionCarrier: Send {
    fn adjustments(&self, template_id: TemplateId) -> OverrideSet;

    fn store_adjustments(&mut self, template_id: TemplateId, adjustments: OverrideSet);

    fn clear(&mut self, template_id: TemplateId);
}
