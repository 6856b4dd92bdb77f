//! Participants and the assessment facts persisted for them.

use crate::{
    scoring::Conclusion,
    types::{AspectId, BatchId, CategoryId, EventId, ParticipantId, PositionId, TemplateId},
};
use serde::{Deserialize, Serialize};

/// A position (formation) inside an event, assessed against one template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub position_id: PositionId,
    pub event_id: EventId,
    pub template_id: TemplateId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Participant {
    pub participant_id: ParticipantId,
    pub event_id: EventId,
    pub position_id: PositionId,
    pub batch_id: Option<BatchId>,
    pub name: String,
    pub test_number: String,
}

/// One (participant, aspect) row as written at assessment time.
///
/// The standard and gap columns are baseline facts. Live reads recompute
/// them from the resolver; only the individual columns are authoritative.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AspectAssessment {
    pub participant_id: ParticipantId,
    pub aspect_id: AspectId,
    pub standard_rating: f64,
    pub standard_score: f64,
    pub individual_rating: f64,
    pub individual_score: f64,
    pub gap_rating: f64,
    pub gap_score: f64,
    pub conclusion: Conclusion,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryAssessment {
    pub participant_id: ParticipantId,
    pub category_id: CategoryId,
    pub standard_rating: f64,
    pub standard_score: f64,
    pub individual_rating: f64,
    pub individual_score: f64,
    pub gap_rating: f64,
    pub gap_score: f64,
    pub conclusion: Conclusion,
}
