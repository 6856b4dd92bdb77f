//! Rankings of every participant in an (event, position) scope.
//!
//! The expensive part (reading rows and summing untoleranced figures) is
//! split from the cheap part (tolerance, rounding, ordering, paging) so the
//! engine can cache the former under the configuration fingerprint and
//! redo the latter on every call.

use crate::{
    assessment::Participant,
    error::ScoringResult,
    fingerprint::Fingerprint,
    resolver::StandardResolver,
    scoring::{self, AssessmentRows, BaseFigures, Conclusion, ConclusionBasis, Figures},
    source::AssessmentSource,
    types::{AspectId, BatchId, Code, EventId, ParticipantId, PositionId, TemplateId},
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub offset: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingQuery {
    pub event_id: EventId,
    pub position_id: PositionId,
    pub template_id: TemplateId,
    pub category_code: Code,
    pub tolerance_percent: f64,
    /// `None` uses the configured page size from offset 0.
    pub page: Option<Page>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedRankingQuery {
    pub event_id: EventId,
    pub position_id: PositionId,
    pub template_id: TemplateId,
    pub tolerance_percent: f64,
    pub page: Option<Page>,
}

/// Cached, tolerance-free aggregate of one participant in one category.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantBase {
    pub participant: Participant,
    pub base: BaseFigures,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryBase {
    pub code: Code,
    pub weight: f64,
    pub base: BaseFigures,
}

/// Cached, tolerance-free combined aggregate of one participant.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedParticipantBase {
    pub participant: Participant,
    pub categories: Vec<CategoryBase>,
    pub total: BaseFigures,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantRanking {
    pub rank: usize,
    pub participant_id: ParticipantId,
    pub name: String,
    pub test_number: String,
    pub batch_id: Option<BatchId>,
    #[serde(flatten)]
    pub figures: Figures,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStanding {
    pub code: Code,
    pub weight: f64,
    #[serde(flatten)]
    pub figures: Figures,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedRanking {
    pub rank: usize,
    pub participant_id: ParticipantId,
    pub name: String,
    pub test_number: String,
    pub batch_id: Option<BatchId>,
    pub categories: Vec<CategoryStanding>,
    #[serde(flatten)]
    pub figures: Figures,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ConclusionSummary {
    pub above_standard: usize,
    pub meets_standard: usize,
    pub below_standard: usize,
    pub total: usize,
    pub passing: usize,
    /// Percentage of passing participants, rounded to two decimals.
    pub pass_rate: f64,
}

impl ConclusionSummary {
    pub fn from_conclusions(conclusions: impl IntoIterator<Item = Conclusion>) -> Self {
        let mut summary = ConclusionSummary::default();
        for conclusion in conclusions {
            match conclusion {
                Conclusion::AboveStandard => summary.above_standard += 1,
                Conclusion::MeetsStandard => summary.meets_standard += 1,
                Conclusion::BelowStandard => summary.below_standard += 1,
            }
            if conclusion.is_passing() {
                summary.passing += 1;
            }
            summary.total += 1;
        }
        summary.pass_rate = if summary.total > 0 {
            scoring::round2(summary.passing as f64 * 100.0 / summary.total as f64)
        } else {
            0.0
        };
        summary
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingPage<T> {
    pub items: Vec<T>,
    /// Size of the full ranking, not of this page.
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
    pub tolerance_percent: f64,
    pub summary: ConclusionSummary,
    /// `None` when the template does not exist.
    pub fingerprint: Option<Fingerprint>,
}

impl<T> RankingPage<T> {
    pub fn empty(page: Page, tolerance_percent: f64) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            offset: page.offset,
            limit: page.limit,
            tolerance_percent,
            summary: ConclusionSummary::default(),
            fingerprint: None,
        }
    }
}

pub struct RankingEngine<'s> {
    source: &'s dyn AssessmentSource,
}

impl<'s> RankingEngine<'s> {
    pub fn new(source: &'s dyn AssessmentSource) -> Self {
        Self { source }
    }

    fn scope_rows(
        &self,
        event_id: EventId,
        position_id: PositionId,
        aspect_ids: &[AspectId],
    ) -> ScoringResult<(Vec<Participant>, HashMap<ParticipantId, AssessmentRows>)> {
        let participants = self.source.participants_in_scope(event_id, position_id)?;
        let mut rows: HashMap<ParticipantId, AssessmentRows> = HashMap::new();
        for row in self
            .source
            .scope_aspect_assessments(event_id, position_id, aspect_ids)?
        {
            rows.entry(row.participant_id)
                .or_default()
                .insert(row.aspect_id, row);
        }
        log::debug!(
            "ranking: read {} participants with rows for event {event_id} position {position_id}",
            rows.len()
        );
        Ok((participants, rows))
    }

    /// Untoleranced category totals of every assessed participant in scope.
    pub fn category_bases(
        &self,
        resolver: &StandardResolver<'_>,
        category_code: &str,
        event_id: EventId,
        position_id: PositionId,
    ) -> ScoringResult<Vec<ParticipantBase>> {
        let Some(category) = resolver.catalog().category_by_code(category_code) else {
            log::warn!(
                "ranking: category '{category_code}' not in template {}",
                resolver.catalog().template_id()
            );
            return Ok(Vec::new());
        };
        let aspect_ids: Vec<AspectId> = category.aspects.iter().map(|a| a.aspect_id).collect();
        let (participants, rows) = self.scope_rows(event_id, position_id, &aspect_ids)?;

        Ok(participants
            .into_iter()
            .filter_map(|participant| {
                let participant_rows = rows.get(&participant.participant_id)?;
                let score = scoring::score_category(resolver, category, participant_rows);
                if score.aspects.is_empty() {
                    return None;
                }
                Some(ParticipantBase { participant, base: score.total })
            })
            .collect())
    }

    /// Untoleranced combined totals of every assessed participant in scope.
    pub fn combined_bases(
        &self,
        resolver: &StandardResolver<'_>,
        event_id: EventId,
        position_id: PositionId,
    ) -> ScoringResult<Vec<CombinedParticipantBase>> {
        let aspect_ids: Vec<AspectId> =
            resolver.catalog().aspects().map(|a| a.aspect_id).collect();
        let (participants, rows) = self.scope_rows(event_id, position_id, &aspect_ids)?;

        Ok(participants
            .into_iter()
            .filter_map(|participant| {
                let participant_rows = rows.get(&participant.participant_id)?;
                let combined = scoring::score_combined(resolver, participant_rows);
                if !combined.is_assessed() {
                    return None;
                }
                Some(CombinedParticipantBase {
                    participant,
                    categories: combined
                        .categories
                        .iter()
                        .map(|c| CategoryBase {
                            code: c.score.category.code.clone(),
                            weight: c.weight,
                            base: c.score.total,
                        })
                        .collect(),
                    total: combined.total,
                })
            })
            .collect())
    }
}

/// Descending individual score, then descending individual rating, then
/// ascending participant id. Compared on display values so visible ties
/// are real ties.
fn standing_order(a: (&Figures, ParticipantId), b: (&Figures, ParticipantId)) -> Ordering {
    b.0.individual_score
        .total_cmp(&a.0.individual_score)
        .then_with(|| b.0.individual_rating.total_cmp(&a.0.individual_rating))
        .then_with(|| a.1.cmp(&b.1))
}

/// Full category ranking with ordinal 1-based ranks.
pub fn rank_category(bases: &[ParticipantBase], tolerance_percent: f64) -> Vec<ParticipantRanking> {
    let mut ranked: Vec<ParticipantRanking> = bases
        .iter()
        .map(|entry| ParticipantRanking {
            rank: 0,
            participant_id: entry.participant.participant_id,
            name: entry.participant.name.clone(),
            test_number: entry.participant.test_number.clone(),
            batch_id: entry.participant.batch_id,
            figures: entry
                .base
                .with_tolerance(tolerance_percent, ConclusionBasis::Score),
        })
        .collect();

    ranked.sort_by(|a, b| standing_order((&a.figures, a.participant_id), (&b.figures, b.participant_id)));
    for (index, entry) in ranked.iter_mut().enumerate() {
        entry.rank = index + 1;
    }
    ranked
}

pub fn rank_combined(
    bases: &[CombinedParticipantBase],
    tolerance_percent: f64,
) -> Vec<CombinedRanking> {
    let mut ranked: Vec<CombinedRanking> = bases
        .iter()
        .map(|entry| CombinedRanking {
            rank: 0,
            participant_id: entry.participant.participant_id,
            name: entry.participant.name.clone(),
            test_number: entry.participant.test_number.clone(),
            batch_id: entry.participant.batch_id,
            categories: entry
                .categories
                .iter()
                .map(|c| CategoryStanding {
                    code: c.code.clone(),
                    weight: scoring::round2(c.weight),
                    figures: c.base.with_tolerance(tolerance_percent, ConclusionBasis::Score),
                })
                .collect(),
            figures: entry
                .total
                .with_tolerance(tolerance_percent, ConclusionBasis::Score),
        })
        .collect();

    ranked.sort_by(|a, b| standing_order((&a.figures, a.participant_id), (&b.figures, b.participant_id)));
    for (index, entry) in ranked.iter_mut().enumerate() {
        entry.rank = index + 1;
    }
    ranked
}

/// Slice one page out of a full ranking; ranks keep their global values.
pub fn paginate<T>(ranked: Vec<T>, page: Page) -> Vec<T> {
    ranked
        .into_iter()
        .skip(page.offset)
        .take(page.limit)
        .collect()
}
