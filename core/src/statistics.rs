//! Rating distribution and descriptive statistics for one aspect.

use crate::{
    catalog::Aspect,
    config::RatingScale,
    error::ScoringResult,
    resolver::StandardResolver,
    scoring::{round2, round_half_up},
    source::AssessmentSource,
    types::{AspectId, EventId, PositionId, TemplateId},
};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionData {
    pub aspect_id: AspectId,
    pub template_id: TemplateId,
    /// Count per rating level; every level of the scale is present.
    pub distribution: BTreeMap<i64, usize>,
    pub standard_rating: f64,
    pub average_rating: f64,
    pub participant_count: usize,
    pub min_rating: f64,
    pub max_rating: f64,
    pub median_rating: f64,
    pub std_deviation: f64,
}

impl DistributionData {
    pub fn empty(aspect_id: AspectId, template_id: TemplateId, scale: RatingScale) -> Self {
        Self {
            aspect_id,
            template_id,
            distribution: scale.levels().map(|level| (level, 0)).collect(),
            standard_rating: 0.0,
            average_rating: 0.0,
            participant_count: 0,
            min_rating: 0.0,
            max_rating: 0.0,
            median_rating: 0.0,
            std_deviation: 0.0,
        }
    }

    /// Share of participants per level, in percent.
    pub fn percentages(&self) -> BTreeMap<i64, f64> {
        self.distribution
            .iter()
            .map(|(level, count)| {
                let pct = if self.participant_count > 0 {
                    round2(*count as f64 * 100.0 / self.participant_count as f64)
                } else {
                    0.0
                };
                (*level, pct)
            })
            .collect()
    }
}

/// The level a rating falls into: half-up to an integer, clamped to the scale.
pub fn bucket(rating: f64, scale: RatingScale) -> i64 {
    (round_half_up(rating, 0) as i64).clamp(scale.min, scale.max)
}

fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

pub struct StatisticsEngine<'s> {
    source: &'s dyn AssessmentSource,
}

impl<'s> StatisticsEngine<'s> {
    pub fn new(source: &'s dyn AssessmentSource) -> Self {
        Self { source }
    }

    pub fn get_distribution_data(
        &self,
        resolver: &StandardResolver<'_>,
        aspect: &Aspect,
        event_id: EventId,
        position_id: PositionId,
        scale: RatingScale,
    ) -> ScoringResult<DistributionData> {
        let mut data = DistributionData::empty(aspect.aspect_id, aspect.template_id, scale);
        data.standard_rating = round2(resolver.resolve_aspect_standard_rating(aspect));

        // Participants without a row are simply absent here, not zeros.
        let mut ratings: Vec<f64> = self
            .source
            .scope_aspect_assessments(event_id, position_id, &[aspect.aspect_id])?
            .into_iter()
            .map(|row| row.individual_rating)
            .collect();
        if ratings.is_empty() {
            log::debug!(
                "statistics: no ratings for aspect {} in event {event_id} position {position_id}",
                aspect.code
            );
            return Ok(data);
        }

        for rating in &ratings {
            *data.distribution.entry(bucket(*rating, scale)).or_insert(0) += 1;
        }

        ratings.sort_by(|a, b| a.total_cmp(b));
        let n = ratings.len() as f64;
        let mean = ratings.iter().sum::<f64>() / n;
        let variance = ratings.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;

        data.participant_count = ratings.len();
        data.average_rating = round2(mean);
        data.min_rating = round2(ratings[0]);
        data.max_rating = round2(ratings[ratings.len() - 1]);
        data.median_rating = round2(median(&ratings));
        data.std_deviation = round2(variance.sqrt());
        Ok(data)
    }
}
