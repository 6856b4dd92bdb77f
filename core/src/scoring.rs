//! Shared scoring primitives.
//!
//! RULE: the individual report, the rankings, the combined report and the
//! import path all compute figures through this module. A figure that two
//! call sites compute independently is a consistency bug waiting to happen.
//!
//! Values stay unrounded (`BaseFigures`) until `BaseFigures::with_tolerance`
//! produces the display-ready `Figures`. Rounding happens exactly once.

use crate::{
    assessment::AspectAssessment,
    catalog::{Aspect, Category},
    resolver::StandardResolver,
    types::AspectId,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const DISPLAY_DECIMALS: i32 = 2;

/// Half-up (away from zero) rounding to `decimals` places.
pub fn round_half_up(value: f64, decimals: i32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let factor = 10f64.powi(decimals);
    let scaled = value * factor;
    // 0.675 * 100 is 67.4999..; strip the binary noise before rounding.
    let cleaned = (scaled * 1e6).round() / 1e6;
    let rounded = cleaned.round() / factor;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

pub fn round2(value: f64) -> f64 {
    round_half_up(value, DISPLAY_DECIMALS)
}

/// Tolerance percentages outside 0..=100 are clamped; NaN counts as 0.
pub fn clamp_tolerance(tolerance_percent: f64) -> f64 {
    if tolerance_percent.is_nan() {
        0.0
    } else {
        tolerance_percent.clamp(0.0, 100.0)
    }
}

pub fn apply_tolerance(value: f64, tolerance_percent: f64) -> f64 {
    let factor = 1.0 - clamp_tolerance(tolerance_percent) / 100.0;
    (value * factor).max(0.0)
}

/// Lowest gap still classified as meeting the standard.
pub fn conclusion_threshold(adjusted_standard: f64, tolerance_percent: f64) -> f64 {
    -adjusted_standard * clamp_tolerance(tolerance_percent) / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Conclusion {
    #[serde(rename = "Above Standard")]
    AboveStandard,
    #[serde(rename = "Meets Standard")]
    MeetsStandard,
    #[serde(rename = "Below Standard")]
    BelowStandard,
}

impl Conclusion {
    pub const ALL: [Conclusion; 3] = [
        Conclusion::AboveStandard,
        Conclusion::MeetsStandard,
        Conclusion::BelowStandard,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Conclusion::AboveStandard => "Above Standard",
            Conclusion::MeetsStandard => "Meets Standard",
            Conclusion::BelowStandard => "Below Standard",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }

    pub fn is_passing(self) -> bool {
        !matches!(self, Conclusion::BelowStandard)
    }
}

/// `gap > 0` is above; `threshold <= gap <= 0` meets; anything lower is below.
pub fn classify(gap: f64, threshold: f64) -> Conclusion {
    if gap > 0.0 {
        Conclusion::AboveStandard
    } else if gap >= threshold {
        Conclusion::MeetsStandard
    } else {
        Conclusion::BelowStandard
    }
}

/// Which gap decides the conclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConclusionBasis {
    /// Per-aspect results compare ratings.
    Rating,
    /// Category and combined aggregates compare weighted scores.
    Score,
}

/// Unrounded standard and recorded individual values, before tolerance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseFigures {
    pub standard_rating: f64,
    pub standard_score: f64,
    pub individual_rating: f64,
    pub individual_score: f64,
}

impl BaseFigures {
    pub fn add(&mut self, other: &BaseFigures) {
        self.standard_rating += other.standard_rating;
        self.standard_score += other.standard_score;
        self.individual_rating += other.individual_rating;
        self.individual_score += other.individual_score;
    }

    pub fn scaled(&self, factor: f64) -> BaseFigures {
        BaseFigures {
            standard_rating: self.standard_rating * factor,
            standard_score: self.standard_score * factor,
            individual_rating: self.individual_rating * factor,
            individual_score: self.individual_score * factor,
        }
    }

    /// Apply tolerance to the standard side, derive gaps and conclusion,
    /// and round everything for display.
    pub fn with_tolerance(&self, tolerance_percent: f64, basis: ConclusionBasis) -> Figures {
        let standard_rating = apply_tolerance(self.standard_rating, tolerance_percent);
        let standard_score = apply_tolerance(self.standard_score, tolerance_percent);
        let gap_rating = round2(self.individual_rating - standard_rating);
        let gap_score = round2(self.individual_score - standard_score);

        let conclusion = match basis {
            ConclusionBasis::Rating => classify(
                gap_rating,
                round2(conclusion_threshold(standard_rating, tolerance_percent)),
            ),
            ConclusionBasis::Score => classify(
                gap_score,
                round2(conclusion_threshold(standard_score, tolerance_percent)),
            ),
        };

        Figures {
            standard_rating: round2(standard_rating),
            standard_score: round2(standard_score),
            individual_rating: round2(self.individual_rating),
            individual_score: round2(self.individual_score),
            gap_rating,
            gap_score,
            conclusion,
        }
    }
}

/// Display-ready figures: tolerance applied, rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Figures {
    pub standard_rating: f64,
    pub standard_score: f64,
    pub individual_rating: f64,
    pub individual_score: f64,
    pub gap_rating: f64,
    pub gap_score: f64,
    pub conclusion: Conclusion,
}

/// Aspect rows of one participant, keyed by aspect id.
pub type AssessmentRows = HashMap<AspectId, AspectAssessment>;

#[derive(Debug, Clone)]
pub struct ScoredAspect<'c> {
    pub aspect: &'c Aspect,
    pub weight: f64,
    pub base: BaseFigures,
}

#[derive(Debug, Clone)]
pub struct CategoryScore<'c> {
    pub category: &'c Category,
    pub aspects: Vec<ScoredAspect<'c>>,
    pub total: BaseFigures,
}

#[derive(Debug, Clone)]
pub struct WeightedCategory<'c> {
    pub weight: f64,
    pub score: CategoryScore<'c>,
}

#[derive(Debug, Clone)]
pub struct CombinedScore<'c> {
    pub categories: Vec<WeightedCategory<'c>>,
    pub total: BaseFigures,
}

impl CombinedScore<'_> {
    /// True when at least one active aspect of any category has a row.
    pub fn is_assessed(&self) -> bool {
        self.categories.iter().any(|c| !c.score.aspects.is_empty())
    }
}

/// Standard side from the resolver, individual side from the persisted row.
pub fn aspect_base(
    resolver: &StandardResolver<'_>,
    aspect: &Aspect,
    individual_rating: f64,
    individual_score: f64,
) -> BaseFigures {
    let standard_rating = resolver.resolve_aspect_standard_rating(aspect);
    let weight = resolver.resolve_aspect_weight(aspect.code.as_str());
    BaseFigures {
        standard_rating,
        standard_score: standard_rating * weight,
        individual_rating,
        individual_score,
    }
}

/// Score every active aspect of `category` that has a row in `rows`.
pub fn score_category<'c>(
    resolver: &StandardResolver<'_>,
    category: &'c Category,
    rows: &AssessmentRows,
) -> CategoryScore<'c> {
    let mut aspects = Vec::with_capacity(category.aspects.len());
    let mut total = BaseFigures::default();

    for aspect in &category.aspects {
        if !resolver.resolve_aspect_active(aspect.code.as_str()) {
            continue;
        }
        let Some(row) = rows.get(&aspect.aspect_id) else {
            log::debug!(
                "scoring: no assessment for aspect {} (participant rows: {})",
                aspect.code,
                rows.len()
            );
            continue;
        };
        let base = aspect_base(resolver, aspect, row.individual_rating, row.individual_score);
        total.add(&base);
        aspects.push(ScoredAspect {
            aspect,
            weight: resolver.resolve_aspect_weight(aspect.code.as_str()),
            base,
        });
    }

    CategoryScore { category, aspects, total }
}

/// Weight each category total by its resolved category weight.
pub fn score_combined<'c>(
    resolver: &StandardResolver<'c>,
    rows: &AssessmentRows,
) -> CombinedScore<'c> {
    let mut categories = Vec::new();
    let mut total = BaseFigures::default();

    for category in &resolver.catalog().categories {
        let weight = resolver.resolve_category_weight(category.code.as_str());
        let score = score_category(resolver, category, rows);
        total.add(&score.total.scaled(weight / 100.0));
        categories.push(WeightedCategory { weight, score });
    }

    CombinedScore { categories, total }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_up_at_two_decimals() {
        assert_eq!(round2(3.666_666_7), 3.67);
        assert_eq!(round2(73.333_333), 73.33);
        assert_eq!(round2(0.675), 0.68);
        assert_eq!(round2(1.005), 1.01);
        assert_eq!(round2(-0.675), -0.68);
        assert_eq!(round2(f64::NAN), 0.0);
    }

    #[test]
    fn tolerance_never_goes_negative() {
        assert_eq!(apply_tolerance(3.5, 0.0), 3.5);
        assert_eq!(apply_tolerance(3.5, 100.0), 0.0);
        assert_eq!(apply_tolerance(3.5, 250.0), 0.0);
        assert_eq!(apply_tolerance(3.5, -10.0), 3.5);
    }

    #[test]
    fn classification_boundaries() {
        assert_eq!(classify(0.01, -0.3), Conclusion::AboveStandard);
        assert_eq!(classify(0.0, -0.3), Conclusion::MeetsStandard);
        assert_eq!(classify(-0.3, -0.3), Conclusion::MeetsStandard);
        assert_eq!(classify(-0.31, -0.3), Conclusion::BelowStandard);
        // With no tolerance the meets band collapses to exactly zero.
        assert_eq!(classify(0.0, 0.0), Conclusion::MeetsStandard);
        assert_eq!(classify(-0.01, 0.0), Conclusion::BelowStandard);
    }

    #[test]
    fn conclusion_labels_round_trip() {
        for c in Conclusion::ALL {
            assert_eq!(Conclusion::from_label(c.label()), Some(c));
        }
        assert_eq!(Conclusion::from_label("Excellent"), None);
    }

    #[test]
    fn tolerance_scenario_from_rating_gap() {
        let base = BaseFigures {
            standard_rating: 3.5,
            standard_score: 70.0,
            individual_rating: 3.83,
            individual_score: 76.6,
        };
        let figures = base.with_tolerance(10.0, ConclusionBasis::Rating);
        assert_eq!(figures.standard_rating, 3.15);
        assert_eq!(figures.gap_rating, 0.68);
        assert_eq!(figures.standard_score, 63.0);
        assert_eq!(figures.conclusion, Conclusion::AboveStandard);
    }
}
