//! Individual report: one participant's figures per aspect, per category
//! and combined.

use crate::{
    error::ScoringResult,
    resolver::StandardResolver,
    scoring::{self, AssessmentRows, CategoryScore, ConclusionBasis, Figures},
    source::AssessmentSource,
    types::{AspectId, CategoryId, Code, ParticipantId, TemplateId},
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubAspectStandard {
    pub code: Code,
    pub name: String,
    pub active: bool,
    pub rating: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AspectResult {
    pub aspect_id: AspectId,
    pub code: Code,
    pub name: String,
    pub weight: f64,
    pub sub_aspects: Vec<SubAspectStandard>,
    #[serde(flatten)]
    pub figures: Figures,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryResult {
    pub participant_id: ParticipantId,
    pub category_id: CategoryId,
    pub category_code: Code,
    pub category_name: String,
    /// Resolved category weight, used by the combined report.
    pub weight: f64,
    pub aspect_count: usize,
    #[serde(flatten)]
    pub figures: Figures,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalAssessment {
    pub participant_id: ParticipantId,
    pub template_id: TemplateId,
    pub categories: Vec<CategoryResult>,
    #[serde(flatten)]
    pub figures: Figures,
}

pub struct IndividualScoringEngine<'s> {
    source: &'s dyn AssessmentSource,
}

impl<'s> IndividualScoringEngine<'s> {
    pub fn new(source: &'s dyn AssessmentSource) -> Self {
        Self { source }
    }

    fn rows_for(
        &self,
        participant_id: ParticipantId,
        aspect_ids: &[AspectId],
    ) -> ScoringResult<AssessmentRows> {
        Ok(self
            .source
            .participant_aspect_assessments(participant_id, aspect_ids)?
            .into_iter()
            .map(|row| (row.aspect_id, row))
            .collect())
    }

    pub fn get_aspect_assessments(
        &self,
        resolver: &StandardResolver<'_>,
        participant_id: ParticipantId,
        category_id: CategoryId,
        tolerance_percent: f64,
    ) -> ScoringResult<Vec<AspectResult>> {
        let Some(category) = resolver.catalog().category_by_id(category_id) else {
            log::warn!("individual: category {category_id} not in template {}", resolver.catalog().template_id());
            return Ok(Vec::new());
        };
        let aspect_ids: Vec<AspectId> = category.aspects.iter().map(|a| a.aspect_id).collect();
        let rows = self.rows_for(participant_id, &aspect_ids)?;
        let score = scoring::score_category(resolver, category, &rows);

        Ok(score
            .aspects
            .iter()
            .map(|scored| AspectResult {
                aspect_id: scored.aspect.aspect_id,
                code: scored.aspect.code.clone(),
                name: scored.aspect.name.clone(),
                weight: scoring::round2(scored.weight),
                sub_aspects: scored
                    .aspect
                    .sub_aspects
                    .iter()
                    .map(|sub| SubAspectStandard {
                        code: sub.code.clone(),
                        name: sub.name.clone(),
                        active: resolver.resolve_sub_aspect_active(sub.code.as_str()),
                        rating: resolver.resolve_sub_aspect_rating(sub.code.as_str()),
                    })
                    .collect(),
                figures: scored
                    .base
                    .with_tolerance(tolerance_percent, ConclusionBasis::Rating),
            })
            .collect())
    }

    pub fn get_category_assessment(
        &self,
        resolver: &StandardResolver<'_>,
        participant_id: ParticipantId,
        category_code: &str,
        tolerance_percent: f64,
    ) -> ScoringResult<Option<CategoryResult>> {
        let Some(category) = resolver.catalog().category_by_code(category_code) else {
            log::warn!(
                "individual: category '{category_code}' not in template {}",
                resolver.catalog().template_id()
            );
            return Ok(None);
        };
        let aspect_ids: Vec<AspectId> = category.aspects.iter().map(|a| a.aspect_id).collect();
        let rows = self.rows_for(participant_id, &aspect_ids)?;
        let score = scoring::score_category(resolver, category, &rows);
        if score.aspects.is_empty() {
            log::debug!(
                "individual: participant {participant_id} has no active assessed aspect in '{category_code}'"
            );
            return Ok(None);
        }
        let weight = resolver.resolve_category_weight(category_code);

        Ok(Some(category_result(participant_id, &score, weight, tolerance_percent)))
    }

    /// All categories of the template, weighted into one overall figure.
    pub fn get_final_assessment(
        &self,
        resolver: &StandardResolver<'_>,
        participant_id: ParticipantId,
        tolerance_percent: f64,
    ) -> ScoringResult<Option<FinalAssessment>> {
        let catalog = resolver.catalog();
        let aspect_ids: Vec<AspectId> = catalog.aspects().map(|a| a.aspect_id).collect();
        let rows = self.rows_for(participant_id, &aspect_ids)?;
        let combined = scoring::score_combined(resolver, &rows);
        if !combined.is_assessed() {
            log::debug!("individual: participant {participant_id} has no active assessed aspect");
            return Ok(None);
        }

        Ok(Some(FinalAssessment {
            participant_id,
            template_id: catalog.template_id(),
            categories: combined
                .categories
                .iter()
                .map(|c| category_result(participant_id, &c.score, c.weight, tolerance_percent))
                .collect(),
            figures: combined
                .total
                .with_tolerance(tolerance_percent, ConclusionBasis::Score),
        }))
    }
}

fn category_result(
    participant_id: ParticipantId,
    score: &CategoryScore<'_>,
    weight: f64,
    tolerance_percent: f64,
) -> CategoryResult {
    CategoryResult {
        participant_id,
        category_id: score.category.category_id,
        category_code: score.category.code.clone(),
        category_name: score.category.name.clone(),
        weight: scoring::round2(weight),
        aspect_count: score.aspects.len(),
        figures: score.total.with_tolerance(tolerance_percent, ConclusionBasis::Score),
    }
}
