//! Bulk import of template structures and assessment results.
//!
//! Standard, gap and conclusion columns written here are baseline facts:
//! resolved with no override layer and tolerance 0, through the same
//! scoring primitives every read path uses.

use crate::{
    assessment::{AspectAssessment, CategoryAssessment},
    context::ConfigurationContext,
    error::{ScoringError, ScoringResult},
    resolver::StandardResolver,
    scoring::{aspect_base, score_category, AssessmentRows, ConclusionBasis},
    source::CatalogSource,
    store::AssessmentStore,
    types::{BatchId, EventId, ParticipantId, PositionId, TemplateId},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateFixture {
    pub code: String,
    pub name: String,
    pub categories: Vec<CategoryFixture>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryFixture {
    pub code: String,
    pub name: String,
    pub weight_percentage: f64,
    #[serde(default)]
    pub aspects: Vec<AspectFixture>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AspectFixture {
    pub code: String,
    pub name: String,
    pub weight_percentage: f64,
    #[serde(default)]
    pub standard_rating: Option<f64>,
    #[serde(default)]
    pub sub_aspects: Vec<SubAspectFixture>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubAspectFixture {
    pub code: String,
    pub name: String,
    pub standard_rating: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentFixture {
    pub event_code: String,
    pub event_name: String,
    pub positions: Vec<PositionFixture>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionFixture {
    pub name: String,
    pub template_code: String,
    #[serde(default)]
    pub batches: Vec<String>,
    pub participants: Vec<ParticipantFixture>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantFixture {
    pub name: String,
    pub test_number: String,
    #[serde(default)]
    pub batch: Option<String>,
    /// Individual rating per aspect code. Missing codes get no row.
    pub ratings: BTreeMap<String, f64>,
    /// Explicit individual scores; default is rating × baseline weight.
    #[serde(default)]
    pub scores: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportSummary {
    pub event_id: EventId,
    pub position_ids: Vec<PositionId>,
    pub participant_ids: Vec<ParticipantId>,
    pub aspect_rows: usize,
    pub category_rows: usize,
}

/// Read a JSON fixture file.
pub fn load_fixture<T: serde::de::DeserializeOwned>(path: &str) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
    let fixture = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
    Ok(fixture)
}

fn reject_duplicates<'a>(kind: &str, codes: impl Iterator<Item = &'a str>) -> ScoringResult<()> {
    let mut seen = HashSet::new();
    for code in codes {
        if !seen.insert(code) {
            return Err(ScoringError::Import(format!("duplicate {kind} code '{code}'")));
        }
    }
    Ok(())
}

pub fn import_template(
    store: &AssessmentStore,
    fixture: &TemplateFixture,
) -> ScoringResult<TemplateId> {
    let aspects = || fixture.categories.iter().flat_map(|c| c.aspects.iter());
    reject_duplicates("category", fixture.categories.iter().map(|c| c.code.as_str()))?;
    reject_duplicates("aspect", aspects().map(|a| a.code.as_str()))?;
    reject_duplicates(
        "sub-aspect",
        aspects().flat_map(|a| a.sub_aspects.iter().map(|s| s.code.as_str())),
    )?;

    let template_id = store.in_transaction(|store| {
        let template_id = store.insert_template(&fixture.code, &fixture.name)?;
        for (c_order, category) in fixture.categories.iter().enumerate() {
            let category_id = store.insert_category(
                template_id,
                &category.code,
                &category.name,
                category.weight_percentage,
                c_order as i64,
            )?;
            for (a_order, aspect) in category.aspects.iter().enumerate() {
                let aspect_id = store.insert_aspect(
                    template_id,
                    category_id,
                    &aspect.code,
                    &aspect.name,
                    aspect.weight_percentage,
                    aspect.standard_rating,
                    a_order as i64,
                )?;
                for (s_order, sub) in aspect.sub_aspects.iter().enumerate() {
                    store.insert_sub_aspect(
                        template_id,
                        aspect_id,
                        &sub.code,
                        &sub.name,
                        sub.standard_rating,
                        s_order as i64,
                    )?;
                }
            }
        }
        Ok(template_id)
    })?;

    log::info!("imported template '{}' as {template_id}", fixture.code);
    Ok(template_id)
}

pub fn import_assessments(
    store: &AssessmentStore,
    fixture: &AssessmentFixture,
) -> ScoringResult<ImportSummary> {
    let summary = store.in_transaction(|store| {
        let mut summary = ImportSummary {
            event_id: store.insert_event(&fixture.event_code, &fixture.event_name)?,
            ..ImportSummary::default()
        };
        for position in &fixture.positions {
            import_position(store, summary.event_id, position, &mut summary)?;
        }
        Ok(summary)
    })?;

    log::info!(
        "imported event '{}': {} participants, {} aspect rows, {} category rows",
        fixture.event_code,
        summary.participant_ids.len(),
        summary.aspect_rows,
        summary.category_rows
    );
    Ok(summary)
}

fn import_position(
    store: &AssessmentStore,
    event_id: EventId,
    position: &PositionFixture,
    summary: &mut ImportSummary,
) -> ScoringResult<()> {
    let template_id = store
        .template_id_by_code(&position.template_code)?
        .ok_or_else(|| {
            ScoringError::Import(format!("unknown template '{}'", position.template_code))
        })?;
    let mut catalog = store
        .load_template_catalog(template_id)?
        .ok_or(ScoringError::TemplateNotFound { template_id })?;
    catalog.normalize_order();
    let context = ConfigurationContext::baseline(template_id);
    let resolver = StandardResolver::new(&catalog, &context);

    let position_id = store.insert_position(event_id, template_id, &position.name)?;
    summary.position_ids.push(position_id);

    let mut batches: HashMap<&str, BatchId> = HashMap::new();
    for name in &position.batches {
        batches.insert(name.as_str(), store.insert_batch(event_id, name)?);
    }

    for participant in &position.participants {
        for (code, rating) in &participant.ratings {
            if catalog.aspect_by_code(code).is_none() {
                return Err(ScoringError::Import(format!(
                    "participant '{}' rated unknown aspect '{code}'",
                    participant.test_number
                )));
            }
            if !rating.is_finite() || *rating < 0.0 {
                return Err(ScoringError::Import(format!(
                    "participant '{}' has invalid rating {rating} for '{code}'",
                    participant.test_number
                )));
            }
        }
        let batch_id = match &participant.batch {
            Some(name) => Some(*batches.get(name.as_str()).ok_or_else(|| {
                ScoringError::Import(format!("unknown batch '{name}'"))
            })?),
            None => None,
        };

        let participant_id = store.insert_participant(
            event_id,
            position_id,
            batch_id,
            &participant.name,
            &participant.test_number,
        )?;
        summary.participant_ids.push(participant_id);

        let mut rows = AssessmentRows::new();
        for aspect in catalog.aspects() {
            let code = aspect.code.as_str();
            let Some(&rating) = participant.ratings.get(code) else {
                continue;
            };
            let score = participant
                .scores
                .get(code)
                .copied()
                .unwrap_or_else(|| rating * resolver.resolve_aspect_weight(code));
            let figures =
                aspect_base(&resolver, aspect, rating, score).with_tolerance(0.0, ConclusionBasis::Rating);
            let row = AspectAssessment {
                participant_id,
                aspect_id: aspect.aspect_id,
                standard_rating: figures.standard_rating,
                standard_score: figures.standard_score,
                individual_rating: rating,
                individual_score: score,
                gap_rating: figures.gap_rating,
                gap_score: figures.gap_score,
                conclusion: figures.conclusion,
            };
            store.insert_aspect_assessment(&row)?;
            rows.insert(aspect.aspect_id, row);
            summary.aspect_rows += 1;
        }

        for category in &catalog.categories {
            let score = score_category(&resolver, category, &rows);
            if score.aspects.is_empty() {
                continue;
            }
            let figures = score.total.with_tolerance(0.0, ConclusionBasis::Score);
            store.insert_category_assessment(&CategoryAssessment {
                participant_id,
                category_id: category.category_id,
                standard_rating: figures.standard_rating,
                standard_score: figures.standard_score,
                individual_rating: figures.individual_rating,
                individual_score: figures.individual_score,
                gap_rating: figures.gap_rating,
                gap_score: figures.gap_score,
                conclusion: figures.conclusion,
            })?;
            summary.category_rows += 1;
        }
    }
    Ok(())
}
