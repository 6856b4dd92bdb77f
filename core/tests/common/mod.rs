//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use standards_core::{
    engine::StandardsEngine,
    import::{
        self, AspectFixture, AssessmentFixture, CategoryFixture, ParticipantFixture,
        PositionFixture, SubAspectFixture, TemplateFixture,
    },
    ranking::{CombinedRankingQuery, Page, RankingQuery},
    store::AssessmentStore,
    types::{Code, EventId, ParticipantId, PositionId, TemplateId},
};
use std::collections::BTreeMap;

pub const TEMPLATE_CODE: &str = "test_standard";

pub const ASPECT_CODES: [&str; 6] = [
    "kecerdasan",
    "cara_kerja",
    "kepribadian",
    "integritas",
    "kerjasama",
    "komunikasi",
];

fn sub(code: &str, rating: i64) -> SubAspectFixture {
    SubAspectFixture {
        code: code.into(),
        name: code.replace('_', " "),
        standard_rating: rating,
    }
}

fn aspect(code: &str, weight: f64, rating: Option<f64>, subs: Vec<SubAspectFixture>) -> AspectFixture {
    AspectFixture {
        code: code.into(),
        name: code.replace('_', " "),
        weight_percentage: weight,
        standard_rating: rating,
        sub_aspects: subs,
    }
}

/// Two categories, potensi 40 / kompetensi 60.
///
/// kecerdasan (weight 20) averages its sub-aspects 3, 4, 4 to 3.67.
/// kepribadian has a direct standard rating of 3.5.
pub fn template_fixture() -> TemplateFixture {
    TemplateFixture {
        code: TEMPLATE_CODE.into(),
        name: "Test Standard".into(),
        categories: vec![
            CategoryFixture {
                code: "potensi".into(),
                name: "Potensi".into(),
                weight_percentage: 40.0,
                aspects: vec![
                    aspect(
                        "kecerdasan",
                        20.0,
                        None,
                        vec![
                            sub("kecerdasan_umum", 3),
                            sub("daya_tangkap", 4),
                            sub("kemampuan_analisa", 4),
                        ],
                    ),
                    aspect(
                        "cara_kerja",
                        30.0,
                        None,
                        vec![sub("sistematika_kerja", 3), sub("ketelitian", 3)],
                    ),
                    aspect("kepribadian", 50.0, Some(3.5), vec![]),
                ],
            },
            CategoryFixture {
                code: "kompetensi".into(),
                name: "Kompetensi".into(),
                weight_percentage: 60.0,
                aspects: vec![
                    aspect("integritas", 40.0, Some(3.0), vec![]),
                    aspect("kerjasama", 30.0, Some(3.0), vec![]),
                    aspect("komunikasi", 30.0, Some(4.0), vec![]),
                ],
            },
        ],
    }
}

pub fn participant(name: &str, ratings: &[(&str, f64)]) -> ParticipantFixture {
    ParticipantFixture {
        name: name.into(),
        test_number: format!("T-{name}"),
        batch: None,
        ratings: ratings.iter().map(|(c, r)| (c.to_string(), *r)).collect(),
        scores: BTreeMap::new(),
    }
}

/// Every aspect rated, spread a little around `base`.
pub fn fully_rated(name: &str, base: f64) -> ParticipantFixture {
    let ratings: Vec<(&str, f64)> = ASPECT_CODES
        .iter()
        .enumerate()
        .map(|(i, code)| (*code, base + (i as f64 - 2.0) * 0.17))
        .collect();
    participant(name, &ratings)
}

pub fn with_scores(mut p: ParticipantFixture, scores: &[(&str, f64)]) -> ParticipantFixture {
    p.scores = scores.iter().map(|(c, s)| (c.to_string(), *s)).collect();
    p
}

pub struct Seeded {
    pub engine: StandardsEngine<AssessmentStore>,
    pub template_id: TemplateId,
    pub event_id: EventId,
    pub position_id: PositionId,
    pub participant_ids: Vec<ParticipantId>,
}

impl Seeded {
    pub fn ranking_query(&self, category: &str, tolerance: f64) -> RankingQuery {
        RankingQuery {
            event_id: self.event_id,
            position_id: self.position_id,
            template_id: self.template_id,
            category_code: Code::from(category),
            tolerance_percent: tolerance,
            page: None,
        }
    }

    pub fn paged_query(&self, category: &str, offset: usize, limit: usize) -> RankingQuery {
        RankingQuery {
            page: Some(Page { offset, limit }),
            ..self.ranking_query(category, 0.0)
        }
    }

    pub fn combined_query(&self, tolerance: f64) -> CombinedRankingQuery {
        CombinedRankingQuery {
            event_id: self.event_id,
            position_id: self.position_id,
            template_id: self.template_id,
            tolerance_percent: tolerance,
            page: None,
        }
    }

    pub fn category_id(&mut self, code: &str) -> i64 {
        self.engine
            .catalog(self.template_id)
            .unwrap()
            .expect("template should exist")
            .category_by_code(code)
            .expect("category should exist")
            .category_id
    }

    pub fn aspect_id(&mut self, code: &str) -> i64 {
        self.engine
            .catalog(self.template_id)
            .unwrap()
            .expect("template should exist")
            .aspect_by_code(code)
            .expect("aspect should exist")
            .aspect_id
    }
}

/// Fresh engine with the test template and one event/position holding `participants`.
pub fn seeded(participants: Vec<ParticipantFixture>) -> Seeded {
    let _ = env_logger::builder().is_test(true).try_init();
    let engine = StandardsEngine::build_test().unwrap();
    let template_id = import::import_template(engine.store(), &template_fixture()).unwrap();
    let summary = import::import_assessments(
        engine.store(),
        &AssessmentFixture {
            event_code: "EV-1".into(),
            event_name: "Test Event".into(),
            positions: vec![PositionFixture {
                name: "Staf".into(),
                template_code: TEMPLATE_CODE.into(),
                batches: vec![],
                participants,
            }],
        },
    )
    .unwrap();

    Seeded {
        engine,
        template_id,
        event_id: summary.event_id,
        position_id: summary.position_ids[0],
        participant_ids: summary.participant_ids,
    }
}
