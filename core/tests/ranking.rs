//! Category and combined rankings.

mod common;

use common::{fully_rated, participant, seeded, with_scores};
use standards_core::scoring::Conclusion;

/// Equal scores fall back to rating, then to participant id: A, C, B.
#[test]
fn tie_break_orders_by_rating_then_id() {
    let mut s = seeded(vec![
        with_scores(participant("A", &[("integritas", 4.0)]), &[("integritas", 80.0)]),
        with_scores(participant("B", &[("integritas", 3.5)]), &[("integritas", 80.0)]),
        with_scores(participant("C", &[("integritas", 4.0)]), &[("integritas", 80.0)]),
    ]);

    let page = s.engine.get_rankings(&s.ranking_query("kompetensi", 0.0)).unwrap();
    let names: Vec<&str> = page.items.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["A", "C", "B"]);
    let ranks: Vec<usize> = page.items.iter().map(|r| r.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3], "Ranks are ordinal even for ties");
}

/// A leads on score; B and C tie on score and C's higher rating puts it second.
#[test]
fn higher_rating_breaks_score_tie() {
    let mut s = seeded(vec![
        with_scores(participant("A", &[("integritas", 3.83)]), &[("integritas", 76.67)]),
        with_scores(participant("B", &[("integritas", 3.5)]), &[("integritas", 70.0)]),
        with_scores(participant("C", &[("integritas", 3.6)]), &[("integritas", 70.0)]),
    ]);

    let page = s.engine.get_rankings(&s.ranking_query("kompetensi", 0.0)).unwrap();
    let standings: Vec<(&str, f64, f64, usize)> = page
        .items
        .iter()
        .map(|r| (r.name.as_str(), r.figures.individual_score, r.figures.individual_rating, r.rank))
        .collect();
    assert_eq!(
        standings,
        vec![("A", 76.67, 3.83, 1), ("C", 70.0, 3.6, 2), ("B", 70.0, 3.5, 3)]
    );
}

/// Paging slices the full ranking; ranks stay global.
#[test]
fn pagination_keeps_global_rank() {
    let mut s = seeded(vec![
        fully_rated("P1", 2.0),
        fully_rated("P2", 4.0),
        fully_rated("P3", 3.0),
        fully_rated("P4", 3.5),
        fully_rated("P5", 2.5),
    ]);

    let full = s.engine.get_rankings(&s.ranking_query("potensi", 0.0)).unwrap();
    let order: Vec<&str> = full.items.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(order, vec!["P2", "P4", "P3", "P5", "P1"]);

    let page = s.engine.get_rankings(&s.paged_query("potensi", 2, 2)).unwrap();
    assert_eq!(page.total, 5);
    assert_eq!(page.offset, 2);
    assert_eq!(page.limit, 2);
    let ranked: Vec<(usize, &str)> = page.items.iter().map(|r| (r.rank, r.name.as_str())).collect();
    assert_eq!(ranked, vec![(3, "P3"), (4, "P5")]);

    let beyond = s.engine.get_rankings(&s.paged_query("potensi", 10, 5)).unwrap();
    assert!(beyond.items.is_empty());
    assert_eq!(beyond.total, 5);
}

/// A participant with no rows in the category is not ranked in it.
#[test]
fn unassessed_participants_are_not_ranked() {
    let mut s = seeded(vec![
        fully_rated("A", 3.0),
        participant("B", &[("kecerdasan", 4.0)]),
    ]);

    let kompetensi = s.engine.get_rankings(&s.ranking_query("kompetensi", 0.0)).unwrap();
    assert_eq!(kompetensi.total, 1);
    assert_eq!(kompetensi.items[0].name, "A");

    let potensi = s.engine.get_rankings(&s.ranking_query("potensi", 0.0)).unwrap();
    assert_eq!(potensi.total, 2);
}

#[test]
fn summary_counts_conclusions() {
    let mut s = seeded(vec![
        participant("High", &[("integritas", 4.0)]),
        participant("Exact", &[("integritas", 3.0)]),
        participant("Low", &[("integritas", 2.0)]),
    ]);

    let page = s.engine.get_rankings(&s.ranking_query("kompetensi", 0.0)).unwrap();
    let conclusions: Vec<Conclusion> = page.items.iter().map(|r| r.figures.conclusion).collect();
    assert_eq!(
        conclusions,
        vec![Conclusion::AboveStandard, Conclusion::MeetsStandard, Conclusion::BelowStandard]
    );
    assert_eq!(page.summary.above_standard, 1);
    assert_eq!(page.summary.meets_standard, 1);
    assert_eq!(page.summary.below_standard, 1);
    assert_eq!(page.summary.passing, 2);
    assert_eq!(page.summary.pass_rate, 66.67);
}

#[test]
fn participant_ranking_matches_full_list() {
    let mut s = seeded(vec![fully_rated("A", 2.0), fully_rated("B", 4.0), fully_rated("C", 3.0)]);
    let c = s.participant_ids[2];

    let entry = s
        .engine
        .get_participant_ranking(&s.ranking_query("potensi", 0.0), c)
        .unwrap()
        .expect("C should be ranked");
    assert_eq!(entry.rank, 2);
    assert_eq!(entry.name, "C");

    let missing = s.engine.get_participant_ranking(&s.ranking_query("potensi", 0.0), 9_999).unwrap();
    assert!(missing.is_none());
}

#[test]
fn combined_ranking_orders_by_weighted_total() {
    let mut s = seeded(vec![fully_rated("A", 2.5), fully_rated("B", 3.8), fully_rated("C", 3.1)]);

    let page = s.engine.get_combined_rankings(&s.combined_query(0.0)).unwrap();
    let names: Vec<&str> = page.items.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["B", "C", "A"]);
    for entry in &page.items {
        assert_eq!(entry.categories.len(), 2);
        let weighted: f64 = entry
            .categories
            .iter()
            .map(|c| c.figures.individual_score * c.weight / 100.0)
            .sum();
        assert!(
            (weighted - entry.figures.individual_score).abs() < 0.02,
            "combined score {} should be the weighted category sum {weighted}",
            entry.figures.individual_score
        );
    }
}

/// Session weights move standard scores; persisted individual scores stay.
#[test]
fn session_weight_changes_standard_not_individual_score() {
    let mut s = seeded(vec![fully_rated("A", 3.0)]);
    let t = s.template_id;

    let before = s.engine.get_rankings(&s.ranking_query("kompetensi", 0.0)).unwrap();
    s.engine.set_session_aspect_weight(t, "integritas", Some(60.0));
    let after = s.engine.get_rankings(&s.ranking_query("kompetensi", 0.0)).unwrap();

    assert_eq!(before.items[0].figures.individual_score, after.items[0].figures.individual_score);
    assert_eq!(before.items[0].figures.standard_score, 330.0);
    assert_eq!(after.items[0].figures.standard_score, 390.0);
    assert_ne!(before.fingerprint, after.fingerprint);
}

#[test]
fn unknown_template_gives_empty_page() {
    let mut s = seeded(vec![fully_rated("A", 3.0)]);
    let mut query = s.ranking_query("potensi", 0.0);
    query.template_id += 50;

    let page = s.engine.get_rankings(&query).unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total, 0);
    assert!(page.fingerprint.is_none());
    assert_eq!(page.limit, s.engine.config().ranking.page_size);
}
