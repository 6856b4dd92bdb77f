//! The individual report and the rankings must agree in every layer state.

mod common;

use common::{fully_rated, participant, seeded, Seeded};
use standards_core::types::Code;

fn seeded_cohort() -> Seeded {
    seeded(vec![
        fully_rated("A", 3.4),
        fully_rated("B", 2.9),
        fully_rated("C", 4.1),
        fully_rated("D", 3.0),
    ])
}

fn assert_consistent(s: &mut Seeded, tolerance: f64, state: &str) {
    for category in ["potensi", "kompetensi"] {
        let page = s.engine.get_rankings(&s.ranking_query(category, tolerance)).unwrap();
        assert_eq!(page.total, s.participant_ids.len());
        for pid in s.participant_ids.clone() {
            let individual = s
                .engine
                .get_category_assessment(pid, category, tolerance)
                .unwrap()
                .unwrap();
            let ranked = page.items.iter().find(|r| r.participant_id == pid).unwrap();
            assert_eq!(
                ranked.figures, individual.figures,
                "[{state}] {category} figures differ for participant {pid}"
            );
        }
    }

    let combined = s.engine.get_combined_rankings(&s.combined_query(tolerance)).unwrap();
    for pid in s.participant_ids.clone() {
        let report = s.engine.get_final_assessment(pid, tolerance).unwrap().unwrap();
        let ranked = combined.items.iter().find(|r| r.participant_id == pid).unwrap();
        assert_eq!(
            ranked.figures, report.figures,
            "[{state}] combined figures differ for participant {pid}"
        );
        for (standing, category) in ranked.categories.iter().zip(&report.categories) {
            assert_eq!(standing.code, category.category_code);
            assert_eq!(standing.weight, category.weight);
            assert_eq!(
                standing.figures, category.figures,
                "[{state}] category {} differs inside the combined report",
                category.category_code
            );
        }
    }
}

#[test]
fn consistent_under_baseline() {
    let mut s = seeded_cohort();
    assert_consistent(&mut s, 0.0, "baseline");
    assert_consistent(&mut s, 10.0, "baseline, 10%");
}

#[test]
fn consistent_under_custom_standard() {
    let mut s = seeded_cohort();
    let t = s.template_id;
    let mut draft = s.engine.custom_standard_from_baseline(t, 7, "STRICT", "Strict").unwrap();
    draft.settings.set_category_weight(Code::from("potensi"), Some(30.0));
    draft.settings.set_category_weight(Code::from("kompetensi"), Some(70.0));
    draft.settings.set_aspect_rating(Code::from("integritas"), Some(4.0));
    draft.settings.set_sub_aspect_rating(Code::from("ketelitian"), Some(5));
    let id = s.engine.save_custom_standard(&draft).unwrap().custom_standard_id.unwrap();
    s.engine.select_custom_standard(t, Some(id)).unwrap();

    assert_consistent(&mut s, 0.0, "custom");
    assert_consistent(&mut s, 5.0, "custom, 5%");
}

#[test]
fn consistent_under_session_adjustments() {
    let mut s = seeded_cohort();
    let t = s.template_id;
    s.engine.set_session_aspect_weight(t, "kepribadian", Some(35.0));
    s.engine.set_session_aspect_weight(t, "cara_kerja", Some(45.0));
    s.engine.set_session_sub_aspect_active(t, "daya_tangkap", Some(false));
    s.engine.set_session_aspect_active(t, "komunikasi", Some(false));
    s.engine.set_session_category_weight(t, "potensi", Some(50.0));
    s.engine.set_session_category_weight(t, "kompetensi", Some(50.0));

    assert_consistent(&mut s, 0.0, "session");
    assert_consistent(&mut s, 20.0, "session, 20%");
}

/// The combined total is the category totals weighted by category weight.
#[test]
fn combined_total_weights_categories() {
    let mut s = seeded(vec![fully_rated("A", 3.0)]);
    let pid = s.participant_ids[0];

    let report = s.engine.get_final_assessment(pid, 0.0).unwrap().unwrap();
    let potensi = &report.categories[0];
    let kompetensi = &report.categories[1];
    assert_eq!(potensi.weight, 40.0);
    assert_eq!(kompetensi.weight, 60.0);

    // potensi 338.33 × 0.4 + kompetensi 330 × 0.6
    assert_eq!(potensi.figures.standard_score, 338.33);
    assert_eq!(kompetensi.figures.standard_score, 330.0);
    assert_eq!(report.figures.standard_score, 333.33);
}

/// A participant with no rows in a category is absent from that ranking
/// and has no category report; both services say so.
#[test]
fn partially_rated_participant_agrees_across_services() {
    let mut s = seeded(vec![
        fully_rated("A", 3.0),
        participant("B", &[("kecerdasan", 4.0)]),
    ]);
    let b = s.participant_ids[1];

    let kompetensi = s.engine.get_rankings(&s.ranking_query("kompetensi", 0.0)).unwrap();
    assert!(kompetensi.items.iter().all(|r| r.participant_id != b));
    assert!(
        s.engine.get_category_assessment(b, "kompetensi", 0.0).unwrap().is_none(),
        "No kompetensi rows means no kompetensi report"
    );

    let potensi = s.engine.get_rankings(&s.ranking_query("potensi", 0.0)).unwrap();
    let ranked = potensi.items.iter().find(|r| r.participant_id == b).unwrap();
    let individual = s.engine.get_category_assessment(b, "potensi", 0.0).unwrap().unwrap();
    assert_eq!(ranked.figures, individual.figures);
    assert_eq!(individual.aspect_count, 1);

    let combined = s.engine.get_combined_rankings(&s.combined_query(0.0)).unwrap();
    let ranked = combined.items.iter().find(|r| r.participant_id == b).unwrap();
    let report = s.engine.get_final_assessment(b, 0.0).unwrap().unwrap();
    assert_eq!(ranked.figures, report.figures);
}

/// Deactivating the only rated aspect leaves nothing to score.
#[test]
fn inactive_only_rows_drop_out_everywhere() {
    let mut s = seeded(vec![
        fully_rated("A", 3.0),
        participant("B", &[("integritas", 4.0)]),
    ]);
    let t = s.template_id;
    let b = s.participant_ids[1];
    s.engine.set_session_aspect_active(t, "integritas", Some(false));
    s.engine.set_session_aspect_weight(t, "kerjasama", Some(50.0));
    s.engine.set_session_aspect_weight(t, "komunikasi", Some(50.0));

    let kompetensi = s.engine.get_rankings(&s.ranking_query("kompetensi", 0.0)).unwrap();
    assert_eq!(kompetensi.total, 1);
    assert!(s.engine.get_category_assessment(b, "kompetensi", 0.0).unwrap().is_none());

    let combined = s.engine.get_combined_rankings(&s.combined_query(0.0)).unwrap();
    assert!(combined.items.iter().all(|r| r.participant_id != b));
    assert!(s.engine.get_final_assessment(b, 0.0).unwrap().is_none());
}
