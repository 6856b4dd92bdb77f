//! Rating distribution per aspect.

mod common;

use common::{participant, seeded};

/// Participants without a row for the aspect are left out, not counted as zero.
#[test]
fn distribution_excludes_missing_rows() {
    let mut s = seeded(vec![
        participant("A", &[("kecerdasan", 1.0)]),
        participant("B", &[("kecerdasan", 2.5)]),
        participant("C", &[("kecerdasan", 3.5)]),
        participant("D", &[("kecerdasan", 4.5)]),
        participant("E", &[("integritas", 3.0)]),
    ]);
    let aspect_id = s.aspect_id("kecerdasan");

    let data = s
        .engine
        .get_distribution_data(s.event_id, s.position_id, aspect_id, s.template_id)
        .unwrap();

    assert_eq!(data.participant_count, 4, "E has no kecerdasan row");
    let counts: Vec<(i64, usize)> = data.distribution.iter().map(|(k, v)| (*k, *v)).collect();
    assert_eq!(counts, vec![(1, 1), (2, 0), (3, 1), (4, 1), (5, 1)], "Half-up buckets");
    assert_eq!(data.standard_rating, 3.67);
    assert_eq!(data.average_rating, 2.88);
    assert_eq!(data.median_rating, 3.0);
    assert_eq!(data.min_rating, 1.0);
    assert_eq!(data.max_rating, 4.5);
    assert_eq!(data.std_deviation, 1.29);

    let pct = data.percentages();
    assert_eq!(pct[&1], 25.0);
    assert_eq!(pct[&2], 0.0);
}

/// Ratings outside the scale land in the nearest end bucket.
#[test]
fn out_of_scale_ratings_are_clamped_into_buckets() {
    let mut s = seeded(vec![
        participant("A", &[("integritas", 0.2)]),
        participant("B", &[("integritas", 5.8)]),
    ]);
    let aspect_id = s.aspect_id("integritas");

    let data = s
        .engine
        .get_distribution_data(s.event_id, s.position_id, aspect_id, s.template_id)
        .unwrap();
    assert_eq!(data.distribution[&1], 1);
    assert_eq!(data.distribution[&5], 1);
    assert_eq!(data.standard_rating, 3.0);
}

#[test]
fn empty_scope_still_lists_every_level() {
    let mut s = seeded(vec![participant("A", &[("integritas", 3.0)])]);
    let aspect_id = s.aspect_id("kecerdasan");

    let data = s
        .engine
        .get_distribution_data(s.event_id, s.position_id, aspect_id, s.template_id)
        .unwrap();
    assert_eq!(data.participant_count, 0);
    assert_eq!(data.distribution.len(), 5);
    assert!(data.distribution.values().all(|c| *c == 0));
    assert_eq!(data.average_rating, 0.0);
}

/// An aspect from another template yields an empty distribution.
#[test]
fn foreign_aspect_is_fail_soft() {
    let mut s = seeded(vec![participant("A", &[("integritas", 3.0)])]);
    let data = s
        .engine
        .get_distribution_data(s.event_id, s.position_id, 9_999, s.template_id)
        .unwrap();
    assert_eq!(data.participant_count, 0);
    assert_eq!(data.aspect_id, 9_999);
}
