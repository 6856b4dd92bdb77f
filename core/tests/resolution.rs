//! Layer precedence and resolution semantics.

mod common;

use common::{fully_rated, seeded};
use standards_core::{
    context::ConfigurationContext,
    layer::{Layer, OverrideSet},
    resolver::StandardResolver,
    types::Code,
};

/// Baseline 20, custom standard 30, session 40: the session wins, and
/// removing layers from the top exposes the next one down.
#[test]
fn session_beats_custom_beats_baseline() {
    let mut s = seeded(vec![fully_rated("A", 3.0)]);
    let t = s.template_id;

    let mut draft = s.engine.custom_standard_from_baseline(t, 1, "INST-30", "Weight 30").unwrap();
    draft.settings.set_aspect_weight(Code::from("kecerdasan"), Some(30.0));
    draft.settings.set_aspect_weight(Code::from("cara_kerja"), Some(20.0));
    let outcome = s.engine.save_custom_standard(&draft).unwrap();
    let id = outcome.custom_standard_id.expect("valid standard should be saved");
    s.engine.select_custom_standard(t, Some(id)).unwrap();
    s.engine.set_session_aspect_weight(t, "kecerdasan", Some(40.0));

    let weight = |s: &mut common::Seeded| {
        let effective = s.engine.effective_standard(t).unwrap().unwrap();
        effective.categories[0].aspects[0].weight
    };

    let w = weight(&mut s);
    assert_eq!(w.value, 40.0);
    assert_eq!(w.layer, Layer::Session);

    s.engine.reset_session(t);
    let w = weight(&mut s);
    assert_eq!(w.value, 30.0);
    assert_eq!(w.layer, Layer::CustomStandard);

    s.engine.select_custom_standard(t, None).unwrap();
    let w = weight(&mut s);
    assert_eq!(w.value, 20.0);
    assert_eq!(w.layer, Layer::Baseline);
}

/// A key present with no value is "no override here", never zero.
#[test]
fn null_override_falls_through() {
    let mut s = seeded(vec![]);
    let t = s.template_id;
    let catalog = s.engine.catalog(t).unwrap().unwrap();

    let mut custom = OverrideSet::default();
    custom.set_aspect_weight(Code::from("kecerdasan"), Some(25.0));
    let mut session = OverrideSet::default();
    session.set_aspect_weight(Code::from("kecerdasan"), None);
    session.set_category_weight(Code::from("potensi"), None);

    let mut draft = s.engine.custom_standard_from_baseline(t, 1, "X", "X").unwrap();
    draft.settings = custom;
    let context = ConfigurationContext::baseline(t)
        .with_custom_standard(Some(draft.preview()))
        .with_session(session);
    let resolver = StandardResolver::new(&catalog, &context);

    assert_eq!(resolver.resolve_aspect_weight("kecerdasan"), 25.0);
    assert_eq!(resolver.aspect_weight("kecerdasan").layer, Layer::CustomStandard);
    assert_eq!(resolver.resolve_category_weight("potensi"), 40.0);
    assert_eq!(
        context.active_layer(),
        Layer::CustomStandard,
        "A session holding only empty keys should not count as an active layer"
    );
}

/// Resolving the same input twice gives bit-identical output.
#[test]
fn resolution_is_idempotent() {
    let mut s = seeded(vec![]);
    let t = s.template_id;
    s.engine.set_session_sub_aspect_rating(t, "daya_tangkap", Some(5));

    let first = s.engine.effective_standard(t).unwrap().unwrap();
    let second = s.engine.effective_standard(t).unwrap().unwrap();
    assert_eq!(first, second);
    assert_eq!(
        s.engine.fingerprint(t).unwrap(),
        s.engine.fingerprint(t).unwrap(),
        "Identical configuration should give identical fingerprints"
    );
}

/// Unknown codes degrade to defaults instead of failing.
#[test]
fn unknown_codes_resolve_to_defaults() {
    let mut s = seeded(vec![]);
    let catalog = s.engine.catalog(s.template_id).unwrap().unwrap();
    let context = ConfigurationContext::baseline(s.template_id);
    let resolver = StandardResolver::new(&catalog, &context);

    assert_eq!(resolver.resolve_aspect_weight("ghost"), 0.0);
    assert_eq!(resolver.resolve_aspect_rating("ghost"), 0.0);
    assert!(resolver.resolve_aspect_active("ghost"));
    assert!(resolver.resolve_sub_aspect_active("ghost"));
    assert_eq!(resolver.resolve_sub_aspect_rating("ghost"), 0);
    assert_eq!(resolver.resolve_category_weight("ghost"), 0.0);
}

/// A context built for another template contributes nothing.
#[test]
fn foreign_context_degrades_to_baseline() {
    let mut s = seeded(vec![]);
    let catalog = s.engine.catalog(s.template_id).unwrap().unwrap();
    let mut session = OverrideSet::default();
    session.set_aspect_weight(Code::from("kecerdasan"), Some(99.0));
    let context = ConfigurationContext::baseline(s.template_id + 100).with_session(session);
    let resolver = StandardResolver::new(&catalog, &context);

    assert_eq!(resolver.resolve_aspect_weight("kecerdasan"), 20.0);
}

/// Sub-aspect averaging uses active sub-aspects only, and falls back to the
/// aspect's own rating when none is active.
#[test]
fn sub_aspect_average_follows_active_flags() {
    let mut s = seeded(vec![]);
    let t = s.template_id;
    let catalog = s.engine.catalog(t).unwrap().unwrap();
    let kecerdasan = catalog.aspect_by_code("kecerdasan").unwrap().clone();

    let mut session = OverrideSet::default();
    session.set_sub_aspect_rating(Code::from("kecerdasan_umum"), Some(5));
    let context = ConfigurationContext::baseline(t).with_session(session.clone());
    let resolver = StandardResolver::new(&catalog, &context);
    assert!((resolver.resolve_aspect_standard_rating(&kecerdasan) - 13.0 / 3.0).abs() < 1e-12);

    for code in ["kecerdasan_umum", "daya_tangkap", "kemampuan_analisa"] {
        session.set_sub_aspect_active(Code::from(code), Some(false));
    }
    session.set_aspect_rating(Code::from("kecerdasan"), Some(2.5));
    let context = ConfigurationContext::baseline(t).with_session(session);
    let resolver = StandardResolver::new(&catalog, &context);
    assert_eq!(resolver.resolve_aspect_standard_rating(&kecerdasan), 2.5);
}

#[test]
fn contributing_layers_report_every_source() {
    let mut s = seeded(vec![]);
    let t = s.template_id;
    s.engine.set_session_aspect_active(t, "komunikasi", Some(false));

    let effective = s.engine.effective_standard(t).unwrap().unwrap();
    assert_eq!(effective.contributing_layers(), vec![Layer::Baseline, Layer::Session]);
}
