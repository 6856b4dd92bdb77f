//! Deterministic demo cohort generation.
//!
//! Same seed, same template: same participants, same ratings. The runner
//! imports the cohort through the regular import path.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;
use standards_core::{
    catalog::TemplateCatalog,
    context::ConfigurationContext,
    import::{AssessmentFixture, ParticipantFixture, PositionFixture},
    resolver::StandardResolver,
    scoring::round2,
};
use std::collections::BTreeMap;

/// Seeded RNG for demo data.
pub struct DemoRng {
    inner: Pcg64Mcg,
}

impl DemoRng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: Pcg64Mcg::seed_from_u64(seed ^ 0x9e37_79b9_7f4a_7c15),
        }
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a u64 in [0, n); 0 when n is 0.
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        if n == 0 {
            return 0;
        }
        self.inner.next_u64() % n
    }

    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// A rating scattered around `centre`, clamped to `min..=max`, two decimals.
    pub fn rating(&mut self, centre: f64, spread: f64, min: f64, max: f64) -> f64 {
        let offset = (self.next_f64() * 2.0 - 1.0) * spread;
        round2((centre + offset).clamp(min, max))
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.next_u64_below(items.len() as u64) as usize]
    }
}

pub struct NameGenerator;

impl NameGenerator {
    pub fn generate_full_name(rng: &mut DemoRng) -> String {
        let first = rng.pick(Self::first_names());
        let last = rng.pick(Self::last_names());
        format!("{first} {last}")
    }

    fn first_names() -> &'static [&'static str] {
        &[
            "Adi", "Agus", "Andi", "Ayu", "Bayu", "Budi", "Citra", "Dewi", "Dian", "Eka",
            "Fajar", "Fitri", "Gilang", "Hadi", "Indah", "Joko", "Kartika", "Lestari", "Made",
            "Nur", "Putri", "Rahmat", "Rina", "Sari", "Siti", "Taufik", "Wahyu", "Wulan",
            "Yogi", "Yuni",
        ]
    }

    fn last_names() -> &'static [&'static str] {
        &[
            "Pratama", "Saputra", "Wijaya", "Hidayat", "Santoso", "Kusuma", "Nugroho",
            "Setiawan", "Lestari", "Rahayu", "Permana", "Gunawan", "Susanto", "Hakim",
            "Siregar", "Nasution", "Simanjuntak", "Halim", "Utami", "Purnomo",
        ]
    }
}

/// One event with one position and two batches, rated against `catalog`.
/// A small share of aspects are left unrated to exercise missing rows.
pub fn demo_cohort(
    catalog: &TemplateCatalog,
    event_code: &str,
    participants: usize,
    seed: u64,
) -> AssessmentFixture {
    let mut rng = DemoRng::new(seed);
    let context = ConfigurationContext::baseline(catalog.template_id());
    let resolver = StandardResolver::new(catalog, &context);
    let batches = vec!["Batch 1".to_string(), "Batch 2".to_string()];

    let participants: Vec<ParticipantFixture> = (0..participants)
        .map(|i| {
            let mut ratings = BTreeMap::new();
            for aspect in catalog.aspects() {
                if rng.chance(0.03) {
                    continue;
                }
                let centre = resolver.resolve_aspect_standard_rating(aspect);
                ratings.insert(aspect.code.to_string(), rng.rating(centre, 1.25, 1.0, 5.0));
            }
            ParticipantFixture {
                name: NameGenerator::generate_full_name(&mut rng),
                test_number: format!("{event_code}-{:04}", i + 1),
                batch: Some(batches[i % batches.len()].clone()),
                ratings,
                scores: BTreeMap::new(),
            }
        })
        .collect();

    AssessmentFixture {
        event_code: event_code.to_string(),
        event_name: format!("Demo assessment {event_code}"),
        positions: vec![PositionFixture {
            name: "Staf Pelaksana".to_string(),
            template_code: catalog.template.code.to_string(),
            batches,
            participants,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_generation_is_deterministic() {
        let mut rng1 = DemoRng::new(99);
        let mut rng2 = DemoRng::new(99);
        for _ in 0..20 {
            assert_eq!(
                NameGenerator::generate_full_name(&mut rng1),
                NameGenerator::generate_full_name(&mut rng2),
                "Same seed should produce same names"
            );
        }
    }

    #[test]
    fn generates_two_part_names() {
        let mut rng = DemoRng::new(12345);
        for _ in 0..100 {
            let name = NameGenerator::generate_full_name(&mut rng);
            let parts: Vec<&str> = name.split_whitespace().collect();
            assert_eq!(parts.len(), 2, "Name should have exactly 2 parts: {name}");
        }
    }

    #[test]
    fn ratings_stay_on_scale() {
        let mut rng = DemoRng::new(7);
        for _ in 0..500 {
            let r = rng.rating(4.5, 1.25, 1.0, 5.0);
            assert!((1.0..=5.0).contains(&r), "rating {r} off scale");
            assert_eq!(r, round2(r), "rating {r} should carry two decimals");
        }
    }
}
