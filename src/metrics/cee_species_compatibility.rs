//! METRIC: SPECIES COMPATIBILITY (CEE)
//!
//! Distance-weighted pairwise affinity across all placed instances.
//! Near neighbors dominate through an exponential distance weight; hostile
//! pairs planted close are amplified as penalties, companion pairs planted
//! close as bonuses.

use crate::catalog::Catalogue;
use crate::compatibility::CompatibilityIndex;
use crate::layout::Individual;
use crate::metrics::clamp_unit;

/// Result of the CEE calculation.
#[derive(Debug, Clone)]
pub struct CeeResult {
    /// Clamped [0, 1] score.
    pub score: f64,
    /// Weighted mean affinity before remapping, in [-1, 1] nominally.
    pub raw: f64,
    /// Number of unordered instance pairs considered.
    pub pairs: usize,
}

/// Calculate CEE for a layout.
///
/// For every unordered instance pair at center-distance `d`:
/// weight `w = exp(-d/2)`, contribution `compat · w`, doubled when a hostile
/// pair (compat < -0.5) sits closer than 1.5 m and boosted ×1.5 when a
/// companion pair (compat > 0.5) sits closer than 1.0 m. The aggregate
/// `Σ contrib / Σ w` is remapped from [-1, 1] to [0, 1].
///
/// Layouts with fewer than two instances score a neutral 1.0.
pub fn calculate_cee(
    individual: &Individual,
    catalogue: &Catalogue,
    compatibility: &CompatibilityIndex,
) -> CeeResult {
    let instances = &individual.plants;
    if instances.len() < 2 {
        return CeeResult { score: 1.0, raw: 1.0, pairs: 0 };
    }

    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    let mut pairs = 0;

    for i in 0..instances.len() {
        for j in i + 1..instances.len() {
            let (a, b) = (&instances[i], &instances[j]);
            let (plant_a, plant_b) = match (catalogue.get(a.plant_id), catalogue.get(b.plant_id)) {
                (Some(pa), Some(pb)) => (pa, pb),
                _ => continue,
            };

            let distance = a.center_distance(b);
            let weight = (-distance / 2.0).exp();
            let compat = compatibility.score(&plant_a.species, &plant_b.species);

            let mut contribution = compat * weight;
            if compat < -0.5 && distance < 1.5 {
                contribution *= 2.0;
            }
            if compat > 0.5 && distance < 1.0 {
                contribution *= 1.5;
            }

            weighted_sum += contribution;
            weight_total += weight;
            pairs += 1;
        }
    }

    if weight_total == 0.0 {
        return CeeResult { score: 1.0, raw: 1.0, pairs };
    }

    let raw = weighted_sum / weight_total;
    CeeResult { score: clamp_unit((raw + 1.0) / 2.0), raw, pairs }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CompatibilityEntry, Plant, PlantType, SunRequirement};
    use crate::layout::{PlantInstance, PlotDimensions, Rotation};
    use approx::assert_relative_eq;
    use smallvec::smallvec;

    fn plant(id: u32, species: &str) -> Plant {
        Plant {
            id,
            species: species.to_string(),
            scientific_name: format!("{} sp.", species),
            types: smallvec![PlantType::Vegetable],
            sun_requirement: SunRequirement::Medium,
            weekly_watering: 5.0,
            harvest_days: 60,
            soil_type: "franco".to_string(),
            water_per_kg: 15.0,
            benefits: vec![],
            size: 0.25,
        }
    }

    fn fixture(
        entries: &[(&str, &str, f64)],
    ) -> (Catalogue, CompatibilityIndex) {
        let catalogue = Catalogue::new(vec![plant(1, "Tomate"), plant(2, "Albahaca")]).unwrap();
        let entries: Vec<CompatibilityEntry> = entries
            .iter()
            .map(|(a, b, s)| CompatibilityEntry {
                species1: a.to_string(),
                species2: b.to_string(),
                score: *s,
            })
            .collect();
        (catalogue, CompatibilityIndex::from_entries(&entries))
    }

    fn layout_at(catalogue: &Catalogue, positions: &[(u32, f64, f64)]) -> Individual {
        let mut ind = Individual::new(PlotDimensions::new(20.0, 20.0));
        for (id, x, y) in positions {
            let p = catalogue.get(*id).unwrap();
            ind.plants.push(PlantInstance::new(p, *x, *y, Rotation::R0));
        }
        ind
    }

    #[test]
    fn singleton_layout_scores_one() {
        let (catalogue, index) = fixture(&[]);
        let ind = layout_at(&catalogue, &[(1, 0.0, 0.0)]);
        let r = calculate_cee(&ind, &catalogue, &index);
        assert_relative_eq!(r.score, 1.0);
        assert_eq!(r.pairs, 0);
    }

    #[test]
    fn companion_pair_scores_above_neutral() {
        let (catalogue, index) = fixture(&[("Tomate", "Albahaca", 0.8)]);
        let ind = layout_at(&catalogue, &[(1, 0.0, 0.0), (2, 2.0, 0.0)]);
        let r = calculate_cee(&ind, &catalogue, &index);
        // Single pair: aggregate equals the (possibly amplified) compat
        assert!(r.score > 0.5);
        assert_eq!(r.pairs, 1);
    }

    #[test]
    fn hostile_close_pair_is_amplified() {
        let (catalogue, index) = fixture(&[("Tomate", "Albahaca", -0.8)]);
        // Centers 1.0 m apart: inside the 1.5 m amplification radius
        let close = layout_at(&catalogue, &[(1, 0.0, 0.0), (2, 1.0, 0.0)]);
        // Centers 3.0 m apart: outside it
        let far = layout_at(&catalogue, &[(1, 0.0, 0.0), (2, 3.0, 0.0)]);

        let close_r = calculate_cee(&close, &catalogue, &index);
        let far_r = calculate_cee(&far, &catalogue, &index);
        // Amplified penalty: raw doubles from -0.8 to -1.6
        assert_relative_eq!(close_r.raw, -1.6, epsilon = 1e-9);
        assert!(close_r.score < far_r.score);
        assert_eq!(close_r.score, 0.0);
    }

    #[test]
    fn close_companion_bonus_caps_at_one() {
        let (catalogue, index) = fixture(&[("Tomate", "Albahaca", 0.8)]);
        // Centers 0.5 m apart: inside the 1.0 m bonus radius
        let ind = layout_at(&catalogue, &[(1, 0.0, 0.0), (2, 0.5, 0.0)]);
        let r = calculate_cee(&ind, &catalogue, &index);
        assert_relative_eq!(r.raw, 1.2, epsilon = 1e-9);
        assert_relative_eq!(r.score, 1.0);
    }

    #[test]
    fn translation_preserves_score() {
        let (catalogue, index) = fixture(&[("Tomate", "Albahaca", 0.6)]);
        let a = layout_at(&catalogue, &[(1, 0.0, 0.0), (2, 2.0, 1.0)]);
        let b = layout_at(&catalogue, &[(1, 5.0, 5.0), (2, 7.0, 6.0)]);
        let ra = calculate_cee(&a, &catalogue, &index);
        let rb = calculate_cee(&b, &catalogue, &index);
        assert_relative_eq!(ra.score, rb.score, epsilon = 1e-12);
    }
}
