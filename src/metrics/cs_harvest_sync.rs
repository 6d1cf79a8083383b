//! METRIC: HARVEST-CYCLE SYNCHRONIZATION (CS)
//!
//! Spread of harvest timings across the layout. Tightly clustered harvest
//! days score high; a spread of 60+ days of standard deviation bottoms out.

use crate::catalog::Catalogue;
use crate::layout::Individual;
use crate::metrics::clamp_unit;

/// Result of the CS calculation.
#[derive(Debug, Clone, Copy)]
pub struct CsResult {
    /// Clamped [0, 1] score.
    pub score: f64,
    /// Population standard deviation of harvest days.
    pub stdev_days: f64,
}

/// Calculate CS for a layout. Fewer than two instances score 1.0.
pub fn calculate_cs(individual: &Individual, catalogue: &Catalogue) -> CsResult {
    let days: Vec<f64> = individual
        .plants
        .iter()
        .filter_map(|p| catalogue.get(p.plant_id))
        .map(|plant| plant.harvest_days as f64)
        .collect();

    if days.len() < 2 {
        return CsResult { score: 1.0, stdev_days: 0.0 };
    }

    let mean = days.iter().sum::<f64>() / days.len() as f64;
    let variance = days.iter().map(|d| (d - mean) * (d - mean)).sum::<f64>() / days.len() as f64;
    let stdev = variance.sqrt();

    CsResult { score: clamp_unit(1.0 - stdev / 60.0), stdev_days: stdev }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Plant, PlantType, SunRequirement};
    use crate::layout::{PlantInstance, PlotDimensions, Rotation};
    use approx::assert_relative_eq;
    use smallvec::smallvec;

    fn plant(id: u32, harvest_days: u32) -> Plant {
        Plant {
            id,
            species: format!("sp{}", id),
            scientific_name: format!("Species {}", id),
            types: smallvec![PlantType::Vegetable],
            sun_requirement: SunRequirement::Medium,
            weekly_watering: 5.0,
            harvest_days,
            soil_type: "franco".to_string(),
            water_per_kg: 15.0,
            benefits: vec![],
            size: 0.25,
        }
    }

    fn layout_with_days(days: &[u32]) -> (Catalogue, Individual) {
        let plants: Vec<Plant> = days
            .iter()
            .enumerate()
            .map(|(i, &d)| plant(i as u32 + 1, d))
            .collect();
        let catalogue = Catalogue::new(plants).unwrap();
        let mut ind = Individual::new(PlotDimensions::new(10.0, 10.0));
        for i in 0..days.len() {
            let p = catalogue.get(i as u32 + 1).unwrap();
            ind.plants
                .push(PlantInstance::new(p, i as f64, 0.0, Rotation::R0));
        }
        (catalogue, ind)
    }

    #[test]
    fn singleton_layout_scores_one() {
        let (catalogue, ind) = layout_with_days(&[60]);
        let r = calculate_cs(&ind, &catalogue);
        assert_relative_eq!(r.score, 1.0);
    }

    #[test]
    fn identical_cycles_score_one() {
        let (catalogue, ind) = layout_with_days(&[60, 60, 60]);
        let r = calculate_cs(&ind, &catalogue);
        assert_relative_eq!(r.score, 1.0);
        assert_relative_eq!(r.stdev_days, 0.0);
    }

    #[test]
    fn spread_lowers_the_score() {
        // 30 and 90: mean 60, population stdev 30 → 1 - 30/60 = 0.5
        let (catalogue, ind) = layout_with_days(&[30, 90]);
        let r = calculate_cs(&ind, &catalogue);
        assert_relative_eq!(r.stdev_days, 30.0);
        assert_relative_eq!(r.score, 0.5);
    }

    #[test]
    fn extreme_spread_bottoms_out_at_zero() {
        let (catalogue, ind) = layout_with_days(&[10, 200]);
        let r = calculate_cs(&ind, &catalogue);
        assert_relative_eq!(r.score, 0.0);
    }
}
