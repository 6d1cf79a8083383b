//! Inbound request model and normalization
//!
//! The raw request arrives as loosely-filled JSON; normalization applies the
//! documented defaults, validates ranges and produces the fully-specified
//! inputs the engine runs on. Randomized defaults (plot dimensions, water
//! limit) draw from the request's seeded stream so a fixed seed reproduces
//! the whole run, defaults included.

use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, Result};
use crate::evaluator::Objective;
use crate::ga::GaConfig;
use crate::rng::GardenRng;

/// Growing season hint; `Auto` resolves from the calendar date downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    #[default]
    Auto,
    Spring,
    Summer,
    Autumn,
    Winter,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RequestedDimensions {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

/// Requested per-category percentages; omitted categories count as 0.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CategoryDistribution {
    #[serde(default)]
    pub vegetable: f64,
    #[serde(default)]
    pub medicinal: f64,
    #[serde(default)]
    pub ornamental: f64,
    #[serde(default)]
    pub aromatic: f64,
}

impl CategoryDistribution {
    /// Bucket vector in (vegetable, medicinal, aromatic, ornamental) order.
    pub fn as_buckets(&self) -> [f64; 4] {
        [self.vegetable, self.medicinal, self.aromatic, self.ornamental]
    }

    fn sum(&self) -> f64 {
        self.vegetable + self.medicinal + self.ornamental + self.aromatic
    }
}

/// Optional genetic-algorithm tuning riding on a request.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GaOverrides {
    pub population_size: Option<usize>,
    pub max_generations: Option<usize>,
    pub crossover_probability: Option<f64>,
    pub mutation_rate: Option<f64>,
    pub insertion_rate: Option<f64>,
    pub deletion_rate: Option<f64>,
    pub tournament_k: Option<usize>,
    pub elite_count: Option<usize>,
    pub patience: Option<usize>,
    pub convergence_threshold: Option<f64>,
    pub timeout_ms: Option<u64>,
}

/// Raw inbound request as deserialized from the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GardenRequest {
    pub user_id: String,
    #[serde(default)]
    pub desired_plant_ids: Vec<u32>,
    pub max_plant_species: Option<usize>,
    pub dimensions: Option<RequestedDimensions>,
    pub water_limit: Option<f64>,
    pub user_experience: Option<u8>,
    pub season: Option<Season>,
    pub location: Option<Location>,
    pub category_distribution: Option<CategoryDistribution>,
    pub budget: Option<f64>,
    pub objective: Option<Objective>,
    pub maintenance_minutes: Option<u32>,
    pub seed: Option<u64>,
    pub ga: Option<GaOverrides>,
}

/// Resource ceilings and pool restrictions the engine enforces.
#[derive(Debug, Clone)]
pub struct Constraints {
    pub max_area: f64,
    pub max_water_weekly: f64,
    pub max_budget: Option<f64>,
    /// Desired (vegetable, medicinal, aromatic, ornamental) percentages.
    pub desired_distribution: Option<[f64; 4]>,
    pub desired_plant_ids: Vec<u32>,
}

/// Fully-specified request after defaults and validation.
#[derive(Debug, Clone)]
pub struct NormalizedRequest {
    pub user_id: String,
    pub dimensions: RequestedDimensions,
    pub constraints: Constraints,
    pub objective: Objective,
    pub season: Season,
    pub location: Location,
    pub user_experience: u8,
    pub maintenance_minutes: u32,
    pub ga: GaConfig,
}

impl GardenRequest {
    /// Apply defaults and range checks.
    ///
    /// `profile_experience` fills `user_experience` when the request omits
    /// it and a user-profile collaborator knows the user. Random defaults
    /// draw from `rng` in a fixed order: plot area, aspect ratio, water
    /// limit.
    pub fn normalize(
        &self,
        profile_experience: Option<u8>,
        rng: &mut GardenRng,
    ) -> Result<NormalizedRequest> {
        if self.user_id.trim().is_empty() {
            return Err(EngineError::validation("userId must be non-empty"));
        }

        let user_experience = match self.user_experience.or(profile_experience) {
            Some(level @ 1..=3) => level,
            Some(level) => {
                return Err(EngineError::validation(format!(
                    "userExperience must be 1, 2 or 3, got {}",
                    level
                )))
            }
            None => return Err(EngineError::validation("userExperience is required")),
        };

        let max_species = self.max_plant_species.unwrap_or(5);
        if max_species != 3 && max_species != 5 {
            return Err(EngineError::validation(format!(
                "maxPlantSpecies must be 3 or 5, got {}",
                max_species
            )));
        }

        let dimensions = match self.dimensions {
            Some(dims) => {
                for (name, value) in [("width", dims.width), ("height", dims.height)] {
                    if !(0.5..=10.0).contains(&value) {
                        return Err(EngineError::validation(format!(
                            "dimensions.{} must be in [0.5, 10], got {}",
                            name, value
                        )));
                    }
                }
                dims
            }
            None => {
                let area = rng.range_f64(1.0, 5.0);
                let aspect = rng.range_f64(0.6, 1.4);
                let width = (area * aspect).sqrt();
                RequestedDimensions { width, height: area / width }
            }
        };
        let area = dimensions.width * dimensions.height;

        let water_limit = match self.water_limit {
            Some(limit) if limit >= 0.0 => limit,
            Some(limit) => {
                return Err(EngineError::validation(format!(
                    "waterLimit must be >= 0, got {}",
                    limit
                )))
            }
            None => area * rng.range_f64(50.0, 80.0),
        };

        let budget = match self.budget {
            Some(budget) if budget >= 0.0 => budget,
            Some(budget) => {
                return Err(EngineError::validation(format!(
                    "budget must be >= 0, got {}",
                    budget
                )))
            }
            None => area * 200.0,
        };

        let location = match self.location {
            Some(loc) => {
                if !(-90.0..=90.0).contains(&loc.lat) || !(-180.0..=180.0).contains(&loc.lon) {
                    return Err(EngineError::validation(format!(
                        "location out of range: ({}, {})",
                        loc.lat, loc.lon
                    )));
                }
                loc
            }
            None => Location { lat: 16.75, lon: -93.11 },
        };

        let desired_distribution = match &self.category_distribution {
            Some(dist) => {
                if (dist.sum() - 100.0).abs() > 1e-6 {
                    return Err(EngineError::validation(format!(
                        "categoryDistribution must sum to 100, got {}",
                        dist.sum()
                    )));
                }
                Some(dist.as_buckets())
            }
            None => None,
        };

        let maintenance_minutes = self
            .maintenance_minutes
            .unwrap_or(user_experience as u32 * 60);

        let mut ga = GaConfig {
            seed: self.seed,
            max_species,
            ..GaConfig::default()
        };
        if let Some(overrides) = &self.ga {
            ga.apply_overrides(overrides);
        }
        ga.check()?;

        Ok(NormalizedRequest {
            user_id: self.user_id.clone(),
            dimensions,
            constraints: Constraints {
                max_area: area,
                max_water_weekly: water_limit,
                max_budget: Some(budget),
                desired_distribution,
                desired_plant_ids: self.desired_plant_ids.clone(),
            },
            objective: self.objective.unwrap_or_default(),
            season: self.season.unwrap_or_default(),
            location,
            user_experience,
            maintenance_minutes,
            ga,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn minimal() -> GardenRequest {
        GardenRequest {
            user_id: "u".to_string(),
            user_experience: Some(2),
            ..Default::default()
        }
    }

    #[test]
    fn minimal_request_fills_every_default() {
        let mut rng = GardenRng::seeded(42);
        let norm = minimal().normalize(None, &mut rng).unwrap();

        let area = norm.dimensions.width * norm.dimensions.height;
        assert!((1.0..=5.0).contains(&area));
        assert!(norm.constraints.max_water_weekly >= area * 50.0 - 1e-9);
        assert!(norm.constraints.max_water_weekly <= area * 80.0 + 1e-9);
        assert_relative_eq!(norm.constraints.max_budget.unwrap(), area * 200.0);
        assert_eq!(norm.objective, Objective::Alimenticio);
        assert_eq!(norm.season, Season::Auto);
        assert_relative_eq!(norm.location.lat, 16.75);
        assert_relative_eq!(norm.location.lon, -93.11);
        assert_eq!(norm.maintenance_minutes, 120);
        assert_eq!(norm.ga.max_species, 5);
    }

    #[test]
    fn defaults_are_reproducible_under_a_seed() {
        let a = minimal().normalize(None, &mut GardenRng::seeded(42)).unwrap();
        let b = minimal().normalize(None, &mut GardenRng::seeded(42)).unwrap();
        assert_eq!(a.dimensions.width, b.dimensions.width);
        assert_eq!(a.constraints.max_water_weekly, b.constraints.max_water_weekly);
    }

    #[test]
    fn missing_experience_is_rejected_without_a_profile() {
        let mut request = minimal();
        request.user_experience = None;
        let err = request.normalize(None, &mut GardenRng::seeded(1)).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn profile_supplies_missing_experience() {
        let mut request = minimal();
        request.user_experience = None;
        let norm = request.normalize(Some(3), &mut GardenRng::seeded(1)).unwrap();
        assert_eq!(norm.user_experience, 3);
        assert_eq!(norm.maintenance_minutes, 180);
    }

    #[test]
    fn rejects_off_menu_species_counts() {
        let mut request = minimal();
        request.max_plant_species = Some(4);
        assert!(request.normalize(None, &mut GardenRng::seeded(1)).is_err());
    }

    #[test]
    fn rejects_out_of_range_dimensions() {
        let mut request = minimal();
        request.dimensions = Some(RequestedDimensions { width: 0.2, height: 2.0 });
        assert!(request.normalize(None, &mut GardenRng::seeded(1)).is_err());

        request.dimensions = Some(RequestedDimensions { width: 2.0, height: 11.0 });
        assert!(request.normalize(None, &mut GardenRng::seeded(1)).is_err());
    }

    #[test]
    fn category_distribution_must_sum_to_hundred() {
        let mut request = minimal();
        request.category_distribution = Some(CategoryDistribution {
            vegetable: 60.0,
            medicinal: 20.0,
            ..Default::default()
        });
        assert!(request.normalize(None, &mut GardenRng::seeded(1)).is_err());

        request.category_distribution = Some(CategoryDistribution {
            vegetable: 60.0,
            medicinal: 20.0,
            ornamental: 10.0,
            aromatic: 10.0,
        });
        let norm = request.normalize(None, &mut GardenRng::seeded(1)).unwrap();
        assert_eq!(
            norm.constraints.desired_distribution,
            Some([60.0, 20.0, 10.0, 10.0])
        );
    }

    #[test]
    fn parses_camel_case_wire_format() {
        let json = r#"{
            "userId": "u1",
            "desiredPlantIds": [1, 2, 3],
            "maxPlantSpecies": 3,
            "dimensions": {"width": 2.0, "height": 1.0},
            "waterLimit": 150.0,
            "userExperience": 2,
            "objective": "alimenticio",
            "seed": 1
        }"#;
        let request: GardenRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.desired_plant_ids, vec![1, 2, 3]);
        assert_eq!(request.objective, Some(Objective::Alimenticio));
        assert_eq!(request.seed, Some(1));
    }
}
