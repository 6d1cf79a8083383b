//! Plant catalogue model
//!
//! Catalogue rows are immutable once loaded. Layouts reference plants by
//! integer id only; the `Catalogue` resolves ids in O(1), so cloning a
//! candidate layout never copies plant data.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::errors::{EngineError, Result};

/// Functional category tags a species can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlantType {
    Vegetable,
    Medicinal,
    Aromatic,
    Ornamental,
}

impl PlantType {
    /// Fixed bucket order used by category-distribution percentages.
    pub const ALL: [PlantType; 4] = [
        PlantType::Vegetable,
        PlantType::Medicinal,
        PlantType::Aromatic,
        PlantType::Ornamental,
    ];

    /// Position in the category-distribution vector.
    pub fn bucket(self) -> usize {
        match self {
            PlantType::Vegetable => 0,
            PlantType::Medicinal => 1,
            PlantType::Aromatic => 2,
            PlantType::Ornamental => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SunRequirement {
    Low,
    Medium,
    High,
}

/// One catalogue species.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plant {
    pub id: u32,
    pub species: String,
    pub scientific_name: String,
    /// Non-empty tag set; most species carry 1-2 tags.
    pub types: SmallVec<[PlantType; 4]>,
    pub sun_requirement: SunRequirement,
    /// Liters per week for one mature specimen.
    pub weekly_watering: f64,
    /// Days from planting to first harvest.
    pub harvest_days: u32,
    pub soil_type: String,
    /// Liters of water per kilogram of yield.
    pub water_per_kg: f64,
    pub benefits: Vec<String>,
    /// Footprint area in m².
    pub size: f64,
}

impl Plant {
    pub fn has_type(&self, t: PlantType) -> bool {
        self.types.contains(&t)
    }

    /// Side length of the default square footprint.
    pub fn side(&self) -> f64 {
        self.size.sqrt()
    }

    /// Implementation cost in currency units (50 per m² of footprint).
    pub fn cost(&self) -> f64 {
        self.size * 50.0
    }

    fn check(&self) -> Result<()> {
        if self.types.is_empty() {
            return Err(EngineError::catalogue(format!(
                "plant {} ({}) has no category tags",
                self.id, self.species
            )));
        }
        if !(self.size > 0.0) {
            return Err(EngineError::catalogue(format!(
                "plant {} ({}) has non-positive size {}",
                self.id, self.species, self.size
            )));
        }
        if self.harvest_days < 1 {
            return Err(EngineError::catalogue(format!(
                "plant {} ({}) has harvest_days < 1",
                self.id, self.species
            )));
        }
        if self.weekly_watering < 0.0 || self.water_per_kg < 0.0 {
            return Err(EngineError::catalogue(format!(
                "plant {} ({}) has negative water figures",
                self.id, self.species
            )));
        }
        Ok(())
    }
}

/// Directed compatibility triple as stored; lookups are symmetric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompatibilityEntry {
    pub species1: String,
    pub species2: String,
    /// Affinity in [-1, 1]; positive = beneficial neighbor.
    pub score: f64,
}

/// Immutable catalogue with O(1) id and species resolution.
#[derive(Debug, Clone)]
pub struct Catalogue {
    plants: Vec<Plant>,
    by_id: FxHashMap<u32, usize>,
    by_species: FxHashMap<String, usize>,
}

impl Catalogue {
    /// Build from rows, rejecting duplicate ids/species and invalid rows.
    pub fn new(plants: Vec<Plant>) -> Result<Self> {
        let mut by_id = FxHashMap::default();
        let mut by_species = FxHashMap::default();

        for (idx, plant) in plants.iter().enumerate() {
            plant.check()?;
            if by_id.insert(plant.id, idx).is_some() {
                return Err(EngineError::catalogue(format!(
                    "duplicate plant id {}",
                    plant.id
                )));
            }
            if by_species.insert(plant.species.clone(), idx).is_some() {
                return Err(EngineError::catalogue(format!(
                    "duplicate species '{}'",
                    plant.species
                )));
            }
        }

        Ok(Self { plants, by_id, by_species })
    }

    pub fn get(&self, id: u32) -> Option<&Plant> {
        self.by_id.get(&id).map(|&idx| &self.plants[idx])
    }

    pub fn get_by_species(&self, species: &str) -> Option<&Plant> {
        self.by_species.get(species).map(|&idx| &self.plants[idx])
    }

    pub fn contains(&self, id: u32) -> bool {
        self.by_id.contains_key(&id)
    }

    pub fn plants(&self) -> &[Plant] {
        &self.plants
    }

    pub fn len(&self) -> usize {
        self.plants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plants.is_empty()
    }
}
