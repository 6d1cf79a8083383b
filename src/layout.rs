//! Layout genome: placed plant instances and candidate individuals
//!
//! An `Individual` is one candidate layout: a rectangular plot plus an
//! ordered list of placed `PlantInstance`s. Instances reference catalogue
//! plants by id, so cloning an individual (elitism, crossover fallback)
//! copies positions and metrics only, never plant data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalogue, Plant};
use crate::metrics::Metrics;

/// Footprint rotation in whole quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
pub enum Rotation {
    R0,
    R90,
    R180,
    R270,
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [Rotation::R0, Rotation::R90, Rotation::R180, Rotation::R270];

    pub fn degrees(self) -> u16 {
        match self {
            Rotation::R0 => 0,
            Rotation::R90 => 90,
            Rotation::R180 => 180,
            Rotation::R270 => 270,
        }
    }
}

impl From<Rotation> for u16 {
    fn from(r: Rotation) -> u16 {
        r.degrees()
    }
}

impl TryFrom<u16> for Rotation {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Rotation::R0),
            90 => Ok(Rotation::R90),
            180 => Ok(Rotation::R180),
            270 => Ok(Rotation::R270),
            other => Err(format!("rotation must be one of 0/90/180/270, got {}", other)),
        }
    }
}

/// Lifecycle state of one planted specimen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlantStatus {
    #[default]
    Pending,
    Planted,
    Growing,
    HarvestReady,
    Harvested,
}

/// One physically placed plant. `(x, y)` is the lower-left corner of the
/// footprint in meters; distances between instances are center-to-center.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlantInstance {
    pub plant_id: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: Rotation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: PlantStatus,
}

impl PlantInstance {
    /// Instance with the default square footprint (√size per side).
    pub fn new(plant: &Plant, x: f64, y: f64, rotation: Rotation) -> Self {
        let side = plant.side();
        Self {
            plant_id: plant.id,
            x,
            y,
            width: side,
            height: side,
            rotation,
            planted_at: None,
            status: PlantStatus::Pending,
        }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn center_distance(&self, other: &PlantInstance) -> f64 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
    }

    /// Axis-aligned bounding-box overlap; touching edges do not overlap.
    pub fn overlaps(&self, other: &PlantInstance) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }

    /// Bounding box fully inside a width × height plot.
    pub fn within_plot(&self, plot_width: f64, plot_height: f64) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.x + self.width <= plot_width
            && self.y + self.height <= plot_height
    }
}

/// Rectangular plot a candidate layout occupies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlotDimensions {
    pub width: f64,
    pub height: f64,
    pub total_area: f64,
}

impl PlotDimensions {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height, total_area: width * height }
    }
}

/// Candidate layout: plot dimensions, placed instances, cached metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Individual {
    pub dimensions: PlotDimensions,
    pub plants: Vec<PlantInstance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Metrics>,
}

impl Individual {
    pub fn new(dimensions: PlotDimensions) -> Self {
        Self { dimensions, plants: Vec::new(), metrics: None }
    }

    pub fn total_plants(&self) -> usize {
        self.plants.len()
    }

    pub fn used_area(&self) -> f64 {
        self.plants.iter().map(|p| p.area()).sum()
    }

    /// Liters per week across all placed instances.
    pub fn total_weekly_water(&self, catalogue: &Catalogue) -> f64 {
        self.plants
            .iter()
            .filter_map(|p| catalogue.get(p.plant_id))
            .map(|plant| plant.weekly_watering)
            .sum()
    }

    /// Implementation cost across all placed instances.
    pub fn total_cost(&self, catalogue: &Catalogue) -> f64 {
        self.plants
            .iter()
            .filter_map(|p| catalogue.get(p.plant_id))
            .map(|plant| plant.cost())
            .sum()
    }

    pub fn fitness(&self) -> f64 {
        self.metrics.as_ref().map(|m| m.fitness).unwrap_or(0.0)
    }

    /// Drop cached metrics after a structural change.
    pub fn invalidate_metrics(&mut self) {
        self.metrics = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PlantType;
    use approx::assert_relative_eq;
    use smallvec::smallvec;

    fn plant(id: u32, size: f64, watering: f64) -> Plant {
        Plant {
            id,
            species: format!("sp{}", id),
            scientific_name: format!("Species {}", id),
            types: smallvec![PlantType::Vegetable],
            sun_requirement: crate::catalog::SunRequirement::Medium,
            weekly_watering: watering,
            harvest_days: 60,
            soil_type: "franco".to_string(),
            water_per_kg: 15.0,
            benefits: vec![],
            size,
        }
    }

    #[test]
    fn default_footprint_is_square_root_of_size() {
        let p = plant(1, 0.25, 5.0);
        let inst = PlantInstance::new(&p, 1.0, 1.0, Rotation::R0);
        assert_relative_eq!(inst.width, 0.5);
        assert_relative_eq!(inst.height, 0.5);
        assert_relative_eq!(inst.area(), 0.25);
        assert_eq!(inst.status, PlantStatus::Pending);
    }

    #[test]
    fn center_distance_uses_footprint_centers() {
        let p = plant(1, 1.0, 5.0);
        let a = PlantInstance::new(&p, 0.0, 0.0, Rotation::R0);
        let b = PlantInstance::new(&p, 3.0, 4.0, Rotation::R0);
        assert_relative_eq!(a.center_distance(&b), 5.0);
    }

    #[test]
    fn touching_footprints_do_not_overlap() {
        let p = plant(1, 1.0, 5.0);
        let a = PlantInstance::new(&p, 0.0, 0.0, Rotation::R0);
        let b = PlantInstance::new(&p, 1.0, 0.0, Rotation::R0);
        let c = PlantInstance::new(&p, 0.5, 0.5, Rotation::R0);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
    }

    #[test]
    fn bounds_check_rejects_escaping_boxes() {
        let p = plant(1, 1.0, 5.0);
        let inside = PlantInstance::new(&p, 0.5, 0.5, Rotation::R0);
        let outside = PlantInstance::new(&p, 1.5, 0.5, Rotation::R0);
        assert!(inside.within_plot(2.0, 2.0));
        assert!(!outside.within_plot(2.0, 2.0));
    }

    #[test]
    fn derived_quantities_sum_over_instances() {
        let catalogue =
            Catalogue::new(vec![plant(1, 0.25, 5.0), plant(2, 1.0, 12.0)]).unwrap();
        let mut ind = Individual::new(PlotDimensions::new(4.0, 3.0));
        ind.plants.push(PlantInstance::new(
            catalogue.get(1).unwrap(),
            0.0,
            0.0,
            Rotation::R0,
        ));
        ind.plants.push(PlantInstance::new(
            catalogue.get(2).unwrap(),
            2.0,
            1.0,
            Rotation::R0,
        ));

        assert_eq!(ind.total_plants(), 2);
        assert_relative_eq!(ind.used_area(), 1.25);
        assert_relative_eq!(ind.total_weekly_water(&catalogue), 17.0);
        assert_relative_eq!(ind.total_cost(&catalogue), 62.5);
        assert_relative_eq!(ind.dimensions.total_area, 12.0);
    }
}
