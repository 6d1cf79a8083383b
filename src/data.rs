//! Catalogue and compatibility stores
//!
//! The engine consumes two storage ports: the plant catalogue and the
//! pairwise compatibility matrix. Both are loaded once at startup; a load
//! failure is fatal. Shipped implementations: in-memory stores for tests
//! and embedding, and CSV-backed stores read with Polars.
//!
//! CSV list columns (`types`, `benefits`) are pipe-separated strings and
//! split after the frame is materialized.

use std::path::{Path, PathBuf};

use polars::prelude::*;
use smallvec::SmallVec;

use crate::catalog::{CompatibilityEntry, Plant, PlantType, SunRequirement};
use crate::errors::{EngineError, Result};

/// Plant catalogue port.
pub trait CatalogueStore: Send + Sync {
    fn list_all(&self) -> Result<Vec<Plant>>;

    fn find_by_id(&self, id: u32) -> Result<Option<Plant>> {
        Ok(self.list_all()?.into_iter().find(|p| p.id == id))
    }
}

/// Compatibility matrix port; consumed once to build the index.
pub trait CompatibilityStore: Send + Sync {
    fn load_all(&self) -> Result<Vec<CompatibilityEntry>>;
}

/// Catalogue held directly in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalogueStore {
    plants: Vec<Plant>,
}

impl InMemoryCatalogueStore {
    pub fn new(plants: Vec<Plant>) -> Self {
        Self { plants }
    }
}

impl CatalogueStore for InMemoryCatalogueStore {
    fn list_all(&self) -> Result<Vec<Plant>> {
        Ok(self.plants.clone())
    }
}

/// Compatibility entries held directly in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCompatibilityStore {
    entries: Vec<CompatibilityEntry>,
}

impl InMemoryCompatibilityStore {
    pub fn new(entries: Vec<CompatibilityEntry>) -> Self {
        Self { entries }
    }
}

impl CompatibilityStore for InMemoryCompatibilityStore {
    fn load_all(&self) -> Result<Vec<CompatibilityEntry>> {
        Ok(self.entries.clone())
    }
}

/// CSV-backed catalogue store.
///
/// Expected header: `id, species, scientific_name, types, sun_requirement,
/// weekly_watering, harvest_days, soil_type, water_per_kg, benefits, size`.
#[derive(Debug, Clone)]
pub struct CsvCatalogueStore {
    path: PathBuf,
}

impl CsvCatalogueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CatalogueStore for CsvCatalogueStore {
    fn list_all(&self) -> Result<Vec<Plant>> {
        let df = read_csv(&self.path)?;

        let ids = df.column("id").map_err(catalogue_err)?;
        let species = str_column(&df, "species")?;
        let scientific = str_column(&df, "scientific_name")?;
        let types = str_column(&df, "types")?;
        let sun = str_column(&df, "sun_requirement")?;
        let watering = df.column("weekly_watering").map_err(catalogue_err)?;
        let harvest = df.column("harvest_days").map_err(catalogue_err)?;
        let soil = str_column(&df, "soil_type")?;
        let water_per_kg = df.column("water_per_kg").map_err(catalogue_err)?;
        let benefits = str_column(&df, "benefits")?;
        let size = df.column("size").map_err(catalogue_err)?;

        let mut plants = Vec::with_capacity(df.height());
        for idx in 0..df.height() {
            let row = || format!("row {} of {:?}", idx, self.path);

            let plant = Plant {
                id: numeric_at(ids, idx)
                    .ok_or_else(|| EngineError::catalogue(format!("missing id at {}", row())))?
                    as u32,
                species: required_str(species, idx, "species", &self.path)?,
                scientific_name: required_str(scientific, idx, "scientific_name", &self.path)?,
                types: parse_types(types.get(idx).unwrap_or(""))?,
                sun_requirement: parse_sun(sun.get(idx).unwrap_or("medium"))?,
                weekly_watering: numeric_at(watering, idx).unwrap_or(0.0),
                harvest_days: numeric_at(harvest, idx).unwrap_or(1.0) as u32,
                soil_type: required_str(soil, idx, "soil_type", &self.path)?,
                water_per_kg: numeric_at(water_per_kg, idx).unwrap_or(0.0),
                benefits: split_list(benefits.get(idx).unwrap_or("")),
                size: numeric_at(size, idx).ok_or_else(|| {
                    EngineError::catalogue(format!("missing size at {}", row()))
                })?,
            };
            plants.push(plant);
        }
        Ok(plants)
    }
}

/// CSV-backed compatibility store.
///
/// Expected header: `species1, species2, score`.
#[derive(Debug, Clone)]
pub struct CsvCompatibilityStore {
    path: PathBuf,
}

impl CsvCompatibilityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CompatibilityStore for CsvCompatibilityStore {
    fn load_all(&self) -> Result<Vec<CompatibilityEntry>> {
        let df = read_csv(&self.path)?;

        let species1 = str_column(&df, "species1")?;
        let species2 = str_column(&df, "species2")?;
        let score = df.column("score").map_err(catalogue_err)?;

        let mut entries = Vec::with_capacity(df.height());
        for idx in 0..df.height() {
            let (Some(a), Some(b)) = (species1.get(idx), species2.get(idx)) else {
                continue;
            };
            let value = numeric_at(score, idx).unwrap_or(0.0);
            if !(-1.0..=1.0).contains(&value) {
                return Err(EngineError::catalogue(format!(
                    "compatibility score {} for ({}, {}) outside [-1, 1]",
                    value, a, b
                )));
            }
            entries.push(CompatibilityEntry {
                species1: a.to_string(),
                species2: b.to_string(),
                score: value,
            });
        }
        Ok(entries)
    }
}

fn read_csv(path: &Path) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| EngineError::catalogue(format!("failed to open {:?}: {}", path, e)))?
        .finish()
        .map_err(|e| EngineError::catalogue(format!("failed to parse {:?}: {}", path, e)))
}

fn catalogue_err(error: PolarsError) -> EngineError {
    EngineError::catalogue(error.to_string())
}

fn str_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a StringChunked> {
    df.column(name)
        .map_err(catalogue_err)?
        .str()
        .map_err(|e| EngineError::catalogue(format!("column '{}': {}", name, e)))
}

fn required_str(
    column: &StringChunked,
    idx: usize,
    name: &str,
    path: &Path,
) -> Result<String> {
    column
        .get(idx)
        .map(|s| s.to_string())
        .ok_or_else(|| EngineError::catalogue(format!("missing {} at row {} of {:?}", name, idx, path)))
}

/// Numeric cell that tolerates integer or float column inference.
fn numeric_at(column: &Column, idx: usize) -> Option<f64> {
    if let Ok(ca) = column.f64() {
        return ca.get(idx);
    }
    if let Ok(ca) = column.i64() {
        return ca.get(idx).map(|v| v as f64);
    }
    if let Ok(ca) = column.i32() {
        return ca.get(idx).map(|v| v as f64);
    }
    None
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split('|')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_types(raw: &str) -> Result<SmallVec<[PlantType; 4]>> {
    let mut types = SmallVec::new();
    for tag in split_list(raw) {
        let parsed = match tag.to_lowercase().as_str() {
            "vegetable" => PlantType::Vegetable,
            "medicinal" => PlantType::Medicinal,
            "aromatic" => PlantType::Aromatic,
            "ornamental" => PlantType::Ornamental,
            other => {
                return Err(EngineError::catalogue(format!(
                    "unknown plant type '{}'",
                    other
                )))
            }
        };
        if !types.contains(&parsed) {
            types.push(parsed);
        }
    }
    Ok(types)
}

fn parse_sun(raw: &str) -> Result<SunRequirement> {
    match raw.to_lowercase().as_str() {
        "low" => Ok(SunRequirement::Low),
        "medium" => Ok(SunRequirement::Medium),
        "high" => Ok(SunRequirement::High),
        other => Err(EngineError::catalogue(format!(
            "unknown sun requirement '{}'",
            other
        ))),
    }
}
