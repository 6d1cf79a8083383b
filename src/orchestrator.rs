//! Request orchestration
//!
//! Drives one generation request end to end: normalize the request, run the
//! plant selector and the genetic algorithm, validate the surviving layouts
//! and assemble the ranked response. Also hosts the optional collaborator
//! ports (user profiles, notifications) the engine consumes but does not
//! implement itself; notification failures are logged and swallowed.

use std::time::Instant;

use chrono::Utc;
use tracing::{info, warn};

use crate::catalog::Catalogue;
use crate::compatibility::CompatibilityIndex;
use crate::data::{CatalogueStore, CompatibilityStore};
use crate::errors::Result;
use crate::ga::GeneticAlgorithm;
use crate::request::GardenRequest;
use crate::response::{
    build_solution, GardenResponse, ResponseMetadata, SelectedPlantView, WeightsView,
};
use crate::rng::GardenRng;
use crate::validator::validate_layout;

/// Minimal profile the engine may consult for a missing experience level.
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub experience_level: u8,
}

/// Optional user-profile collaborator.
pub trait UserProfileStore: Send + Sync {
    fn get_by_id(&self, user_id: &str) -> Option<UserProfile>;
}

/// Optional fire-and-forget notification collaborator.
pub trait NotificationSink: Send + Sync {
    fn send(
        &self,
        user_id: &str,
        title: &str,
        body: &str,
        data: &serde_json::Value,
    ) -> anyhow::Result<()>;
}

/// Sink that records notifications in the log stream; useful as a default
/// and in tests.
#[derive(Debug, Default)]
pub struct LoggingNotificationSink;

impl NotificationSink for LoggingNotificationSink {
    fn send(
        &self,
        user_id: &str,
        title: &str,
        body: &str,
        _data: &serde_json::Value,
    ) -> anyhow::Result<()> {
        info!(user_id, title, body, "notification");
        Ok(())
    }
}

/// One orchestrator serves many requests; the catalogue and compatibility
/// index are loaded once and shared immutably.
pub struct Orchestrator {
    catalogue: Catalogue,
    compatibility: CompatibilityIndex,
    profiles: Option<Box<dyn UserProfileStore>>,
    notifications: Option<Box<dyn NotificationSink>>,
}

impl Orchestrator {
    pub fn new(catalogue: Catalogue, compatibility: CompatibilityIndex) -> Self {
        Self {
            catalogue,
            compatibility,
            profiles: None,
            notifications: None,
        }
    }

    /// Load the catalogue and build the compatibility index from stores.
    /// Failing here is startup-fatal.
    pub fn from_stores(
        catalogue_store: &dyn CatalogueStore,
        compatibility_store: &dyn CompatibilityStore,
    ) -> Result<Self> {
        let catalogue = Catalogue::new(catalogue_store.list_all()?)?;
        let entries = compatibility_store.load_all()?;
        let compatibility = CompatibilityIndex::from_entries(&entries);
        info!(
            plants = catalogue.len(),
            pairs = compatibility.len(),
            "catalogue and compatibility index loaded"
        );
        Ok(Self::new(catalogue, compatibility))
    }

    pub fn with_profiles(mut self, profiles: Box<dyn UserProfileStore>) -> Self {
        self.profiles = Some(profiles);
        self
    }

    pub fn with_notifications(mut self, notifications: Box<dyn NotificationSink>) -> Self {
        self.notifications = Some(notifications);
        self
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    /// Handle one generation request.
    pub fn run(&self, request: &GardenRequest) -> Result<GardenResponse> {
        let started = Instant::now();

        let mut rng = match request.seed {
            Some(seed) => GardenRng::seeded(seed),
            None => GardenRng::from_entropy(),
        };

        let profile_experience = if request.user_experience.is_none() {
            self.profiles
                .as_ref()
                .and_then(|store| store.get_by_id(&request.user_id))
                .map(|profile| profile.experience_level)
        } else {
            None
        };

        let normalized = request.normalize(profile_experience, &mut rng)?;
        info!(
            user_id = %normalized.user_id,
            objective = ?normalized.objective,
            area = normalized.constraints.max_area,
            "generation request accepted"
        );

        let mut engine = GeneticAlgorithm::new(
            &self.catalogue,
            &self.compatibility,
            &normalized.constraints,
            normalized.objective,
            normalized.season,
            normalized.ga.clone(),
            rng,
        )?;

        let selected_plants: Vec<SelectedPlantView> = engine
            .pool()
            .iter()
            .map(|plant| SelectedPlantView {
                id: plant.id,
                species: plant.species.clone(),
                scientific_name: plant.scientific_name.clone(),
                types: plant.types.iter().copied().collect(),
            })
            .collect();

        let outcome = engine.evolve()?;

        let generated_at = Utc::now();
        let solutions: Vec<_> = outcome
            .top
            .iter()
            .enumerate()
            .map(|(i, individual)| {
                let report = validate_layout(
                    individual,
                    &self.catalogue,
                    &self.compatibility,
                    &normalized.constraints,
                    normalized.maintenance_minutes,
                );
                build_solution(
                    i + 1,
                    individual,
                    &self.catalogue,
                    &self.compatibility,
                    report,
                    generated_at,
                )
            })
            .collect();

        let response = GardenResponse {
            success: !solutions.is_empty(),
            solutions,
            metadata: ResponseMetadata {
                execution_time_ms: started.elapsed().as_millis() as u64,
                total_generations: outcome.generations,
                convergence_generation: outcome.convergence_generation,
                population_size: normalized.ga.population_size,
                stopping_reason: outcome.stopping_reason,
                objective: normalized.objective,
                applied_weights: WeightsView::for_objective(normalized.objective),
                selected_plants,
            },
        };

        self.notify(&normalized.user_id, &response);
        Ok(response)
    }

    /// Fire-and-forget completion notice; failures never propagate.
    fn notify(&self, user_id: &str, response: &GardenResponse) {
        let Some(sink) = self.notifications.as_ref() else {
            return;
        };
        let best = response
            .solutions
            .first()
            .map(|s| s.metrics.fitness)
            .unwrap_or(0.0);
        let data = serde_json::json!({
            "solutions": response.solutions.len(),
            "bestFitness": best,
            "stoppingReason": response.metadata.stopping_reason,
        });
        let body = format!(
            "Se generaron {} propuestas de huerto (mejor aptitud {:.2})",
            response.solutions.len(),
            best
        );
        if let Err(error) = sink.send(user_id, "Tu huerto está listo", &body, &data) {
            warn!(user_id, %error, "notification delivery failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CompatibilityEntry, Plant, PlantType, SunRequirement};
    use crate::data::{InMemoryCatalogueStore, InMemoryCompatibilityStore};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn plant(id: u32, species: &str, types: &[PlantType]) -> Plant {
        Plant {
            id,
            species: species.to_string(),
            scientific_name: format!("{} sp.", species),
            types: types.iter().copied().collect(),
            sun_requirement: SunRequirement::Medium,
            weekly_watering: 8.0,
            harvest_days: 60,
            soil_type: "franco".to_string(),
            water_per_kg: 15.0,
            benefits: vec![],
            size: 0.16,
        }
    }

    fn orchestrator() -> Orchestrator {
        let catalogue_store = InMemoryCatalogueStore::new(vec![
            plant(1, "Cilantro", &[PlantType::Aromatic]),
            plant(2, "Tomate", &[PlantType::Vegetable]),
            plant(3, "Albahaca", &[PlantType::Aromatic, PlantType::Medicinal]),
        ]);
        let compatibility_store = InMemoryCompatibilityStore::new(vec![
            CompatibilityEntry {
                species1: "Cilantro".to_string(),
                species2: "Tomate".to_string(),
                score: 1.0,
            },
            CompatibilityEntry {
                species1: "Cilantro".to_string(),
                species2: "Albahaca".to_string(),
                score: 1.0,
            },
            CompatibilityEntry {
                species1: "Tomate".to_string(),
                species2: "Albahaca".to_string(),
                score: 0.8,
            },
        ]);
        Orchestrator::from_stores(&catalogue_store, &compatibility_store).unwrap()
    }

    struct FailingSink(Arc<AtomicUsize>);

    impl NotificationSink for FailingSink {
        fn send(
            &self,
            _user_id: &str,
            _title: &str,
            _body: &str,
            _data: &serde_json::Value,
        ) -> anyhow::Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("downstream unavailable")
        }
    }

    struct FixedProfiles(u8);

    impl UserProfileStore for FixedProfiles {
        fn get_by_id(&self, _user_id: &str) -> Option<UserProfile> {
            Some(UserProfile { experience_level: self.0 })
        }
    }

    fn seeded_request() -> GardenRequest {
        GardenRequest {
            user_id: "u".to_string(),
            user_experience: Some(2),
            seed: Some(42),
            ..Default::default()
        }
    }

    #[test]
    fn run_produces_ranked_solutions() {
        let response = orchestrator().run(&seeded_request()).unwrap();
        assert!(response.success);
        assert!(!response.solutions.is_empty());
        for (i, solution) in response.solutions.iter().enumerate() {
            assert_eq!(solution.rank, i + 1);
        }
        for pair in response.solutions.windows(2) {
            assert!(pair[0].metrics.fitness >= pair[1].metrics.fitness);
        }
        assert_eq!(response.metadata.selected_plants.len(), 3);
    }

    #[test]
    fn notification_failure_is_swallowed() {
        let calls = Arc::new(AtomicUsize::new(0));
        let orchestrator =
            orchestrator().with_notifications(Box::new(FailingSink(calls.clone())));
        let response = orchestrator.run(&seeded_request()).unwrap();
        assert!(response.success);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn profile_store_backfills_experience() {
        let orchestrator = orchestrator().with_profiles(Box::new(FixedProfiles(3)));
        let mut request = seeded_request();
        request.user_experience = None;
        let response = orchestrator.run(&request).unwrap();
        assert!(response.success);
    }

    #[test]
    fn missing_experience_without_profile_is_a_validation_error() {
        let mut request = seeded_request();
        request.user_experience = None;
        let err = orchestrator().run(&request).unwrap_err();
        assert!(matches!(err, crate::errors::EngineError::Validation(_)));
    }
}
