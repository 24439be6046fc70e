//! Add-plant flow: identify, look up, derive the watering interval, upload,
//! insert. Each step waits for the previous one.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::db::PlantStore;
use crate::error::AppError;
use crate::models::{Owner, Plant};
use crate::photos::{photo_key, PhotoStore};
use crate::plant_id::PlantIdentifier;
use crate::trefle::{SpeciesCatalog, SpeciesMatch};
use crate::watering::watering_interval;

#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    Added(Plant),
    /// Plant.id gave no usable suggestion.
    NotIdentified,
    /// Trefle had no match for this name. Nothing was uploaded or stored.
    SpeciesNotFound { name: String },
}

impl AddOutcome {
    pub fn status_message(&self) -> String {
        match self {
            AddOutcome::Added(plant) => format!("Planta agregada: {}", plant.name),
            AddOutcome::NotIdentified => {
                "Planta no identificada automáticamente; puedes agregarla por nombre.".to_string()
            }
            AddOutcome::SpeciesNotFound { name } => {
                format!("Planta no encontrada en Trefle: {}", name)
            }
        }
    }
}

/// Collapses a flow result into the single status line shown to the user.
pub fn status_for(result: &Result<AddOutcome, AppError>) -> String {
    match result {
        Ok(outcome) => outcome.status_message(),
        Err(e) => format!("Error: {}", e),
    }
}

pub struct AddPlantFlow<'a> {
    pub identifier: &'a dyn PlantIdentifier,
    pub catalog: &'a dyn SpeciesCatalog,
    pub photos: &'a dyn PhotoStore,
    pub store: &'a dyn PlantStore,
}

impl AddPlantFlow<'_> {
    pub async fn add_from_photo(
        &self,
        owner: &Owner,
        filename: &str,
        image: &[u8],
    ) -> Result<AddOutcome, AppError> {
        if image.is_empty() {
            return Err(AppError::Validation("image is empty".into()));
        }

        info!(owner = owner.as_str(), filename, "identifying photo");
        let identification = self.identifier.identify(&STANDARD.encode(image)).await?;
        let name = match identification.name {
            Some(name) => name,
            None => return Ok(AddOutcome::NotIdentified),
        };

        info!(name = %name, "plant identified, fetching species data");
        let species = match self.lookup(&name).await? {
            Some(species) => species,
            None => return Ok(AddOutcome::SpeciesNotFound { name }),
        };

        let now = Utc::now();
        let key = photo_key(owner, now, filename);
        self.photos
            .put(&key, image)
            .map_err(|e| AppError::Storage(e.to_string()))?;
        let image_url = self.photos.public_url(&key);
        info!(key = %key, "photo uploaded");

        let plant = build_record(owner, &name, &species, Some(image_url), now);
        match self.insert(plant).await {
            Ok(plant) => Ok(AddOutcome::Added(plant)),
            Err(e) => {
                // Upload and insert are not atomic; the photo stays behind.
                warn!(key = %key, error = %e, "plant insert failed, photo left without a record");
                Err(e)
            }
        }
    }

    pub async fn add_by_name(&self, owner: &Owner, name: &str) -> Result<AddOutcome, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("name is required".into()));
        }

        info!(owner = owner.as_str(), name, "adding plant by name");
        let species = match self.lookup(name).await? {
            Some(species) => species,
            None => return Ok(AddOutcome::SpeciesNotFound { name: name.to_string() }),
        };

        let image = species.image_url();
        let plant = build_record(owner, name, &species, image, Utc::now());
        Ok(AddOutcome::Added(self.insert(plant).await?))
    }

    async fn lookup(&self, name: &str) -> Result<Option<SpeciesMatch>, AppError> {
        match self.catalog.lookup(name).await {
            Ok(species) => Ok(Some(species)),
            Err(AppError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn insert(&self, mut plant: Plant) -> Result<Plant, AppError> {
        let id = self.store.insert(plant.clone()).await?;
        plant.id = Some(id);
        info!(id = %id, name = %plant.name, "plant stored");
        Ok(plant)
    }
}

fn build_record(
    owner: &Owner,
    searched_name: &str,
    species: &SpeciesMatch,
    image: Option<String>,
    now: DateTime<Utc>,
) -> Plant {
    let tolerance = species.shade_tolerance();
    Plant {
        id: None,
        user_id: owner.as_str().to_string(),
        name: species.common_name().unwrap_or_else(|| searched_name.to_string()),
        scientific_name: species.scientific_name().unwrap_or_default(),
        family: species.family().unwrap_or_default(),
        image,
        watering_interval: Some(watering_interval(tolerance.as_deref())),
        last_watered: Some(now),
        sunlight: species.light(),
        soil: species.soil_texture(),
        harvest: species.harvest_time(),
        notes: species.description(),
        created_at: now,
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::json;

    use crate::error::AppError;
    use crate::plant_id::{Identification, PlantIdentifier};
    use crate::trefle::{SpeciesCatalog, SpeciesMatch};

    pub struct FakeIdentifier(pub Option<&'static str>);

    #[async_trait]
    impl PlantIdentifier for FakeIdentifier {
        async fn identify(&self, image: &str) -> Result<Identification, AppError> {
            assert!(!image.starts_with("data:"));
            Ok(Identification {
                name: self.0.map(str::to_string),
                raw: json!({}),
            })
        }
    }

    #[derive(Default)]
    pub struct FakeCatalog {
        pub species: Option<SpeciesMatch>,
        pub calls: AtomicUsize,
    }

    #[async_trait]
    impl SpeciesCatalog for FakeCatalog {
        async fn lookup(&self, _name: &str) -> Result<SpeciesMatch, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.species
                .clone()
                .ok_or_else(|| AppError::NotFound("no plant found".into()))
        }
    }

    /// Both gateways, always failing as if the upstream answered 502.
    pub struct FailingUpstream;

    #[async_trait]
    impl PlantIdentifier for FailingUpstream {
        async fn identify(&self, _image: &str) -> Result<Identification, AppError> {
            Err(AppError::Upstream("plant.id responded 502 Bad Gateway".into()))
        }
    }

    #[async_trait]
    impl SpeciesCatalog for FailingUpstream {
        async fn lookup(&self, _name: &str) -> Result<SpeciesMatch, AppError> {
            Err(AppError::Upstream("trefle responded 502 Bad Gateway".into()))
        }
    }

    pub fn basil(tolerance: Option<&str>) -> SpeciesMatch {
        SpeciesMatch {
            plant: json!({
                "id": 1134,
                "common_name": "Basil",
                "family": "Lamiaceae",
                "image_url": "https://bs.plantnet.org/image/o/basil.jpg"
            }),
            details: json!({
                "data": {
                    "scientific_name": "Ocimum basilicum",
                    "main_species": { "growth": {
                        "shade_tolerance": tolerance,
                        "light": 8,
                        "description": "Hierba aromática"
                    } }
                }
            }),
        }
    }
}
