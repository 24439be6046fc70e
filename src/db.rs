use async_trait::async_trait;
use mongodb::{Collection, bson::oid::ObjectId, bson::doc};
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use futures_util::stream::TryStreamExt;
use tracing::debug;

use crate::models::{Owner, Plant};

/// Persistence for plant records. Every read and write is scoped to an owner.
#[async_trait]
pub trait PlantStore: Send + Sync {
    async fn insert(&self, plant: Plant) -> Result<ObjectId>;

    /// All plants of `owner`, newest first.
    async fn list(&self, owner: &Owner) -> Result<Vec<Plant>>;

    async fn get(&self, owner: &Owner, id: &ObjectId) -> Result<Option<Plant>>;

    /// Overwrites `last_watered`. Returns false when no plant matched.
    async fn mark_watered(&self, owner: &Owner, id: &ObjectId, at: DateTime<Utc>) -> Result<bool>;
}

pub struct MongoStore {
    collection: Collection<Plant>,
}

impl MongoStore {
    pub fn new(collection: Collection<Plant>) -> Self {
        Self { collection }
    }
}

#[async_trait]
impl PlantStore for MongoStore {
    async fn insert(&self, plant: Plant) -> Result<ObjectId> {
        let result = self.collection.insert_one(plant).await?;
        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| anyhow!("MongoDB no devolvió un ObjectId"))
    }

    async fn list(&self, owner: &Owner) -> Result<Vec<Plant>> {
        let cursor = self
            .collection
            .find(doc! { "user_id": owner.as_str() })
            .sort(doc! { "created_at": -1 })
            .await?;
        let plants: Vec<Plant> = cursor.try_collect().await?;
        debug!(owner = owner.as_str(), count = plants.len(), "listed plants");
        Ok(plants)
    }

    async fn get(&self, owner: &Owner, id: &ObjectId) -> Result<Option<Plant>> {
        let plant = self
            .collection
            .find_one(doc! { "_id": *id, "user_id": owner.as_str() })
            .await?;
        Ok(plant)
    }

    async fn mark_watered(&self, owner: &Owner, id: &ObjectId, at: DateTime<Utc>) -> Result<bool> {
        let result = self
            .collection
            .update_one(
                doc! { "_id": *id, "user_id": owner.as_str() },
                doc! { "$set": { "last_watered": mongodb::bson::DateTime::from_chrono(at) } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }
}

/// Parses a hex ObjectId coming from the CLI or a URL path.
pub fn parse_plant_id(id: &str) -> Result<ObjectId> {
    ObjectId::parse_str(id).map_err(|e| anyhow!("ID inválido '{}': {}", id, e))
}

#[cfg(test)]
pub mod memory {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// In-process store for flow and handler tests.
    #[derive(Default)]
    pub struct MemoryStore {
        plants: Mutex<Vec<Plant>>,
        fail_inserts: AtomicBool,
    }

    impl MemoryStore {
        pub fn failing_inserts() -> Self {
            let store = Self::default();
            store.fail_inserts.store(true, Ordering::SeqCst);
            store
        }

        pub fn len(&self) -> usize {
            self.plants.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl PlantStore for MemoryStore {
        async fn insert(&self, mut plant: Plant) -> Result<ObjectId> {
            if self.fail_inserts.load(Ordering::SeqCst) {
                return Err(anyhow!("insert rejected"));
            }
            let id = ObjectId::new();
            plant.id = Some(id);
            self.plants.lock().unwrap().push(plant);
            Ok(id)
        }

        async fn list(&self, owner: &Owner) -> Result<Vec<Plant>> {
            let mut plants: Vec<Plant> = self
                .plants
                .lock()
                .unwrap()
                .iter()
                .filter(|p| p.user_id == owner.as_str())
                .cloned()
                .collect();
            plants.reverse();
            plants.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(plants)
        }

        async fn get(&self, owner: &Owner, id: &ObjectId) -> Result<Option<Plant>> {
            Ok(self
                .plants
                .lock()
                .unwrap()
                .iter()
                .find(|p| p.id.as_ref() == Some(id) && p.user_id == owner.as_str())
                .cloned())
        }

        async fn mark_watered(&self, owner: &Owner, id: &ObjectId, at: DateTime<Utc>) -> Result<bool> {
            let mut plants = self.plants.lock().unwrap();
            match plants
                .iter_mut()
                .find(|p| p.id.as_ref() == Some(id) && p.user_id == owner.as_str())
            {
                Some(plant) => {
                    plant.last_watered = Some(at);
                    Ok(true)
                }
                None => Ok(false),
            }
        }
    }
}
