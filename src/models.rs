use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;

use crate::watering::{StatusReport, WateringStatus};

/// Principal that owns a set of plants. Every store operation is scoped to one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Owner(String);

impl Owner {
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        let id = id.trim();
        if id.is_empty() {
            None
        } else {
            Some(Owner(id.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Plant {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub scientific_name: String,
    #[serde(default)]
    pub family: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub watering_interval: Option<u32>,
    #[serde(default, with = "optional_bson_datetime")]
    pub last_watered: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sunlight: Option<String>,
    #[serde(default)]
    pub soil: Option<String>,
    #[serde(default)]
    pub harvest: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

/// Stores timestamps as BSON datetimes so `created_at` sorts chronologically.
mod optional_bson_datetime {
    use chrono::{DateTime, Utc};
    use mongodb::bson;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error> {
        value.map(bson::DateTime::from_chrono).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        Ok(Option::<bson::DateTime>::deserialize(deserializer)?.map(|dt| dt.to_chrono()))
    }
}

impl Plant {
    pub fn watering_status(&self, now: DateTime<Utc>) -> WateringStatus {
        WateringStatus::evaluate(self.watering_interval, self.last_watered, now)
    }

    pub fn has_advice(&self) -> bool {
        self.sunlight.is_some() || self.soil.is_some() || self.harvest.is_some() || self.notes.is_some()
    }
}

/// JSON shape of a plant on the HTTP API: hex id plus its current status.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PlantView {
    pub id: String,
    pub name: String,
    pub scientific_name: String,
    pub family: String,
    pub image: Option<String>,
    pub watering_interval: Option<u32>,
    pub last_watered: Option<DateTime<Utc>>,
    pub sunlight: Option<String>,
    pub soil: Option<String>,
    pub harvest: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub watering: StatusReport,
}

impl PlantView {
    pub fn new(plant: Plant, now: DateTime<Utc>) -> Self {
        let watering = plant.watering_status(now).report();
        PlantView {
            id: plant.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: plant.name,
            scientific_name: plant.scientific_name,
            family: plant.family,
            image: plant.image,
            watering_interval: plant.watering_interval,
            last_watered: plant.last_watered,
            sunlight: plant.sunlight,
            soil: plant.soil,
            harvest: plant.harvest,
            notes: plant.notes,
            created_at: plant.created_at,
            watering,
        }
    }
}
