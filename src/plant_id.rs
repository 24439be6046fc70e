//! Plant.id client: sends a photo, gets back a best-guess species name.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};

use crate::error::AppError;

/// Result of an identification request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identification {
    pub name: Option<String>,
    pub raw: Value,
}

#[async_trait]
pub trait PlantIdentifier: Send + Sync {
    /// `image` is base64 without a `data:` prefix.
    async fn identify(&self, image: &str) -> Result<Identification, AppError>;
}

pub struct PlantIdClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl PlantIdClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl PlantIdentifier for PlantIdClient {
    async fn identify(&self, image: &str) -> Result<Identification, AppError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Upstream("PLANT_ID_KEY is not set".into()))?;

        let body = serde_json::json!({
            "images": [image],
            "modifiers": ["similar_images"],
            "plant_details": ["common_names", "taxonomy"],
        });

        let response = self
            .http
            .post(format!("{}/v2/identify", self.base_url))
            .header("Api-Key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            error!(%status, "plant.id rejected the identification request");
            return Err(AppError::Upstream(format!("plant.id responded {}", status)));
        }

        let raw: Value = response.json().await?;
        let name = best_guess(&raw);
        info!(name = ?name, "plant.id identification finished");
        Ok(Identification { name, raw })
    }
}

/// First suggestion's `plant_name`, else its first common name.
pub fn best_guess(raw: &Value) -> Option<String> {
    let suggestion = raw.get("suggestions")?.get(0)?;
    let non_empty = |v: &Value| v.as_str().filter(|s| !s.is_empty()).map(str::to_string);
    suggestion
        .get("plant_name")
        .and_then(non_empty)
        .or_else(|| {
            suggestion
                .pointer("/plant_details/common_names/0")
                .and_then(non_empty)
        })
}
