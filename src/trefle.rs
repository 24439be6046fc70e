//! Trefle client: name search followed by a species detail fetch.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};

use crate::error::AppError;

/// Summary record (first search hit) and detail record (species fetch).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeciesMatch {
    pub plant: Value,
    pub details: Value,
}

impl SpeciesMatch {
    pub fn common_name(&self) -> Option<String> {
        text(self.plant.get("common_name"))
    }

    pub fn family(&self) -> Option<String> {
        text(self.plant.get("family"))
    }

    pub fn image_url(&self) -> Option<String> {
        text(self.plant.get("image_url"))
    }

    pub fn scientific_name(&self) -> Option<String> {
        text(self.details.pointer("/data/scientific_name"))
    }

    pub fn shade_tolerance(&self) -> Option<String> {
        self.growth("shade_tolerance")
    }

    pub fn light(&self) -> Option<String> {
        self.growth("light")
    }

    pub fn soil_texture(&self) -> Option<String> {
        self.growth("soil_texture")
    }

    pub fn harvest_time(&self) -> Option<String> {
        self.growth("harvest_time")
    }

    pub fn description(&self) -> Option<String> {
        self.growth("description")
    }

    // Plant records nest growth under main_species; species records carry it directly.
    fn growth(&self, field: &str) -> Option<String> {
        text(self.details.pointer(&format!("/data/main_species/growth/{}", field)))
            .or_else(|| text(self.details.pointer(&format!("/data/growth/{}", field))))
    }
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[async_trait]
pub trait SpeciesCatalog: Send + Sync {
    /// Fails with [`AppError::NotFound`] when the search has no results.
    async fn lookup(&self, name: &str) -> Result<SpeciesMatch, AppError>;
}

pub struct TrefleClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl TrefleClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    async fn get_json(&self, url: String, query: &[(&str, &str)]) -> Result<Value, AppError> {
        let response = self.http.get(&url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            error!(%status, url = %url, "trefle request failed");
            return Err(AppError::Upstream(format!("trefle responded {}", status)));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl SpeciesCatalog for TrefleClient {
    async fn lookup(&self, name: &str) -> Result<SpeciesMatch, AppError> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| AppError::Upstream("TREFLE_TOKEN is not set".into()))?;

        let search = self
            .get_json(
                format!("{}/api/v1/plants/search", self.base_url),
                &[("token", token), ("q", name)],
            )
            .await?;

        let plant = match search.pointer("/data/0") {
            Some(plant) => plant.clone(),
            None => {
                info!(name, "no trefle match");
                return Err(AppError::NotFound("no plant found".into()));
            }
        };
        let id = match plant.get("id") {
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::String(s)) => s.clone(),
            _ => return Err(AppError::Upstream("trefle search hit has no id".into())),
        };

        let details = self
            .get_json(
                format!("{}/api/v1/species/{}", self.base_url, id),
                &[("token", token)],
            )
            .await?;

        info!(name, species_id = %id, "trefle lookup finished");
        Ok(SpeciesMatch { plant, details })
    }
}
