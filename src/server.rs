//! HTTP surface: the identify / trefle proxies, the plant endpoints and photo
//! serving.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, FromRequestParts, Path, Query, State};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::db::{parse_plant_id, PlantStore};
use crate::error::AppError;
use crate::flow::{status_for, AddOutcome, AddPlantFlow};
use crate::models::{Owner, PlantView};
use crate::photos::PhotoStore;
use crate::plant_id::{Identification, PlantIdentifier};
use crate::trefle::{SpeciesCatalog, SpeciesMatch};

pub const OWNER_HEADER: &str = "x-owner-id";

/// Request body cap for routes that carry a base64 photo inside JSON.
/// 20 MiB of base64 holds a photo of roughly 15 MiB.
pub const PHOTO_BODY_LIMIT: usize = 20 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub identifier: Arc<dyn PlantIdentifier>,
    pub catalog: Arc<dyn SpeciesCatalog>,
    pub photos: Arc<dyn PhotoStore>,
    pub store: Arc<dyn PlantStore>,
}

impl AppState {
    pub fn flow(&self) -> AddPlantFlow<'_> {
        AddPlantFlow {
            identifier: self.identifier.as_ref(),
            catalog: self.catalog.as_ref(),
            photos: self.photos.as_ref(),
            store: self.store.as_ref(),
        }
    }
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/identify",
            post(identify).layer(DefaultBodyLimit::max(PHOTO_BODY_LIMIT)),
        )
        .route("/api/trefle", get(trefle))
        .route("/api/plants", get(list_plants).post(add_by_name))
        .route(
            "/api/plants/photo",
            post(add_from_photo).layer(DefaultBodyLimit::max(PHOTO_BODY_LIMIT)),
        )
        .route("/api/plants/{id}", get(get_plant))
        .route("/api/plants/{id}/water", post(water_plant))
        .route("/photos/{*key}", get(photo))
        .with_state(state)
}

pub async fn serve(state: AppState, listen: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(listen).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, routes(state)).await?;
    Ok(())
}

impl<S: Send + Sync> FromRequestParts<S> for Owner {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(OWNER_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(Owner::new)
            .ok_or_else(|| AppError::Unauthorized(format!("{} header required", OWNER_HEADER)))
    }
}

#[derive(Deserialize)]
struct IdentifyRequest {
    image: Option<String>,
}

async fn identify(
    State(state): State<AppState>,
    Json(req): Json<IdentifyRequest>,
) -> Result<Json<Identification>, AppError> {
    let image = req
        .image
        .filter(|i| !i.is_empty())
        .ok_or_else(|| AppError::Validation("image required".into()))?;
    let result = state.identifier.identify(&image).await;
    if let Err(e) = &result {
        error!(error = %e, "identify failed");
    }
    Ok(Json(result?))
}

#[derive(Deserialize)]
struct TrefleQuery {
    name: Option<String>,
}

async fn trefle(
    State(state): State<AppState>,
    Query(query): Query<TrefleQuery>,
) -> Result<Json<SpeciesMatch>, AppError> {
    let name = query
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| AppError::Validation("name query required".into()))?;
    Ok(Json(state.catalog.lookup(&name).await?))
}

async fn list_plants(
    State(state): State<AppState>,
    owner: Owner,
) -> Result<Json<Vec<PlantView>>, AppError> {
    let now = Utc::now();
    let plants = state.store.list(&owner).await?;
    Ok(Json(plants.into_iter().map(|p| PlantView::new(p, now)).collect()))
}

async fn get_plant(
    State(state): State<AppState>,
    owner: Owner,
    Path(id): Path<String>,
) -> Result<Json<PlantView>, AppError> {
    let id = parse_plant_id(&id).map_err(|e| AppError::Validation(e.to_string()))?;
    let plant = state
        .store
        .get(&owner, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("plant not found".into()))?;
    Ok(Json(PlantView::new(plant, Utc::now())))
}

async fn water_plant(
    State(state): State<AppState>,
    owner: Owner,
    Path(id): Path<String>,
) -> Result<Json<PlantView>, AppError> {
    let id = parse_plant_id(&id).map_err(|e| AppError::Validation(e.to_string()))?;
    let now = Utc::now();
    if !state.store.mark_watered(&owner, &id, now).await? {
        return Err(AppError::NotFound("plant not found".into()));
    }
    info!(owner = owner.as_str(), id = %id, "plant watered");
    let plant = state
        .store
        .get(&owner, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("plant not found".into()))?;
    Ok(Json(PlantView::new(plant, now)))
}

#[derive(Serialize)]
struct AddResponse {
    status: String,
    plant: Option<PlantView>,
}

/// Not-found and not-identified are answered with 200 and a status line; only
/// validation and upstream/storage failures become error responses.
fn add_response(result: Result<AddOutcome, AppError>) -> Result<Json<AddResponse>, AppError> {
    let status = status_for(&result);
    let plant = match result? {
        AddOutcome::Added(plant) => Some(PlantView::new(plant, Utc::now())),
        AddOutcome::NotIdentified | AddOutcome::SpeciesNotFound { .. } => None,
    };
    Ok(Json(AddResponse { status, plant }))
}

#[derive(Deserialize)]
struct AddByNameRequest {
    name: Option<String>,
}

async fn add_by_name(
    State(state): State<AppState>,
    owner: Owner,
    Json(req): Json<AddByNameRequest>,
) -> Result<Json<AddResponse>, AppError> {
    let name = req.name.unwrap_or_default();
    add_response(state.flow().add_by_name(&owner, &name).await)
}

#[derive(Deserialize)]
struct AddFromPhotoRequest {
    image: Option<String>,
    filename: Option<String>,
}

async fn add_from_photo(
    State(state): State<AppState>,
    owner: Owner,
    Json(req): Json<AddFromPhotoRequest>,
) -> Result<Json<AddResponse>, AppError> {
    let image = req
        .image
        .filter(|i| !i.is_empty())
        .ok_or_else(|| AppError::Validation("image required".into()))?;
    let bytes = STANDARD
        .decode(strip_data_uri(&image))
        .map_err(|e| AppError::Validation(format!("image is not valid base64: {}", e)))?;
    let filename = req.filename.unwrap_or_else(|| "photo.jpg".to_string());
    add_response(state.flow().add_from_photo(&owner, &filename, &bytes).await)
}

/// `data:image/jpeg;base64,AAAA` → `AAAA`; bare base64 is returned unchanged.
fn strip_data_uri(image: &str) -> &str {
    match image.split_once(',') {
        Some((prefix, payload)) if prefix.starts_with("data:") => payload,
        _ => image,
    }
}

async fn photo(State(state): State<AppState>, Path(key): Path<String>) -> Response {
    match state.photos.get(&key) {
        Ok(Some(bytes)) => ([(header::CONTENT_TYPE, content_type(&key))], bytes).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => AppError::Validation(e.to_string()).into_response(),
    }
}

fn content_type(key: &str) -> &'static str {
    let ext = key.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" => "image/heic",
        _ => "application/octet-stream",
    }
}
