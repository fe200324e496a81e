use axum::extract::{Path, State};
use axum::Json;
use quote_engine::OrderId;
use serde::Serialize;

use crate::error::ApiError;
use crate::routes::AppState;
use crate::upload::is_image_name;

#[derive(Debug, Serialize)]
pub struct GalleryView {
    pub id: String,
    pub count: usize,
    pub images: Vec<String>,
}

/// Lists an upload folder. Knowing the id is the only access check.
pub async fn gallery(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<GalleryView>, ApiError> {
    let id = OrderId::parse(&id)?;
    let names = state
        .images
        .list(&id)?
        .ok_or_else(|| ApiError::NotFound(format!("no upload folder for {}", id)))?;
    let images: Vec<String> = names
        .into_iter()
        .filter(|n| is_image_name(n))
        .map(|n| format!("/uploads/{}/{}", id, n))
        .collect();
    Ok(Json(GalleryView { id: id.to_string(), count: images.len(), images }))
}
