//! `POST /v1/collections`, `DELETE /v1/collections/{name}` (§6).

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateCollectionBody {
    pub collection_name: String,
    pub dimension: usize,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CollectionResponse {
    pub success: bool,
    pub collection_name: String,
}

pub async fn create_collection(
    State(state): State<AppState>,
    Json(body): Json<CreateCollectionBody>,
) -> Result<Json<CollectionResponse>, ApiError> {
    state
        .store
        .create_collection(&body.collection_name, body.dimension, body.description)
        .await?;
    Ok(Json(CollectionResponse { success: true, collection_name: body.collection_name }))
}

pub async fn delete_collection(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<CollectionResponse>, ApiError> {
    state.store.delete_collection(&name).await?;
    Ok(Json(CollectionResponse { success: true, collection_name: name }))
}
