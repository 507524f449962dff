use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    api::models::mappings::{MappingSummary, StatusMessage},
    error::Result,
    repositories::mappings::{MappingCreate, MappingUpdate},
};

use super::AppState;

/// GET /mappings
pub async fn list_mappings(State(state): State<AppState>) -> Result<Json<Vec<MappingSummary>>> {
    let mappings = state.mappings_repository.get_all().await?;

    Ok(Json(mappings.into_iter().map(MappingSummary::from).collect()))
}

/// POST /mappings
pub async fn add_mapping(
    State(state): State<AppState>,
    Json(create): Json<MappingCreate>,
) -> Result<Json<StatusMessage>> {
    let mapping = state.mappings_repository.create(&create).await?;
    tracing::info!(charger = %mapping.name, serial = %mapping.serial, "Mapping added");

    Ok(Json(StatusMessage::new("ok")))
}

/// PUT /mappings/{name}
/// The path name is authoritative; only `serial` is read from the body.
pub async fn update_mapping(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(update): Json<MappingUpdate>,
) -> Result<Json<StatusMessage>> {
    let mapping = state
        .mappings_repository
        .update_serial(&name, &update)
        .await?;
    tracing::info!(charger = %mapping.name, serial = %mapping.serial, "Mapping updated");

    Ok(Json(StatusMessage::new("updated")))
}

/// DELETE /mappings/{name}
pub async fn delete_mapping(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<StatusMessage>> {
    state.mappings_repository.delete(&name).await?;
    tracing::info!(charger = %name, "Mapping deleted");

    Ok(Json(StatusMessage::new("deleted").with_name(name)))
}
