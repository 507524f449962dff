use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::Result,
    services::status::{ChargerStatus, StatusResult},
};

use super::AppState;

/// GET /status/{name}
pub async fn get_status(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ChargerStatus>> {
    let status = state.status_service.fetch_status(&name).await?;

    Ok(Json(status))
}

/// GET /all
/// Always 200 once the mappings are read; per-charger failures are inline.
pub async fn get_all_status(State(state): State<AppState>) -> Result<Json<Vec<StatusResult>>> {
    let results = state.status_service.fetch_all().await?;

    let failed = results.iter().filter(|r| r.is_error()).count();
    tracing::debug!(total = results.len(), failed, "Status report assembled");

    Ok(Json(results))
}
