use axum::Json;
use axum::extract::State;

use atrium_core::persona::Persona;

use crate::app::AppState;
use crate::error::ApiError;

/// `GET /api/personas`
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Persona>>, ApiError> {
    let personas = state
        .personas
        .get_all()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(personas))
}
