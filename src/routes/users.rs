use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json as AxumJson},
};

use crate::auth::AuthenticatedUser;
use crate::db::{self, models::Role};
use crate::error::ApiError;
use crate::stats;
use crate::AppState;

/// `GET /api/users/{id}/stats`
///
/// Owner-only. The response shape follows the target user's role: donors
/// get donation counts, organizations get meal totals and claim counts.
pub async fn user_stats(
    Path(id): Path<String>,
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    if user.id != id {
        return Err(ApiError::Forbidden(
            "You can only view your own statistics".to_string(),
        ));
    }

    let target = db::find_user(&state.db, &id).await?;
    let body = match target.role {
        Role::Donor => serde_json::to_value(stats::donor_stats(&state.db, &id).await?),
        Role::Organization => serde_json::to_value(stats::organization_stats(&state.db, &id).await?),
    }
    .map_err(|e| ApiError::Internal(e.into()))?;

    Ok(AxumJson(body))
}
