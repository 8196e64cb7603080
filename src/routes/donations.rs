use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json as AxumJson},
};

use crate::auth::AuthenticatedUser;
use crate::db;
use crate::error::ApiError;
use crate::lifecycle::{self, CreateDonationRequest, DistributeRequest};
use crate::AppState;

pub async fn create_donation(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<CreateDonationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let donation = lifecycle::create_donation(&state.db, &user, req).await?;
    tracing::info!(donation_id = %donation.id, donor_id = %user.id, "donation created");
    Ok((StatusCode::CREATED, AxumJson(donation)))
}

pub async fn list_donations(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let donations = db::list_donations(&state.db).await?;
    Ok(AxumJson(donations))
}

pub async fn accept_donation(
    Path(id): Path<String>,
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let donation = lifecycle::accept_donation(&state.db, &user, &id).await?;
    tracing::info!(donation_id = %id, organization_id = %user.id, "donation accepted");
    Ok(AxumJson(donation))
}

pub async fn distribute_donation(
    Path(id): Path<String>,
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<DistributeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let donation = lifecycle::record_distribution(&state.db, &user, &id, req).await?;
    tracing::info!(donation_id = %id, organization_id = %user.id, "donation distributed");
    Ok(AxumJson(donation))
}
