//! Donation lifecycle engine.
//!
//! Enforces the one-way state machine Available -> Accepted -> Distributed
//! and who may drive each transition. Every operation takes the acting
//! principal explicitly; persistence goes through the store's
//! compare-and-swap so concurrent transitions have exactly one winner.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::auth::AuthenticatedUser;
use crate::db::{
    self,
    models::{Distribution, Donation, DonationPatch, DonationStatus, NewDonation, Role},
    Db,
};
use crate::error::{ApiError, Result};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDonationRequest {
    pub items: String,
    pub quantity: String,
    pub pickup_time: String,
    pub location: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributeRequest {
    /// Accepted as a JSON number or numeric string; coerced to a
    /// non-negative whole number, rejected otherwise.
    pub meals: Option<Value>,
    pub date: Option<String>,
    pub notes: Option<String>,
}

pub async fn create_donation(
    db: &Db,
    principal: &AuthenticatedUser,
    req: CreateDonationRequest,
) -> Result<Donation> {
    if principal.role != Role::Donor {
        return Err(ApiError::Forbidden(
            "Only donors can create donations".to_string(),
        ));
    }

    let pickup_time = parse_timestamp(&req.pickup_time, "Pickup time")?;
    db::create_donation(
        db,
        &principal.id,
        NewDonation {
            items: req.items,
            quantity: req.quantity,
            location: req.location,
            pickup_time,
        },
    )
    .await
}

/// Claims an Available donation for the acting organization. First come,
/// first served: the swap succeeds for exactly one caller per donation.
pub async fn accept_donation(
    db: &Db,
    principal: &AuthenticatedUser,
    donation_id: &str,
) -> Result<Donation> {
    if principal.role != Role::Organization {
        return Err(ApiError::Forbidden(
            "Only organizations can accept donations".to_string(),
        ));
    }

    db::update_donation_where_status(
        db,
        donation_id,
        DonationStatus::Available,
        DonationPatch {
            status: Some(DonationStatus::Accepted),
            organization_id: Some(principal.id.clone()),
            distribution: None,
        },
    )
    .await
}

/// Closes an Accepted donation with its distribution record. Only the
/// organization holding the claim may do this, and a donation that is
/// already Distributed is never overwritten.
pub async fn record_distribution(
    db: &Db,
    principal: &AuthenticatedUser,
    donation_id: &str,
    req: DistributeRequest,
) -> Result<Donation> {
    if principal.role != Role::Organization {
        return Err(ApiError::Forbidden(
            "Only organizations can record distributions".to_string(),
        ));
    }

    let donation = db::find_donation(db, donation_id).await?;
    if donation.status != DonationStatus::Accepted {
        return Err(db::transition_conflict(donation.status));
    }

    let meals = coerce_meals(req.meals.as_ref())?;
    let date = match req.date.as_deref() {
        Some(raw) => parse_timestamp(raw, "Distribution date")?,
        None => {
            return Err(ApiError::Validation(
                "Distribution date is required".to_string(),
            ))
        }
    };

    if donation.organization_id.as_deref() != Some(principal.id.as_str()) {
        return Err(ApiError::Forbidden(
            "Only the organization that accepted this donation can record its distribution"
                .to_string(),
        ));
    }

    // Re-checked atomically: a racing distribute loses here, not silently.
    db::update_donation_where_status(
        db,
        donation_id,
        DonationStatus::Accepted,
        DonationPatch {
            status: Some(DonationStatus::Distributed),
            organization_id: None,
            distribution: Some(Distribution {
                meals,
                date,
                notes: req.notes,
            }),
        },
    )
    .await
}

fn parse_timestamp(raw: &str, field: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    // Browser datetime-local inputs arrive without a zone, sometimes
    // without seconds. Treated as UTC.
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(naive.and_utc());
        }
    }
    Err(ApiError::Validation(format!(
        "{field} must be a valid timestamp"
    )))
}

fn coerce_meals(raw: Option<&Value>) -> Result<u32> {
    let value = raw.ok_or_else(|| ApiError::Validation("Meals field is required".to_string()))?;
    let count = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    count
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| ApiError::Validation("Meals must be a non-negative whole number".to_string()))
}
