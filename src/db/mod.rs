//! In-memory document store for users and donations.
//!
//! Free functions over a shared [`Db`] handle. Lock acquisition is bounded
//! so a store call can fail fast with `StoreUnavailable` instead of hanging.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::error::{ApiError, Result};

pub mod models;

use models::{
    Donation, DonationPatch, DonationStatus, DonationView, NewDonation, NewUser, Role, User,
    UserPatch,
};

const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Database {
    users: RwLock<HashMap<String, User>>,
    donations: RwLock<HashMap<String, Donation>>,
}

pub type Db = Arc<Database>;

pub fn init() -> Db {
    Arc::new(Database {
        users: RwLock::new(HashMap::new()),
        donations: RwLock::new(HashMap::new()),
    })
}

async fn read_guard<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
    tokio::time::timeout(LOCK_TIMEOUT, lock.read())
        .await
        .map_err(|_| ApiError::StoreUnavailable)
}

async fn write_guard<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
    tokio::time::timeout(LOCK_TIMEOUT, lock.write())
        .await
        .map_err(|_| ApiError::StoreUnavailable)
}

// ── Users ────────────────────────────────────────────────────────

pub async fn create_user(db: &Db, new: NewUser) -> Result<User> {
    let mut users = write_guard(&db.users).await?;
    if users
        .values()
        .any(|u| u.email.eq_ignore_ascii_case(&new.email))
    {
        return Err(ApiError::Validation("User already exists".to_string()));
    }

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        name: new.name,
        email: new.email,
        password: new.password,
        phone: new.phone,
        address: new.address,
        role: new.role,
        created_at: now,
        updated_at: now,
    };
    users.insert(user.id.clone(), user.clone());
    Ok(user)
}

pub async fn find_user(db: &Db, id: &str) -> Result<User> {
    let users = read_guard(&db.users).await?;
    users.get(id).cloned().ok_or(ApiError::NotFound("User"))
}

pub async fn find_user_by_email_and_role(
    db: &Db,
    email: &str,
    role: Role,
) -> Result<Option<User>> {
    let users = read_guard(&db.users).await?;
    Ok(users
        .values()
        .find(|u| u.role == role && u.email.eq_ignore_ascii_case(email))
        .cloned())
}

pub async fn update_user(db: &Db, id: &str, patch: UserPatch) -> Result<User> {
    let mut users = write_guard(&db.users).await?;
    let user = users.get_mut(id).ok_or(ApiError::NotFound("User"))?;
    if let Some(name) = patch.name {
        user.name = name;
    }
    if let Some(phone) = patch.phone {
        user.phone = phone;
    }
    if let Some(address) = patch.address {
        user.address = address;
    }
    if let Some(password) = patch.password {
        user.password = password;
    }
    user.updated_at = Utc::now();
    Ok(user.clone())
}

// ── Donations ────────────────────────────────────────────────────

fn require_text(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{field} field is required")));
    }
    Ok(())
}

/// Creates a new Available donation. Validation failures insert nothing.
pub async fn create_donation(db: &Db, donor_id: &str, new: NewDonation) -> Result<Donation> {
    require_text(&new.items, "Items")?;
    require_text(&new.quantity, "Quantity")?;
    require_text(&new.location, "Location")?;

    let now = Utc::now();
    let donation = Donation {
        id: Uuid::new_v4().to_string(),
        donor_id: donor_id.to_string(),
        items: new.items,
        quantity: new.quantity,
        location: new.location,
        pickup_time: new.pickup_time,
        status: DonationStatus::Available,
        organization_id: None,
        distribution: None,
        created_at: now,
        updated_at: now,
    };

    let mut donations = write_guard(&db.donations).await?;
    donations.insert(donation.id.clone(), donation.clone());
    Ok(donation)
}

/// All donations, newest first, joined with donor/organization display names.
pub async fn list_donations(db: &Db) -> Result<Vec<DonationView>> {
    let donations = read_guard(&db.donations).await?;
    let users = read_guard(&db.users).await?;

    let display_name = |id: &str| {
        users
            .get(id)
            .map(|u| u.name.clone())
            .unwrap_or_else(|| "Unknown".to_string())
    };

    let mut list: Vec<DonationView> = donations
        .values()
        .map(|d| DonationView {
            donor_name: display_name(&d.donor_id),
            organization_name: d.organization_id.as_deref().map(display_name),
            donation: d.clone(),
        })
        .collect();
    list.sort_by(|a, b| b.donation.created_at.cmp(&a.donation.created_at));
    Ok(list)
}

pub async fn find_donation(db: &Db, id: &str) -> Result<Donation> {
    let donations = read_guard(&db.donations).await?;
    donations
        .get(id)
        .cloned()
        .ok_or(ApiError::NotFound("Donation"))
}

/// One consistent view of the donation collection for read-only aggregation.
pub async fn snapshot_donations(db: &Db) -> Result<Vec<Donation>> {
    let donations = read_guard(&db.donations).await?;
    Ok(donations.values().cloned().collect())
}

fn apply_patch(donation: &mut Donation, patch: DonationPatch) {
    if let Some(status) = patch.status {
        donation.status = status;
    }
    if let Some(organization_id) = patch.organization_id {
        donation.organization_id = Some(organization_id);
    }
    if let Some(distribution) = patch.distribution {
        donation.distribution = Some(distribution);
    }
    donation.updated_at = Utc::now();
}

pub(crate) fn transition_conflict(actual: DonationStatus) -> ApiError {
    let message = match actual {
        DonationStatus::Available => "Donation has not been accepted yet",
        DonationStatus::Accepted => "Donation is already accepted",
        DonationStatus::Distributed => "Donation is already distributed",
    };
    ApiError::InvalidTransition(message.to_string())
}

/// Unconditional atomic merge of `patch` into the stored record.
pub async fn update_donation(db: &Db, id: &str, patch: DonationPatch) -> Result<Donation> {
    let mut donations = write_guard(&db.donations).await?;
    let donation = donations.get_mut(id).ok_or(ApiError::NotFound("Donation"))?;
    apply_patch(donation, patch);
    Ok(donation.clone())
}

/// Compare-and-swap merge: applies `patch` only while `status` still equals
/// `expected`. Check and merge share one write-lock critical section, so
/// concurrent transitions serialize and the loser observes the status already
/// advanced. A failed swap leaves the record untouched.
pub async fn update_donation_where_status(
    db: &Db,
    id: &str,
    expected: DonationStatus,
    patch: DonationPatch,
) -> Result<Donation> {
    let mut donations = write_guard(&db.donations).await?;
    let donation = donations.get_mut(id).ok_or(ApiError::NotFound("Donation"))?;
    if donation.status != expected {
        return Err(transition_conflict(donation.status));
    }
    apply_patch(donation, patch);
    Ok(donation.clone())
}
