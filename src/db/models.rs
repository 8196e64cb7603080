use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The two kinds of principal the platform knows about.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Donor,
    Organization,
}

/// Registered account. Never serialized directly; responses go through
/// `auth::UserProfile` so the password hash cannot leak.
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub address: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle of a donation. Transitions only ever move forward:
/// Available -> Accepted -> Distributed.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DonationStatus {
    Available,
    Accepted,
    Distributed,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Distribution {
    pub meals: u32,
    pub date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Donation {
    pub id: String,
    pub donor_id: String,
    pub items: String,
    pub quantity: String,
    pub location: String,
    pub pickup_time: DateTime<Utc>,
    pub status: DonationStatus,
    /// Set exactly once, at the Accepted transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    /// Set exactly once, at the Distributed transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution: Option<Distribution>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Donation joined with display names for the listing endpoint.
/// Unresolvable references render as "Unknown" rather than failing the list.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DonationView {
    #[serde(flatten)]
    pub donation: Donation,
    pub donor_name: String,
    pub organization_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    /// Already hashed by the caller.
    pub password: String,
    pub phone: String,
    pub address: String,
    pub role: Role,
}

#[derive(Debug, Default, Clone)]
pub struct UserPatch {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewDonation {
    pub items: String,
    pub quantity: String,
    pub location: String,
    pub pickup_time: DateTime<Utc>,
}

/// Fields a transition may change. Merged atomically by the store.
#[derive(Debug, Default, Clone)]
pub struct DonationPatch {
    pub status: Option<DonationStatus>,
    pub organization_id: Option<String>,
    pub distribution: Option<Distribution>,
}
