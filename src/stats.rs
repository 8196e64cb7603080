//! Per-user statistics, recomputed from the donation collection on demand.
//!
//! Nothing is cached or persisted; each query folds over one consistent
//! snapshot of the store.

use serde::Serialize;

use crate::db::{self, models::DonationStatus, Db};
use crate::error::Result;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DonorStats {
    pub total_donations: usize,
    pub active_donations: usize,
    pub completed_donations: usize,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationStats {
    pub people_served: u64,
    pub active_donations: usize,
    pub completed_donations: usize,
}

pub async fn donor_stats(db: &Db, donor_id: &str) -> Result<DonorStats> {
    let donations = db::snapshot_donations(db).await?;

    let mut stats = DonorStats {
        total_donations: 0,
        active_donations: 0,
        completed_donations: 0,
    };
    for donation in donations.iter().filter(|d| d.donor_id == donor_id) {
        stats.total_donations += 1;
        match donation.status {
            DonationStatus::Available => stats.active_donations += 1,
            DonationStatus::Distributed => stats.completed_donations += 1,
            DonationStatus::Accepted => {}
        }
    }
    Ok(stats)
}

pub async fn organization_stats(db: &Db, organization_id: &str) -> Result<OrganizationStats> {
    let donations = db::snapshot_donations(db).await?;

    let mut stats = OrganizationStats {
        people_served: 0,
        active_donations: 0,
        completed_donations: 0,
    };
    for donation in donations
        .iter()
        .filter(|d| d.organization_id.as_deref() == Some(organization_id))
    {
        match donation.status {
            DonationStatus::Accepted => stats.active_donations += 1,
            DonationStatus::Distributed => {
                stats.completed_donations += 1;
                // A distribution without a meal count contributes zero.
                stats.people_served += donation
                    .distribution
                    .as_ref()
                    .map(|dist| u64::from(dist.meals))
                    .unwrap_or(0);
            }
            DonationStatus::Available => {}
        }
    }
    Ok(stats)
}
