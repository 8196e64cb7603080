use mealmesh::auth::AuthenticatedUser;
use mealmesh::db::{
    self,
    models::{DonationStatus, NewUser, Role},
};
use mealmesh::error::ApiError;
use mealmesh::lifecycle::{self, CreateDonationRequest, DistributeRequest};
use mealmesh::stats;
use serde_json::json;
use uuid::Uuid;

async fn register_user(db: &db::Db, name: &str, role: Role) -> AuthenticatedUser {
    let email = format!("{}-{}@example.com", name.to_lowercase().replace(' ', "-"), Uuid::new_v4());
    let user = db::create_user(
        db,
        NewUser {
            name: name.to_string(),
            email: email.clone(),
            password: "not-a-real-hash".to_string(),
            phone: "044-0000".to_string(),
            address: "Chennai".to_string(),
            role,
        },
    )
    .await
    .expect("create user");

    AuthenticatedUser {
        id: user.id,
        email,
        role,
    }
}

#[tokio::test]
async fn donation_lifecycle_end_to_end() {
    let db = db::init();

    let donor = register_user(&db, "Anjappar Restaurant", Role::Donor).await;
    let org = register_user(&db, "Chennai Food Bank", Role::Organization).await;

    // Donor posts a donation.
    let created = lifecycle::create_donation(
        &db,
        &donor,
        CreateDonationRequest {
            items: "Sambar rice, curd rice".to_string(),
            quantity: "50 meals".to_string(),
            pickup_time: "2026-03-15T10:00".to_string(),
            location: "T.Nagar, Chennai".to_string(),
        },
    )
    .await
    .expect("create donation");
    assert_eq!(created.status, DonationStatus::Available);
    assert!(created.organization_id.is_none());
    assert!(created.distribution.is_none());

    // The listing joins display names from the user store.
    let listed = db::list_donations(&db).await.expect("list donations");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].donor_name, "Anjappar Restaurant");
    assert!(listed[0].organization_name.is_none());

    // Organization claims it.
    let accepted = lifecycle::accept_donation(&db, &org, &created.id)
        .await
        .expect("accept donation");
    assert_eq!(accepted.status, DonationStatus::Accepted);
    assert_eq!(accepted.organization_id.as_deref(), Some(org.id.as_str()));

    let listed = db::list_donations(&db).await.expect("list donations");
    assert_eq!(
        listed[0].organization_name.as_deref(),
        Some("Chennai Food Bank")
    );

    // And closes it with a distribution record.
    let distributed = lifecycle::record_distribution(
        &db,
        &org,
        &created.id,
        DistributeRequest {
            meals: Some(json!(42)),
            date: Some("2026-03-16T18:00:00Z".to_string()),
            notes: Some("Evening distribution at Egmore shelter".to_string()),
        },
    )
    .await
    .expect("record distribution");
    assert_eq!(distributed.status, DonationStatus::Distributed);
    let record = distributed.distribution.expect("distribution record");
    assert_eq!(record.meals, 42);
    assert_eq!(
        record.notes.as_deref(),
        Some("Evening distribution at Egmore shelter")
    );

    // Statistics reflect the store at query time.
    let donor_stats = stats::donor_stats(&db, &donor.id).await.expect("donor stats");
    assert_eq!(donor_stats.total_donations, 1);
    assert_eq!(donor_stats.active_donations, 0);
    assert_eq!(donor_stats.completed_donations, 1);

    let org_stats = stats::organization_stats(&db, &org.id)
        .await
        .expect("org stats");
    assert_eq!(org_stats.people_served, 42);
    assert_eq!(org_stats.active_donations, 0);
    assert_eq!(org_stats.completed_donations, 1);
}

#[tokio::test]
async fn lifecycle_rejections_leave_state_untouched() {
    let db = db::init();

    let donor = register_user(&db, "Krishna Sweets", Role::Donor).await;
    let org_a = register_user(&db, "Arunachalam Trust", Role::Organization).await;
    let org_b = register_user(&db, "Salem Food Relief", Role::Organization).await;

    let created = lifecycle::create_donation(
        &db,
        &donor,
        CreateDonationRequest {
            items: "Sweet boxes, snacks".to_string(),
            quantity: "45 meals".to_string(),
            pickup_time: "2026-03-12T14:30:00Z".to_string(),
            location: "Coimbatore".to_string(),
        },
    )
    .await
    .expect("create donation");

    lifecycle::accept_donation(&db, &org_a, &created.id)
        .await
        .expect("accept donation");

    // A second organization can neither re-accept nor distribute.
    let err = lifecycle::accept_donation(&db, &org_b, &created.id)
        .await
        .expect_err("second accept");
    assert!(matches!(err, ApiError::InvalidTransition(_)));

    let err = lifecycle::record_distribution(
        &db,
        &org_b,
        &created.id,
        DistributeRequest {
            meals: Some(json!(10)),
            date: Some("2026-03-13T12:00:00Z".to_string()),
            notes: None,
        },
    )
    .await
    .expect_err("foreign distribute");
    assert!(matches!(err, ApiError::Forbidden(_)));

    // The claim is still org A's, still Accepted.
    let current = db::find_donation(&db, &created.id).await.expect("find donation");
    assert_eq!(current.status, DonationStatus::Accepted);
    assert_eq!(current.organization_id.as_deref(), Some(org_a.id.as_str()));
    assert!(current.distribution.is_none());

    // Org A's numbers show one active claim, org B's show nothing.
    let stats_a = stats::organization_stats(&db, &org_a.id).await.expect("stats");
    assert_eq!(stats_a.active_donations, 1);
    let stats_b = stats::organization_stats(&db, &org_b.id).await.expect("stats");
    assert_eq!(stats_b.active_donations, 0);
}
