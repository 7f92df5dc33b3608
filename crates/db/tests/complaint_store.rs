//! Repository-level checks for complaints, the daily tracking sequence and
//! the audit ledger.

use aduan_core::lifecycle::ComplaintStatus;
use aduan_core::roles::Role;
use aduan_core::types::{DbId, Timestamp};
use aduan_db::models::complaint::{ComplaintListQuery, ListScope, NewComplaint, TransitionWrite};
use aduan_db::models::user::CreateUser;
use aduan_db::repositories::{ComplaintRepo, StatusEventRepo, TrackingSequenceRepo, UserRepo};
use chrono::{NaiveDate, TimeZone, Utc};
use sqlx::PgPool;

fn at(day: u32, hour: u32) -> Timestamp {
    Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
}

async fn seed_user(pool: &PgPool, role: Role, email: &str) -> DbId {
    let input = CreateUser {
        name: email.split('@').next().unwrap_or(email).to_string(),
        email: email.to_string(),
        password_hash: "not-a-real-hash".to_string(),
        role_id: role.id(),
        phone: None,
    };
    UserRepo::create(pool, &input).await.unwrap().id
}

async fn seed_complaint(pool: &PgPool, citizen_id: DbId, tracking: &str, title: &str) -> DbId {
    let input = NewComplaint {
        citizen_id,
        category_id: 1,
        title: title.to_string(),
        description: "Large pothole near the market entrance".to_string(),
        location: "Jl. Merdeka 12".to_string(),
        photo_ref: None,
    };
    let mut tx = pool.begin().await.unwrap();
    let complaint = ComplaintRepo::insert(&mut tx, &input, tracking, at(2, 8))
        .await
        .unwrap();
    tx.commit().await.unwrap();
    complaint.id
}

fn claim_write(employee_id: DbId) -> TransitionWrite {
    TransitionWrite {
        expected: vec![ComplaintStatus::Waiting.id()],
        target: ComplaintStatus::InProgress.id(),
        employee_id: Some(employee_id),
        processed_at: Some(at(2, 10)),
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Tracking sequence
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn concurrent_allocations_are_unique_and_gap_free(pool: PgPool) {
    let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();

    let tasks = (0..20).map(|_| {
        let pool = pool.clone();
        tokio::spawn(async move {
            let mut tx = pool.begin().await.unwrap();
            let value = TrackingSequenceRepo::next_value(&mut tx, day).await.unwrap();
            tx.commit().await.unwrap();
            value
        })
    });

    let mut values: Vec<i32> = futures::future::join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();
    values.sort_unstable();

    assert_eq!(values, (1..=20).collect::<Vec<_>>());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn rolled_back_allocation_is_reused(pool: PgPool) {
    let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();

    let mut tx = pool.begin().await.unwrap();
    assert_eq!(TrackingSequenceRepo::next_value(&mut tx, day).await.unwrap(), 1);
    tx.rollback().await.unwrap();

    let mut tx = pool.begin().await.unwrap();
    assert_eq!(TrackingSequenceRepo::next_value(&mut tx, day).await.unwrap(), 1);
    assert_eq!(TrackingSequenceRepo::next_value(&mut tx, day).await.unwrap(), 2);
    tx.commit().await.unwrap();

    let other_day = NaiveDate::from_ymd_opt(2026, 3, 3).unwrap();
    let mut conn = pool.acquire().await.unwrap();
    assert_eq!(
        TrackingSequenceRepo::next_value(&mut conn, other_day).await.unwrap(),
        1
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_tracking_number_is_a_named_unique_violation(pool: PgPool) {
    let citizen = seed_user(&pool, Role::Citizen, "warga@example.com").await;
    seed_complaint(&pool, citizen, "ADU-20260302-0001", "Pothole").await;

    let input = NewComplaint {
        citizen_id: citizen,
        category_id: 1,
        title: "Another".to_string(),
        description: "Blocked drain".to_string(),
        location: "Jl. Sudirman".to_string(),
        photo_ref: None,
    };
    let mut conn = pool.acquire().await.unwrap();
    let err = ComplaintRepo::insert(&mut conn, &input, "ADU-20260302-0001", at(2, 9))
        .await
        .unwrap_err();

    assert!(aduan_db::is_unique_violation(
        &err,
        "uq_complaints_tracking_number"
    ));
    assert!(!aduan_db::is_unique_violation(&err, "uq_users_email"));
}

// ---------------------------------------------------------------------------
// Guarded transitions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn guarded_update_applies_once(pool: PgPool) {
    let citizen = seed_user(&pool, Role::Citizen, "warga@example.com").await;
    let first = seed_user(&pool, Role::Employee, "budi@example.com").await;
    let second = seed_user(&pool, Role::Employee, "sari@example.com").await;
    let id = seed_complaint(&pool, citizen, "ADU-20260302-0001", "Pothole").await;

    let mut conn = pool.acquire().await.unwrap();
    let claimed = ComplaintRepo::apply_transition(&mut conn, id, &claim_write(first))
        .await
        .unwrap()
        .expect("first claim should apply");
    assert_eq!(claimed.status_id, ComplaintStatus::InProgress.id());
    assert_eq!(claimed.employee_id, Some(first));
    assert_eq!(claimed.processed_at, Some(at(2, 10)));

    let lost = ComplaintRepo::apply_transition(&mut conn, id, &claim_write(second))
        .await
        .unwrap();
    assert!(lost.is_none());

    let stored = ComplaintRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(stored.employee_id, Some(first));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn assignee_guard_blocks_other_employees(pool: PgPool) {
    let citizen = seed_user(&pool, Role::Citizen, "warga@example.com").await;
    let owner = seed_user(&pool, Role::Employee, "budi@example.com").await;
    let other = seed_user(&pool, Role::Employee, "sari@example.com").await;
    let id = seed_complaint(&pool, citizen, "ADU-20260302-0001", "Pothole").await;

    let mut conn = pool.acquire().await.unwrap();
    ComplaintRepo::apply_transition(&mut conn, id, &claim_write(owner))
        .await
        .unwrap()
        .unwrap();

    let complete = |assignee| TransitionWrite {
        expected: ComplaintStatus::IN_PROGRESS_GROUP.iter().map(|s| s.id()).collect(),
        target: ComplaintStatus::Completed.id(),
        assignee: Some(assignee),
        completed_at: Some(at(3, 9)),
        employee_note: Some("Patched".to_string()),
        ..Default::default()
    };

    let blocked = ComplaintRepo::apply_transition(&mut conn, id, &complete(other))
        .await
        .unwrap();
    assert!(blocked.is_none());

    let done = ComplaintRepo::apply_transition(&mut conn, id, &complete(owner))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(done.status_id, ComplaintStatus::Completed.id());
    assert_eq!(done.employee_note.as_deref(), Some("Patched"));
    // Fields left as None are untouched.
    assert_eq!(done.processed_at, Some(at(2, 10)));
}

// ---------------------------------------------------------------------------
// Listing scopes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn employee_scope_sees_queue_and_own_work(pool: PgPool) {
    let citizen = seed_user(&pool, Role::Citizen, "warga@example.com").await;
    let budi = seed_user(&pool, Role::Employee, "budi@example.com").await;
    let sari = seed_user(&pool, Role::Employee, "sari@example.com").await;

    let queued = seed_complaint(&pool, citizen, "ADU-20260302-0001", "Queued").await;
    let mine = seed_complaint(&pool, citizen, "ADU-20260302-0002", "Mine").await;
    let theirs = seed_complaint(&pool, citizen, "ADU-20260302-0003", "Theirs").await;

    let mut conn = pool.acquire().await.unwrap();
    ComplaintRepo::apply_transition(&mut conn, mine, &claim_write(budi))
        .await
        .unwrap()
        .unwrap();
    ComplaintRepo::apply_transition(&mut conn, theirs, &claim_write(sari))
        .await
        .unwrap()
        .unwrap();

    let query = ComplaintListQuery::new(ListScope::UnassignedOrAssignedTo(budi));
    let mut ids: Vec<DbId> = ComplaintRepo::list(&pool, &query, 10, 0)
        .await
        .unwrap()
        .into_iter()
        .map(|row| row.complaint.id)
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![queued, mine]);
    assert_eq!(ComplaintRepo::count(&pool, &query).await.unwrap(), 2);

    let all = ComplaintListQuery::new(ListScope::All);
    assert_eq!(ComplaintRepo::count(&pool, &all).await.unwrap(), 3);

    let filed = ComplaintListQuery::new(ListScope::FiledBy(budi));
    assert_eq!(ComplaintRepo::count(&pool, &filed).await.unwrap(), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn search_matches_literally_and_case_insensitively(pool: PgPool) {
    let citizen = seed_user(&pool, Role::Citizen, "warga@example.com").await;
    seed_complaint(&pool, citizen, "ADU-20260302-0001", "Street light 100% dark").await;
    seed_complaint(&pool, citizen, "ADU-20260302-0002", "Street light flickers").await;

    let mut query = ComplaintListQuery::new(ListScope::All);
    query.search = Some("100%".to_string());
    assert_eq!(ComplaintRepo::count(&pool, &query).await.unwrap(), 1);

    query.search = Some("STREET".to_string());
    assert_eq!(ComplaintRepo::count(&pool, &query).await.unwrap(), 2);

    query.search = Some("0002".to_string());
    let rows = ComplaintRepo::list(&pool, &query, 10, 0).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].complaint.title, "Street light flickers");
    assert_eq!(rows[0].citizen_name, "warga");
    assert_eq!(rows[0].category_name, "Infrastructure");
    assert!(rows[0].employee_name.is_none());
}

// ---------------------------------------------------------------------------
// Audit ledger
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn ledger_is_oldest_first_with_insertion_tiebreak(pool: PgPool) {
    let citizen = seed_user(&pool, Role::Citizen, "warga@example.com").await;
    let employee = seed_user(&pool, Role::Employee, "budi@example.com").await;
    let id = seed_complaint(&pool, citizen, "ADU-20260302-0001", "Pothole").await;

    let mut tx = pool.begin().await.unwrap();
    StatusEventRepo::append(&mut tx, id, ComplaintStatus::Waiting, "Submitted", citizen, at(2, 8))
        .await
        .unwrap();
    // Same instant as the next event: order falls back to insertion.
    StatusEventRepo::append(&mut tx, id, ComplaintStatus::InProgress, "Claimed", employee, at(2, 9))
        .await
        .unwrap();
    StatusEventRepo::append(&mut tx, id, ComplaintStatus::Completed, "Done", employee, at(2, 9))
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let history = StatusEventRepo::list_for_complaint(&pool, id).await.unwrap();
    let notes: Vec<&str> = history.iter().map(|e| e.event.note.as_str()).collect();
    assert_eq!(notes, ["Submitted", "Claimed", "Done"]);
    assert_eq!(history[0].actor_name, "warga");
    assert_eq!(history[2].event.status_id, ComplaintStatus::Completed.id());
}
