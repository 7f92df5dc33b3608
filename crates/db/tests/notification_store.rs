use aduan_core::roles::Role;
use aduan_core::types::{DbId, Timestamp};
use aduan_db::models::notification::ReadFilter;
use aduan_db::models::user::CreateUser;
use aduan_db::repositories::{NotificationRepo, UserRepo};
use chrono::{Duration, TimeZone, Utc};
use sqlx::PgPool;

fn t0() -> Timestamp {
    Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap()
}

async fn seed_user(pool: &PgPool, role: Role, email: &str) -> DbId {
    let input = CreateUser {
        name: email.to_string(),
        email: email.to_string(),
        password_hash: "not-a-real-hash".to_string(),
        role_id: role.id(),
        phone: None,
    };
    UserRepo::create(pool, &input).await.unwrap().id
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn fan_out_creates_one_row_per_recipient(pool: PgPool) {
    let budi = seed_user(&pool, Role::Employee, "budi@example.com").await;
    let sari = seed_user(&pool, Role::Employee, "sari@example.com").await;
    seed_user(&pool, Role::OfficeHead, "kepala@example.com").await;

    let mut tx = pool.begin().await.unwrap();
    let recipients = UserRepo::active_ids_by_role(&mut tx, Role::Employee).await.unwrap();
    assert_eq!(recipients, vec![budi, sari]);

    let created = NotificationRepo::notify_many(&mut tx, &recipients, None, "New", "Body", t0())
        .await
        .unwrap();
    assert_eq!(created.len(), 2);
    assert!(NotificationRepo::notify_many(&mut tx, &[], None, "New", "Body", t0())
        .await
        .unwrap()
        .is_empty());
    tx.commit().await.unwrap();

    assert_eq!(NotificationRepo::unread_count(&pool, budi).await.unwrap(), 1);
    assert_eq!(NotificationRepo::unread_count(&pool, sari).await.unwrap(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn inactive_users_are_not_recipients(pool: PgPool) {
    let active = seed_user(&pool, Role::Employee, "budi@example.com").await;
    let inactive = seed_user(&pool, Role::Employee, "sari@example.com").await;
    sqlx::query("UPDATE users SET is_active = false WHERE id = $1")
        .bind(inactive)
        .execute(&pool)
        .await
        .unwrap();

    let mut conn = pool.acquire().await.unwrap();
    let recipients = UserRepo::active_ids_by_role(&mut conn, Role::Employee).await.unwrap();
    assert_eq!(recipients, vec![active]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn read_state_and_filters(pool: PgPool) {
    let user = seed_user(&pool, Role::Citizen, "warga@example.com").await;
    let stranger = seed_user(&pool, Role::Citizen, "lain@example.com").await;

    let mut conn = pool.acquire().await.unwrap();
    let mut ids = Vec::new();
    for i in 0..3 {
        let n = NotificationRepo::notify(
            &mut conn,
            user,
            None,
            &format!("Update {i}"),
            "Body",
            t0() + Duration::minutes(i),
        )
        .await
        .unwrap();
        ids.push(n.id);
    }
    drop(conn);

    // Newest first.
    let listed = NotificationRepo::list_for_user(&pool, user, ReadFilter::All, 10, 0)
        .await
        .unwrap();
    let titles: Vec<&str> = listed.iter().map(|n| n.title.as_str()).collect();
    assert_eq!(titles, ["Update 2", "Update 1", "Update 0"]);

    // Someone else's notification is invisible.
    assert!(!NotificationRepo::mark_read(&pool, ids[0], stranger, t0())
        .await
        .unwrap());

    let first_read = t0() + Duration::hours(1);
    assert!(NotificationRepo::mark_read(&pool, ids[0], user, first_read)
        .await
        .unwrap());
    // Re-marking keeps the original read time.
    assert!(NotificationRepo::mark_read(&pool, ids[0], user, first_read + Duration::hours(1))
        .await
        .unwrap());

    let read = NotificationRepo::list_for_user(&pool, user, ReadFilter::Read, 10, 0)
        .await
        .unwrap();
    assert_eq!(read.len(), 1);
    assert!(read[0].is_read);
    assert_eq!(read[0].read_at, Some(first_read));

    assert_eq!(
        NotificationRepo::count_for_user(&pool, user, ReadFilter::Unread).await.unwrap(),
        2
    );
    assert_eq!(
        NotificationRepo::mark_all_read(&pool, user, first_read).await.unwrap(),
        2
    );
    assert_eq!(NotificationRepo::unread_count(&pool, user).await.unwrap(), 0);
    assert_eq!(
        NotificationRepo::mark_all_read(&pool, user, first_read).await.unwrap(),
        0
    );
}
