//! HTTP-level tests for the employee roster.

mod common;

use aduan_core::roles::Role;
use axum::http::StatusCode;
use common::{body_json, build_test_app, get_auth};
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn office_head_sees_employees_newest_first(pool: PgPool) {
    let app = build_test_app(pool);
    let (_, head) = app.user(Role::OfficeHead, "kepala@example.com").await;
    let (budi, _) = app.user(Role::Employee, "budi@example.com").await;
    app.user(Role::Citizen, "warga@example.com").await;
    let (sari, _) = app.user(Role::Employee, "sari@example.com").await;

    let response = get_auth(app.app(), "/api/v1/employees", &head).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);

    let roster = json["data"].as_array().unwrap();
    let ids: Vec<i64> = roster.iter().map(|e| e["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![sari, budi]);
    assert_eq!(roster[0]["email"], "sari@example.com");
    assert_eq!(roster[0]["role"], "employee");
    assert!(roster[0].get("password_hash").is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn roster_is_for_office_heads_only(pool: PgPool) {
    let app = build_test_app(pool);
    let (_, employee) = app.user(Role::Employee, "budi@example.com").await;
    let (_, citizen) = app.user(Role::Citizen, "warga@example.com").await;

    for token in [&employee, &citizen] {
        let response = get_auth(app.app(), "/api/v1/employees", token).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(response).await["code"], "FORBIDDEN");
    }
}
