//! Report metrics and persisted snapshots over HTTP.

mod common;

use aduan_core::roles::Role;
use axum::http::StatusCode;
use chrono::{Duration, TimeZone, Utc};
use common::{body_json, build_test_app, get_auth, post_json_auth, put_json_auth};
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn metrics_for_the_current_month(pool: PgPool) {
    let app = build_test_app(pool);
    let (_, citizen) = app.user(Role::Citizen, "ani@example.com").await;
    let (_, employee) = app.user(Role::Employee, "budi@example.com").await;
    let (_, head) = app.user(Role::OfficeHead, "kepala@example.com").await;

    // February: one complaint, for the previous-window comparison.
    app.clock
        .set(Utc.with_ymd_and_hms(2026, 2, 10, 9, 0, 0).unwrap());
    app.submit(&citizen, "February").await;

    // March: four complaints, two completed.
    app.clock.set(common::start_time());
    let mut ids = Vec::new();
    for title in ["A", "B", "C", "D"] {
        ids.push(app.submit(&citizen, title).await);
    }
    app.clock.advance(Duration::days(1));
    for id in &ids[..3] {
        assert_eq!(app.act(&employee, *id, "claim", None).await.status(), 200);
    }
    app.clock.advance(Duration::days(2));
    for id in &ids[..2] {
        assert_eq!(app.act(&employee, *id, "complete", Some("Done")).await.status(), 200);
    }

    let response = get_auth(app.app(), "/api/v1/reports/metrics", &head).await;
    assert_eq!(response.status(), StatusCode::OK);
    let m = body_json(response).await["data"].clone();

    assert_eq!(m["period"], "this_month");
    assert_eq!(m["total"], 4);
    assert_eq!(m["completed"], 2);
    assert_eq!(m["in_progress"], 1);
    assert_eq!(m["waiting"], 1);
    assert_eq!(m["completion_rate"], 50.0);
    assert_eq!(m["efficiency"], 50.0);
    assert_eq!(m["avg_processing_days"], 2.0);
    assert_eq!(m["avg_response_days"], 1.0);
    assert_eq!(m["trending_category"]["name"], "Infrastructure");
    assert_eq!(m["trending_category"]["total"], 4);
    assert_eq!(m["breakdown"]["completed"]["percent"], 50.0);
    assert_eq!(m["trends"]["volume"]["direction"], "up");
    assert_eq!(m["monthly"].as_array().unwrap().len(), 6);

    // Employees see reports too; citizens do not.
    let response = get_auth(app.app(), "/api/v1/reports/metrics?period=this_year", &employee).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["total"], 5);

    let response = get_auth(app.app(), "/api/v1/reports/metrics", &citizen).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn empty_period_reports_no_data(pool: PgPool) {
    let app = build_test_app(pool);
    let (_, head) = app.user(Role::OfficeHead, "kepala@example.com").await;

    let response = get_auth(
        app.app(),
        "/api/v1/reports/metrics?start_date=2025-01-01&end_date=2025-01-31",
        &head,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let m = body_json(response).await["data"].clone();
    assert_eq!(m["period"], "custom");
    assert_eq!(m["total"], 0);
    assert_eq!(m["completion_rate"], 0.0);
    assert!(m["trending_category"]["category_id"].is_null());

    for query in [
        "?period=fortnight",
        "?start_date=2025-02-01&end_date=2025-01-01",
    ] {
        let response = get_auth(app.app(), &format!("/api/v1/reports/metrics{query}"), &head).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "query {query}");
    }
    let response = get_auth(
        app.app(),
        "/api/v1/reports/metrics?start_date=2025-01-01",
        &head,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn snapshot_lifecycle(pool: PgPool) {
    let app = build_test_app(pool);
    let (_, citizen) = app.user(Role::Citizen, "ani@example.com").await;
    let (head_id, head) = app.user(Role::OfficeHead, "kepala@example.com").await;

    app.submit(&citizen, "A").await;
    app.submit(&citizen, "B").await;

    let response = post_json_auth(
        app.app(),
        "/api/v1/reports",
        serde_json::json!({ "kind": "monthly" }),
        &head,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let snapshot = body_json(response).await["data"].clone();
    assert_eq!(snapshot["kind"], "monthly");
    assert_eq!(snapshot["period_start"], "2026-03-01");
    assert_eq!(snapshot["period_end"], "2026-03-31");
    assert_eq!(snapshot["total_count"], 2);
    assert_eq!(snapshot["created_by"], head_id);
    assert!(snapshot["artifact_ref"].is_null());
    let id = snapshot["id"].as_i64().unwrap();

    let response = post_json_auth(
        app.app(),
        "/api/v1/reports",
        serde_json::json!({ "kind": "daily", "start_date": "2026-01-01", "end_date": "2026-01-31" }),
        &head,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["data"]["total_count"], 0);

    let response = get_auth(app.app(), "/api/v1/reports?limit=1", &head).await;
    let page = body_json(response).await["data"].clone();
    assert_eq!(page["total_items"], 2);
    assert_eq!(page["items"].as_array().unwrap().len(), 1);

    // Attach once; a second attach conflicts.
    let uri = format!("/api/v1/reports/{id}/artifact");
    let response = put_json_auth(
        app.app(),
        &uri,
        serde_json::json!({ "artifact_ref": "" }),
        &head,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = serde_json::json!({ "artifact_ref": "exports/march.pdf" });
    let response = put_json_auth(app.app(), &uri, body.clone(), &head).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["artifact_ref"], "exports/march.pdf");

    let response = put_json_auth(app.app(), &uri, body.clone(), &head).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = put_json_auth(app.app(), "/api/v1/reports/999/artifact", body, &head).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get_auth(app.app(), &format!("/api/v1/reports/{id}"), &head).await;
    assert_eq!(body_json(response).await["data"]["artifact_ref"], "exports/march.pdf");

    // Citizens cannot generate.
    let response = post_json_auth(
        app.app(),
        "/api/v1/reports",
        serde_json::json!({ "kind": "weekly" }),
        &citizen,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn citizens_are_refused_before_period_checks(pool: PgPool) {
    let app = build_test_app(pool);
    let (_, citizen) = app.user(Role::Citizen, "warga@example.com").await;

    let response = get_auth(app.app(), "/api/v1/reports/metrics?period=fortnight", &citizen).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_json_auth(
        app.app(),
        "/api/v1/reports",
        serde_json::json!({ "kind": "monthly", "start_date": "2026-03-01" }),
        &citizen,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get_auth(app.app(), "/api/v1/reports?limit=0", &citizen).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn out_of_range_dates_are_a_validation_error(pool: PgPool) {
    let app = build_test_app(pool);
    let (_, head) = app.user(Role::OfficeHead, "kepala@example.com").await;

    let response = get_auth(
        app.app(),
        "/api/v1/reports/metrics?start_date=-262143-01-01&end_date=-262143-01-02",
        &head,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["code"], "VALIDATION_ERROR");
}
