use axum::http::{Method, StatusCode};
use tower::ServiceExt;

use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::test_support;

async fn record_attempt(
    pool: &sqlx::PgPool,
    exam_id: &str,
    student_id: &str,
    score: i32,
    suffix: &str,
) {
    let mut tx = pool.begin().await.expect("begin");
    let attempt = repositories::attempts::insert(
        &mut tx,
        &format!("attempt-{suffix}"),
        exam_id,
        student_id,
        primitive_now_utc(),
    )
    .await
    .expect("attempt");
    repositories::attempts::set_score(&mut tx, &attempt.id, score).await.expect("score");
    tx.commit().await.expect("commit");
}

#[tokio::test]
async fn leaderboard_orders_by_total_score_then_username() {
    test_support::require_db!();
    let ctx = test_support::setup_test_context().await;
    let prefix = test_support::api_prefix(&ctx.state);

    let category = test_support::insert_category(ctx.state.db(), "Math").await;
    let exam = test_support::insert_exam(ctx.state.db(), &category.id, "Math 101", 100).await;

    let alice = test_support::insert_user(ctx.state.db(), "alice", "a-long-password").await;
    let bob = test_support::insert_user(ctx.state.db(), "bob", "a-long-password").await;
    let carol = test_support::insert_user(ctx.state.db(), "carol", "a-long-password").await;
    // Admins never appear on the leaderboard, whatever their score.
    let admin = test_support::insert_admin(ctx.state.db(), "admin20", "a-long-password").await;

    record_attempt(ctx.state.db(), &exam.id, &alice.id, 30, "a1").await;
    record_attempt(ctx.state.db(), &exam.id, &alice.id, 40, "a2").await;
    record_attempt(ctx.state.db(), &exam.id, &bob.id, 70, "b1").await;
    record_attempt(ctx.state.db(), &exam.id, &carol.id, 50, "c1").await;
    record_attempt(ctx.state.db(), &exam.id, &admin.id, 99, "d1").await;

    let token = test_support::bearer_token(&ctx.state, &alice);
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("{prefix}/leaderboard"),
            Some(&token),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    let entries = body.as_array().unwrap();

    // alice and bob tie at 70; username breaks the tie.
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["student"], "alice");
    assert_eq!(entries[0]["score"], 70);
    assert_eq!(entries[0]["attempts"], 2);
    assert_eq!(entries[1]["student"], "bob");
    assert_eq!(entries[2]["student"], "carol");
}

#[tokio::test]
async fn exam_stats_is_admin_only_and_aggregates() {
    test_support::require_db!();
    let ctx = test_support::setup_test_context().await;
    let prefix = test_support::api_prefix(&ctx.state);

    let category = test_support::insert_category(ctx.state.db(), "Math").await;
    let exam_a = test_support::insert_exam(ctx.state.db(), &category.id, "Algebra", 100).await;
    let exam_b = test_support::insert_exam(ctx.state.db(), &category.id, "Calculus", 100).await;

    let student = test_support::insert_user(ctx.state.db(), "student20", "a-long-password").await;
    let admin = test_support::insert_admin(ctx.state.db(), "admin21", "a-long-password").await;

    record_attempt(ctx.state.db(), &exam_a.id, &student.id, 40, "a1").await;
    record_attempt(ctx.state.db(), &exam_a.id, &student.id, 60, "a2").await;
    record_attempt(ctx.state.db(), &exam_b.id, &student.id, 90, "b1").await;

    let student_token = test_support::bearer_token(&ctx.state, &student);
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("{prefix}/admin/exam-stats"),
            Some(&student_token),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let admin_token = test_support::bearer_token(&ctx.state, &admin);
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("{prefix}/admin/exam-stats"),
            Some(&admin_token),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;

    assert_eq!(body["total_exams"], 2);
    assert_eq!(body["total_attempts"], 3);
    let averages = body["avg_score_per_exam"].as_array().unwrap();
    assert_eq!(averages[0]["exam_title"], "Algebra");
    assert_eq!(averages[0]["avg_score"], 50.0);
    assert_eq!(averages[1]["exam_title"], "Calculus");
    assert_eq!(averages[1]["avg_score"], 90.0);
    assert_eq!(body["leaderboard"][0]["username"], "student20");
    assert_eq!(body["leaderboard"][0]["total_score"], 190);
}

#[tokio::test]
async fn attempts_per_category_groups_only_the_callers_attempts() {
    test_support::require_db!();
    let ctx = test_support::setup_test_context().await;
    let prefix = test_support::api_prefix(&ctx.state);

    let math = test_support::insert_category(ctx.state.db(), "Math").await;
    let history = test_support::insert_category(ctx.state.db(), "History").await;
    let algebra = test_support::insert_exam(ctx.state.db(), &math.id, "Algebra", 100).await;
    let herodotus = test_support::insert_exam(ctx.state.db(), &history.id, "Herodotus", 100).await;

    let student = test_support::insert_user(ctx.state.db(), "student21", "a-long-password").await;
    let other = test_support::insert_user(ctx.state.db(), "student22", "a-long-password").await;

    record_attempt(ctx.state.db(), &algebra.id, &student.id, 10, "a1").await;
    record_attempt(ctx.state.db(), &algebra.id, &student.id, 20, "a2").await;
    record_attempt(ctx.state.db(), &herodotus.id, &student.id, 30, "h1").await;
    record_attempt(ctx.state.db(), &algebra.id, &other.id, 99, "o1").await;

    let token = test_support::bearer_token(&ctx.state, &student);
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("{prefix}/attempts-per-category"),
            Some(&token),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 2);

    let math_row = rows.iter().find(|r| r["category_name"] == "Math").expect("math row");
    assert_eq!(math_row["count"], 2);
    let history_row = rows.iter().find(|r| r["category_name"] == "History").expect("history row");
    assert_eq!(history_row["count"], 1);
}

#[tokio::test]
async fn leaderboard_requires_authentication() {
    test_support::require_db!();
    let ctx = test_support::setup_test_context().await;
    let prefix = test_support::api_prefix(&ctx.state);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("{prefix}/leaderboard"),
            None,
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = test_support::read_json(response).await;
    assert!(body["error"].as_str().is_some());
}
