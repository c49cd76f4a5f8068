use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::repositories;
use crate::test_support;

#[tokio::test]
async fn category_crud_requires_admin() {
    test_support::require_db!();
    let ctx = test_support::setup_test_context().await;
    let prefix = test_support::api_prefix(&ctx.state);

    let student = test_support::insert_user(ctx.state.db(), "student01", "a-long-password").await;
    let admin = test_support::insert_admin(ctx.state.db(), "admin01", "a-long-password").await;
    let student_token = test_support::bearer_token(&ctx.state, &student);
    let admin_token = test_support::bearer_token(&ctx.state, &admin);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("{prefix}/categories"),
            Some(&student_token),
            Some(json!({"name": "Math"})),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("{prefix}/categories"),
            Some(&admin_token),
            Some(json!({"name": "Math"})),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = test_support::read_json(response).await;
    let category_id = body["id"].as_str().expect("id").to_string();
    assert_eq!(body["name"], "Math");

    // Students can read what admins created.
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("{prefix}/categories/{category_id}"),
            Some(&student_token),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PATCH,
            &format!("{prefix}/categories/{category_id}"),
            Some(&admin_token),
            Some(json!({"name": "Mathematics"})),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    assert_eq!(body["name"], "Mathematics");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::DELETE,
            &format!("{prefix}/categories/{category_id}"),
            Some(&admin_token),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("{prefix}/categories/{category_id}"),
            Some(&student_token),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn category_exams_404_on_unknown_category() {
    test_support::require_db!();
    let ctx = test_support::setup_test_context().await;
    let prefix = test_support::api_prefix(&ctx.state);

    let user = test_support::insert_user(ctx.state.db(), "student02", "a-long-password").await;
    let token = test_support::bearer_token(&ctx.state, &user);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("{prefix}/categories/no-such-id/exams"),
            Some(&token),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = test_support::read_json(response).await;
    assert_eq!(body["error"], "Category not found");
}

#[tokio::test]
async fn deleting_a_category_cascades_to_attempts() {
    test_support::require_db!();
    let ctx = test_support::setup_test_context().await;

    let student = test_support::insert_user(ctx.state.db(), "student03", "a-long-password").await;
    let category = test_support::insert_category(ctx.state.db(), "History").await;
    let exam = test_support::insert_exam(ctx.state.db(), &category.id, "History 101", 100).await;
    let (question_id, option_ids) = test_support::insert_question(
        ctx.state.db(),
        &exam.id,
        "Who wrote the Histories?",
        &["Herodotus", "Thucydides"],
        0,
        0,
    )
    .await;

    let mut tx = ctx.state.db().begin().await.expect("begin");
    let attempt = repositories::attempts::insert(
        &mut tx,
        "attempt-1",
        &exam.id,
        &student.id,
        crate::core::time::primitive_now_utc(),
    )
    .await
    .expect("attempt");
    repositories::attempts::insert_answer(
        &mut tx,
        "answer-1",
        &attempt.id,
        &question_id,
        &option_ids[0],
        true,
    )
    .await
    .expect("answer");
    tx.commit().await.expect("commit");

    let deleted = repositories::categories::delete_by_id(ctx.state.db(), &category.id)
        .await
        .expect("delete");
    assert!(deleted);

    for (table, count) in [
        ("exams", 0i64),
        ("questions", 0),
        ("question_options", 0),
        ("exam_attempts", 0),
        ("user_answers", 0),
    ] {
        let remaining: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(ctx.state.db())
            .await
            .expect("count");
        assert_eq!(remaining, count, "{table} should be empty after cascade");
    }
}
