use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::exams::exam_with_questions;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::category::{CategoryPayload, CategoryResponse};
use crate::schemas::exam::ExamResponse;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/:category_id",
            get(get_category).put(update_category).patch(update_category).delete(delete_category),
        )
        .route("/:category_id/exams", get(category_exams))
}

async fn list_categories(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    let categories = repositories::categories::list(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list categories"))?;

    Ok(Json(categories.into_iter().map(CategoryResponse::from_db).collect()))
}

async fn create_category(
    State(state): State<AppState>,
    _admin: CurrentAdmin,
    Json(payload): Json<CategoryPayload>,
) -> Result<(StatusCode, Json<CategoryResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let id = Uuid::new_v4().to_string();
    let category =
        repositories::categories::create(state.db(), &id, payload.name.trim(), primitive_now_utc())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to create category"))?;

    Ok((StatusCode::CREATED, Json(CategoryResponse::from_db(category))))
}

async fn get_category(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(category_id): Path<String>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let category = repositories::categories::find_by_id(state.db(), &category_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load category"))?
        .ok_or_else(|| ApiError::NotFound("Category not found".to_string()))?;

    Ok(Json(CategoryResponse::from_db(category)))
}

async fn update_category(
    State(state): State<AppState>,
    _admin: CurrentAdmin,
    Path(category_id): Path<String>,
    Json(payload): Json<CategoryPayload>,
) -> Result<Json<CategoryResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let category =
        repositories::categories::update_name(state.db(), &category_id, payload.name.trim())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to update category"))?
            .ok_or_else(|| ApiError::NotFound("Category not found".to_string()))?;

    Ok(Json(CategoryResponse::from_db(category)))
}

async fn delete_category(
    State(state): State<AppState>,
    _admin: CurrentAdmin,
    Path(category_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::categories::delete_by_id(state.db(), &category_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete category"))?;

    if !deleted {
        return Err(ApiError::NotFound("Category not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn category_exams(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(category_id): Path<String>,
) -> Result<Json<Vec<ExamResponse>>, ApiError> {
    let exists = repositories::categories::exists(state.db(), &category_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load category"))?;
    if !exists {
        return Err(ApiError::NotFound("Category not found".to_string()));
    }

    let exams = repositories::exams::list_by_category(state.db(), &category_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list exams"))?;

    let mut responses = Vec::with_capacity(exams.len());
    for exam in exams {
        responses.push(exam_with_questions(&state, exam).await?);
    }

    Ok(Json(responses))
}

#[cfg(test)]
mod tests;
