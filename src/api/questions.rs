use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::exams::persist_question;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::exam::{QuestionResponse, QuestionUpdate, StandaloneQuestionCreate};

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/", get(list_questions).post(create_question)).route(
        "/:question_id",
        get(get_question).put(update_question).patch(update_question).delete(delete_question),
    )
}

async fn list_questions(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<Vec<QuestionResponse>>, ApiError> {
    let questions = repositories::questions::list(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list questions"))?;

    let mut responses = Vec::with_capacity(questions.len());
    for question in questions {
        let options = repositories::questions::options_for_question(state.db(), &question.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list options"))?;
        responses.push(QuestionResponse::from_db(question, options));
    }

    Ok(Json(responses))
}

async fn create_question(
    State(state): State<AppState>,
    _admin: CurrentAdmin,
    Json(payload): Json<StandaloneQuestionCreate>,
) -> Result<(StatusCode, Json<QuestionResponse>), ApiError> {
    payload.question.validate_options().map_err(ApiError::BadRequest)?;

    let exam = repositories::exams::find_by_id(state.db(), &payload.exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load exam"))?
        .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))?;

    let position = repositories::questions::next_position(state.db(), &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to compute question position"))?;

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to open transaction"))?;

    let response =
        persist_question(&mut tx, &exam.id, &payload.question, position, primitive_now_utc())
            .await?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit question"))?;

    Ok((StatusCode::CREATED, Json(response)))
}

async fn get_question(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(question_id): Path<String>,
) -> Result<Json<QuestionResponse>, ApiError> {
    let question = repositories::questions::find_by_id(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load question"))?
        .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;

    let options = repositories::questions::options_for_question(state.db(), &question.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list options"))?;

    Ok(Json(QuestionResponse::from_db(question, options)))
}

async fn update_question(
    State(state): State<AppState>,
    _admin: CurrentAdmin,
    Path(question_id): Path<String>,
    Json(payload): Json<QuestionUpdate>,
) -> Result<Json<QuestionResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let question = repositories::questions::update_text(state.db(), &question_id, payload.text.trim())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update question"))?
        .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;

    let options = repositories::questions::options_for_question(state.db(), &question.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list options"))?;

    Ok(Json(QuestionResponse::from_db(question, options)))
}

async fn delete_question(
    State(state): State<AppState>,
    _admin: CurrentAdmin,
    Path(question_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::questions::delete_by_id(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete question"))?;

    if !deleted {
        return Err(ApiError::NotFound("Question not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
