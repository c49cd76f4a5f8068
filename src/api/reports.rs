use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::core::state::AppState;
use crate::repositories::stats;
use crate::schemas::stats::{
    CategoryAttempts, ExamStatsResponse, ExamAverage, LeaderboardEntry, StudentLeaderboardEntry,
};

const ADMIN_LEADERBOARD_LIMIT: i64 = 10;
const PUBLIC_LEADERBOARD_LIMIT: i64 = 5;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/exam-stats", get(exam_stats))
        .route("/attempts-per-category", get(attempts_per_category))
        .route("/leaderboard", get(leaderboard))
}

async fn exam_stats(
    State(state): State<AppState>,
    _admin: CurrentAdmin,
) -> Result<Json<ExamStatsResponse>, ApiError> {
    let total_exams = stats::total_exams(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count exams"))?;
    let total_attempts = stats::total_attempts(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count attempts"))?;
    let averages = stats::avg_score_per_exam(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to compute exam averages"))?;
    let leaders = stats::leaderboard(state.db(), ADMIN_LEADERBOARD_LIMIT)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to compute leaderboard"))?;

    Ok(Json(ExamStatsResponse {
        total_exams,
        total_attempts,
        avg_score_per_exam: averages.into_iter().map(ExamAverage::from_row).collect(),
        leaderboard: leaders.into_iter().map(LeaderboardEntry::from_row).collect(),
    }))
}

async fn attempts_per_category(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<CategoryAttempts>>, ApiError> {
    let rows = stats::attempts_per_category(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to group attempts"))?;

    Ok(Json(rows.into_iter().map(CategoryAttempts::from_row).collect()))
}

async fn leaderboard(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<Vec<StudentLeaderboardEntry>>, ApiError> {
    let leaders = stats::leaderboard(state.db(), PUBLIC_LEADERBOARD_LIMIT)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to compute leaderboard"))?;

    Ok(Json(leaders.into_iter().map(StudentLeaderboardEntry::from_row).collect()))
}

#[cfg(test)]
mod tests;
