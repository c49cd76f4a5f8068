use serde::Serialize;

use crate::repositories::stats::{CategoryAttemptsRow, ExamAverageRow, LeaderboardRow};

#[derive(Debug, Serialize)]
pub(crate) struct ExamAverage {
    pub(crate) exam_title: String,
    pub(crate) avg_score: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct LeaderboardEntry {
    pub(crate) username: String,
    pub(crate) total_score: i64,
    pub(crate) total_attempts: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamStatsResponse {
    pub(crate) total_exams: i64,
    pub(crate) total_attempts: i64,
    pub(crate) avg_score_per_exam: Vec<ExamAverage>,
    pub(crate) leaderboard: Vec<LeaderboardEntry>,
}

/// Student-facing leaderboard keeps the original field names (student/score/
/// attempts) rather than the admin shape.
#[derive(Debug, Serialize)]
pub(crate) struct StudentLeaderboardEntry {
    pub(crate) student: String,
    pub(crate) score: i64,
    pub(crate) attempts: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct CategoryAttempts {
    pub(crate) category_id: String,
    pub(crate) category_name: String,
    pub(crate) count: i64,
}

impl ExamAverage {
    pub(crate) fn from_row(row: ExamAverageRow) -> Self {
        Self { exam_title: row.exam_title, avg_score: row.avg_score }
    }
}

impl LeaderboardEntry {
    pub(crate) fn from_row(row: LeaderboardRow) -> Self {
        Self {
            username: row.username,
            total_score: row.total_score,
            total_attempts: row.total_attempts,
        }
    }
}

impl StudentLeaderboardEntry {
    pub(crate) fn from_row(row: LeaderboardRow) -> Self {
        Self { student: row.username, score: row.total_score, attempts: row.total_attempts }
    }
}

impl CategoryAttempts {
    pub(crate) fn from_row(row: CategoryAttemptsRow) -> Self {
        Self { category_id: row.category_id, category_name: row.category_name, count: row.count }
    }
}
