use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::time::format_primitive;
use crate::db::models::{ExamAttempt, UserAnswer};

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitExamRequest {
    /// question_id -> selected_option_id
    #[serde(default)]
    pub(crate) answers: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AnswerResponse {
    pub(crate) question_id: String,
    pub(crate) selected_option_id: String,
    pub(crate) is_correct: bool,
}

impl AnswerResponse {
    pub(crate) fn from_db(answer: UserAnswer) -> Self {
        Self {
            question_id: answer.question_id,
            selected_option_id: answer.selected_option_id,
            is_correct: answer.is_correct,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AttemptResponse {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) student_id: String,
    pub(crate) score: i32,
    pub(crate) submitted_at: String,
}

impl AttemptResponse {
    pub(crate) fn from_db(attempt: ExamAttempt) -> Self {
        Self {
            id: attempt.id,
            exam_id: attempt.exam_id,
            student_id: attempt.student_id,
            score: attempt.score,
            submitted_at: format_primitive(attempt.submitted_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmissionResponse {
    #[serde(flatten)]
    pub(crate) attempt: AttemptResponse,
    pub(crate) answers: Vec<AnswerResponse>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ScoreResponse {
    pub(crate) attempt: AttemptResponse,
    pub(crate) answers: Vec<AnswerResponse>,
}
