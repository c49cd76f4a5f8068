use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::models::{Exam, Question, QuestionOption};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ExamCreate {
    pub(crate) category_id: String,
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[validate(range(min = 1, message = "duration_minutes must be positive"))]
    pub(crate) duration_minutes: i32,
    #[validate(range(min = 1, message = "total_marks must be positive"))]
    pub(crate) total_marks: i32,
    #[serde(default)]
    pub(crate) questions: Vec<QuestionCreate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuestionCreate {
    pub(crate) text: String,
    pub(crate) options: Vec<OptionCreate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OptionCreate {
    pub(crate) text: String,
    #[serde(default)]
    pub(crate) is_correct: bool,
}

impl QuestionCreate {
    /// Exactly one correct option among at least two; every write path that
    /// accepts client-supplied questions goes through this check.
    pub(crate) fn validate_options(&self) -> Result<(), String> {
        if self.text.trim().is_empty() {
            return Err("question text must not be empty".to_string());
        }
        if self.options.len() < 2 {
            return Err(format!("question '{}' needs at least 2 options", self.text));
        }
        let correct = self.options.iter().filter(|opt| opt.is_correct).count();
        if correct != 1 {
            return Err(format!(
                "question '{}' must have exactly one correct option, found {correct}",
                self.text
            ));
        }
        Ok(())
    }
}

/// Standalone question creation targets an existing exam by id.
#[derive(Debug, Deserialize)]
pub(crate) struct StandaloneQuestionCreate {
    pub(crate) exam_id: String,
    #[serde(flatten)]
    pub(crate) question: QuestionCreate,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionUpdate {
    #[validate(length(min = 1, message = "text must not be empty"))]
    pub(crate) text: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ExamUpdate {
    #[serde(default)]
    pub(crate) category_id: Option<String>,
    #[serde(default)]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    #[validate(range(min = 1, message = "duration_minutes must be positive"))]
    pub(crate) duration_minutes: Option<i32>,
    #[serde(default)]
    #[validate(range(min = 1, message = "total_marks must be positive"))]
    pub(crate) total_marks: Option<i32>,
}

#[derive(Debug, Serialize)]
pub(crate) struct OptionResponse {
    pub(crate) id: String,
    pub(crate) text: String,
    pub(crate) is_correct: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: String,
    pub(crate) text: String,
    /// Text of the flagged option; kept for admin review screens.
    pub(crate) correct_option: Option<String>,
    pub(crate) options: Vec<OptionResponse>,
}

impl QuestionResponse {
    pub(crate) fn from_db(question: Question, options: Vec<QuestionOption>) -> Self {
        let correct_option =
            options.iter().find(|opt| opt.is_correct).map(|opt| opt.text.clone());
        Self {
            id: question.id,
            text: question.text,
            correct_option,
            options: options
                .into_iter()
                .map(|opt| OptionResponse { id: opt.id, text: opt.text, is_correct: opt.is_correct })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamResponse {
    pub(crate) id: String,
    pub(crate) category_id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) duration_minutes: i32,
    pub(crate) total_marks: i32,
    pub(crate) questions: Vec<QuestionResponse>,
}

impl ExamResponse {
    pub(crate) fn from_db(exam: Exam, questions: Vec<QuestionResponse>) -> Self {
        Self {
            id: exam.id,
            category_id: exam.category_id,
            title: exam.title,
            description: exam.description,
            duration_minutes: exam.duration_minutes,
            total_marks: exam.total_marks,
            questions,
        }
    }
}

/// Question shape served to students taking the exam; correctness is never
/// exposed here.
#[derive(Debug, Serialize)]
pub(crate) struct StudentOptionResponse {
    pub(crate) id: String,
    pub(crate) text: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct StudentQuestionResponse {
    pub(crate) id: String,
    pub(crate) text: String,
    pub(crate) options: Vec<StudentOptionResponse>,
}

impl StudentQuestionResponse {
    pub(crate) fn from_db(question: Question, options: Vec<QuestionOption>) -> Self {
        Self {
            id: question.id,
            text: question.text,
            options: options
                .into_iter()
                .map(|opt| StudentOptionResponse { id: opt.id, text: opt.text })
                .collect(),
        }
    }
}
