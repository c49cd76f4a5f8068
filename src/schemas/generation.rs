use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Default)]
pub(crate) struct GenerateQuestionsRequest {
    #[serde(default)]
    pub(crate) num_questions: Option<u32>,
}

#[derive(Debug, Serialize)]
pub(crate) struct GeneratedQuestionResponse {
    pub(crate) id: String,
    pub(crate) text: String,
    pub(crate) options: Vec<String>,
    pub(crate) correct: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct GenerateQuestionsResponse {
    pub(crate) exam: String,
    pub(crate) generated_questions: Vec<GeneratedQuestionResponse>,
}
