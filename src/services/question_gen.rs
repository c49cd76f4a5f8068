use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::core::config::Settings;

const MAX_RETRIES: u32 = 3;

/// Prompt-in/text-out capability. Injected into `AppState` so handlers never
/// talk to a concrete model client and tests can script the output.
#[async_trait]
pub(crate) trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

pub(crate) fn build_prompt(num_questions: u32, exam_title: &str) -> String {
    format!(
        "Generate {num_questions} multiple choice questions for the exam: {exam_title}. \
         Each question must have 4 options labeled A, B, C, D. Clearly mark the correct answer."
    )
}

/// A question recovered from free-form model output, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedQuestion {
    pub(crate) text: String,
    pub(crate) options: Vec<String>,
    pub(crate) correct: String,
}

/// Line-oriented parser for model output shaped like:
///
/// ```text
/// 1. What is 2 + 2?
/// A) 3
/// B) 4
/// Answer: 4
/// ```
///
/// Unrecognized lines are ignored; a question without any options is dropped;
/// a question whose correct label was never seen falls back to its first
/// option. The result is truncated to `limit`.
pub(crate) fn parse_generated_text(output: &str, limit: usize) -> Vec<ParsedQuestion> {
    let mut questions: Vec<ParsedQuestion> = Vec::new();
    let mut text: Option<String> = None;
    let mut options: Vec<String> = Vec::new();
    let mut correct: Option<String> = None;

    let flush = |questions: &mut Vec<ParsedQuestion>,
                 text: &mut Option<String>,
                 options: &mut Vec<String>,
                 correct: &mut Option<String>| {
        if let Some(question_text) = text.take() {
            if !options.is_empty() {
                let fallback = options[0].clone();
                questions.push(ParsedQuestion {
                    text: question_text,
                    options: std::mem::take(options),
                    correct: correct.take().unwrap_or(fallback),
                });
            }
        }
        *text = None;
        options.clear();
        *correct = None;
    };

    for line in output.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let first = line.chars().next().unwrap_or_default();

        if first.is_ascii_digit() && line.contains('.') {
            flush(&mut questions, &mut text, &mut options, &mut correct);
            if let Some((_, rest)) = line.split_once('.') {
                text = Some(rest.trim().to_string());
            }
        } else if matches!(first, 'A' | 'B' | 'C' | 'D') && line.contains(')') {
            if let Some((_, rest)) = line.split_once(')') {
                options.push(rest.trim().to_string());
            }
        } else if line.contains("Answer:") || line.contains("Correct:") {
            if let Some(label) = line.rsplit(':').next() {
                correct = Some(label.trim().to_string());
            }
        }
    }

    flush(&mut questions, &mut text, &mut options, &mut correct);
    questions.truncate(limit);
    questions
}

/// OpenAI-compatible chat-completions client used in production. Bounded
/// timeouts and a short retry loop keep one slow model call from wedging the
/// request path.
#[derive(Debug, Clone)]
pub(crate) struct OpenAiTextGenerator {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl OpenAiTextGenerator {
    pub(crate) fn from_settings(settings: &Settings) -> Result<Self> {
        let timeout = Duration::from_secs(settings.ai().ai_request_timeout);
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_key: settings.ai().openai_api_key.clone(),
            base_url: settings.ai().openai_base_url.trim_end_matches('/').to_string(),
            model: settings.ai().ai_model.clone(),
            max_tokens: settings.ai().ai_max_tokens,
        })
    }
}

#[async_trait]
impl TextGenerator for OpenAiTextGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let payload = json!({
            "model": self.model,
            "messages": [
                {"role": "user", "content": prompt}
            ],
            "max_completion_tokens": self.max_tokens,
        });

        let url = format!("{}/chat/completions", self.base_url);
        let mut last_error = None;
        let mut body = Value::Null;

        for attempt in 0..=MAX_RETRIES {
            let response =
                self.client.post(&url).bearer_auth(&self.api_key).json(&payload).send().await;

            match response {
                Ok(resp) => {
                    let status = resp.status();
                    body = resp.json().await.unwrap_or(Value::Null);
                    if status.is_success() {
                        last_error = None;
                        break;
                    }
                    last_error = Some(anyhow::anyhow!("Text generation API error: {body}"));
                }
                Err(err) => {
                    last_error =
                        Some(anyhow::anyhow!(err).context("Failed to call text generation API"));
                }
            }

            if attempt < MAX_RETRIES {
                tokio::time::sleep(Duration::from_secs(2_u64.pow(attempt))).await;
            }
        }

        if let Some(err) = last_error {
            return Err(err);
        }

        let content = body
            .get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|value| value.as_str())
            .context("Missing text generation response content")?;

        Ok(content.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_names_exam_and_count() {
        let prompt = build_prompt(5, "Math101");
        assert!(prompt.contains("5 multiple choice questions"));
        assert!(prompt.contains("Math101"));
    }

    #[test]
    fn parses_questions_options_and_answer() {
        let output = "\
1. What is 2 + 2?
A) 3
B) 4
C) 5
D) 6
Answer: 4
2. Capital of France?
A) Berlin
B) Paris
Correct: Paris
";
        let parsed = parse_generated_text(output, 20);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].text, "What is 2 + 2?");
        assert_eq!(parsed[0].options, vec!["3", "4", "5", "6"]);
        assert_eq!(parsed[0].correct, "4");
        assert_eq!(parsed[1].text, "Capital of France?");
        assert_eq!(parsed[1].correct, "Paris");
    }

    #[test]
    fn missing_answer_falls_back_to_first_option() {
        let output = "\
1. Pick one.
A) first
B) second
";
        let parsed = parse_generated_text(output, 20);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].correct, "first");
    }

    #[test]
    fn question_without_options_is_dropped() {
        let output = "\
1. Orphan question with no options.
2. Real question.
A) yes
B) no
Answer: yes
";
        let parsed = parse_generated_text(output, 20);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].text, "Real question.");
    }

    #[test]
    fn trailing_question_is_flushed() {
        let output = "\
1. First?
A) a
B) b
Answer: b
2. Last one?
A) x
B) y
";
        let parsed = parse_generated_text(output, 20);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].text, "Last one?");
        assert_eq!(parsed[1].correct, "x");
    }

    #[test]
    fn result_truncated_to_limit() {
        let mut output = String::new();
        for i in 1..=5 {
            output.push_str(&format!("{i}. Question {i}?\nA) a\nB) b\nAnswer: a\n"));
        }
        let parsed = parse_generated_text(&output, 3);
        assert_eq!(parsed.len(), 3);
    }

    #[test]
    fn noise_lines_are_ignored() {
        let output = "\
Here are your questions:

1. Solid question?
A) yes
B) no
Answer: no
Good luck!
";
        let parsed = parse_generated_text(output, 20);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].correct, "no");
    }

    #[test]
    fn empty_output_yields_no_questions() {
        assert!(parse_generated_text("", 20).is_empty());
        assert!(parse_generated_text("complete nonsense\nwith no structure", 20).is_empty());
    }
}
