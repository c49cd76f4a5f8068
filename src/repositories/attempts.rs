use sqlx::{PgPool, Postgres, Transaction};
use time::PrimitiveDateTime;

use crate::db::models::{ExamAttempt, UserAnswer};

pub(crate) const COLUMNS: &str = "id, exam_id, student_id, score, submitted_at";
pub(crate) const ANSWER_COLUMNS: &str = "id, attempt_id, question_id, selected_option_id, is_correct";

pub(crate) async fn insert(
    tx: &mut Transaction<'_, Postgres>,
    id: &str,
    exam_id: &str,
    student_id: &str,
    submitted_at: PrimitiveDateTime,
) -> Result<ExamAttempt, sqlx::Error> {
    sqlx::query_as::<_, ExamAttempt>(&format!(
        "INSERT INTO exam_attempts (id, exam_id, student_id, score, submitted_at)
         VALUES ($1, $2, $3, 0, $4)
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(exam_id)
    .bind(student_id)
    .bind(submitted_at)
    .fetch_one(&mut **tx)
    .await
}

pub(crate) async fn insert_answer(
    tx: &mut Transaction<'_, Postgres>,
    id: &str,
    attempt_id: &str,
    question_id: &str,
    selected_option_id: &str,
    is_correct: bool,
) -> Result<UserAnswer, sqlx::Error> {
    sqlx::query_as::<_, UserAnswer>(&format!(
        "INSERT INTO user_answers (id, attempt_id, question_id, selected_option_id, is_correct)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {ANSWER_COLUMNS}"
    ))
    .bind(id)
    .bind(attempt_id)
    .bind(question_id)
    .bind(selected_option_id)
    .bind(is_correct)
    .fetch_one(&mut **tx)
    .await
}

/// The single post-scoring write; the attempt row is never touched again.
pub(crate) async fn set_score(
    tx: &mut Transaction<'_, Postgres>,
    id: &str,
    score: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE exam_attempts SET score = $1 WHERE id = $2")
        .bind(score)
        .bind(id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

pub(crate) async fn latest_for_student_exam(
    pool: &PgPool,
    student_id: &str,
    exam_id: &str,
) -> Result<Option<ExamAttempt>, sqlx::Error> {
    sqlx::query_as::<_, ExamAttempt>(&format!(
        "SELECT {COLUMNS} FROM exam_attempts
         WHERE student_id = $1 AND exam_id = $2
         ORDER BY submitted_at DESC
         LIMIT 1"
    ))
    .bind(student_id)
    .bind(exam_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn answers_for_attempt(
    pool: &PgPool,
    attempt_id: &str,
) -> Result<Vec<UserAnswer>, sqlx::Error> {
    sqlx::query_as::<_, UserAnswer>(&format!(
        "SELECT {ANSWER_COLUMNS} FROM user_answers WHERE attempt_id = $1"
    ))
    .bind(attempt_id)
    .fetch_all(pool)
    .await
}
