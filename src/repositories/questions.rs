use sqlx::{PgPool, Postgres, Transaction};
use time::PrimitiveDateTime;

use crate::db::models::{Question, QuestionOption};

pub(crate) const COLUMNS: &str = "id, exam_id, text, position, created_at";
pub(crate) const OPTION_COLUMNS: &str = "id, question_id, text, is_correct, position";

pub(crate) async fn list(pool: &PgPool) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM questions ORDER BY exam_id, position"
    ))
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_by_exam(
    pool: &PgPool,
    exam_id: &str,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM questions WHERE exam_id = $1 ORDER BY position, created_at"
    ))
    .bind(exam_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!("SELECT {COLUMNS} FROM questions WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Question lookup scoped to one exam; used by the submission loop so answers
/// cannot reference questions from other exams.
pub(crate) async fn find_scoped(
    pool: &PgPool,
    id: &str,
    exam_id: &str,
) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM questions WHERE id = $1 AND exam_id = $2"
    ))
    .bind(id)
    .bind(exam_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn options_for_question(
    pool: &PgPool,
    question_id: &str,
) -> Result<Vec<QuestionOption>, sqlx::Error> {
    sqlx::query_as::<_, QuestionOption>(&format!(
        "SELECT {OPTION_COLUMNS} FROM question_options WHERE question_id = $1 ORDER BY position"
    ))
    .bind(question_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn options_for_exam(
    pool: &PgPool,
    exam_id: &str,
) -> Result<Vec<QuestionOption>, sqlx::Error> {
    sqlx::query_as::<_, QuestionOption>(&format!(
        "SELECT o.{} FROM question_options o
         JOIN questions q ON q.id = o.question_id
         WHERE q.exam_id = $1
         ORDER BY q.position, o.position",
        OPTION_COLUMNS.replace(", ", ", o."),
    ))
    .bind(exam_id)
    .fetch_all(pool)
    .await
}

/// Option lookup scoped to one question, mirroring `find_scoped`.
pub(crate) async fn find_option_scoped(
    pool: &PgPool,
    id: &str,
    question_id: &str,
) -> Result<Option<QuestionOption>, sqlx::Error> {
    sqlx::query_as::<_, QuestionOption>(&format!(
        "SELECT {OPTION_COLUMNS} FROM question_options WHERE id = $1 AND question_id = $2"
    ))
    .bind(id)
    .bind(question_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn insert(
    tx: &mut Transaction<'_, Postgres>,
    id: &str,
    exam_id: &str,
    text: &str,
    position: i32,
    created_at: PrimitiveDateTime,
) -> Result<Question, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "INSERT INTO questions (id, exam_id, text, position, created_at)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(exam_id)
    .bind(text)
    .bind(position)
    .bind(created_at)
    .fetch_one(&mut **tx)
    .await
}

pub(crate) async fn insert_option(
    tx: &mut Transaction<'_, Postgres>,
    id: &str,
    question_id: &str,
    text: &str,
    is_correct: bool,
    position: i32,
) -> Result<QuestionOption, sqlx::Error> {
    sqlx::query_as::<_, QuestionOption>(&format!(
        "INSERT INTO question_options (id, question_id, text, is_correct, position)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {OPTION_COLUMNS}"
    ))
    .bind(id)
    .bind(question_id)
    .bind(text)
    .bind(is_correct)
    .bind(position)
    .fetch_one(&mut **tx)
    .await
}

pub(crate) async fn update_text(
    pool: &PgPool,
    id: &str,
    text: &str,
) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "UPDATE questions SET text = $1 WHERE id = $2 RETURNING {COLUMNS}"
    ))
    .bind(text)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete_by_id(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM questions WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn next_position(pool: &PgPool, exam_id: &str) -> Result<i32, sqlx::Error> {
    sqlx::query_scalar("SELECT COALESCE(MAX(position) + 1, 0) FROM questions WHERE exam_id = $1")
        .bind(exam_id)
        .fetch_one(pool)
        .await
}
