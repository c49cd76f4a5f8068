use sqlx::PgPool;

use crate::db::types::UserRole;

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ExamAverageRow {
    pub(crate) exam_title: String,
    pub(crate) avg_score: f64,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct LeaderboardRow {
    pub(crate) username: String,
    pub(crate) total_score: i64,
    pub(crate) total_attempts: i64,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct CategoryAttemptsRow {
    pub(crate) category_id: String,
    pub(crate) category_name: String,
    pub(crate) count: i64,
}

pub(crate) async fn total_exams(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM exams").fetch_one(pool).await
}

pub(crate) async fn total_attempts(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM exam_attempts").fetch_one(pool).await
}

pub(crate) async fn avg_score_per_exam(pool: &PgPool) -> Result<Vec<ExamAverageRow>, sqlx::Error> {
    sqlx::query_as::<_, ExamAverageRow>(
        "SELECT e.title AS exam_title, AVG(a.score)::float8 AS avg_score
         FROM exam_attempts a
         JOIN exams e ON e.id = a.exam_id
         GROUP BY e.title
         ORDER BY e.title",
    )
    .fetch_all(pool)
    .await
}

/// Students ranked by summed score across all attempts. Only students with at
/// least one attempt appear; ties break on username so the order is stable.
pub(crate) async fn leaderboard(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<LeaderboardRow>, sqlx::Error> {
    sqlx::query_as::<_, LeaderboardRow>(
        "SELECT u.username,
                SUM(a.score)::bigint AS total_score,
                COUNT(a.id) AS total_attempts
         FROM exam_attempts a
         JOIN users u ON u.id = a.student_id
         WHERE u.role = $1
         GROUP BY u.username
         ORDER BY total_score DESC, u.username ASC
         LIMIT $2",
    )
    .bind(UserRole::Student)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub(crate) async fn attempts_per_category(
    pool: &PgPool,
    student_id: &str,
) -> Result<Vec<CategoryAttemptsRow>, sqlx::Error> {
    sqlx::query_as::<_, CategoryAttemptsRow>(
        "SELECT c.id AS category_id, c.name AS category_name, COUNT(a.id) AS count
         FROM exam_attempts a
         JOIN exams e ON e.id = a.exam_id
         JOIN categories c ON c.id = e.category_id
         WHERE a.student_id = $1
         GROUP BY c.id, c.name
         ORDER BY c.name",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await
}
