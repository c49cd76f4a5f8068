use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Exam;
use crate::repositories;
use crate::schemas::attempt::{
    AnswerResponse, AttemptResponse, ScoreResponse, SubmissionResponse, SubmitExamRequest,
};
use crate::schemas::exam::{
    ExamCreate, ExamResponse, ExamUpdate, QuestionCreate, QuestionResponse,
    StudentQuestionResponse,
};
use crate::schemas::generation::{
    GenerateQuestionsRequest, GeneratedQuestionResponse, GenerateQuestionsResponse,
};
use crate::services::question_gen::{build_prompt, parse_generated_text};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_exams).post(create_exam))
        .route("/:exam_id", get(get_exam).put(update_exam).patch(update_exam).delete(delete_exam))
        .route("/:exam_id/questions", get(exam_questions))
        .route("/:exam_id/submit", post(submit_exam))
        .route("/:exam_id/score", get(check_score))
        .route("/:exam_id/generate-questions", post(generate_questions))
}

/// Loads an exam's questions and options and assembles the admin-facing
/// response shape. Shared with the category exam listing.
pub(crate) async fn exam_with_questions(
    state: &AppState,
    exam: Exam,
) -> Result<ExamResponse, ApiError> {
    let questions = repositories::questions::list_by_exam(state.db(), &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list questions"))?;
    let mut options = repositories::questions::options_for_exam(state.db(), &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list options"))?;

    let mut responses = Vec::with_capacity(questions.len());
    for question in questions {
        let (mine, rest): (Vec<_>, Vec<_>) =
            options.into_iter().partition(|o| o.question_id == question.id);
        options = rest;
        responses.push(QuestionResponse::from_db(question, mine));
    }

    Ok(ExamResponse::from_db(exam, responses))
}

async fn fetch_exam(state: &AppState, exam_id: &str) -> Result<Exam, ApiError> {
    repositories::exams::find_by_id(state.db(), exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load exam"))?
        .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))
}

async fn list_exams(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<Vec<ExamResponse>>, ApiError> {
    let exams = repositories::exams::list(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list exams"))?;

    let mut responses = Vec::with_capacity(exams.len());
    for exam in exams {
        responses.push(exam_with_questions(&state, exam).await?);
    }

    Ok(Json(responses))
}

async fn create_exam(
    State(state): State<AppState>,
    _admin: CurrentAdmin,
    Json(payload): Json<ExamCreate>,
) -> Result<(StatusCode, Json<ExamResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    for question in &payload.questions {
        question.validate_options().map_err(ApiError::BadRequest)?;
    }

    let category_ok = repositories::categories::exists(state.db(), &payload.category_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load category"))?;
    if !category_ok {
        return Err(ApiError::BadRequest("Unknown category".to_string()));
    }

    let now = primitive_now_utc();
    let exam_id = Uuid::new_v4().to_string();

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to open transaction"))?;

    let exam = repositories::exams::insert(
        &mut tx,
        repositories::exams::CreateExam {
            id: &exam_id,
            category_id: &payload.category_id,
            title: payload.title.trim(),
            description: payload.description.as_deref(),
            duration_minutes: payload.duration_minutes,
            total_marks: payload.total_marks,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create exam"))?;

    let mut questions = Vec::with_capacity(payload.questions.len());
    for (position, question) in payload.questions.iter().enumerate() {
        questions.push(persist_question(&mut tx, &exam.id, question, position as i32, now).await?);
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit exam"))?;

    tracing::info!(exam_id = %exam.id, questions = questions.len(), "Created exam");

    Ok((StatusCode::CREATED, Json(ExamResponse::from_db(exam, questions))))
}

/// Inserts one validated question with its options inside the caller's
/// transaction.
pub(crate) async fn persist_question(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    exam_id: &str,
    payload: &QuestionCreate,
    position: i32,
    created_at: time::PrimitiveDateTime,
) -> Result<QuestionResponse, ApiError> {
    let question = repositories::questions::insert(
        tx,
        &Uuid::new_v4().to_string(),
        exam_id,
        payload.text.trim(),
        position,
        created_at,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create question"))?;

    let mut options = Vec::with_capacity(payload.options.len());
    for (opt_position, option) in payload.options.iter().enumerate() {
        let inserted = repositories::questions::insert_option(
            tx,
            &Uuid::new_v4().to_string(),
            &question.id,
            option.text.trim(),
            option.is_correct,
            opt_position as i32,
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create option"))?;
        options.push(inserted);
    }

    Ok(QuestionResponse::from_db(question, options))
}

async fn get_exam(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(exam_id): Path<String>,
) -> Result<Json<ExamResponse>, ApiError> {
    let exam = fetch_exam(&state, &exam_id).await?;
    Ok(Json(exam_with_questions(&state, exam).await?))
}

async fn update_exam(
    State(state): State<AppState>,
    _admin: CurrentAdmin,
    Path(exam_id): Path<String>,
    Json(payload): Json<ExamUpdate>,
) -> Result<Json<ExamResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    if let Some(category_id) = &payload.category_id {
        let category_ok = repositories::categories::exists(state.db(), category_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load category"))?;
        if !category_ok {
            return Err(ApiError::BadRequest("Unknown category".to_string()));
        }
    }

    let exam = repositories::exams::update(
        state.db(),
        &exam_id,
        repositories::exams::UpdateExam {
            category_id: payload.category_id,
            title: payload.title,
            description: payload.description,
            duration_minutes: payload.duration_minutes,
            total_marks: payload.total_marks,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update exam"))?
    .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))?;

    Ok(Json(exam_with_questions(&state, exam).await?))
}

async fn delete_exam(
    State(state): State<AppState>,
    _admin: CurrentAdmin,
    Path(exam_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::exams::delete_by_id(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete exam"))?;

    if !deleted {
        return Err(ApiError::NotFound("Exam not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn exam_questions(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(exam_id): Path<String>,
) -> Result<Json<Vec<StudentQuestionResponse>>, ApiError> {
    let exam = fetch_exam(&state, &exam_id).await?;

    let questions = repositories::questions::list_by_exam(state.db(), &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list questions"))?;

    let mut responses = Vec::with_capacity(questions.len());
    for question in questions {
        let options = repositories::questions::options_for_question(state.db(), &question.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list options"))?;
        responses.push(StudentQuestionResponse::from_db(question, options));
    }

    Ok(Json(responses))
}

async fn submit_exam(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(exam_id): Path<String>,
    Json(payload): Json<SubmitExamRequest>,
) -> Result<(StatusCode, Json<SubmissionResponse>), ApiError> {
    let exam = fetch_exam(&state, &exam_id).await?;

    let total_questions = repositories::exams::count_questions(state.db(), &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count questions"))?;

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to open transaction"))?;

    let attempt = repositories::attempts::insert(
        &mut tx,
        &Uuid::new_v4().to_string(),
        &exam.id,
        &user.id,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create attempt"))?;

    let mut answers = Vec::new();
    let mut correct: u32 = 0;

    for (question_id, option_id) in &payload.answers {
        // Unknown or cross-exam ids are skipped, never rejected.
        let Some(question) = repositories::questions::find_scoped(state.db(), question_id, &exam.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load question"))?
        else {
            continue;
        };
        let Some(option) =
            repositories::questions::find_option_scoped(state.db(), option_id, &question.id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to load option"))?
        else {
            continue;
        };

        if option.is_correct {
            correct += 1;
        }

        let answer = repositories::attempts::insert_answer(
            &mut tx,
            &Uuid::new_v4().to_string(),
            &attempt.id,
            &question.id,
            &option.id,
            option.is_correct,
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to record answer"))?;
        answers.push(AnswerResponse::from_db(answer));
    }

    let score = state.settings().exam().scoring_policy.score(
        correct,
        total_questions as u32,
        exam.total_marks,
    );
    repositories::attempts::set_score(&mut tx, &attempt.id, score)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to store score"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit submission"))?;

    tracing::info!(attempt_id = %attempt.id, exam_id = %exam.id, score, "Scored submission");

    let mut attempt = AttemptResponse::from_db(attempt);
    attempt.score = score;

    Ok((StatusCode::CREATED, Json(SubmissionResponse { attempt, answers })))
}

async fn check_score(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(exam_id): Path<String>,
) -> Result<Json<ScoreResponse>, ApiError> {
    let exam = fetch_exam(&state, &exam_id).await?;

    let attempt = repositories::attempts::latest_for_student_exam(state.db(), &user.id, &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load attempt"))?
        .ok_or_else(|| ApiError::NotFound("No submission found".to_string()))?;

    let answers = repositories::attempts::answers_for_attempt(state.db(), &attempt.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load answers"))?;

    Ok(Json(ScoreResponse {
        attempt: AttemptResponse::from_db(attempt),
        answers: answers.into_iter().map(AnswerResponse::from_db).collect(),
    }))
}

async fn generate_questions(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(exam_id): Path<String>,
    Json(payload): Json<GenerateQuestionsRequest>,
) -> Result<(StatusCode, Json<GenerateQuestionsResponse>), ApiError> {
    let exam = fetch_exam(&state, &exam_id).await?;

    tracing::info!(
        admin = %admin.username,
        exam = %exam.title,
        "Generating exam questions"
    );

    let exam_settings = state.settings().exam();
    let num_questions = payload
        .num_questions
        .unwrap_or(exam_settings.default_generated_questions)
        .min(exam_settings.max_generated_questions)
        .max(1);

    let prompt = build_prompt(num_questions, &exam.title);
    let output = state
        .generator()
        .generate(&prompt)
        .await
        .map_err(|e| ApiError::ServiceUnavailable(format!("Question generation failed: {e}")))?;

    let parsed = parse_generated_text(&output, num_questions as usize);

    let now = primitive_now_utc();
    let mut position = repositories::questions::next_position(state.db(), &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to compute question position"))?;

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to open transaction"))?;

    let mut generated = Vec::with_capacity(parsed.len());
    for item in parsed {
        let question = repositories::questions::insert(
            &mut tx,
            &Uuid::new_v4().to_string(),
            &exam.id,
            &item.text,
            position,
            now,
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create question"))?;
        position += 1;

        // The model's correct label must match an option; otherwise the first
        // option is flagged so the question stays scorable.
        let correct_index = item
            .options
            .iter()
            .position(|text| text.eq_ignore_ascii_case(&item.correct))
            .unwrap_or(0);
        let correct = item.options.get(correct_index).cloned().unwrap_or_default();

        for (opt_position, text) in item.options.iter().enumerate() {
            repositories::questions::insert_option(
                &mut tx,
                &Uuid::new_v4().to_string(),
                &question.id,
                text,
                opt_position == correct_index,
                opt_position as i32,
            )
            .await
            .map_err(|e| ApiError::internal(e, "Failed to create option"))?;
        }

        generated.push(GeneratedQuestionResponse {
            id: question.id,
            text: item.text,
            options: item.options,
            correct,
        });
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit generated questions"))?;

    tracing::info!(exam_id = %exam.id, generated = generated.len(), "Generated questions");

    Ok((
        StatusCode::CREATED,
        Json(GenerateQuestionsResponse { exam: exam.title, generated_questions: generated }),
    ))
}
