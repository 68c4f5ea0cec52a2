use axum::Json;
use axum::extract::{Path, Query};
use axum::routing::{delete, post};
use axum::{Router, extract::State, http::StatusCode, routing::get};
use serde::{Deserialize, Serialize};

use crate::db::repository;
use crate::error::AppError;
use crate::models::{Course, CourseStatus, Term, TrackOutcome, UntrackOutcome};
use crate::services::{CycleStats, MonitorService};
use crate::state::AppState;

// The account subsystem authenticates callers; handlers trust the user id
// they are handed.

#[derive(Deserialize)]
struct TrackRequest {
    user_id: i64,
    course_code: String,
}

#[derive(Deserialize)]
struct UserParams {
    user_id: i64,
}

#[derive(Serialize)]
struct TrackResponse {
    status: TrackOutcome,
    courses: Vec<Course>,
}

#[derive(Serialize)]
struct UntrackResponse {
    status: UntrackOutcome,
    courses: Vec<Course>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/terms/{term}/courses", get(list_tracked).put(track_course))
        .route("/terms/{term}/courses/{code}", delete(untrack_course))
        .route("/monitor/run", post(run_monitor_cycle))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn list_tracked(
    State(state): State<AppState>,
    Path(term): Path<String>,
    Query(params): Query<UserParams>,
) -> Result<Json<Vec<Course>>, AppError> {
    let term: Term = term.parse()?;
    let courses =
        repository::courses_for_user(&state.db, params.user_id, &term.to_string()).await?;
    Ok(Json(courses))
}

/// Start tracking a course for a term. The course record is created lazily
/// on the first request, seeded with whatever the catalog reports right
/// now; a course the catalog has never heard of is not recorded at all.
async fn track_course(
    State(state): State<AppState>,
    Path(term): Path<String>,
    Json(req): Json<TrackRequest>,
) -> Result<Json<TrackResponse>, AppError> {
    let term: Term = term.parse()?;
    let code = req.course_code.trim();
    if code.is_empty() {
        return Err(AppError::BadRequest("course code cannot be blank".to_string()));
    }
    let term_code = term.to_string();

    let status = state.catalog.fetch_status(code, &term_code).await?;
    let outcome = if status == CourseStatus::Nonexistent {
        TrackOutcome::Nonexistent
    } else {
        let course =
            repository::get_or_create_course(&state.db, code, &term_code, status).await?;
        let (_, already_tracked) =
            repository::subscribe(&state.db, course.id, req.user_id).await?;
        if already_tracked {
            TrackOutcome::AlreadyTracked
        } else {
            TrackOutcome::from(status)
        }
    };

    let courses = repository::courses_for_user(&state.db, req.user_id, &term_code).await?;
    Ok(Json(TrackResponse {
        status: outcome,
        courses,
    }))
}

async fn untrack_course(
    State(state): State<AppState>,
    Path((term, code)): Path<(String, String)>,
    Query(params): Query<UserParams>,
) -> Result<Json<UntrackResponse>, AppError> {
    let term: Term = term.parse()?;
    let term_code = term.to_string();

    let deleted = repository::unsubscribe(&state.db, params.user_id, &code, &term_code).await?;
    let status = if deleted {
        UntrackOutcome::Deleted
    } else {
        UntrackOutcome::NotDeleted
    };

    let courses = repository::courses_for_user(&state.db, params.user_id, &term_code).await?;
    Ok(Json(UntrackResponse { status, courses }))
}

/// Run one monitoring cycle immediately instead of waiting for the
/// scheduler's next tick.
async fn run_monitor_cycle(State(state): State<AppState>) -> Result<Json<CycleStats>, AppError> {
    let service = MonitorService::new(
        state.db.clone(),
        state.catalog.clone(),
        state.notifier.clone(),
    );
    let stats = service.run_cycle().await?;
    Ok(Json(stats))
}
