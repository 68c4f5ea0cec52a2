use sqlx::SqlitePool;

use crate::error::AppError;
use crate::models::{Course, CourseStatus, Subscription, User};

pub async fn all_courses(db: &SqlitePool) -> Result<Vec<Course>, AppError> {
    let courses = sqlx::query_as::<_, Course>("SELECT id, code, status, term FROM courses")
        .fetch_all(db)
        .await?;
    Ok(courses)
}

pub async fn find_course(
    db: &SqlitePool,
    code: &str,
    term: &str,
) -> Result<Option<Course>, AppError> {
    let course = sqlx::query_as::<_, Course>(
        "SELECT id, code, status, term FROM courses WHERE code = ?1 AND term = ?2",
    )
    .bind(code)
    .bind(term)
    .fetch_optional(db)
    .await?;
    Ok(course)
}

/// Create the course record the first time anyone asks to track it.
///
/// The insert races with concurrent track requests for the same (code,
/// term), so it is conditional on the natural key; an existing record is
/// returned unchanged and the requested initial status is ignored.
pub async fn get_or_create_course(
    db: &SqlitePool,
    code: &str,
    term: &str,
    initial_status: CourseStatus,
) -> Result<Course, AppError> {
    if code.trim().is_empty() {
        return Err(AppError::BadRequest("course code cannot be blank".to_string()));
    }
    if term.trim().is_empty() {
        return Err(AppError::BadRequest("term cannot be blank".to_string()));
    }

    sqlx::query(
        "INSERT INTO courses (code, status, term) VALUES (?1, ?2, ?3) \
         ON CONFLICT (code, term) DO NOTHING",
    )
    .bind(code)
    .bind(initial_status)
    .bind(term)
    .execute(db)
    .await?;

    find_course(db, code, term).await?.ok_or(AppError::NotFound)
}

pub async fn update_course_status(
    db: &SqlitePool,
    course_id: i64,
    status: CourseStatus,
) -> Result<(), AppError> {
    sqlx::query("UPDATE courses SET status = ?1 WHERE id = ?2")
        .bind(status)
        .bind(course_id)
        .execute(db)
        .await?;
    Ok(())
}

/// The courses a user is tracking for one term.
pub async fn courses_for_user(
    db: &SqlitePool,
    user_id: i64,
    term: &str,
) -> Result<Vec<Course>, AppError> {
    let courses = sqlx::query_as::<_, Course>(
        "SELECT courses.id, courses.code, courses.status, courses.term \
         FROM courses, subscriptions \
         WHERE subscriptions.user_id = ?1 \
           AND subscriptions.course_id = courses.id \
           AND courses.term = ?2",
    )
    .bind(user_id)
    .bind(term)
    .fetch_all(db)
    .await?;
    Ok(courses)
}

/// Subscribe a user to a course record. Idempotent: a duplicate request
/// returns the existing row and reports `already_existed = true`.
pub async fn subscribe(
    db: &SqlitePool,
    course_id: i64,
    user_id: i64,
) -> Result<(Subscription, bool), AppError> {
    if course_id <= 0 {
        return Err(AppError::BadRequest("course id must be positive".to_string()));
    }
    if user_id <= 0 {
        return Err(AppError::BadRequest("user id must be positive".to_string()));
    }

    let inserted = sqlx::query(
        "INSERT INTO subscriptions (course_id, user_id) VALUES (?1, ?2) \
         ON CONFLICT (course_id, user_id) DO NOTHING",
    )
    .bind(course_id)
    .bind(user_id)
    .execute(db)
    .await?
    .rows_affected()
        > 0;

    let subscription = sqlx::query_as::<_, Subscription>(
        "SELECT id, course_id, user_id FROM subscriptions \
         WHERE course_id = ?1 AND user_id = ?2",
    )
    .bind(course_id)
    .bind(user_id)
    .fetch_optional(db)
    .await?
    .ok_or(AppError::NotFound)?;

    Ok((subscription, !inserted))
}

/// Remove a user's subscription, addressed by course identity rather than
/// surrogate id. Returns whether a row was actually deleted.
pub async fn unsubscribe(
    db: &SqlitePool,
    user_id: i64,
    code: &str,
    term: &str,
) -> Result<bool, AppError> {
    let result = sqlx::query(
        "DELETE FROM subscriptions \
         WHERE user_id = ?1 \
           AND course_id IN (SELECT id FROM courses WHERE code = ?2 AND term = ?3)",
    )
    .bind(user_id)
    .bind(code)
    .bind(term)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn subscribers_of(
    db: &SqlitePool,
    course_id: i64,
) -> Result<Vec<Subscription>, AppError> {
    let subscriptions = sqlx::query_as::<_, Subscription>(
        "SELECT id, course_id, user_id FROM subscriptions WHERE course_id = ?1",
    )
    .bind(course_id)
    .fetch_all(db)
    .await?;
    Ok(subscriptions)
}

pub async fn find_user(db: &SqlitePool, user_id: i64) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>("SELECT id, email FROM users WHERE id = ?1")
        .bind(user_id)
        .fetch_optional(db)
        .await?;
    Ok(user)
}
