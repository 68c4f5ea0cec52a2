use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tokio::sync::Semaphore;
use tracing::warn;

use crate::db::repository;
use crate::error::AppError;
use crate::models::{Course, CourseStatus, Term, relevant_terms};
use crate::notify::Notifier;
use crate::websoc::CatalogClient;

/// Upper bound on notification sends in flight across all fan-outs.
const FANOUT_CONCURRENCY: usize = 8;

/// One pass over every known course in a currently relevant term: fetch
/// the live status, persist changes, and fan out notifications when a
/// full course opens up.
pub struct MonitorService {
    db: SqlitePool,
    catalog: Arc<dyn CatalogClient>,
    notifier: Arc<dyn Notifier>,
    fanout: Arc<Semaphore>,
}

#[derive(Debug, Default, Serialize)]
pub struct CycleStats {
    /// Courses in a relevant term that were checked this cycle.
    pub checked: usize,
    /// Status changes persisted this cycle.
    pub transitions: usize,
    /// Courses whose subscribers were notified (full -> open/waitlist).
    pub fanouts: usize,
    /// Courses skipped because the catalog lookup failed.
    pub fetch_failures: usize,
}

impl MonitorService {
    pub fn new(
        db: SqlitePool,
        catalog: Arc<dyn CatalogClient>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            db,
            catalog,
            notifier,
            fanout: Arc::new(Semaphore::new(FANOUT_CONCURRENCY)),
        }
    }

    pub async fn run_cycle(&self) -> Result<CycleStats, AppError> {
        self.run_cycle_at(Utc::now()).await
    }

    /// The clock is a parameter so tests can pin the relevant-term window.
    pub async fn run_cycle_at(&self, now: DateTime<Utc>) -> Result<CycleStats, AppError> {
        let mut stats = CycleStats::default();
        let window: Vec<String> = relevant_terms(now)
            .into_iter()
            .map(|t| t.to_string())
            .collect();

        let courses = repository::all_courses(&self.db).await?;
        for course in courses {
            if !window.contains(&course.term) {
                continue;
            }
            stats.checked += 1;

            let new_status = match self.catalog.fetch_status(&course.code, &course.term).await {
                Ok(status) => status,
                Err(e) => {
                    // Skip without touching stored state; a transient
                    // outage must not look like a transition.
                    warn!(
                        course = %course.code,
                        term = %course.term,
                        "status fetch failed, skipping this cycle: {e}"
                    );
                    stats.fetch_failures += 1;
                    continue;
                }
            };

            if new_status == course.status {
                continue;
            }

            if let Err(e) =
                repository::update_course_status(&self.db, course.id, new_status).await
            {
                // Not persisted, so don't notify either; the next
                // successful cycle will re-detect the same transition.
                warn!(
                    course = %course.code,
                    term = %course.term,
                    "failed to persist status change: {e}"
                );
                continue;
            }
            stats.transitions += 1;

            if course.status == CourseStatus::Full
                && matches!(new_status, CourseStatus::Open | CourseStatus::Waitlist)
            {
                stats.fanouts += 1;
                tokio::spawn(notify_subscribers(
                    self.db.clone(),
                    self.notifier.clone(),
                    self.fanout.clone(),
                    course,
                ));
            }
        }

        Ok(stats)
    }
}

/// Fan out one notification per subscriber of `course`.
///
/// Runs detached from the monitoring loop. Every recipient is handled
/// independently: a missing account record or a failed send is logged and
/// the rest of the fan-out continues.
async fn notify_subscribers(
    db: SqlitePool,
    notifier: Arc<dyn Notifier>,
    limiter: Arc<Semaphore>,
    course: Course,
) {
    let term_label = course
        .term
        .parse::<Term>()
        .map(|t| t.readable())
        .unwrap_or_else(|_| course.term.clone());

    let subscriptions = match repository::subscribers_of(&db, course.id).await {
        Ok(subscriptions) => subscriptions,
        Err(e) => {
            warn!(course = %course.code, "failed to load subscribers: {e}");
            return;
        }
    };

    for subscription in subscriptions {
        let user = match repository::find_user(&db, subscription.user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                warn!(
                    user_id = subscription.user_id,
                    "subscriber has no account record, skipping"
                );
                continue;
            }
            Err(e) => {
                warn!(user_id = subscription.user_id, "failed to load subscriber: {e}");
                continue;
            }
        };

        let Ok(permit) = limiter.clone().acquire_owned().await else {
            return;
        };
        let notifier = notifier.clone();
        let code = course.code.clone();
        let label = term_label.clone();
        tokio::spawn(async move {
            let _permit = permit;
            if let Err(e) = notifier.notify_course_open(&code, &label, &user.email).await {
                warn!(course = %code, recipient = %user.email, "notification failed: {e}");
            }
        });
    }
}
