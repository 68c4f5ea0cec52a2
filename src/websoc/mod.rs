use std::env;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::AppError;
use crate::models::CourseStatus;

#[derive(Clone, Debug)]
pub struct WebSocConfig {
    pub base_url: String,
}

impl WebSocConfig {
    pub fn new_from_env() -> Self {
        let base_url = env::var("WEBSOC_URL")
            .unwrap_or_else(|_| "https://www.reg.uci.edu/perl/WebSoc".to_string());
        Self { base_url }
    }
}

/// Source of truth for a course's current enrollment status.
///
/// One lookup per call; retries and timeouts are the caller's concern.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn fetch_status(&self, code: &str, term: &str) -> Result<CourseStatus, AppError>;
}

/// Classify a catalog listing body by substring search.
///
/// The listing is unstructured text, so markers are checked in a fixed
/// priority order: a full marker wins over an open marker, which wins over
/// the no-results banner. Anything else is a waitlist.
pub fn classify_listing(body: &str) -> CourseStatus {
    if body.contains("FULL") {
        return CourseStatus::Full;
    }
    if body.contains("OPEN") {
        return CourseStatus::Open;
    }
    if body.contains("No courses matched") {
        return CourseStatus::Nonexistent;
    }
    CourseStatus::Waitlist
}

pub struct WebSocHttpClient {
    client: Client,
    config: WebSocConfig,
}

impl WebSocHttpClient {
    pub fn new(config: WebSocConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Catalog(format!("failed to build http client: {e}")))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl CatalogClient for WebSocHttpClient {
    async fn fetch_status(&self, code: &str, term: &str) -> Result<CourseStatus, AppError> {
        let url = format!(
            "{}?YearTerm={}&ShowFinals=0&ShowComments=0&CourseCodes={}",
            self.config.base_url, term, code
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Catalog(e.to_string()))?;

        // An error page carries none of the status markers and must not be
        // mistaken for a waitlist or a missing course.
        if !response.status().is_success() {
            return Err(AppError::Catalog(format!(
                "catalog returned {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::Catalog(e.to_string()))?;

        Ok(classify_listing(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_marker_wins_over_everything() {
        let body = "<td>FULL</td> ... OPEN ... No courses matched";
        assert_eq!(classify_listing(body), CourseStatus::Full);
    }

    #[test]
    fn open_marker_wins_over_no_match_banner() {
        let body = "<td>OPEN</td> No courses matched";
        assert_eq!(classify_listing(body), CourseStatus::Open);
    }

    #[test]
    fn no_match_banner_means_nonexistent() {
        let body = "No courses matched your search criteria.";
        assert_eq!(classify_listing(body), CourseStatus::Nonexistent);
    }

    #[test]
    fn anything_else_is_a_waitlist() {
        assert_eq!(classify_listing("<td>Waitl</td>"), CourseStatus::Waitlist);
        assert_eq!(classify_listing(""), CourseStatus::Waitlist);
    }

    #[tokio::test]
    async fn fetch_status_classifies_listing_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .match_query(mockito::Matcher::Any)
            .with_body("<table><td>OPEN</td></table>")
            .create_async()
            .await;

        let client = WebSocHttpClient::new(WebSocConfig {
            base_url: server.url(),
        })
        .expect("failed to build client");

        let status = client
            .fetch_status("COMPSCI161", "2025-92")
            .await
            .expect("lookup failed");
        assert_eq!(status, CourseStatus::Open);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn fetch_status_reports_upstream_errors() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/")
            .match_query(mockito::Matcher::Any)
            .with_status(503)
            .with_body("Service Unavailable")
            .create_async()
            .await;

        let client = WebSocHttpClient::new(WebSocConfig {
            base_url: server.url(),
        })
        .expect("failed to build client");

        let result = client.fetch_status("COMPSCI161", "2025-92").await;
        assert!(matches!(result, Err(AppError::Catalog(_))));
    }
}
