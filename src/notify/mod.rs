use std::env;

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use tracing::info;

use crate::error::AppError;

/// Delivery channel for "your course opened up" notifications.
///
/// One call per recipient; implementations must not assume anything about
/// other recipients of the same course.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_course_open(
        &self,
        course_code: &str,
        term_label: &str,
        recipient: &str,
    ) -> Result<(), AppError>;
}

#[derive(Clone, Debug)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub from: String,
    pub portal_url: String,
}

impl EmailConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let smtp_host = env::var("SMTP_HOST")
            .map_err(|_| AppError::BadRequest("SMTP_HOST is not set".to_string()))?;
        let smtp_port = env::var("SMTP_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(587);
        let from = env::var("MAIL_FROM")
            .map_err(|_| AppError::BadRequest("MAIL_FROM is not set".to_string()))?;
        let portal_url =
            env::var("ENROLL_URL").unwrap_or_else(|_| "https://www.reg.uci.edu".to_string());

        Ok(Self {
            smtp_host,
            smtp_port,
            from,
            portal_url,
        })
    }
}

/// Sends notifications as emails over SMTP (STARTTLS).
pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    portal_url: String,
}

impl EmailNotifier {
    /// SMTP credentials are resolved from `SMTP_USERNAME`/`SMTP_PASSWORD`;
    /// if either is missing the connection is unauthenticated.
    pub fn new(config: EmailConfig) -> Result<Self, AppError> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e: lettre::address::AddressError| AppError::Notify(e.to_string()))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| AppError::Notify(e.to_string()))?
            .port(config.smtp_port);

        if let (Ok(username), Ok(password)) =
            (env::var("SMTP_USERNAME"), env::var("SMTP_PASSWORD"))
        {
            builder = builder.credentials(Credentials::new(username, password));
        }

        Ok(Self {
            transport: builder.build(),
            from,
            portal_url: config.portal_url,
        })
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify_course_open(
        &self,
        course_code: &str,
        term_label: &str,
        recipient: &str,
    ) -> Result<(), AppError> {
        let to: Mailbox = recipient
            .parse()
            .map_err(|e: lettre::address::AddressError| AppError::Notify(e.to_string()))?;

        let subject = format!("Your course {course_code} is available!");
        let body = format!(
            "<p>Your course {course_code} for {term_label} quarter is available!</p>\
             <p>Go ahead and enroll now on <a href='{}'>WebReg</a>!</p>",
            self.portal_url
        );

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(body)
            .map_err(|e| AppError::Notify(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| AppError::Notify(e.to_string()))?;

        info!(course = course_code, recipient, "course open notification delivered");
        Ok(())
    }
}

/// Fallback channel used when SMTP is unconfigured: the notification is
/// only logged.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_course_open(
        &self,
        course_code: &str,
        term_label: &str,
        recipient: &str,
    ) -> Result<(), AppError> {
        info!(
            course = course_code,
            term = term_label,
            recipient,
            "course is open (notification logged only)"
        );
        Ok(())
    }
}
