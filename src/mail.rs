//! Password-reset mail delivery over SMTP.

use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use log::{info, warn};
use std::sync::Arc;

use crate::config::MailSettings;
use crate::error::AppError;

/// Sends the reset link; without a configured SMTP server it only logs.
#[derive(Clone)]
pub struct Mailer {
    transport: Option<Arc<AsyncSmtpTransport<Tokio1Executor>>>,
    from: Mailbox,
    public_url: String,
}

impl Mailer {
    pub fn new(settings: &MailSettings, public_url: &str) -> Result<Self, AppError> {
        let from = settings.default_sender.parse::<Mailbox>().map_err(|e| {
            AppError::InternalServerError(format!("Invalid MAIL_DEFAULT_SENDER address: {}", e))
        })?;

        let transport = if settings.server.trim().is_empty() {
            warn!("MAIL_SERVER not configured; reset emails will only be logged");
            None
        } else {
            let builder = if settings.use_tls {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.server)
            } else {
                AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.server)
            }
            .map_err(|e| {
                AppError::InternalServerError(format!("Failed to configure SMTP transport: {}", e))
            })?
            .port(settings.port);

            let builder = match (&settings.username, &settings.password) {
                (Some(username), Some(password)) => {
                    builder.credentials(Credentials::new(username.clone(), password.clone()))
                }
                _ => builder,
            };
            Some(Arc::new(builder.build()))
        };

        Ok(Self {
            transport,
            from,
            public_url: public_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    pub fn reset_link(&self, token: &str) -> String {
        format!("{}/reset_request/{}", self.public_url, token)
    }

    pub fn reset_body(&self, token: &str) -> String {
        format!(
            "To reset your password, visit the following link:\n{}\n\n\
             If you did not make this request then simply ignore this email and no changes will be made.\n",
            self.reset_link(token)
        )
    }

    pub async fn send_reset_email(&self, recipient: &str, token: &str) -> Result<(), AppError> {
        let subject = "Password Reset Request";
        let Some(transport) = &self.transport else {
            info!(
                "mailer in no-op mode; reset link for {}: {}",
                recipient,
                self.reset_link(token)
            );
            return Ok(());
        };

        let to = recipient.parse::<Mailbox>().map_err(|e| {
            AppError::InternalServerError(format!("Invalid recipient email address: {}", e))
        })?;
        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(header::ContentType::TEXT_PLAIN)
            .body(self.reset_body(token))
            .map_err(|e| AppError::InternalServerError(format!("Failed to build email: {}", e)))?;

        transport
            .send(email)
            .await
            .map_err(|e| AppError::InternalServerError(format!("Failed to send email: {}", e)))?;
        info!("reset email sent to {}", recipient);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_mailer() -> Mailer {
        Mailer::new(&MailSettings::default(), "https://blog.example.com/").unwrap()
    }

    #[test]
    fn test_empty_server_means_noop() {
        assert!(!noop_mailer().is_enabled());
    }

    #[test]
    fn test_reset_link_uses_public_url() {
        let mailer = noop_mailer();
        assert_eq!(
            mailer.reset_link("abc.def"),
            "https://blog.example.com/reset_request/abc.def"
        );
        assert!(mailer
            .reset_body("abc.def")
            .contains("https://blog.example.com/reset_request/abc.def"));
    }

    #[test]
    fn test_invalid_sender_is_rejected() {
        let settings = MailSettings {
            default_sender: "not an address".into(),
            ..MailSettings::default()
        };
        assert!(Mailer::new(&settings, "http://localhost").is_err());
    }

    #[actix_rt::test]
    async fn test_noop_send_succeeds() {
        noop_mailer()
            .send_reset_email("reader@example.com", "token")
            .await
            .unwrap();
    }

    #[actix_rt::test]
    async fn test_configured_transport_is_enabled() {
        let settings = MailSettings {
            server: "smtp.example.com".into(),
            username: Some("user".into()),
            password: Some("pass".into()),
            ..MailSettings::default()
        };
        let mailer = Mailer::new(&settings, "http://localhost").unwrap();
        assert!(mailer.is_enabled());
    }
}
