//! SMTP transport via lettre.

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use super::MailTransport;
use crate::error::DeliveryError;
use crate::render::RenderedMessage;

/// Outbound mail server settings.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub from_address: String,
}

/// Sends rendered messages through an SMTP relay (STARTTLS).
pub struct SmtpMailTransport {
    transport: SmtpTransport,
    from: Mailbox,
}

impl SmtpMailTransport {
    pub fn new(config: &SmtpConfig) -> Result<Self, DeliveryError> {
        let from: Mailbox =
            config
                .from_address
                .parse()
                .map_err(|e| DeliveryError::InvalidAddress {
                    address: config.from_address.clone(),
                    reason: format!("{e}"),
                })?;

        let mut builder = SmtpTransport::starttls_relay(&config.host)
            .map_err(|e| DeliveryError::Smtp(format!("SMTP relay error: {e}")))?
            .port(config.port);
        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.expose_secret().to_string(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

/// Build the multipart (plain + HTML) email for one recipient.
pub fn build_email(
    from: &Mailbox,
    message: &RenderedMessage,
    recipient: &str,
) -> Result<Message, DeliveryError> {
    let to: Mailbox = recipient
        .parse()
        .map_err(|e| DeliveryError::InvalidAddress {
            address: recipient.to_string(),
            reason: format!("{e}"),
        })?;

    Message::builder()
        .from(from.clone())
        .to(to)
        .subject(message.subject.clone())
        .multipart(MultiPart::alternative_plain_html(
            message.body.clone(),
            message.html_body.clone(),
        ))
        .map_err(|e| DeliveryError::Build(e.to_string()))
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, message: &RenderedMessage, recipient: &str) -> Result<(), DeliveryError> {
        let email = build_email(&self.from, message, recipient)?;
        let transport = self.transport.clone();

        tokio::task::spawn_blocking(move || transport.send(&email))
            .await
            .map_err(|e| DeliveryError::Aborted(e.to_string()))?
            .map_err(|e| DeliveryError::Smtp(e.to_string()))?;

        debug!(recipient, "Email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> RenderedMessage {
        RenderedMessage {
            subject: "Daily Mass Readings – Thursday, October 15, 2026".to_string(),
            body: "plain body".to_string(),
            html_body: "<p>html body</p>".to_string(),
        }
    }

    fn from() -> Mailbox {
        "Daily Readings <readings@example.org>".parse().unwrap()
    }

    #[test]
    fn builds_multipart_email() {
        let email = build_email(&from(), &message(), "friend@example.com").unwrap();
        let raw = String::from_utf8(email.formatted()).unwrap();
        assert!(raw.contains("To: friend@example.com"));
        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("plain body"));
        assert!(raw.contains("<p>html body</p>"));
    }

    #[test]
    fn invalid_recipient_is_rejected() {
        let err = build_email(&from(), &message(), "not-an-address").unwrap_err();
        assert!(matches!(err, DeliveryError::InvalidAddress { .. }));
    }

    #[test]
    fn transport_rejects_bad_sender() {
        let config = SmtpConfig {
            host: "smtp.example.org".to_string(),
            port: 587,
            username: String::new(),
            password: SecretString::from(String::new()),
            from_address: "nope".to_string(),
        };
        assert!(matches!(
            SmtpMailTransport::new(&config),
            Err(DeliveryError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn transport_builds_with_credentials() {
        let config = SmtpConfig {
            host: "smtp.example.org".to_string(),
            port: 2525,
            username: "user".to_string(),
            password: SecretString::from("secret".to_string()),
            from_address: "readings@example.org".to_string(),
        };
        assert!(SmtpMailTransport::new(&config).is_ok());
    }
}
