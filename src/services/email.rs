use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::Config;

/// Outbound mail. Construction returns None when SMTP is not configured;
/// callers treat delivery as best-effort.
pub struct EmailService {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl EmailService {
    pub fn new(config: &Config) -> Option<Self> {
        let host = config.smtp_host.as_deref()?;
        let username = config.smtp_username.clone()?;
        let password = config.smtp_password.clone()?;
        let from_addr = config.smtp_from.as_deref()?;

        let port = config.smtp_port.unwrap_or(587);
        let creds = Credentials::new(username, password);

        let transport = if port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .ok()?
                .credentials(creds)
                .build()
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .ok()?
                .credentials(creds)
                .build()
        };

        let from: Mailbox = from_addr.parse().ok()?;

        Some(Self { transport, from })
    }

    pub async fn send_password_reset(&self, to: &str, reset_url: &str) -> anyhow::Result<()> {
        let to: Mailbox = to.parse()?;

        let text = format!(
            "You requested a password reset. Open the link below to reset your password:\n\n\
             {reset_url}\n\nThis link will expire in 15 minutes."
        );
        let html = format!(
            r#"<p>You requested a password reset. Click the link below to reset your password:</p>
<a href="{reset_url}">Reset Password</a>
<p>This link will expire in 15 minutes.</p>"#
        );

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject("Password Reset Request")
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html),
                    ),
            )?;

        self.transport.send(email).await?;
        Ok(())
    }
}
