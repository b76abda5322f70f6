use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::AppConfig;

/// Outbound mail. Callers treat sends as best-effort: a failed send is logged
/// and never fails the surrounding request.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_verification(
        &self,
        to: &str,
        first_name: &str,
        token: &str,
    ) -> anyhow::Result<()>;
}

/// Used when MAIL_USERNAME is not configured.
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send_verification(
        &self,
        to: &str,
        _first_name: &str,
        _token: &str,
    ) -> anyhow::Result<()> {
        debug!(to = %to, "mail transport not configured, skipping verification email");
        Ok(())
    }
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
    base_url: String,
}

impl SmtpMailer {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let username = config
            .mail
            .username
            .clone()
            .ok_or_else(|| anyhow::anyhow!("MAIL_USERNAME not set"))?;
        let password = config
            .mail
            .password
            .clone()
            .ok_or_else(|| anyhow::anyhow!("MAIL_PASSWORD not set"))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.mail.server)?
            .port(config.mail.port)
            .credentials(Credentials::new(username.clone(), password))
            .build();

        Ok(Self {
            transport,
            from: username,
            base_url: config.base_url.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_verification(
        &self,
        to: &str,
        first_name: &str,
        token: &str,
    ) -> anyhow::Result<()> {
        let verification_url = format!("{}/api/auth/verify/{}", self.base_url, token);

        let html_body = format!(
            r#"<h2>Welcome to DigiSanchar, {first_name}!</h2>
<p>Thank you for creating an account. Please verify your email address by clicking the link below:</p>
<p><a href="{url}" style="background: #00c851; color: white; padding: 12px 24px; text-decoration: none; border-radius: 8px;">Verify Email</a></p>
<p>If you didn't create this account, you can safely ignore this email.</p>
<p>Best regards,<br>The DigiSanchar Team</p>"#,
            first_name = first_name,
            url = verification_url,
        );

        let email = Message::builder()
            .from(self.from.parse()?)
            .to(to.parse()?)
            .subject("Verify your DigiSanchar account")
            .header(ContentType::TEXT_HTML)
            .body(html_body)?;

        self.transport.send(email).await?;
        debug!(to = %to, "verification email sent");
        Ok(())
    }
}

/// SMTP when credentials are configured, otherwise a no-op.
pub fn from_config(config: &AppConfig) -> Arc<dyn Mailer> {
    if config.mail.username.is_some() {
        match SmtpMailer::new(config) {
            Ok(mailer) => {
                info!(server = %config.mail.server, "smtp mailer configured");
                return Arc::new(mailer);
            }
            Err(e) => {
                warn!(error = %e, "smtp mailer init failed, falling back to no-op");
            }
        }
    }
    Arc::new(NoopMailer)
}
