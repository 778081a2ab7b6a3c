pub mod templates;

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::auth::reset_token;
use crate::config::SmtpConfig;

/// Outbound SMTP for account and lead notifications.
pub struct SystemMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SystemMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, String> {
        let creds = Credentials::new(config.user.clone(), config.pass.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| format!("System SMTP error: {e}"))?
            .port(config.port)
            .credentials(creds)
            .build();

        Ok(Self {
            transport,
            from: config.from.clone(),
        })
    }

    pub async fn send_password_reset(
        &self,
        to_email: &str,
        to_name: &str,
        reset_url: &str,
    ) -> Result<(), String> {
        let html =
            templates::render_password_reset(to_name, reset_url, reset_token::VALIDITY_DAYS)?;
        self.send(to_email, "Reset Your Password", &html).await
    }

    pub async fn send_set_password(
        &self,
        to_email: &str,
        to_name: &str,
        set_password_url: &str,
    ) -> Result<(), String> {
        let html = templates::render_set_password(
            to_name,
            set_password_url,
            reset_token::VALIDITY_DAYS,
        )?;
        self.send(to_email, "Welcome to SkyCRM", &html).await
    }

    pub async fn send_lead_assigned(
        &self,
        to_email: &str,
        to_name: &str,
        title: &str,
        company_name: &str,
        lead_url: &str,
    ) -> Result<(), String> {
        let html = templates::render_lead_assigned(to_name, title, company_name, lead_url)?;
        self.send(
            to_email,
            &format!("Lead '{title}' has been assigned to you"),
            &html,
        )
        .await
    }

    pub async fn send_follow_up_reminder(
        &self,
        to_email: &str,
        to_name: &str,
        title: &str,
        follow_up_at: &str,
        offset_label: &str,
        lead_url: &str,
    ) -> Result<(), String> {
        let html = templates::render_follow_up_reminder(
            to_name,
            title,
            follow_up_at,
            offset_label,
            lead_url,
        )?;
        self.send(to_email, &format!("Follow-up Reminder: {title}"), &html)
            .await
    }

    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), String> {
        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| format!("Invalid from address: {e}"))?,
            )
            .to(to.parse().map_err(|e| format!("Invalid to address: {e}"))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| format!("Failed to build email: {e}"))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| format!("Failed to send email: {e}"))?;

        Ok(())
    }
}

/// Links into the frontend application.
pub fn reset_password_url(frontend_url: &str, uid: &str, token: &str) -> String {
    format!("{frontend_url}/reset-password/{uid}/{token}/")
}

pub fn set_password_url(frontend_url: &str, uid: &str, token: &str) -> String {
    format!("{frontend_url}/set-password/{uid}/{token}/")
}

pub fn lead_url(frontend_url: &str, lead_id: uuid::Uuid) -> String {
    format!("{frontend_url}/leads/{lead_id}/view/")
}
