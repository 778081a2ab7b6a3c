use std::net::IpAddr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub base_url: String,
    /// Origin of the SPA; used for CORS and for links in outgoing emails.
    pub frontend_url: String,
    pub max_body_size: usize,
    pub access_token_minutes: i64,
    pub refresh_token_days: i64,
    pub reminder_interval_secs: u64,
    pub log_level: String,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;

        let host: IpAddr = env_or("CRM_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid CRM_HOST: {e}"))?;

        let port: u16 = env_or("CRM_PORT", "8000")
            .parse()
            .map_err(|e| format!("Invalid CRM_PORT: {e}"))?;

        let base_url = env_or("CRM_BASE_URL", &format!("http://{host}:{port}"));
        let frontend_url = env_or("CRM_FRONTEND_URL", "http://localhost:3000")
            .trim_end_matches('/')
            .to_string();

        let max_body_size: usize = env_or("CRM_MAX_BODY_SIZE", "1048576")
            .parse()
            .map_err(|e| format!("Invalid CRM_MAX_BODY_SIZE: {e}"))?;

        let access_token_minutes: i64 = env_or("CRM_ACCESS_TOKEN_MINUTES", "1440")
            .parse()
            .map_err(|e| format!("Invalid CRM_ACCESS_TOKEN_MINUTES: {e}"))?;

        let refresh_token_days: i64 = env_or("CRM_REFRESH_TOKEN_DAYS", "365")
            .parse()
            .map_err(|e| format!("Invalid CRM_REFRESH_TOKEN_DAYS: {e}"))?;

        let reminder_interval_secs: u64 = env_or("CRM_REMINDER_INTERVAL_SECS", "60")
            .parse()
            .map_err(|e| format!("Invalid CRM_REMINDER_INTERVAL_SECS: {e}"))?;

        let log_level = env_or("CRM_LOG_LEVEL", "info");

        let smtp = match (
            std::env::var("CRM_SMTP_HOST").ok(),
            std::env::var("CRM_SMTP_PORT").ok(),
            std::env::var("CRM_SMTP_USER").ok(),
            std::env::var("CRM_SMTP_PASS").ok(),
            std::env::var("CRM_SMTP_FROM").ok(),
        ) {
            (Some(host), Some(port), Some(user), Some(pass), Some(from)) => Some(SmtpConfig {
                host,
                port: port
                    .parse()
                    .map_err(|e| format!("Invalid CRM_SMTP_PORT: {e}"))?,
                user,
                pass,
                from,
            }),
            _ => None,
        };

        Ok(Config {
            database_url,
            jwt_secret,
            host,
            port,
            base_url,
            frontend_url,
            max_body_size,
            access_token_minutes,
            refresh_token_days,
            reminder_interval_secs,
            log_level,
            smtp,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
