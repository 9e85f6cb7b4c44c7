use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub postgrest_url: String,
    pub postgrest_api_key: String,
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            postgrest_url: env::var("CLINIC_POSTGREST_URL").unwrap_or_else(|_| {
                warn!("CLINIC_POSTGREST_URL not set, using empty value");
                String::new()
            }),
            postgrest_api_key: env::var("CLINIC_POSTGREST_API_KEY").unwrap_or_else(|_| {
                warn!("CLINIC_POSTGREST_API_KEY not set, using empty value");
                String::new()
            }),
            jwt_secret: env::var("CLINIC_JWT_SECRET").unwrap_or_else(|_| {
                warn!("CLINIC_JWT_SECRET not set, using empty value");
                String::new()
            }),
            token_ttl_secs: env::var("CLINIC_TOKEN_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(24 * 3600),
            port: env::var("CLINIC_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.postgrest_url.is_empty() && !self.jwt_secret.is_empty()
    }
}
