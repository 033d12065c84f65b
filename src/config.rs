use anyhow::{anyhow, Context};
use std::env;
use std::time::Duration;

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub completion_api_base: String,
    pub completion_api_key: String,
    pub completion_model: String,
    pub completion_timeout: Duration,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| anyhow!("DATABASE_URL not found"))?;

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| anyhow!("JWT_SECRET not found"))?;

        // The completion service speaks the OpenAI chat-completions contract;
        // default to a locally hosted model server.
        let completion_api_base = env::var("COMPLETION_API_BASE")
            .unwrap_or_else(|_| "http://localhost:21002/v1".to_string());

        let completion_api_key =
            env::var("COMPLETION_API_KEY").unwrap_or_else(|_| "local".to_string());

        let completion_model =
            env::var("COMPLETION_MODEL").unwrap_or_else(|_| "qwen".to_string());

        let completion_timeout = env::var("COMPLETION_TIMEOUT_SECS")
            .ok()
            .map(|raw| {
                raw.parse::<u64>()
                    .with_context(|| format!("invalid COMPLETION_TIMEOUT_SECS: {raw}"))
            })
            .transpose()?
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(60));

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = env::var("PORT")
            .ok()
            .map(|raw| raw.parse::<u16>().with_context(|| format!("invalid PORT: {raw}")))
            .transpose()?
            .unwrap_or(8000);

        Ok(AppConfig {
            database_url,
            jwt_secret,
            completion_api_base,
            completion_api_key,
            completion_model,
            completion_timeout,
            host,
            port,
        })
    }
}
