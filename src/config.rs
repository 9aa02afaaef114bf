//! Static configuration for the database session and the generation backend.
//! Everything is read once from the environment at startup and passed into
//! the components at construction time; there is no process-wide mutable
//! state and no runtime reconfiguration.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
}

impl DbConfig {
    pub fn from_env() -> Self {
        let host = std::env::var("PGSAGE_DB_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = std::env::var("PGSAGE_DB_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(5432);
        let user = std::env::var("PGSAGE_DB_USER").unwrap_or_else(|_| "postgres".to_string());
        let password = std::env::var("PGSAGE_DB_PASSWORD").unwrap_or_default();
        let dbname = std::env::var("PGSAGE_DB_NAME").unwrap_or_else(|_| "postgres".to_string());
        Self { host, port, user, password, dbname }
    }

    /// Keyword/value connection string for tokio-postgres.
    pub fn conn_string(&self) -> String {
        format!(
            "host={} port={} user={} password={} dbname={}",
            self.host, self.port, self.user, self.password, self.dbname
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl LlmConfig {
    pub fn from_env() -> Self {
        let api_key = std::env::var("PGSAGE_LLM_API_KEY").unwrap_or_default();
        let base_url = std::env::var("PGSAGE_LLM_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let model =
            std::env::var("PGSAGE_LLM_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".to_string());
        // Fixed sampling settings; the backend is consumed as string -> string.
        Self { api_key, base_url, model, temperature: 0.7, max_tokens: 150 }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub llm: LlmConfig,
}

impl Config {
    pub fn from_env() -> Self {
        Self { db: DbConfig::from_env(), llm: LlmConfig::from_env() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conn_string_contains_all_parts() {
        let cfg = DbConfig {
            host: "db.example".into(),
            port: 5433,
            user: "app".into(),
            password: "secret".into(),
            dbname: "ccp".into(),
        };
        let s = cfg.conn_string();
        assert!(s.contains("host=db.example"));
        assert!(s.contains("port=5433"));
        assert!(s.contains("user=app"));
        assert!(s.contains("password=secret"));
        assert!(s.contains("dbname=ccp"));
    }
}
