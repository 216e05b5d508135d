//! Application configuration, loaded once at startup from the environment.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub session_secret: String,
    #[serde(default)]
    pub issuer_url: String,
    #[serde(default)]
    pub repl_id: String,
    pub admin_api_token: String,
    #[serde(default)]
    pub mysportsfeeds_api_key: String,
    #[serde(default)]
    pub whop_api_key: String,
    #[serde(default)]
    pub whop_plan_id: String,
    #[serde(default)]
    pub whop_webhook_secret: String,
    #[serde(default = "default_node_env")]
    pub node_env: String,
    #[serde(default)]
    pub dev_bypass_auth: bool,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_session_ttl")]
    pub session_ttl_seconds: u64,
}

fn default_node_env() -> String {
    "development".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_session_ttl() -> u64 {
    60 * 60 * 24 * 30
}

impl AppConfig {
    /// Load from process environment, failing fast on missing required vars.
    pub fn load() -> anyhow::Result<Self> {
        let cfg = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .try_parsing(true)
                    .list_separator(","),
            )
            .build()?;

        let config: AppConfig = cfg.try_deserialize()?;
        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        self.node_env == "production"
    }

    /// Auth can only be bypassed outside production, regardless of `DEV_BYPASS_AUTH`.
    pub fn is_auth_disabled(&self) -> bool {
        self.dev_bypass_auth && !self.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_disabled_never_applies_in_production() {
        let mut cfg = test_config();
        cfg.dev_bypass_auth = true;
        cfg.node_env = "production".to_string();
        assert!(!cfg.is_auth_disabled());

        cfg.node_env = "development".to_string();
        assert!(cfg.is_auth_disabled());
    }

    fn test_config() -> AppConfig {
        AppConfig {
            database_url: "postgres://localhost/test".to_string(),
            session_secret: "test".to_string(),
            issuer_url: String::new(),
            repl_id: String::new(),
            admin_api_token: "test".to_string(),
            mysportsfeeds_api_key: String::new(),
            whop_api_key: String::new(),
            whop_plan_id: String::new(),
            whop_webhook_secret: String::new(),
            node_env: "development".to_string(),
            dev_bypass_auth: false,
            port: 8080,
            session_ttl_seconds: 3600,
        }
    }
}
