//! Configuration loading and resolution.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Deployment mode, from `ENVIRONMENT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("development") {
            Environment::Development
        } else {
            Environment::Production
        }
    }
}

/// Serving-layer settings. The extractor's own settings live in
/// [`clinvar_scout::ExtractorConfig`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub environment: Environment,
    /// CORS origins honoured outside development.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 5000,
            environment: Environment::Production,
            allowed_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Read `HOST`, `PORT`, `ENVIRONMENT`, and `ALLOWED_ORIGINS`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(host) = std::env::var("HOST") {
            match host.trim().parse() {
                Ok(ip) => config.host = ip,
                Err(_) => tracing::warn!("ignoring invalid HOST={host:?}"),
            }
        }
        if let Ok(port) = std::env::var("PORT") {
            match port.trim().parse() {
                Ok(p) => config.port = p,
                Err(_) => tracing::warn!("ignoring invalid PORT={port:?}"),
            }
        }
        if let Ok(env) = std::env::var("ENVIRONMENT") {
            config.environment = Environment::parse(&env);
        }
        if let Ok(origins) = std::env::var("ALLOWED_ORIGINS") {
            config.allowed_origins = parse_origins(&origins);
        }
        config
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Comma-separated origin list; blanks dropped.
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

/// Load `.env` from the working directory, if present.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!("loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("failed to load .env: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parse() {
        assert_eq!(Environment::parse("development"), Environment::Development);
        assert_eq!(Environment::parse(" Development "), Environment::Development);
        assert_eq!(Environment::parse("production"), Environment::Production);
        assert_eq!(Environment::parse(""), Environment::Production);
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins("https://a.example, ,https://b.example"),
            vec!["https://a.example", "https://b.example"]
        );
        assert!(parse_origins("").is_empty());
    }

    #[test]
    fn test_default_addr() {
        assert_eq!(ServerConfig::default().addr().to_string(), "0.0.0.0:5000");
    }
}
