use std::env;

use actix_cors::Cors;
use actix_web::http::header;

/// Bind address for the HTTP server, read from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// Environment variables must be set by the runtime environment:
    /// - Docker: via compose env_file or --env-file
    /// - Local dev: source env files manually
    pub fn from_env() -> Result<Self, String> {
        let host = env::var("CAUCUS_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = match env::var("CAUCUS_PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|_| format!("CAUCUS_PORT must be a valid port number, got {raw:?}"))?,
            Err(_) => 3001,
        };
        Ok(Self { host, port })
    }
}

/// Build CORS middleware with a restrictive, explicit configuration:
/// - Origins must be configured via CORS_ALLOWED_ORIGINS
/// - Lightly validate origins, and ignore empty / "null" entries
pub fn cors_middleware() -> Cors {
    // Comma-separated origins, e.g.:
    // CORS_ALLOWED_ORIGINS=http://localhost:3000,https://caucus.example
    let allowed_raw = env::var("CORS_ALLOWED_ORIGINS").unwrap_or_default();

    let allowed_origins: Vec<String> = allowed_raw
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty() && *s != "null")
        .filter(|s| s.starts_with("http://") || s.starts_with("https://"))
        .map(|s| s.to_string())
        .collect();

    // Fallback to localhost-only if nothing valid was configured
    let effective_origins: Vec<String> = if allowed_origins.is_empty() {
        vec![
            "http://localhost:3000".to_string(),
            "http://127.0.0.1:3000".to_string(),
        ]
    } else {
        allowed_origins
    };

    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
        .max_age(3600);
    for origin in &effective_origins {
        cors = cors.allowed_origin(origin);
    }
    cors
}
