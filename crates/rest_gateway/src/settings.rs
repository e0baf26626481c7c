use std::{env, fs};

use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub server_url: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    server_url: Option<String>,
    request_timeout_secs: Option<u64>,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8080".into(),
            request_timeout_secs: 30,
        }
    }
}

/// Settings from `gateway.toml` in the working directory, overridden by
/// `SERVER_URL` / `APP__SERVER_URL` and `APP__REQUEST_TIMEOUT_SECS`.
pub fn load_settings() -> GatewaySettings {
    let mut settings = GatewaySettings::default();

    if let Ok(raw) = fs::read_to_string("gateway.toml") {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.server_url {
                    settings.server_url = v;
                }
                if let Some(v) = file_cfg.request_timeout_secs {
                    settings.request_timeout_secs = v;
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "gateway.toml is invalid; using defaults");
            }
        }
    }

    if let Ok(v) = env::var("SERVER_URL") {
        settings.server_url = v;
    }
    if let Ok(v) = env::var("APP__SERVER_URL") {
        settings.server_url = v;
    }
    if let Ok(v) = env::var("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }

    settings.server_url = normalize_server_url(&settings.server_url);
    settings
}

pub fn normalize_server_url(raw: &str) -> String {
    let raw = raw.trim().trim_end_matches('/');

    if raw.is_empty() {
        return GatewaySettings::default().server_url;
    }

    if raw.contains("://") {
        return raw.to_string();
    }

    format!("http://{raw}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_localhost() {
        let settings = GatewaySettings::default();
        assert_eq!(settings.server_url, "http://127.0.0.1:8080");
        assert_eq!(settings.request_timeout_secs, 30);
    }

    #[test]
    fn file_settings_accept_an_integer_timeout() {
        let raw = "server_url = \"https://console.example.org\"\nrequest_timeout_secs = 45\n";
        let file_cfg: FileSettings = toml::from_str(raw).expect("decode gateway.toml");
        assert_eq!(
            file_cfg.server_url.as_deref(),
            Some("https://console.example.org")
        );
        assert_eq!(file_cfg.request_timeout_secs, Some(45));
    }

    #[test]
    fn file_settings_keep_the_server_url_when_the_timeout_is_absent() {
        let file_cfg: FileSettings =
            toml::from_str("server_url = \"https://console.example.org\"\n").expect("decode");
        assert_eq!(
            file_cfg.server_url.as_deref(),
            Some("https://console.example.org")
        );
        assert_eq!(file_cfg.request_timeout_secs, None);
    }

    #[test]
    fn normalizes_bare_host_to_http_url() {
        assert_eq!(
            normalize_server_url("inventory.example.org:8080"),
            "http://inventory.example.org:8080"
        );
    }

    #[test]
    fn normalize_strips_trailing_slash_and_keeps_scheme() {
        assert_eq!(
            normalize_server_url("https://console.example.org/"),
            "https://console.example.org"
        );
    }

    #[test]
    fn normalize_falls_back_to_the_default_for_empty_input() {
        assert_eq!(normalize_server_url("  "), "http://127.0.0.1:8080");
    }
}
