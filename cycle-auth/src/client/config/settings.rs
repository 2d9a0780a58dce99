use cycle_api::DEFAULT_BASE_URL;
use serde::Deserialize;

/// Where the client finds the tracker service. Loaded as the `[auth]` table of the app config.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(default = "default_server_url")]
    pub server_url: String,
}

fn default_server_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), String> {
        if self.server_url.is_empty() {
            return Err("auth.server_url is required".to_string());
        }
        if !self.server_url.starts_with("http://") && !self.server_url.starts_with("https://") {
            return Err("auth.server_url must be a valid HTTP(S) URL".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_http_urls() {
        let settings = Settings {
            server_url: "ftp://tracker.example".to_string(),
        };
        assert!(settings.validate().is_err());

        let settings = Settings {
            server_url: String::new(),
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn default_points_at_local_service() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.server_url, "http://localhost:5000");
    }
}
