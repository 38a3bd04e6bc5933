use std::path::PathBuf;

const DEFAULT_API_URL: &str = "http://localhost:4000/api";

/// Runtime configuration. Everything comes from the environment with
/// sensible defaults; the data directory follows the platform convention.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub token_path: PathBuf,
    pub log_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        let api_url = std::env::var("HIREFLOW_API_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let data_dir = Self::data_dir();
        let token_path = std::env::var("HIREFLOW_TOKEN_PATH")
            .ok()
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("token"));

        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            token_path,
            log_path: data_dir.join("hireflow.log"),
        }
    }

    fn data_dir() -> PathBuf {
        // Use XDG data directory or fallback
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "hireflow") {
            proj_dirs.data_dir().to_path_buf()
        } else {
            PathBuf::from(".")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url_trailing_slash_is_trimmed() {
        unsafe {
            std::env::set_var("HIREFLOW_API_URL", "https://api.example.com/v1/");
        }
        let config = Config::from_env();
        unsafe {
            std::env::remove_var("HIREFLOW_API_URL");
        }
        assert_eq!(config.api_url, "https://api.example.com/v1");
    }

    #[test]
    fn test_default_api_url() {
        // Only meaningful when the variable is not set in the environment.
        if std::env::var("HIREFLOW_API_URL").is_err() {
            let config = Config::from_env();
            assert_eq!(config.api_url, DEFAULT_API_URL);
        }
    }
}
