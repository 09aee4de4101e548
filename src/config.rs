use std::env;
use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_FALLBACK_URL: &str = "https://filmfinder-api-fallback.herokuapp.com/api";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} is not a valid port: {value}")]
    InvalidPort { name: &'static str, value: String },
}

/// Runtime settings, read from the environment after loading `.env`.
#[derive(Debug, Clone)]
pub struct Config {
    pub tmdb_api_key: Option<String>,
    pub tmdb_api_base: String,
    pub tmdb_image_base: String,
    pub tmdb_language: String,
    pub films_data_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub api_url: String,
    pub fallback_api_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tmdb_api_key: None,
            tmdb_api_base: "https://api.themoviedb.org/3".to_string(),
            tmdb_image_base: "https://image.tmdb.org/t/p".to_string(),
            tmdb_language: "id-ID".to_string(),
            films_data_path: PathBuf::from("data/films.json"),
            host: "0.0.0.0".to_string(),
            port: 5000,
            api_url: DEFAULT_API_URL.to_string(),
            fallback_api_url: Some(DEFAULT_FALLBACK_URL.to_string()),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let value = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        config.tmdb_api_key = value("TMDB_API_KEY");
        if let Some(base) = value("TMDB_API_BASE") {
            config.tmdb_api_base = base.trim_end_matches('/').to_string();
        }
        if let Some(base) = value("TMDB_IMAGE_BASE") {
            config.tmdb_image_base = base.trim_end_matches('/').to_string();
        }
        if let Some(language) = value("TMDB_LANGUAGE") {
            config.tmdb_language = language;
        }
        if let Some(path) = value("FILMS_DATA_PATH") {
            config.films_data_path = PathBuf::from(path);
        }
        if let Some(host) = value("HOST") {
            config.host = host;
        }
        if let Some(port) = value("PORT") {
            config.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort { name: "PORT", value: port })?;
        }
        if let Some(url) = value("FILMFINDER_API_URL") {
            config.api_url = url.trim_end_matches('/').to_string();
        }
        if let Some(url) = value("FILMFINDER_FALLBACK_URL") {
            config.fallback_api_url = Some(url.trim_end_matches('/').to_string());
        }

        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
