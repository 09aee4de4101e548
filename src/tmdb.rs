use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::config::Config;

const PLACEHOLDER_KEYS: [&str; 3] = ["your_tmdb_api_key_here", "demo", "demo_key_for_testing"];

#[derive(Debug)]
pub struct Tmdb {
    api_key: String,
    api_base: String,
    image_base: String,
    language: String,
    client: Client,
    api_key_valid: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Paged<T> {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub results: Vec<T>,
    #[serde(default)]
    pub total_results: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenreList {
    #[serde(default)]
    pub genres: Vec<Genre>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Genre {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
    #[serde(default)]
    pub crew: Vec<CrewMember>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CastMember {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CrewMember {
    pub name: String,
    #[serde(default)]
    pub job: String,
}

/// A movie as TMDB returns it, either from a listing or from `/movie/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Movie {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub original_title: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub genres: Option<Vec<Genre>>,
    #[serde(default)]
    pub genre_ids: Option<Vec<u32>>,
    #[serde(default)]
    pub credits: Option<Credits>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub recommendations: Option<Paged<Movie>>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u64,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub original_language: Option<String>,
}

pub fn is_placeholder_key(key: &str) -> bool {
    let key = key.trim();
    key.is_empty() || PLACEHOLDER_KEYS.contains(&key)
}

impl Tmdb {
    pub fn new(config: &Config) -> Self {
        Self {
            api_key: config.tmdb_api_key.clone().unwrap_or_default(),
            api_base: config.tmdb_api_base.clone(),
            image_base: config.tmdb_image_base.clone(),
            language: config.tmdb_language.clone(),
            client: Client::new(),
            api_key_valid: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key_valid
    }

    pub fn image_base(&self) -> &str {
        &self.image_base
    }

    pub async fn validate_api_key(&mut self) -> bool {
        self.api_key_valid = false;
        if is_placeholder_key(&self.api_key) {
            tracing::warn!("TMDB API key missing or placeholder; using local fallback catalog");
            return false;
        }

        let response = self
            .client
            .get(format!("{}/configuration", self.api_base))
            .query(&[("api_key", self.api_key.as_str())])
            .timeout(Duration::from_secs(5))
            .send()
            .await;

        match response {
            Ok(response) if response.status().is_success() => {
                tracing::info!("TMDB API key valid");
                self.api_key_valid = true;
            }
            Ok(response) => {
                tracing::warn!(status = response.status().as_u16(), "TMDB API key rejected");
            }
            Err(err) => {
                tracing::warn!(error = %err, "TMDB API key validation failed");
            }
        }
        self.api_key_valid
    }

    pub async fn search_movies(&self, query: &str, page: u32) -> Result<Paged<Movie>, reqwest::Error> {
        let page = page.to_string();
        self.get_data(
            "/search/movie",
            &[("query", query), ("page", page.as_str()), ("include_adult", "false")],
        )
        .await
    }

    pub async fn movie_details(&self, movie_id: u64) -> Result<Option<Movie>, reqwest::Error> {
        let movie: Option<Movie> = self
            .get_data(
                &format!("/movie/{}", movie_id),
                &[("append_to_response", "credits,videos,recommendations")],
            )
            .await?;
        Ok(movie)
    }

    pub async fn discover_movies(
        &self,
        genre_ids: &[u32],
        page: u32,
    ) -> Result<Paged<Movie>, reqwest::Error> {
        let page = page.to_string();
        let with_genres = genre_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let mut params = vec![
            ("sort_by", "popularity.desc"),
            ("page", page.as_str()),
            ("include_adult", "false"),
            ("vote_count.gte", "100"),
        ];
        if !with_genres.is_empty() {
            params.push(("with_genres", with_genres.as_str()));
        }
        self.get_data("/discover/movie", &params).await
    }

    pub async fn genres(&self) -> Result<GenreList, reqwest::Error> {
        self.get_data("/genre/movie/list", &[]).await
    }

    pub async fn popular_movies(&self, page: u32) -> Result<Paged<Movie>, reqwest::Error> {
        let page = page.to_string();
        self.get_data("/movie/popular", &[("page", page.as_str())]).await
    }

    async fn get_data<T: DeserializeOwned + Default>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, reqwest::Error> {
        if !self.api_key_valid {
            return Ok(T::default());
        }

        let mut request = self
            .client
            .get(format!("{}{}", self.api_base, path))
            .query(&[("api_key", self.api_key.as_str()), ("language", self.language.as_str())]);

        for (key, value) in params {
            request = request.query(&[(*key, *value)]);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            tracing::warn!(path, status = response.status().as_u16(), "TMDB request failed");
            return Ok(T::default());
        }
        response.json().await
    }
}
