use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use moka::future::Cache;
use rand::prelude::IndexedRandom;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::film::{Film, LocalFilm, Recommendation};
use crate::tmdb::{Movie, Tmdb};

const DETAIL_PACING: Duration = Duration::from_millis(100);
const SEARCH_LIMIT: usize = 10;
/// Films fetched per genre key, the largest default any caller asks for.
const RECOMMENDATION_POOL: usize = 10;
const NO_RESULTS_MESSAGE: &str = "Maaf, saya tidak dapat menemukan rekomendasi film yang sesuai dengan preferensi Anda. Coba dengan kata kunci yang berbeda.";

/// Indonesian genre names and their TMDB English equivalents.
const GENRE_TRANSLATIONS: [(&str, &str); 22] = [
    ("aksi", "action"),
    ("petualangan", "adventure"),
    ("animasi", "animation"),
    ("komedi", "comedy"),
    ("kriminal", "crime"),
    ("dokumenter", "documentary"),
    ("drama", "drama"),
    ("keluarga", "family"),
    ("fantasi", "fantasy"),
    ("sejarah", "history"),
    ("horror", "horror"),
    ("horor", "horror"),
    ("musik", "music"),
    ("misteri", "mystery"),
    ("romance", "romance"),
    ("romantis", "romance"),
    ("sci-fi", "science fiction"),
    ("fiksi ilmiah", "science fiction"),
    ("thriller", "thriller"),
    ("perang", "war"),
    ("western", "western"),
    ("tv movie", "tv movie"),
];

/// TMDB's stable movie genre ids, used when the genre list cannot be fetched.
const TMDB_GENRE_IDS: [(&str, u32); 19] = [
    ("action", 28),
    ("adventure", 12),
    ("animation", 16),
    ("comedy", 35),
    ("crime", 80),
    ("documentary", 99),
    ("drama", 18),
    ("family", 10751),
    ("fantasy", 14),
    ("history", 36),
    ("horror", 27),
    ("music", 10402),
    ("mystery", 9648),
    ("romance", 10749),
    ("science fiction", 878),
    ("tv movie", 10770),
    ("thriller", 53),
    ("war", 10752),
    ("western", 37),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AnalyzeResponse {
    pub message: String,
    pub recommendations: Vec<Recommendation>,
    pub total_results: usize,
    pub query: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GenreFilms {
    pub genre: String,
    pub films: Vec<Film>,
    pub count: usize,
}

pub fn english_genre(name: &str) -> Option<&'static str> {
    let name = name.trim().to_lowercase();
    GENRE_TRANSLATIONS
        .iter()
        .find(|(indonesian, _)| *indonesian == name)
        .map(|(_, english)| *english)
}

fn static_genre_id(name: &str) -> Option<u32> {
    let name = name.trim().to_lowercase();
    let english = english_genre(&name).unwrap_or(name.as_str()).to_string();
    TMDB_GENRE_IDS
        .iter()
        .find(|(genre, _)| *genre == english)
        .map(|(_, id)| *id)
}

/// Reads the local fallback catalog, or returns the built-in one.
pub fn load_local_films(path: &Path) -> BTreeMap<String, LocalFilm> {
    let parsed = std::fs::read_to_string(path)
        .map_err(|err| err.to_string())
        .and_then(|body| serde_json::from_str(&body).map_err(|err| err.to_string()));
    match parsed {
        Ok(films) => films,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "using built-in fallback catalog");
            builtin_local_films()
        }
    }
}

pub fn builtin_local_films() -> BTreeMap<String, LocalFilm> {
    let dune = LocalFilm {
        title: Some("Dune".to_string()),
        release_year: Some("2021".to_string()),
        director: Some("Denis Villeneuve".to_string()),
        genre: vec![
            "Sci-Fi".to_string(),
            "Action".to_string(),
            "Adventure".to_string(),
            "Drama".to_string(),
        ],
        description: Some(
            "Film yang mengadaptasi novel fiksi ilmiah terkenal karya Frank Herbert.".to_string(),
        ),
        actors: Vec::new(),
        rating: 8.0,
        duration: None,
        recommendations: vec![
            "Blade Runner 2049".to_string(),
            "Arrival".to_string(),
            "Interstellar".to_string(),
        ],
    };
    BTreeMap::from([("Dune".to_string(), dune)])
}

/// Film lookups backed by TMDB, falling back to the local catalog.
pub struct Catalog {
    tmdb: Tmdb,
    local: BTreeMap<String, LocalFilm>,
    details_cache: Cache<u64, Film>,
    recommendation_cache: Cache<String, (usize, Vec<Film>)>,
    genre_cache: Cache<&'static str, Vec<(String, u32)>>,
}

impl Catalog {
    pub fn new(tmdb: Tmdb, local: BTreeMap<String, LocalFilm>) -> Self {
        let ttl = Duration::from_secs(60 * 60 * 6);
        Self {
            tmdb,
            local,
            details_cache: Cache::builder()
                .max_capacity(5000)
                .time_to_live(ttl)
                .build(),
            recommendation_cache: Cache::builder()
                .max_capacity(1000)
                .time_to_live(ttl)
                .build(),
            genre_cache: Cache::builder()
                .max_capacity(1)
                .time_to_live(Duration::from_secs(60 * 60 * 24))
                .build(),
        }
    }

    pub async fn recommendations(&self, genres: &[String], limit: usize) -> Vec<Film> {
        if limit == 0 {
            return Vec::new();
        }

        let mut key_parts: Vec<String> = genres.iter().map(|g| g.trim().to_lowercase()).collect();
        key_parts.sort();
        let cache_key = key_parts.join("_");

        if let Some((fetched, cached)) = self.recommendation_cache.get(&cache_key).await
            && limit <= fetched
        {
            return cached.into_iter().take(limit).collect();
        }

        // Cache a full pool, never just the caller's limit.
        let fetch = limit.max(RECOMMENDATION_POOL);
        let films = match self.tmdb_recommendations(genres, fetch).await {
            Ok(films) if !films.is_empty() => films,
            Ok(_) => self.local_recommendations(genres, fetch),
            Err(err) => {
                tracing::warn!(error = %err, "TMDB recommendations failed");
                let mut films = self.local_recommendations(genres, fetch);
                films.truncate(limit);
                return films;
            }
        };

        self.recommendation_cache
            .insert(cache_key, (fetch, films.clone()))
            .await;
        films.into_iter().take(limit).collect()
    }

    pub async fn search(&self, query: &str) -> Vec<Film> {
        if !self.tmdb.is_enabled() {
            return self.local_search(query);
        }
        match self.tmdb_search(query).await {
            Ok(films) => films,
            Err(err) => {
                tracing::warn!(query, error = %err, "TMDB search failed");
                self.local_search(query)
            }
        }
    }

    pub async fn popular(&self, limit: usize) -> Vec<Film> {
        if self.tmdb.is_enabled() {
            let result = match self.tmdb.popular_movies(1).await {
                Ok(page) => self.expand(&page.results, limit).await,
                Err(err) => Err(err),
            };
            match result {
                Ok(films) => return films,
                Err(err) => tracing::warn!(error = %err, "TMDB popular films failed"),
            }
        }
        self.local
            .iter()
            .take(limit)
            .map(|(name, film)| Film::from_local(name, film))
            .collect()
    }

    /// Looks a film up by TMDB id (all digits) or by title.
    pub async fn details(&self, id_or_title: &str) -> Option<Film> {
        let id_or_title = id_or_title.trim();
        if id_or_title.is_empty() {
            return None;
        }

        if id_or_title.chars().all(|c| c.is_ascii_digit()) {
            let id = id_or_title.parse::<u64>().ok()?;
            return match self.details_by_id(id).await {
                Ok(film) => film,
                Err(err) => {
                    tracing::warn!(id, error = %err, "TMDB details failed");
                    None
                }
            };
        }

        if let Some(film) = self.local_by_slug(id_or_title) {
            return Some(film);
        }
        self.search(id_or_title).await.into_iter().next()
    }

    pub async fn films_by_genre(&self, genre: &str, limit: usize) -> GenreFilms {
        let films = self.recommendations(&[genre.to_string()], limit).await;
        GenreFilms {
            genre: genre.to_string(),
            count: films.len(),
            films,
        }
    }

    pub fn analysis(&self, films: Vec<Film>, input: &str, genres: Vec<String>) -> AnalyzeResponse {
        if films.is_empty() {
            return AnalyzeResponse {
                message: NO_RESULTS_MESSAGE.to_string(),
                recommendations: Vec::new(),
                total_results: 0,
                query: input.to_string(),
                genres,
                data_source: None,
            };
        }

        let count = films.len();
        let templates = [
            format!(
                "Berdasarkan preferensi Anda '{}', berikut adalah {} rekomendasi film yang mungkin Anda sukai:",
                input, count
            ),
            format!("Saya menemukan {} film yang cocok dengan selera Anda:", count),
            format!(
                "Dari analisis preferensi Anda, berikut {} film yang direkomendasikan:",
                count
            ),
            format!(
                "Berdasarkan kata kunci '{}', ini adalah {} film pilihan terbaik untuk Anda:",
                input, count
            ),
        ];
        let message = templates
            .choose(&mut rand::rng())
            .cloned()
            .unwrap_or_default();

        let data_source = if films[0].tmdb_id.is_some() { "TMDB" } else { "Local" };
        let recommendations: Vec<Recommendation> =
            films.into_iter().map(Film::into_recommendation).collect();

        AnalyzeResponse {
            message,
            total_results: recommendations.len(),
            recommendations,
            query: input.to_string(),
            genres,
            data_source: Some(data_source.to_string()),
        }
    }

    async fn tmdb_recommendations(
        &self,
        genres: &[String],
        limit: usize,
    ) -> Result<Vec<Film>, reqwest::Error> {
        if !self.tmdb.is_enabled() {
            return Ok(Vec::new());
        }

        let genre_ids = self.resolve_genre_ids(genres).await?;
        let page = if genre_ids.is_empty() {
            self.tmdb.popular_movies(1).await?
        } else {
            self.tmdb.discover_movies(&genre_ids, 1).await?
        };
        self.expand(&page.results, limit).await
    }

    async fn tmdb_search(&self, query: &str) -> Result<Vec<Film>, reqwest::Error> {
        let page = self.tmdb.search_movies(query, 1).await?;
        tracing::debug!(query, page = page.page, total = page.total_results, "TMDB search");
        self.expand(&page.results, SEARCH_LIMIT).await
    }

    async fn resolve_genre_ids(&self, genres: &[String]) -> Result<Vec<u32>, reqwest::Error> {
        let known = match self.genre_cache.get("movie").await {
            Some(known) => known,
            None => {
                let list = self.tmdb.genres().await?;
                let known: Vec<(String, u32)> = list
                    .genres
                    .into_iter()
                    .map(|genre| (genre.name.to_lowercase(), genre.id))
                    .collect();
                if !known.is_empty() {
                    self.genre_cache.insert("movie", known.clone()).await;
                }
                known
            }
        };

        let lookup = |name: &str| {
            known
                .iter()
                .find(|(known_name, _)| known_name == name)
                .map(|(_, id)| *id)
        };

        let mut ids = Vec::new();
        for genre in genres {
            let name = genre.trim().to_lowercase();
            let id = lookup(&name)
                .or_else(|| english_genre(&name).and_then(lookup))
                .or_else(|| static_genre_id(&name));
            if let Some(id) = id
                && !ids.contains(&id)
            {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    async fn expand(&self, movies: &[Movie], limit: usize) -> Result<Vec<Film>, reqwest::Error> {
        let mut films = Vec::new();
        for (index, movie) in movies.iter().take(limit).enumerate() {
            if index > 0 {
                tokio::time::sleep(DETAIL_PACING).await;
            }
            if let Some(film) = self.details_by_id(movie.id).await? {
                films.push(film);
            }
        }
        Ok(films)
    }

    async fn details_by_id(&self, id: u64) -> Result<Option<Film>, reqwest::Error> {
        if let Some(film) = self.details_cache.get(&id).await {
            return Ok(Some(film));
        }
        let Some(movie) = self.tmdb.movie_details(id).await? else {
            return Ok(None);
        };
        let film = Film::from_tmdb(&movie, self.tmdb.image_base());
        self.details_cache.insert(id, film.clone()).await;
        Ok(Some(film))
    }

    fn local_recommendations(&self, genres: &[String], limit: usize) -> Vec<Film> {
        let wanted: Vec<String> = genres
            .iter()
            .flat_map(|genre| {
                let genre = genre.trim().to_lowercase();
                let english = english_genre(&genre).map(str::to_string);
                std::iter::once(genre).chain(english)
            })
            .filter(|genre| !genre.is_empty())
            .collect();

        let mut films: Vec<Film> = self
            .local
            .iter()
            .filter(|(_, film)| {
                film.genre.iter().any(|film_genre| {
                    let film_genre = film_genre.to_lowercase();
                    wanted.iter().any(|genre| film_genre.contains(genre.as_str()))
                })
            })
            .map(|(name, film)| Film::from_local(name, film))
            .collect();

        films.shuffle(&mut rand::rng());
        films.truncate(limit);
        films
    }

    fn local_search(&self, query: &str) -> Vec<Film> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }
        self.local
            .iter()
            .filter(|(name, film)| {
                name.to_lowercase().contains(&query)
                    || film
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&query))
                    || film.genre.iter().any(|g| g.to_lowercase().contains(&query))
            })
            .map(|(name, film)| Film::from_local(name, film))
            .collect()
    }

    fn local_by_slug(&self, slug: &str) -> Option<Film> {
        let slug = slug.to_lowercase();
        self.local
            .iter()
            .find(|(name, _)| name.replace(' ', "_").to_lowercase() == slug)
            .map(|(name, film)| Film::from_local(name, film))
    }
}
