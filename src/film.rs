use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use crate::tmdb::Movie;

pub const UNKNOWN: &str = "Unknown";
pub const NO_DESCRIPTION: &str = "Deskripsi tidak tersedia";

const GENRE_NAMES: [(u32, &str); 19] = [
    (28, "Aksi"),
    (35, "Komedi"),
    (18, "Drama"),
    (27, "Horror"),
    (10749, "Romance"),
    (878, "Sci-Fi"),
    (53, "Thriller"),
    (12, "Petualangan"),
    (16, "Animasi"),
    (80, "Kriminal"),
    (99, "Dokumenter"),
    (10751, "Keluarga"),
    (14, "Fantasi"),
    (36, "Sejarah"),
    (10402, "Musik"),
    (9648, "Misteri"),
    (10770, "TV Movie"),
    (37, "Western"),
    (10752, "Perang"),
];

/// TMDB id for catalog films, a slug for local fallback films.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum FilmId {
    Tmdb(u64),
    Local(String),
}

impl fmt::Display for FilmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilmId::Tmdb(id) => write!(f, "{}", id),
            FilmId::Local(slug) => f.write_str(slug),
        }
    }
}

/// The film record every view renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Film {
    pub id: FilmId,
    pub title: String,
    #[serde(default)]
    pub original_title: Option<String>,
    #[serde(default = "unknown", deserialize_with = "string_or_number")]
    pub release_year: String,
    #[serde(default = "unknown")]
    pub release_date: String,
    #[serde(default = "unknown")]
    pub director: String,
    #[serde(default)]
    pub genre: Vec<String>,
    #[serde(default = "no_description")]
    pub description: String,
    #[serde(default)]
    pub actors: Vec<String>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub vote_count: u64,
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub poster_url: Option<String>,
    #[serde(default)]
    pub backdrop_url: Option<String>,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub tmdb_id: Option<u64>,
    #[serde(default = "english")]
    pub language: String,
}

/// A film with its match strength, as returned by `/api/analyze`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Recommendation {
    #[serde(flatten)]
    pub film: Film,
    pub confidence: f64,
}

/// One entry of the local `films.json` catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct LocalFilm {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub release_year: Option<String>,
    #[serde(default)]
    pub director: Option<String>,
    #[serde(default)]
    pub genre: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub actors: Vec<String>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

fn unknown() -> String {
    UNKNOWN.to_string()
}

fn no_description() -> String {
    NO_DESCRIPTION.to_string()
}

fn english() -> String {
    "en".to_string()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Integer(i64),
    Float(f64),
}

impl From<StringOrNumber> for String {
    fn from(value: StringOrNumber) -> Self {
        match value {
            StringOrNumber::String(value) => value,
            StringOrNumber::Integer(value) => value.to_string(),
            StringOrNumber::Float(value) => value.to_string(),
        }
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    StringOrNumber::deserialize(deserializer).map(String::from)
}

fn optional_string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Option::<StringOrNumber>::deserialize(deserializer).map(|value| value.map(String::from))
}

pub fn genre_name(id: u32) -> &'static str {
    GENRE_NAMES
        .iter()
        .find(|(genre_id, _)| *genre_id == id)
        .map(|(_, name)| *name)
        .unwrap_or(UNKNOWN)
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Match strength derived from rating and popularity, capped at 95.
pub fn confidence_score(rating: f64, popularity: f64) -> f64 {
    round1(((rating * 10.0 + popularity / 100.0) / 2.0).min(95.0))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

impl Film {
    pub fn from_tmdb(movie: &Movie, image_base: &str) -> Self {
        let genre = match (&movie.genres, &movie.genre_ids) {
            (Some(genres), _) => genres.iter().map(|genre| genre.name.clone()).collect(),
            (None, Some(ids)) => ids.iter().map(|id| genre_name(*id).to_string()).collect(),
            (None, None) => Vec::new(),
        };

        let director = movie
            .credits
            .as_ref()
            .and_then(|credits| credits.crew.iter().find(|person| person.job == "Director"))
            .map(|person| person.name.clone())
            .unwrap_or_else(unknown);

        let actors = movie
            .credits
            .as_ref()
            .map(|credits| credits.cast.iter().take(5).map(|p| p.name.clone()).collect())
            .unwrap_or_default();

        let recommendations = movie
            .recommendations
            .as_ref()
            .map(|recs| {
                recs.results
                    .iter()
                    .take(5)
                    .filter_map(|rec| rec.title.clone())
                    .collect()
            })
            .unwrap_or_default();

        let release_date = non_empty(movie.release_date.as_deref());
        let release_year = release_date
            .and_then(|date| date.get(..4))
            .map(str::to_string)
            .unwrap_or_else(unknown);

        Self {
            id: FilmId::Tmdb(movie.id),
            title: movie.title.clone().unwrap_or_else(unknown),
            original_title: movie.original_title.clone(),
            release_year,
            release_date: release_date.map(str::to_string).unwrap_or_else(unknown),
            director,
            genre,
            description: non_empty(movie.overview.as_deref())
                .map(str::to_string)
                .unwrap_or_else(no_description),
            actors,
            rating: round1(movie.vote_average),
            vote_count: movie.vote_count,
            duration: movie.runtime.unwrap_or(0),
            poster_url: movie
                .poster_path
                .as_ref()
                .map(|path| format!("{}/w500{}", image_base, path)),
            backdrop_url: movie
                .backdrop_path
                .as_ref()
                .map(|path| format!("{}/original{}", image_base, path)),
            popularity: movie.popularity,
            recommendations,
            tmdb_id: Some(movie.id),
            language: movie.original_language.clone().unwrap_or_else(english),
        }
    }

    pub fn from_local(name: &str, local: &LocalFilm) -> Self {
        let release_year = local.release_year.clone().unwrap_or_else(unknown);
        Self {
            id: FilmId::Local(name.replace(' ', "_").to_lowercase()),
            title: local.title.clone().unwrap_or_else(|| name.to_string()),
            original_title: Some(local.title.clone().unwrap_or_else(|| name.to_string())),
            release_date: release_year.clone(),
            release_year,
            director: local.director.clone().unwrap_or_else(unknown),
            genre: local.genre.clone(),
            description: local.description.clone().unwrap_or_else(no_description),
            actors: local.actors.clone(),
            rating: local.rating,
            vote_count: 1000,
            duration: local.duration.unwrap_or(120),
            poster_url: None,
            backdrop_url: None,
            popularity: local.rating * 100.0,
            recommendations: local.recommendations.clone(),
            tmdb_id: None,
            language: english(),
        }
    }

    pub fn into_recommendation(self) -> Recommendation {
        let confidence = confidence_score(self.rating, self.popularity);
        Recommendation {
            film: self,
            confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const IMAGE_BASE: &str = "https://image.tmdb.org/t/p";

    #[test]
    fn test_from_tmdb_details() {
        let movie: Movie = serde_json::from_value(json!({
            "id": 438631,
            "title": "Dune",
            "original_title": "Dune",
            "overview": "Paul Atreides...",
            "release_date": "2021-09-15",
            "genres": [{ "id": 878, "name": "Fiksi Ilmiah" }, { "id": 12, "name": "Petualangan" }],
            "credits": {
                "cast": [
                    { "name": "Timothée Chalamet" }, { "name": "Rebecca Ferguson" },
                    { "name": "Oscar Isaac" }, { "name": "Josh Brolin" },
                    { "name": "Stellan Skarsgård" }, { "name": "Dave Bautista" }
                ],
                "crew": [
                    { "name": "Hans Zimmer", "job": "Original Music Composer" },
                    { "name": "Denis Villeneuve", "job": "Director" }
                ]
            },
            "runtime": 155,
            "poster_path": "/d5NXSklXo0qyIYkgV94XAgMIckC.jpg",
            "backdrop_path": "/jYEW5xZkZk2WTrdbMGAPFuBqbDc.jpg",
            "vote_average": 7.789,
            "vote_count": 12000,
            "popularity": 120.5,
            "original_language": "en"
        }))
        .expect("movie");

        let film = Film::from_tmdb(&movie, IMAGE_BASE);
        assert_eq!(film.id, FilmId::Tmdb(438631));
        assert_eq!(film.release_year, "2021");
        assert_eq!(film.director, "Denis Villeneuve");
        assert_eq!(film.actors.len(), 5);
        assert_eq!(film.genre, vec!["Fiksi Ilmiah", "Petualangan"]);
        assert_eq!(film.rating, 7.8);
        assert_eq!(
            film.poster_url.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/d5NXSklXo0qyIYkgV94XAgMIckC.jpg")
        );
        assert_eq!(
            film.backdrop_url.as_deref(),
            Some("https://image.tmdb.org/t/p/original/jYEW5xZkZk2WTrdbMGAPFuBqbDc.jpg")
        );
        assert_eq!(film.tmdb_id, Some(438631));
    }

    #[test]
    fn test_from_tmdb_listing_uses_genre_ids() {
        let movie: Movie = serde_json::from_value(json!({
            "id": 1,
            "title": "Listing",
            "genre_ids": [28, 99999],
            "overview": "",
            "release_date": ""
        }))
        .expect("movie");

        let film = Film::from_tmdb(&movie, IMAGE_BASE);
        assert_eq!(film.genre, vec!["Aksi", "Unknown"]);
        assert_eq!(film.description, NO_DESCRIPTION);
        assert_eq!(film.release_year, UNKNOWN);
        assert_eq!(film.director, UNKNOWN);
        assert!(film.poster_url.is_none());
    }

    #[test]
    fn test_from_local() {
        let local: LocalFilm = serde_json::from_value(json!({
            "title": "Dune",
            "release_year": 2021,
            "director": "Denis Villeneuve",
            "genre": ["Sci-Fi", "Action"],
            "rating": 8.0
        }))
        .expect("local film");

        let film = Film::from_local("Blade Runner 2049", &local);
        assert_eq!(film.id, FilmId::Local("blade_runner_2049".to_string()));
        assert_eq!(film.release_year, "2021");
        assert_eq!(film.duration, 120);
        assert_eq!(film.popularity, 800.0);
        assert_eq!(film.vote_count, 1000);
        assert!(film.tmdb_id.is_none());
    }

    #[test]
    fn test_confidence_score() {
        assert_eq!(confidence_score(8.0, 800.0), 44.0);
        assert_eq!(confidence_score(10.0, 100_000.0), 95.0);
        assert_eq!(confidence_score(7.3, 45.0), 36.7);
    }

    #[test]
    fn test_recommendation_json_is_flat() {
        let local: LocalFilm = serde_json::from_value(json!({ "rating": 9.0 })).expect("local");
        let rec = Film::from_local("Arrival", &local).into_recommendation();
        let value = serde_json::to_value(&rec).expect("serialize");
        assert_eq!(value["title"], "Arrival");
        assert_eq!(value["id"], "arrival");
        assert_eq!(value["confidence"], 49.5);

        let back: Recommendation = serde_json::from_value(value).expect("deserialize");
        assert_eq!(back.film.title, "Arrival");
    }

    #[test]
    fn test_film_accepts_numeric_release_year() {
        let film: Film = serde_json::from_value(json!({
            "id": 7,
            "title": "Numeric",
            "release_year": 1999
        }))
        .expect("film");
        assert_eq!(film.release_year, "1999");
        assert_eq!(film.language, "en");
    }
}
