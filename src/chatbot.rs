use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::catalog::Catalog;
use crate::classifier::GenreClassifier;
use crate::film::{Film, Recommendation};

const CHAT_RECOMMENDATIONS: usize = 5;
const CHAT_GENRE_FILMS: usize = 5;

static GREETING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(halo|hai|hi|hello|hey|pagi|siang|sore|malam|selamat\s+(pagi|siang|sore|malam)|assalamualaikum)\b")
        .expect("valid regex")
});
static HELP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(bantuan|help|tolong\s+jelaskan|bisa\s+apa|cara\s+pakai)\b").expect("valid regex")
});
static FILM_INFO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:info(?:rmasi)?|detail|tentang|ceritakan(?:\s+tentang)?)\s+(?:film\s+)?(.+?)[\s?.!]*$")
        .expect("valid regex")
});
static RECOMMEND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(rekomendasi\w*|rekomendasikan|sarankan|saran|recommend\w*|suggest\w*)\b")
        .expect("valid regex")
});

/// What the user is asking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Greeting,
    Help,
    FilmInfo(String),
    Recommend,
    Genre,
    Unknown,
}

/// Chatbot reply, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatReply {
    Text {
        content: String,
    },
    FilmInfo {
        content: String,
        film: Box<Film>,
    },
    Recommendations {
        content: String,
        recommendations: Vec<Recommendation>,
    },
    GenreFilms {
        content: String,
        genre: String,
        films: Vec<Film>,
    },
}

impl ChatReply {
    pub fn text(content: impl Into<String>) -> Self {
        ChatReply::Text {
            content: content.into(),
        }
    }

    pub fn content(&self) -> &str {
        match self {
            ChatReply::Text { content }
            | ChatReply::FilmInfo { content, .. }
            | ChatReply::Recommendations { content, .. }
            | ChatReply::GenreFilms { content, .. } => content,
        }
    }
}

pub fn detect_intent(message: &str, classifier: &GenreClassifier) -> Intent {
    if HELP.is_match(message) {
        return Intent::Help;
    }
    if let Some(title) = FILM_INFO
        .captures(message)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|title| !title.is_empty())
    {
        return Intent::FilmInfo(title);
    }
    if RECOMMEND.is_match(message) {
        return Intent::Recommend;
    }
    if !classifier.predict(message).top_genres.is_empty() {
        return Intent::Genre;
    }
    if GREETING.is_match(message) {
        return Intent::Greeting;
    }
    Intent::Unknown
}

fn help_text(classifier: &GenreClassifier) -> String {
    let genres: Vec<&str> = classifier.genres().collect();
    format!(
        "Saya FilmBot. Coba tanyakan:\n- \"info film Dune\" untuk detail sebuah film\n- \"rekomendasi film horor yang menegangkan\" untuk saran film\n- \"film komedi\" untuk daftar film per genre\nGenre yang saya kenal: {}.",
        genres.join(", ")
    )
}

pub async fn reply(catalog: &Catalog, classifier: &GenreClassifier, message: &str) -> ChatReply {
    let intent = detect_intent(message, classifier);
    tracing::debug!(?intent, "chat intent");

    match intent {
        Intent::Greeting => ChatReply::text(
            "Halo! Saya FilmBot, asisten film Anda. Ceritakan film seperti apa yang ingin Anda tonton, atau ketik \"bantuan\".",
        ),
        Intent::Help => ChatReply::text(help_text(classifier)),
        Intent::FilmInfo(title) => match catalog.details(&title).await {
            Some(film) => ChatReply::FilmInfo {
                content: format!(
                    "{} ({}) disutradarai oleh {}. {}",
                    film.title, film.release_year, film.director, film.description
                ),
                film: Box::new(film),
            },
            None => ChatReply::text(format!(
                "Maaf, saya tidak menemukan informasi tentang film '{}'.",
                title
            )),
        },
        Intent::Recommend => {
            let genres = classifier.predict(message).top_genres;
            let films = catalog.recommendations(&genres, CHAT_RECOMMENDATIONS).await;
            if films.is_empty() {
                return ChatReply::text(
                    "Maaf, saya belum menemukan film yang cocok. Coba sebutkan genre atau suasana film yang Anda inginkan.",
                );
            }
            let content = if genres.is_empty() {
                format!("Berikut {} film yang sedang populer:", films.len())
            } else {
                format!(
                    "Berikut {} rekomendasi film {} untuk Anda:",
                    films.len(),
                    genres.join(", ")
                )
            };
            ChatReply::Recommendations {
                content,
                recommendations: films.into_iter().map(Film::into_recommendation).collect(),
            }
        }
        Intent::Genre => {
            let prediction = classifier.predict(message);
            let Some(genre) = prediction.top_genres.first() else {
                return ChatReply::text(help_text(classifier));
            };
            let result = catalog.films_by_genre(genre, CHAT_GENRE_FILMS).await;
            if result.films.is_empty() {
                return ChatReply::text(format!(
                    "Maaf, saya belum punya daftar film bergenre {}.",
                    genre
                ));
            }
            ChatReply::GenreFilms {
                content: format!("Ini {} film bergenre {}:", result.count, result.genre),
                genre: result.genre,
                films: result.films,
            }
        }
        Intent::Unknown => ChatReply::text(
            "Maaf, saya belum mengerti maksud Anda. Ketik \"bantuan\" untuk melihat apa yang bisa saya lakukan.",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::demo_catalog;

    #[test]
    fn test_detect_intent() {
        let classifier = GenreClassifier::new();
        assert_eq!(detect_intent("Halo FilmBot", &classifier), Intent::Greeting);
        assert_eq!(detect_intent("bantuan", &classifier), Intent::Help);
        assert_eq!(
            detect_intent("info film Dune?", &classifier),
            Intent::FilmInfo("Dune".to_string())
        );
        assert_eq!(
            detect_intent("ceritakan tentang La La Land", &classifier),
            Intent::FilmInfo("La La Land".to_string())
        );
        assert_eq!(
            detect_intent("rekomendasi film horor dong", &classifier),
            Intent::Recommend
        );
        assert_eq!(detect_intent("film komedi", &classifier), Intent::Genre);
        assert_eq!(detect_intent("apa kabar", &classifier), Intent::Unknown);
    }

    #[test]
    fn test_reply_wire_format() {
        let value = serde_json::to_value(ChatReply::text("hai")).expect("serialize");
        assert_eq!(value, serde_json::json!({ "type": "text", "content": "hai" }));
    }

    #[tokio::test]
    async fn test_reply_film_info() {
        let catalog = demo_catalog().await;
        let classifier = GenreClassifier::new();

        let reply = reply(&catalog, &classifier, "info film Dune").await;
        let ChatReply::FilmInfo { film, content } = reply else {
            panic!("expected film info, got {:?}", reply);
        };
        assert_eq!(film.title, "Dune");
        assert!(content.contains("Denis Villeneuve"));
    }

    #[tokio::test]
    async fn test_reply_film_not_found() {
        let catalog = demo_catalog().await;
        let classifier = GenreClassifier::new();

        let reply = reply(&catalog, &classifier, "info film Tidak Ada").await;
        assert!(matches!(reply, ChatReply::Text { .. }));
        assert!(reply.content().contains("Tidak Ada"));
    }

    #[tokio::test]
    async fn test_reply_recommendations() {
        let catalog = demo_catalog().await;
        let classifier = GenreClassifier::new();

        let reply = reply(&catalog, &classifier, "sarankan film horor").await;
        let ChatReply::Recommendations { recommendations, .. } = reply else {
            panic!("expected recommendations, got {:?}", reply);
        };
        assert_eq!(recommendations.len(), 1);
        assert_eq!(recommendations[0].film.title, "The Conjuring");
    }

    #[tokio::test]
    async fn test_reply_genre_films() {
        let catalog = demo_catalog().await;
        let classifier = GenreClassifier::new();

        let reply = reply(&catalog, &classifier, "film romantis").await;
        let ChatReply::GenreFilms { genre, films, .. } = reply else {
            panic!("expected genre films, got {:?}", reply);
        };
        assert_eq!(genre, "Romance");
        assert_eq!(films[0].title, "La La Land");
    }
}
