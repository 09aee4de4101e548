use std::fmt::Write as _;

use crate::client::ConnectionStatus;
use crate::film::Film;

const MAX_GENRE_TAGS: usize = 3;
const MAX_ACTORS: usize = 5;
const MAX_RELATED: usize = 3;

/// Five-star rendering of a 0-10 rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StarRating {
    pub full: u8,
    pub half: bool,
    pub empty: u8,
}

impl StarRating {
    pub fn from_rating(rating: f64) -> Self {
        let rating = if rating.is_nan() { 0.0 } else { rating.clamp(0.0, 10.0) };
        let stars = rating / 2.0;
        let full = stars.floor() as u8;
        let half = stars.fract() >= 0.5;
        let empty = 5 - full - u8::from(half);
        Self { full, half, empty }
    }

    pub fn render(&self, rating: f64) -> String {
        let mut out = String::new();
        out.push_str(&"★".repeat(self.full as usize));
        if self.half {
            out.push('⯪');
        }
        out.push_str(&"☆".repeat(self.empty as usize));
        let _ = write!(out, " {:.1}/10", rating);
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
}

impl ConfidenceBand {
    pub fn from_score(confidence: f64) -> Self {
        if confidence >= 80.0 {
            ConfidenceBand::High
        } else if confidence >= 60.0 {
            ConfidenceBand::Medium
        } else {
            ConfidenceBand::Low
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            ConfidenceBand::High => "green",
            ConfidenceBand::Medium => "yellow",
            ConfidenceBand::Low => "red",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceBand::High => "sangat cocok",
            ConfidenceBand::Medium => "cukup cocok",
            ConfidenceBand::Low => "kurang cocok",
        }
    }
}

pub fn confidence_badge(confidence: f64) -> String {
    let band = ConfidenceBand::from_score(confidence);
    format!("{:.0}% Match ({})", confidence, band.label())
}

fn paint(text: &str, color: &str) -> String {
    let code = match color {
        "green" => 32,
        "yellow" => 33,
        _ => 31,
    };
    format!("\x1b[{}m{}\x1b[0m", code, text)
}

/// The first three genres, plus a "+N more" tag for the rest.
pub fn genre_tags(genres: &[String]) -> (Vec<&str>, Option<String>) {
    let shown = genres
        .iter()
        .take(MAX_GENRE_TAGS)
        .map(String::as_str)
        .collect();
    let more = (genres.len() > MAX_GENRE_TAGS)
        .then(|| format!("+{} more", genres.len() - MAX_GENRE_TAGS));
    (shown, more)
}

pub fn format_duration(minutes: Option<u32>) -> Option<String> {
    match minutes {
        None | Some(0) => None,
        Some(minutes) => Some(format!("{}h {}m", minutes / 60, minutes % 60)),
    }
}

pub fn connection_label(status: ConnectionStatus) -> &'static str {
    match status {
        ConnectionStatus::Connected => "Terhubung ke server",
        ConnectionStatus::Connecting => "Menghubungkan...",
        ConnectionStatus::Failed => "Koneksi terputus",
        ConnectionStatus::Idle => "Status tidak diketahui",
    }
}

/// Plain-text film card. `confidence` is shown only for recommendations.
pub fn render_card(index: usize, film: &Film, confidence: Option<f64>, expanded: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}. {}", index + 1, film.title);

    let mut meta = vec![film.release_year.clone()];
    if let Some(duration) = format_duration(Some(film.duration)) {
        meta.push(duration);
    }
    if film.vote_count > 0 {
        meta.push(format!("{} votes", film.vote_count));
    }
    let _ = writeln!(out, "   {}", meta.join(" · "));

    if let Some(confidence) = confidence {
        let band = ConfidenceBand::from_score(confidence);
        let _ = writeln!(out, "   {}", paint(&confidence_badge(confidence), band.color()));
    }
    let stars = StarRating::from_rating(film.rating);
    let _ = writeln!(out, "   {}", stars.render(film.rating));

    let (tags, more) = genre_tags(&film.genre);
    if !tags.is_empty() {
        let mut line = tags.join(", ");
        if let Some(more) = more {
            line.push_str(", ");
            line.push_str(&more);
        }
        let _ = writeln!(out, "   [{}]", line);
    }
    if let Some(poster) = &film.poster_url {
        let _ = writeln!(out, "   {}", poster);
    }
    let _ = writeln!(out, "   {}", film.description);

    if expanded {
        let _ = writeln!(out, "   Sutradara: {}", film.director);
        if !film.actors.is_empty() {
            let actors: Vec<&str> = film.actors.iter().take(MAX_ACTORS).map(String::as_str).collect();
            let _ = writeln!(out, "   Pemeran: {}", actors.join(", "));
        }
        if !film.recommendations.is_empty() {
            let related: Vec<&str> = film
                .recommendations
                .iter()
                .take(MAX_RELATED)
                .map(String::as_str)
                .collect();
            let _ = writeln!(out, "   Film serupa: {}", related.join(", "));
        }
    }
    out
}
