use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use utoipa::ToSchema;

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}\-]+").expect("valid regex"));

const STOPWORDS: &[&str] = &[
    "saya", "aku", "kami", "kita", "anda", "kamu", "yang", "dan", "atau", "dengan", "untuk",
    "di", "ke", "dari", "ini", "itu", "ada", "adalah", "akan", "juga", "sangat", "banget",
    "sekali", "lebih", "agak", "mau", "ingin", "pengen", "suka", "senang", "nonton",
    "menonton", "tonton", "film", "filmnya", "movie", "movies", "sebuah", "yg", "dong", "deh",
    "tolong", "tentang", "seperti", "punya", "memiliki", "bisa", "the", "a", "an", "and", "or",
    "of", "to", "i", "me", "my", "want", "like", "with", "that", "some", "please", "is", "are",
];

/// Genre name and the keywords (single words or space-separated phrases) that vote for it.
const LEXICON: &[(&str, &[&str])] = &[
    ("Aksi", &["aksi", "action", "laga", "tembak", "tembakan", "ledakan", "pertarungan", "bertarung", "superhero", "pahlawan", "seru", "berantem", "martial"]),
    ("Komedi", &["komedi", "comedy", "lucu", "lawak", "humor", "kocak", "ketawa", "tertawa", "menghibur", "ringan", "funny"]),
    ("Drama", &["drama", "mengharukan", "sedih", "haru", "emosional", "menyentuh", "pesan moral", "kehidupan", "keluarga besar", "tangis", "menangis"]),
    ("Horror", &["horor", "horror", "hantu", "seram", "menyeramkan", "menakutkan", "takut", "setan", "mistis", "kesurupan", "zombie", "iblis"]),
    ("Romance", &["romance", "romantis", "cinta", "pacar", "kekasih", "percintaan", "jatuh cinta", "love", "pernikahan"]),
    ("Sci-Fi", &["sci-fi", "scifi", "fiksi ilmiah", "science fiction", "luar angkasa", "antariksa", "alien", "robot", "futuristik", "masa depan", "teknologi", "space", "time travel", "perjalanan waktu"]),
    ("Thriller", &["thriller", "menegangkan", "tegang", "ketegangan", "plot twist", "twist", "psikologis", "suspense", "pembunuh"]),
    ("Petualangan", &["petualangan", "adventure", "berpetualang", "ekspedisi", "perjalanan", "harta karun", "eksplorasi", "menjelajah"]),
    ("Animasi", &["animasi", "animation", "kartun", "anime", "pixar", "disney", "animated"]),
    ("Kriminal", &["kriminal", "crime", "kejahatan", "mafia", "gangster", "perampokan", "detektif", "polisi", "narkoba", "heist"]),
    ("Dokumenter", &["dokumenter", "documentary", "kisah nyata", "fakta", "nyata"]),
    ("Keluarga", &["keluarga", "family", "anak-anak", "anak", "semua umur", "orang tua"]),
    ("Fantasi", &["fantasi", "fantasy", "sihir", "penyihir", "magic", "naga", "dunia lain", "ajaib", "kerajaan"]),
    ("Sejarah", &["sejarah", "history", "historis", "sejarahnya", "kolonial", "kerajaan kuno", "biografi", "biopic"]),
    ("Musik", &["musik", "music", "musikal", "musical", "lagu", "band", "penyanyi", "konser"]),
    ("Misteri", &["misteri", "mystery", "teka-teki", "misterius", "rahasia", "penyelidikan", "whodunit"]),
    ("Perang", &["perang", "war", "tentara", "militer", "pertempuran", "prajurit", "medan perang"]),
    ("Western", &["western", "koboi", "cowboy", "wild west"]),
];

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct GenreScore {
    pub genre: String,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct GenrePrediction {
    pub top_genres: Vec<String>,
    pub scores: Vec<GenreScore>,
}

/// Keyword-lexicon genre classifier for free-text film preferences.
#[derive(Debug, Clone)]
pub struct GenreClassifier {
    stopwords: HashSet<&'static str>,
    lexicon: Vec<(&'static str, Vec<Vec<&'static str>>)>,
    max_genres: usize,
}

impl Default for GenreClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl GenreClassifier {
    pub fn new() -> Self {
        let lexicon: Vec<(&'static str, Vec<Vec<&'static str>>)> = LEXICON
            .iter()
            .map(|(genre, keywords)| {
                let phrases = keywords
                    .iter()
                    .map(|keyword| keyword.split_whitespace().collect::<Vec<_>>())
                    .collect();
                (*genre, phrases)
            })
            .collect();

        Self {
            stopwords: STOPWORDS.iter().copied().collect(),
            lexicon,
            max_genres: 3,
        }
    }

    pub fn genres(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.lexicon.iter().map(|(genre, _)| *genre)
    }

    /// Lower-cases, strips punctuation and drops stopwords.
    pub fn preprocess(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        NON_WORD
            .replace_all(&lower, " ")
            .split_whitespace()
            .map(|token| token.trim_matches('-'))
            .filter(|token| !token.is_empty() && !self.stopwords.contains(token))
            .map(str::to_string)
            .collect()
    }

    pub fn predict(&self, text: &str) -> GenrePrediction {
        // Phrases are matched on the raw token stream so that stopwords inside
        // a phrase ("keluarga besar") still line up.
        let lower = text.to_lowercase();
        let raw: Vec<&str> = NON_WORD
            .split(&lower)
            .flat_map(str::split_whitespace)
            .collect();
        let kept: HashSet<String> = self.preprocess(text).into_iter().collect();

        let mut hits: Vec<(usize, &'static str, usize)> = self
            .lexicon
            .iter()
            .enumerate()
            .map(|(order, (genre, phrases))| {
                let count: usize = phrases
                    .iter()
                    .map(|phrase| match phrase.as_slice() {
                        [word] => usize::from(kept.contains(*word)),
                        words => raw.windows(words.len()).filter(|w| w == &words).count(),
                    })
                    .sum();
                (order, *genre, count)
            })
            .filter(|(_, _, count)| *count > 0)
            .collect();

        let total: usize = hits.iter().map(|(_, _, count)| count).sum();
        if total == 0 {
            return GenrePrediction::default();
        }

        hits.sort_by(|a, b| b.2.cmp(&a.2).then(a.0.cmp(&b.0)));

        let scores: Vec<GenreScore> = hits
            .iter()
            .map(|(_, genre, count)| GenreScore {
                genre: genre.to_string(),
                score: *count as f64 / total as f64,
            })
            .collect();
        let top_genres = scores
            .iter()
            .take(self.max_genres)
            .map(|score| score.genre.clone())
            .collect();

        GenrePrediction { top_genres, scores }
    }
}
