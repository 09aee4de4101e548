use std::fmt::Write as _;
use std::io::Write as _;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::chatbot::ChatReply;
use crate::client::{ApiClient, ClientError};
use crate::display::{connection_label, render_card};
use crate::film::Film;
use crate::tabs::{Pane, Tabs, UnknownPane};

pub const POPULAR_VIEW_LIMIT: usize = 12;

const HELP: &str = "Perintah:
  /tab <recommender|search|popular|chatbot>  pindah tab
  /tabs                                      daftar tab
  /expand <n>                                buka atau tutup detail film ke-n
  /reset                                     hapus hasil
  /status                                    status koneksi
  /help                                      bantuan ini
  /quit                                      keluar
Teks lain dikirim ke tab yang aktif.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Tab(Pane),
    Tabs,
    Expand(usize),
    Reset,
    Status,
    Help,
    Quit,
    Input(String),
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("perintah tidak dikenal: {0} (ketik /help)")]
    Unknown(String),
    #[error(transparent)]
    Pane(#[from] UnknownPane),
    #[error("nomor film tidak valid: {0}")]
    InvalidIndex(String),
}

pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Command::Input(line.to_string()));
    };
    let (name, arg) = rest
        .split_once(char::is_whitespace)
        .map(|(name, arg)| (name, arg.trim()))
        .unwrap_or((rest, ""));

    match name {
        "tab" => Ok(Command::Tab(arg.parse()?)),
        "tabs" => Ok(Command::Tabs),
        "expand" => arg
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .map(|n| Command::Expand(n - 1))
            .ok_or_else(|| CommandError::InvalidIndex(arg.to_string())),
        "reset" => Ok(Command::Reset),
        "status" => Ok(Command::Status),
        "help" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(CommandError::Unknown(format!("/{}", other))),
    }
}

pub enum Step {
    Continue(String),
    Quit,
}

/// Interactive session over the API: one active tab, the last list of films
/// and at most one expanded card.
pub struct Shell {
    client: ApiClient,
    tabs: Tabs,
    results: Vec<(Film, Option<f64>)>,
    expanded: Option<usize>,
}

impl Shell {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            tabs: Tabs::default(),
            results: Vec::new(),
            expanded: None,
        }
    }

    pub fn active_pane(&self) -> Pane {
        self.tabs.active()
    }

    pub async fn run(mut self) -> std::io::Result<()> {
        let status = self.client.check_connection().await;
        println!("FilmFinder - {}", connection_label(status));
        println!("API: {}", self.client.active_url());
        println!("{}", HELP);

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("[{}]> ", self.active_pane());
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }
            match self.handle(&line).await {
                Step::Continue(output) => println!("{}", output.trim_end()),
                Step::Quit => break,
            }
        }
        Ok(())
    }

    pub async fn handle(&mut self, line: &str) -> Step {
        let command = match parse_command(line) {
            Ok(command) => command,
            Err(err) => return Step::Continue(err.to_string()),
        };

        let output = match command {
            Command::Quit => return Step::Quit,
            Command::Help => HELP.to_string(),
            Command::Tabs => self.render_tabs(),
            Command::Status => self.render_status(),
            Command::Reset => {
                self.clear();
                "Hasil dihapus.".to_string()
            }
            Command::Tab(pane) => {
                if self.tabs.select(pane) {
                    self.clear();
                }
                let mut output = format!("== {} ==\n", pane.label());
                if pane == Pane::Popular {
                    output.push_str(&self.load_popular().await);
                }
                output
            }
            Command::Expand(index) => {
                if index >= self.results.len() {
                    format!("Tidak ada film nomor {}.", index + 1)
                } else {
                    self.expanded = if self.expanded == Some(index) {
                        None
                    } else {
                        Some(index)
                    };
                    self.render_results()
                }
            }
            Command::Input(text) => match self.tabs.active() {
                Pane::Recommender => self.recommend(&text).await,
                Pane::Search => self.search(&text).await,
                Pane::Popular => self.load_popular().await,
                Pane::Chatbot => self.chat(&text).await,
            },
        };
        Step::Continue(output)
    }

    fn clear(&mut self) {
        self.results.clear();
        self.expanded = None;
    }

    fn show(&mut self, results: Vec<(Film, Option<f64>)>) {
        self.results = results;
        self.expanded = None;
    }

    async fn recommend(&mut self, text: &str) -> String {
        match self.client.submit(text).await {
            Ok(response) => {
                let header = response.message.clone();
                self.show(
                    response
                        .recommendations
                        .into_iter()
                        .map(|rec| (rec.film, Some(rec.confidence)))
                        .collect(),
                );
                format!("{}\n{}", header, self.render_results())
            }
            Err(err) => error_line(&err),
        }
    }

    async fn search(&mut self, query: &str) -> String {
        match self.client.search(query).await {
            Ok(response) if response.results.is_empty() => {
                self.clear();
                format!("Tidak ada film yang ditemukan untuk '{}'.", query.trim())
            }
            Ok(response) => {
                self.show(response.results.into_iter().map(|film| (film, None)).collect());
                self.render_results()
            }
            Err(err) => error_line(&err),
        }
    }

    async fn load_popular(&mut self) -> String {
        match self.client.popular(POPULAR_VIEW_LIMIT).await {
            Ok(response) => {
                self.show(response.results.into_iter().map(|film| (film, None)).collect());
                self.render_results()
            }
            Err(err) => error_line(&err),
        }
    }

    async fn chat(&mut self, message: &str) -> String {
        let reply = match self.client.chat(message).await {
            Ok(reply) => reply,
            Err(err) => return error_line(&err),
        };
        let content = reply.content().to_string();
        let films: Vec<(Film, Option<f64>)> = match reply {
            ChatReply::Text { .. } => Vec::new(),
            ChatReply::FilmInfo { film, .. } => vec![(*film, None)],
            ChatReply::Recommendations {
                recommendations, ..
            } => recommendations
                .into_iter()
                .map(|rec| (rec.film, Some(rec.confidence)))
                .collect(),
            ChatReply::GenreFilms { films, .. } => {
                films.into_iter().map(|film| (film, None)).collect()
            }
        };
        if films.is_empty() {
            return format!("FilmBot: {}", content);
        }
        self.show(films);
        format!("FilmBot: {}\n{}", content, self.render_results())
    }

    fn render_status(&self) -> String {
        let mut out = format!(
            "{} ({})",
            connection_label(self.client.status()),
            self.client.active_url()
        );
        if self.client.active_url() != self.client.primary_url() {
            let _ = write!(out, ", cadangan untuk {}", self.client.primary_url());
        }
        out
    }

    fn render_tabs(&self) -> String {
        let mut out = String::new();
        for pane in self.tabs.panes() {
            let marker = if self.tabs.is_active(pane) { '*' } else { ' ' };
            let _ = writeln!(out, "{} {:<12} {}", marker, pane.id(), pane.label());
        }
        out
    }

    fn render_results(&self) -> String {
        if self.results.is_empty() {
            return "Belum ada film.".to_string();
        }
        self.results
            .iter()
            .enumerate()
            .map(|(index, (film, confidence))| {
                render_card(index, film, *confidence, self.expanded == Some(index))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn error_line(err: &ClientError) -> String {
    format!("Error: {}", err.user_message())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::spawn;
    use crate::client::{ConnectionStatus, RetryPolicy};
    use crate::server::{router, tests::demo_state};

    async fn demo_shell() -> Shell {
        let base = spawn(router(demo_state().await)).await;
        let mut client = ApiClient::new(base, None).with_retry(RetryPolicy {
            max_retries: 0,
            delay: std::time::Duration::ZERO,
        });
        assert_eq!(client.check_connection().await, ConnectionStatus::Connected);
        Shell::new(client)
    }

    fn output(step: Step) -> String {
        match step {
            Step::Continue(output) => output,
            Step::Quit => panic!("unexpected quit"),
        }
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("/tab search"), Ok(Command::Tab(Pane::Search)));
        assert_eq!(parse_command("/expand 2"), Ok(Command::Expand(1)));
        assert_eq!(parse_command(" /quit "), Ok(Command::Quit));
        assert_eq!(
            parse_command("film horor seram"),
            Ok(Command::Input("film horor seram".to_string()))
        );
        assert_eq!(
            parse_command("/expand 0"),
            Err(CommandError::InvalidIndex("0".to_string()))
        );
        assert!(matches!(parse_command("/tab settings"), Err(CommandError::Pane(_))));
        assert!(matches!(parse_command("/train"), Err(CommandError::Unknown(_))));
    }

    #[tokio::test]
    async fn test_recommend_and_expand() {
        let mut shell = demo_shell().await;
        assert_eq!(shell.active_pane(), Pane::Recommender);

        let out = output(shell.handle("film horor yang menegangkan").await);
        assert!(out.contains("1. The Conjuring"));
        assert!(out.contains("% Match"));
        assert!(!out.contains("Sutradara"));

        let out = output(shell.handle("/expand 1").await);
        assert!(out.contains("Sutradara: James Wan"));
        let out = output(shell.handle("/expand 1").await);
        assert!(!out.contains("Sutradara"));

        let out = output(shell.handle("/expand 5").await);
        assert_eq!(out, "Tidak ada film nomor 5.");

        let out = output(shell.handle("   ").await);
        assert_eq!(out, "Error: Silakan masukkan preferensi film Anda");
    }

    #[tokio::test]
    async fn test_tabs_search_and_popular() {
        let mut shell = demo_shell().await;

        let out = output(shell.handle("/tab popular").await);
        assert!(out.starts_with("== Film Populer =="));
        assert!(out.contains("3. "));

        output(shell.handle("/tab search").await);
        assert_eq!(shell.active_pane(), Pane::Search);
        let out = output(shell.handle("dune").await);
        assert!(out.starts_with("1. Dune"));
        let out = output(shell.handle("zzzz").await);
        assert_eq!(out, "Tidak ada film yang ditemukan untuk 'zzzz'.");

        let out = output(shell.handle("/status").await);
        assert!(out.starts_with("Terhubung ke server (http://127.0.0.1:"));
        assert!(!out.contains("cadangan"));

        let out = output(shell.handle("/tabs").await);
        assert!(out.contains("* search"));
        assert!(matches!(shell.handle("/quit").await, Step::Quit));
    }

    #[tokio::test]
    async fn test_chatbot_tab() {
        let mut shell = demo_shell().await;
        output(shell.handle("/tab chatbot").await);

        let out = output(shell.handle("halo").await);
        assert!(out.starts_with("FilmBot: Halo!"));

        let out = output(shell.handle("info film Dune").await);
        assert!(out.contains("1. Dune"));
    }
}
