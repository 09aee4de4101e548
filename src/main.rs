use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod catalog;
mod chatbot;
mod classifier;
mod client;
mod config;
mod display;
mod film;
mod server;
mod shell;
mod tabs;
mod tmdb;

use client::{ApiClient, ClientError};
use config::Config;
use display::render_card;
use shell::{POPULAR_VIEW_LIMIT, Shell};

#[derive(Parser)]
#[command(name = "filmfinder", version, about = "Film recommendations from free-text preferences")]
struct Cli {
    /// Base URL of the filmfinder API for client commands
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// API URL to switch to when the primary fails its health check
    #[arg(long, global = true)]
    fallback_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (default)
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Describe what you feel like watching and get recommendations
    Ask { text: Vec<String> },
    /// Search films by title or keyword
    Search { query: Vec<String> },
    /// List popular films
    Popular {
        #[arg(long, default_value_t = POPULAR_VIEW_LIMIT)]
        limit: usize,
    },
    /// Send one message to the chatbot
    Chat { message: Vec<String> },
    /// Interactive session with tabs
    Shell,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let default_level = match cli.command {
        None | Some(Command::Serve { .. }) => "info",
        Some(_) => "warn",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .compact()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::FAILURE;
        }
    };
    if let Some(url) = cli.api_url {
        config.api_url = url.trim_end_matches('/').to_string();
    }
    if let Some(url) = cli.fallback_url {
        config.fallback_api_url = Some(url.trim_end_matches('/').to_string());
    }

    let command = cli.command.unwrap_or(Command::Serve {
        host: None,
        port: None,
    });
    match run(command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Error: {}", .0.user_message())]
    Client(#[from] ClientError),
}

async fn run(command: Command, mut config: Config) -> Result<(), RunError> {
    match command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            server::serve(&config).await?;
        }
        Command::Shell => {
            Shell::new(ApiClient::from_config(&config)).run().await?;
        }
        Command::Ask { text } => {
            let client = connect(&config).await;
            let response = client.submit(&text.join(" ")).await?;
            println!("{}", response.message);
            for (index, rec) in response.recommendations.iter().enumerate() {
                println!("{}", render_card(index, &rec.film, Some(rec.confidence), false));
            }
        }
        Command::Search { query } => {
            let client = connect(&config).await;
            let query = query.join(" ");
            let response = client.search(&query).await?;
            if response.results.is_empty() {
                println!("Tidak ada film yang ditemukan untuk '{}'.", query.trim());
            }
            for (index, film) in response.results.iter().enumerate() {
                println!("{}", render_card(index, film, None, false));
            }
        }
        Command::Popular { limit } => {
            let client = connect(&config).await;
            let response = client.popular(limit).await?;
            for (index, film) in response.results.iter().enumerate() {
                println!("{}", render_card(index, film, None, false));
            }
        }
        Command::Chat { message } => {
            let client = connect(&config).await;
            let reply = client.chat(&message.join(" ")).await?;
            println!("{}", reply.content());
        }
    }
    Ok(())
}

async fn connect(config: &Config) -> ApiClient {
    let mut client = ApiClient::from_config(config);
    client.check_connection().await;
    client
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["filmfinder"]).expect("parse");
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["filmfinder", "serve", "--port", "8080"]).expect("parse");
        assert!(matches!(cli.command, Some(Command::Serve { port: Some(8080), .. })));

        let cli = Cli::try_parse_from(["filmfinder", "ask", "film", "horor", "--api-url", "http://x/api"])
            .expect("parse");
        assert_eq!(cli.api_url.as_deref(), Some("http://x/api"));
        let Some(Command::Ask { text }) = cli.command else {
            panic!("expected ask");
        };
        assert_eq!(text, vec!["film", "horor"]);

        let cli = Cli::try_parse_from(["filmfinder", "popular"]).expect("parse");
        assert!(matches!(cli.command, Some(Command::Popular { limit: 12 })));
        assert!(cli.fallback_url.is_none());

        let cli = Cli::try_parse_from(["filmfinder", "shell", "--fallback-url", "http://y/api"])
            .expect("parse");
        assert_eq!(cli.fallback_url.as_deref(), Some("http://y/api"));
        assert!(matches!(cli.command, Some(Command::Shell)));
    }
}
