//! Prompt Engineering Optimizer
//!
//! Runs the HTTP server by default; `ask` and `chat` talk to a running server.

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::map_err_ignore)]
#![allow(clippy::unused_async)]

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::io::Write;
use std::sync::Arc;

use clap::Parser;
use dotenvy::dotenv;
use futures::StreamExt;
use tokio::io::{AsyncBufReadExt, BufReader};

use prompt_optimizer::client::{ChatView, GenerateClient, GenerateRequest};
use prompt_optimizer::config::{AppConfig, Cli, Command};
use prompt_optimizer::render::{code_blocks, render_terminal};
use prompt_optimizer::{server, telemetry};

/// Typed in the interactive session to end it.
const TERMINATE: &str = "TERMINATE";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present) before clap reads env-backed flags
    let _ = dotenv();

    let cli = Cli::parse();
    let config = match AppConfig::from_cli(&cli) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    telemetry::init(&config.log);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => server::start_server(config).await,
        Command::Ask {
            prompt,
            followup,
            server,
            session,
            extract,
            no_stream,
        } => ask(&server, session, &prompt, followup, extract, no_stream).await,
        Command::Chat { server, session } => chat(&server, session).await,
    }
}

fn client_for(server: &str, session: Option<String>) -> anyhow::Result<GenerateClient> {
    let client = GenerateClient::new(server)?;
    Ok(match session {
        Some(id) => client.with_session(id),
        None => client,
    })
}

/// Print only the code blocks of a reply, or the reply itself if it has none.
fn print_extracted(reply: &str) {
    let blocks = code_blocks(reply);
    if blocks.is_empty() {
        println!("{}", reply.trim_end());
        return;
    }
    for block in blocks {
        print!("{}", block.content);
    }
}

async fn ask(
    server: &str,
    session: Option<String>,
    prompt: &str,
    followup: bool,
    extract: bool,
    no_stream: bool,
) -> anyhow::Result<()> {
    let client = client_for(server, session)?;

    if no_stream {
        let reply = client
            .complete(&GenerateRequest {
                prompt: prompt.to_string(),
                is_followup: followup,
            })
            .await?;
        if extract {
            print_extracted(&reply);
        } else {
            print!("{}", render_terminal(&reply));
        }
        return Ok(());
    }

    let stream = client
        .stream(&GenerateRequest {
            prompt: prompt.to_string(),
            is_followup: followup,
        })
        .await?;
    futures::pin_mut!(stream);

    let mut reply = String::new();
    while let Some(payload) = stream.next().await {
        let payload = payload?;
        if let Some(token) = &payload.token {
            reply.push_str(token);
            if !extract {
                print!("{token}");
                std::io::stdout().flush()?;
            }
        }
        if let Some(error) = &payload.error {
            anyhow::bail!("Generation failed: {error}");
        }
        if payload.is_terminal() {
            break;
        }
    }

    if extract {
        print_extracted(&reply);
    } else {
        println!();
    }
    Ok(())
}

async fn chat(server: &str, session: Option<String>) -> anyhow::Result<()> {
    let client = client_for(server, session)?;
    let mut view = ChatView::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("\n[:] ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim() == TERMINATE {
            println!("Goodbye!");
            break;
        }

        match client
            .run_turn(&mut view, &line, |token| {
                print!("{token}");
                let _ = std::io::stdout().flush();
            })
            .await
        {
            Ok(Some(_)) => println!(),
            Ok(None) => {}
            Err(e) => eprintln!("\nError: {e}"),
        }
    }

    Ok(())
}
