//! Live poll client.

use std::io::BufRead;

use clap::Parser;
use livepoll::cli::{Cli, Commands};
use livepoll::config::Config;
use livepoll::session::{self, UserCommand};
use livepoll::terminal::{self, TerminalPresenter};
use livepoll::{editor, SessionRole};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Join { poll_id } => run_interactive(&config, &poll_id, SessionRole::Voter).await?,
        Commands::Admin { poll_id } => run_interactive(&config, &poll_id, SessionRole::Admin).await?,
        Commands::Save { path } => {
            let draft = editor::load_draft(&path).await?;
            let client = reqwest::Client::new();
            let poll_id = editor::save_poll(&client, &config, draft).await?;
            println!("Poll saved.");
            println!("Poll id: {}", poll_id);
            println!("Voters join with: livepoll join {}", poll_id);
        }
    }
    Ok(())
}

async fn run_interactive(config: &Config, poll_id: &str, role: SessionRole) -> anyhow::Result<()> {
    let (input_tx, input_rx) = mpsc::channel(16);

    // Plain thread: tokio::io::stdin blocks runtime shutdown.
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            match terminal::parse_command(&line) {
                Ok(Some(command)) => {
                    let quit = command == UserCommand::Quit;
                    if input_tx.blocking_send(command).is_err() || quit {
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => eprintln!("! {}", e),
            }
        }
    });

    let presenter = TerminalPresenter::new(std::io::stdout(), role);
    session::run_session(config, poll_id, role, presenter, input_rx).await?;
    Ok(())
}
