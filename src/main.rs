mod commands;
mod dispatcher;
mod engine;
mod replies;

use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::sync::Arc;
use tally_channels::telegram::TelegramChannel;
use tally_core::{config, traits::Channel};
use tally_store::SqliteStore;

#[derive(Parser)]
#[command(name = "tally", version, about = "Tally — chat-driven task tracker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot.
    Start,
    /// Check store health and counts.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Start => {
            let cfg = config::load(&cli.config)?;

            // Build channels.
            let mut channels: HashMap<String, Arc<dyn Channel>> = HashMap::new();

            if let Some(ref tg) = cfg.channel.telegram {
                if tg.enabled {
                    if tg.bot_token.is_empty() {
                        anyhow::bail!(
                            "Telegram is enabled but bot_token is empty. \
                             Set it in config.toml."
                        );
                    }
                    let channel = TelegramChannel::new(tg.clone());
                    channels.insert("telegram".to_string(), Arc::new(channel));
                }
            }

            if channels.is_empty() {
                anyhow::bail!("No channels enabled. Enable at least one channel in config.toml.");
            }

            // Build the store.
            let store = Arc::new(SqliteStore::new(&cfg.store).await?);

            // Build and run the dispatcher.
            println!("Tally — starting bot...");
            let dispatcher = Arc::new(dispatcher::Dispatcher::new(
                channels,
                store.clone(),
                store,
            ));
            dispatcher.run().await?;
        }
        Commands::Status => {
            let cfg = config::load(&cli.config)?;
            let store = SqliteStore::new(&cfg.store).await?;
            println!("store: ok ({})", config::shellexpand(&cfg.store.db_path));
            println!("users: {}", store.count_users().await?);
            println!("open tasks: {}", store.count_open_tasks().await?);
        }
    }

    Ok(())
}
