use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::io::AsyncBufReadExt;

mod application;
mod domain;
mod infrastructure;

use application::errors::BotError;
use application::messaging::{CommandRegistry, Dispatcher};
use domain::entities::Inbound;
use infrastructure::adapters::console::ConsoleAdapter;
use infrastructure::adapters::telegram::{self, TelegramAdapter};
use infrastructure::config::Config;
use infrastructure::ns::NsClient;

#[derive(Parser)]
#[command(name = "treinbot")]
#[command(about = "Telegram bot for Dutch railway travel information", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Bot token (overrides config)
    #[arg(short, long)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => {
            run_bot(cli.config, cli.token);
        }
        Commands::Version => {
            println!("treinbot v{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::InitConfig => {
            init_config();
        }
    }
}

fn run_bot(config_path: String, token_override: Option<String>) {
    // Load config
    let config = if std::path::Path::new(&config_path).exists() {
        Config::load(&config_path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config: {}, using defaults", e);
            Config::load_env()
        })
    } else {
        Config::load_env()
    };

    tracing::info!("Starting {}", config.bot.name);

    let ns = Arc::new(NsClient::new(&config.services.ns));

    let mut registry = CommandRegistry::new();
    if let Err(e) = register_commands(&mut registry, ns, config.bot.default_station.clone()) {
        tracing::error!("Failed to build command table: {}", e);
        std::process::exit(1);
    }
    tracing::info!("Registered {} commands", registry.len());

    let rt = tokio::runtime::Runtime::new().unwrap();

    if let Some(token) = token_override.or_else(|| config.telegram_token()) {
        let poll_timeout = config.poll_timeout_secs();
        rt.block_on(async {
            let mut channel = TelegramAdapter::new(token);
            if let Err(e) = channel.fetch_bot_info().await {
                tracing::error!("Failed to fetch bot info: {}", e);
                return;
            }
            let channel = Arc::new(channel);
            let dispatcher = Arc::new(Dispatcher::new(registry, channel.clone()));
            run_telegram(channel, dispatcher, poll_timeout).await;
        });
    } else {
        // Run console bot (dev mode)
        rt.block_on(async {
            let channel = Arc::new(ConsoleAdapter::new());
            let dispatcher = Arc::new(Dispatcher::new(registry, channel));
            run_console(dispatcher).await;
        });
    }
}

async fn run_telegram(
    channel: Arc<TelegramAdapter>,
    dispatcher: Arc<Dispatcher>,
    poll_timeout: i64,
) {
    let info = channel.bot_info();
    tracing::info!("Bot started: @{}", info.username);

    let mut offset: i64 = 0;

    loop {
        match channel.get_updates(offset, poll_timeout).await {
            Ok(updates) => {
                if updates.is_empty() {
                    continue;
                }
                offset = TelegramAdapter::get_next_offset(&updates).max(offset);

                for update in &updates {
                    if let Some(msg) = telegram::inbound_from_update(update) {
                        // One task per message; replies of concurrent
                        // dispatches may interleave.
                        let dispatcher = dispatcher.clone();
                        tokio::spawn(async move {
                            dispatcher.dispatch(msg).await;
                        });
                    }
                }
            }
            Err(e) => {
                tracing::error!("Failed to fetch updates: {}", e);
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
        }
    }
}

async fn run_console(dispatcher: Arc<Dispatcher>) {
    tracing::info!("Console mode, type a command (try /help), 'exit' to quit");

    let stdin = tokio::io::stdin();
    let mut lines = tokio::io::BufReader::new(stdin).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }

        let msg = Inbound::new("console", line).with_platform("console");
        dispatcher.dispatch(msg).await;
    }
}

/// Build the command table.
///
/// Registration order is the match priority: the two-station journey pattern
/// must come before the single-station and bare /trein patterns.
fn register_commands(
    registry: &mut CommandRegistry,
    ns: Arc<NsClient>,
    default_station: String,
) -> Result<(), BotError> {
    registry.register("/start", |_msg, _args| async {
        Ok(vec![
            "Hoi! Stuur /help voor een overzicht van wat ik kan.".to_string(),
        ])
    })?;

    registry.register("/help", |_msg, _args| async {
        Ok(vec![[
            "Ik versta de volgende commando's:",
            "/trein - storingen rond het standaard station",
            "/trein <station> - storingen rond een station",
            "/trein <van> <naar> - reisadvies tussen twee stations",
        ]
        .join("\n")])
    })?;

    let client = ns.clone();
    registry.register(r"/trein (\w*) (\w*)", move |_msg, args| {
        let client = client.clone();
        async move {
            let from = args.first().cloned().unwrap_or_default();
            let to = args.get(1).cloned().unwrap_or_default();
            let mut replies = client.reisadvies(&from, &to).await?;
            if replies.is_empty() {
                replies.push(format!("Geen reisadvies gevonden van {} naar {}.", from, to));
            }
            Ok(replies)
        }
    })?;

    let client = ns.clone();
    registry.register(r"/trein (\w*)", move |_msg, args| {
        let client = client.clone();
        async move {
            let station = args.into_iter().next().unwrap_or_default();
            let mut replies = client.storingen(&station).await?;
            if replies.is_empty() {
                replies.push(format!("Geen storingen bekend rond {}.", station));
            }
            Ok(replies)
        }
    })?;

    let client = ns;
    registry.register("/trein", move |_msg, _args| {
        let client = client.clone();
        let station = default_station.clone();
        async move {
            let mut replies = client.storingen(&station).await?;
            if replies.is_empty() {
                replies.push(format!("Geen storingen bekend rond {}.", station));
            }
            Ok(replies)
        }
    })?;

    Ok(())
}

fn init_config() {
    let config = Config::default();
    let yaml = serde_yaml::to_string(&config).unwrap();
    println!("{}", yaml);
    println!("\nSave this to config.yaml and adjust as needed.");
}
