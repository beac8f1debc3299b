//! palaver - terminal host for the chat widget engine

mod config;
mod presenter;

use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use palaver_api::{ChatRole, ChatsClient, ClientConfig};
use palaver_engine::{ChatEngine, ChatLabels, EngineConfig};

use config::Config;
use presenter::TermPresenter;

/// palaver - talk to a chat backend from the terminal
#[derive(Parser, Debug)]
#[command(name = "palaver")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// API root, e.g. https://example.com/api/v1
    #[arg(long)]
    api_root: Option<String>,

    /// Chatbot identifier
    #[arg(long)]
    chatbot_id: Option<String>,

    /// Per-session nonce header value
    #[arg(long)]
    nonce: Option<String>,

    /// Reply delivery (direct, push)
    #[arg(long)]
    streaming_type: Option<String>,

    /// Push-hub endpoint
    #[arg(long)]
    hub_host: Option<String>,

    /// Alternate execution host for streaming turns
    #[arg(long)]
    node_host: Option<String>,

    /// Skip the welcome message
    #[arg(long)]
    no_greeting: bool,

    /// Send one message as a plain request/response turn and exit
    #[arg(long)]
    ask: Option<String>,

    /// List stored conversations
    #[arg(long)]
    history: bool,

    /// Print one stored conversation by id
    #[arg(long)]
    show: Option<u64>,

    /// History page
    #[arg(long, default_value_t = 1)]
    page: u32,

    /// History page size
    #[arg(long, default_value_t = 20)]
    per_page: u32,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = if args.verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if args.init_config {
        let path = Config::init().context("failed to create config file")?;
        println!("Config file: {}", path.display());
        return Ok(());
    }

    let config = Config::load();

    // command line beats config file; both were read once and are never
    // revisited
    let client_config = ClientConfig {
        api_root: args
            .api_root
            .or_else(|| config.api_root.clone())
            .unwrap_or_default(),
        chatbot_id: args
            .chatbot_id
            .or_else(|| config.chatbot_id.clone())
            .unwrap_or_default(),
        session_nonce: args.nonce.or_else(|| config.session_nonce.clone()),
        streaming_type: args
            .streaming_type
            .or_else(|| config.streaming_type.clone()),
        hub_host: args.hub_host.or_else(|| config.hub_host.clone()),
        node_host: args.node_host.or_else(|| config.node_host.clone()),
    };
    let client =
        ChatsClient::new(client_config).context("chat backend is not configured; see --init-config")?;

    if args.history || args.show.is_some() {
        if !config.history_enabled() {
            bail!("history browsing is disabled in the config file");
        }
        if let Some(chat_id) = args.show {
            return show_chat(&client, chat_id).await;
        }
        return list_chats(&client, args.page, args.per_page).await;
    }

    if let Some(message) = &args.ask {
        return ask_once(&client, message, &config.labels).await;
    }

    let presenter = Arc::new(TermPresenter::new());
    let mut engine = ChatEngine::new(
        EngineConfig { labels: config.labels.clone() },
        client.strategy(),
        presenter,
    );

    // ctrl-c revokes liveness; the loop discards whatever its in-flight
    // turn still produces
    let handle = engine.handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.deactivate();
        }
    });

    engine.run(!args.no_greeting).await;
    Ok(())
}

/// One request/response turn, no streaming involved.
async fn ask_once(client: &ChatsClient, message: &str, labels: &ChatLabels) -> anyhow::Result<()> {
    let response = client
        .chat(message, None)
        .await
        .context("failed to send the message")?;
    if response.success {
        match response.chat {
            Some(reply) => println!("{}", reply.message),
            None => println!("{}", labels.error_message),
        }
    } else {
        println!(
            "{}",
            response.message.as_deref().unwrap_or(&labels.error_message)
        );
    }
    Ok(())
}

async fn list_chats(client: &ChatsClient, page: u32, per_page: u32) -> anyhow::Result<()> {
    let response = client
        .list(page, per_page, None)
        .await
        .context("failed to list conversations")?;
    if !response.success {
        bail!("backend refused the listing request");
    }
    if response.chats.is_empty() {
        println!("No stored conversations.");
        return Ok(());
    }
    for chat in &response.chats {
        let created = chat.created_at.with_timezone(&chrono::Local);
        println!(
            "{:>6}  {}  {}",
            chat.id,
            created.format("%Y-%m-%d %H:%M"),
            chat.title.as_deref().unwrap_or("(untitled)"),
        );
    }
    println!(
        "page {} of {} ({} conversations)",
        page, response.pages, response.total
    );
    Ok(())
}

async fn show_chat(client: &ChatsClient, chat_id: u64) -> anyhow::Result<()> {
    let response = client
        .get(chat_id)
        .await
        .with_context(|| format!("failed to fetch conversation {}", chat_id))?;
    let Some(chat) = response.chat else {
        bail!(
            "conversation {} not found{}",
            chat_id,
            response
                .message
                .map(|m| format!(": {}", m))
                .unwrap_or_default()
        );
    };
    println!(
        "# {} ({})",
        chat.chat.title.as_deref().unwrap_or("(untitled)"),
        chat.chat
            .created_at
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M"),
    );
    for message in &chat.messages {
        let speaker = match message.role {
            ChatRole::User => "you",
            ChatRole::Model => "bot",
        };
        println!("{}> {}", speaker, message.content);
    }
    Ok(())
}
