mod config;
mod error;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use catalog::{Embedder, OpenAiEmbedder, Payload, Point, QdrantIndex, VectorIndex};
use chrono::{Local, TimeZone};
use clap::{Parser, Subcommand};
use runtime::{Conversation, OpenAiBackend, ShopToolbox};
use serde::Deserialize;
use storage::{ConversationId, Event, EventKind, EventStore, Role};

use config::Config;
use error::{Error, Result};

const SYSTEM_PROMPT: &str = "You are a helpful shopping assistant. Use the provided tools to \
    search for products, filter them by price, color, or type, and recommend them to the user.";
const CONFIG_FILE: &str = "clerk.toml";

#[derive(Parser)]
#[command(name = "clerk")]
#[command(about = "A tool-calling shopping assistant over a product catalog", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Resume a prior conversation (id prefix match supported)
        #[arg(short, long)]
        resume: Option<String>,
    },
    /// List all conversations
    Conversations {
        /// Show only the last N conversations
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
    /// Show event logs for a conversation
    Logs {
        /// Conversation ID (prefix match supported)
        #[arg(short, long)]
        conversation: String,
        /// Filter by event kind (message, model_call, tool_call, tool_result)
        #[arg(short, long)]
        kind: Option<String>,
    },
    /// Embed and upsert products from a JSON file into the index
    Ingest {
        /// Path to a JSON array of product records
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Chat { resume }) => cmd_chat(resume).await,
        None => cmd_chat(None).await,
        Some(Commands::Conversations { limit }) => cmd_conversations(limit),
        Some(Commands::Logs { conversation, kind }) => cmd_logs(&conversation, kind.as_deref()),
        Some(Commands::Ingest { file }) => cmd_ingest(&file).await,
    }
}

async fn cmd_chat(resume: Option<String>) -> Result<()> {
    println!("clerk v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    let api_key = config.api_key()?;
    let store_base_url = config.store_base_url()?;

    let backend = OpenAiBackend::builder(&api_key, &config.model.name).build();
    let embedder = OpenAiEmbedder::with_model(
        &api_key,
        &config.embedding.model,
        config.embedding.dimension,
    );
    let index = QdrantIndex::new(&config.index.url, &config.index.collection);

    // Dimension mismatch is fatal before any conversation starts.
    catalog::check_dimensions(&embedder, &index).await?;

    let toolbox = ShopToolbox::new(embedder, index, store_base_url);

    let data_dir = dirs_data_dir().unwrap_or_else(|| ".clerk".into());
    std::fs::create_dir_all(&data_dir)?;
    let db_path = data_dir.join("events.db");
    let store = EventStore::open(&db_path)?;

    println!("Conversations stored at: {}", db_path.display());

    let mut conversation = match resume {
        Some(prefix) => {
            let id = find_conversation(&store, &prefix)?;
            Conversation::resume(store, backend, toolbox, id)?.with_system(SYSTEM_PROMPT)
        }
        None => Conversation::new(store, backend, toolbox)?.with_system(SYSTEM_PROMPT),
    };
    println!("Conversation ID: {}", conversation.id);
    println!("Model: {}", config.model.name);
    println!("Type 'quit' or Ctrl+D to exit.\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            // EOF
            break;
        }

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "quit" || input == "exit" {
            break;
        }

        match conversation.send(input).await {
            Ok(answer) => {
                println!("\n{answer}");
                println!("[model calls so far: {}]\n", conversation.call_count());
            }
            Err(e) => {
                eprintln!("Error: {e}\n");
            }
        }
    }

    conversation.end()?;
    println!("\nConversation ended.");
    Ok(())
}

fn cmd_conversations(limit: usize) -> Result<()> {
    let store = open_store()?;
    let conversations = store.list_conversations()?;

    if conversations.is_empty() {
        println!("No conversations found.");
        return Ok(());
    }

    println!(
        "{:<36}  {:<20}  {:<8}  STATUS",
        "CONVERSATION ID", "STARTED", "MSGS"
    );
    println!("{}", "-".repeat(80));

    for summary in conversations.into_iter().take(limit) {
        let started = Local
            .from_utc_datetime(&summary.started_at.naive_utc())
            .format("%Y-%m-%d %H:%M");
        let status = if summary.ended_at.is_some() {
            "ended"
        } else {
            "active"
        };
        println!(
            "{:<36}  {:<20}  {:<8}  {status}",
            summary.id, started, summary.message_count
        );
    }

    Ok(())
}

fn cmd_logs(conversation_prefix: &str, kind_filter: Option<&str>) -> Result<()> {
    let store = open_store()?;
    let conversation_id = find_conversation(&store, conversation_prefix)?;
    let events = store.load_events(conversation_id, kind_filter)?;

    if events.is_empty() {
        println!("No events found for conversation {conversation_id}");
        return Ok(());
    }

    println!("Conversation: {conversation_id}\n");

    for event in events {
        print_event(&event);
    }

    Ok(())
}

/// A product record as it appears in the ingest file.
#[derive(Debug, Deserialize)]
struct IngestProduct {
    id: u64,
    title: String,
    #[serde(default)]
    vendor: String,
    #[serde(default)]
    tags: String,
    handle: String,
    #[serde(default)]
    product_type: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    price: String,
}

async fn cmd_ingest(file: &std::path::Path) -> Result<()> {
    let config = load_config()?;
    let api_key = config.api_key()?;

    let embedder = OpenAiEmbedder::with_model(
        &api_key,
        &config.embedding.model,
        config.embedding.dimension,
    );
    let index = QdrantIndex::new(&config.index.url, &config.index.collection);
    index.ensure_collection(embedder.dimension()).await?;
    catalog::check_dimensions(&embedder, &index).await?;

    let content = std::fs::read_to_string(file)?;
    let products: Vec<IngestProduct> = serde_json::from_str(&content)?;
    println!("Found {} products in {}", products.len(), file.display());

    for product in products {
        let payload = Payload {
            title: product.title,
            vendor: product.vendor,
            price: product.price,
            handle: product.handle,
            tags: product.tags,
            product_type: product.product_type,
            description: product.description,
        };

        let vector = embedder.embed(&payload.embedding_text()).await?;
        index
            .upsert(vec![Point {
                id: product.id,
                vector,
                payload,
            }])
            .await?;

        println!("Upserted product {}", product.id);
    }

    println!("Ingest completed.");
    Ok(())
}

fn print_event(event: &Event) {
    let time = Local
        .from_utc_datetime(&event.timestamp.naive_utc())
        .format("%H:%M:%S");

    match &event.kind {
        EventKind::ConversationStart => {
            println!("[{time}] === Conversation started ===");
        }
        EventKind::ConversationEnd => {
            println!("[{time}] === Conversation ended ===");
        }
        EventKind::Message { role, content } => {
            let role_str = match role {
                Role::User => "USER",
                Role::Assistant => "ASSISTANT",
                Role::System => "SYSTEM",
            };
            println!("[{time}] {role_str}: {}", truncate_display(content, 200));
        }
        EventKind::ModelCall {
            input_tokens,
            output_tokens,
        } => {
            println!("[{time}] MODEL CALL: in={input_tokens} out={output_tokens}");
        }
        EventKind::ToolCall { id, name, input } => {
            println!("[{time}] TOOL CALL [{id}]: {name} {input}");
        }
        EventKind::ToolResult { id, name, output } => {
            println!("[{time}] TOOL RESULT [{id}]: {name} {output}");
        }
    }
}

/// Truncate long messages for display. The cut is backed off to a
/// char boundary so multibyte content never splits mid-character.
fn truncate_display(content: &str, max_bytes: usize) -> String {
    if content.len() <= max_bytes {
        return content.to_string();
    }
    let mut end = max_bytes;
    while !content.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &content[..end])
}

fn find_conversation(store: &EventStore, prefix: &str) -> Result<ConversationId> {
    let conversations = store.list_conversations()?;
    let matching: Vec<_> = conversations
        .iter()
        .filter(|c| c.id.to_string().starts_with(prefix))
        .collect();

    match matching.len() {
        0 => Err(Error::ConversationNotFound {
            prefix: prefix.to_string(),
        }),
        1 => Ok(matching[0].id),
        _ => Err(Error::AmbiguousConversation {
            prefix: prefix.to_string(),
            matches: matching.iter().map(|c| c.id.to_string()).collect(),
        }),
    }
}

fn open_store() -> Result<EventStore> {
    let data_dir = dirs_data_dir().unwrap_or_else(|| ".clerk".into());
    let db_path = data_dir.join("events.db");

    if !db_path.exists() {
        return Err(Error::DatabaseNotFound { path: db_path });
    }

    Ok(EventStore::open(&db_path)?)
}

fn dirs_data_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local/share/clerk"))
    }
    #[cfg(target_os = "linux")]
    {
        std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local/share")))
            .map(|p| p.join("clerk"))
    }
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|h| PathBuf::from(h).join("clerk"))
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        None
    }
}

fn load_config() -> Result<Config> {
    let config_path = PathBuf::from(CONFIG_FILE);

    if config_path.exists() {
        Ok(Config::load(&config_path)?)
    } else {
        Ok(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_display_leaves_short_content_alone() {
        assert_eq!(truncate_display("hello", 200), "hello");
    }

    #[test]
    fn truncate_display_backs_off_to_char_boundary() {
        // 101 two-byte chars: 202 bytes, and byte 200 falls inside the
        // last character.
        let content = "é".repeat(101);
        let truncated = truncate_display(&content, 200);
        assert_eq!(truncated, format!("{}...", "é".repeat(100)));
    }

    #[test]
    fn truncate_display_handles_wide_characters() {
        let content = "™".repeat(80);
        let truncated = truncate_display(&content, 200);
        assert!(truncated.ends_with("..."));
        assert!(truncated.len() <= 203);
    }
}
