//! Reflection CLI
//!
//! Command-line interface for migrations, one-shot messages and
//! interactive chat sessions.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use console::style;
use dialoguer::{theme::ColorfulTheme, Input};
use reflection::agent::{resolve_system_prompt, ChatRequest, ConversationManager, GeminiClient};
use reflection::config::{
    config_path, save_config, validate_config, Config, GeminiConfig, StorageBackendType,
};
use reflection::core::{HistoryStore, SemanticCacheStore, TurnKind};
use reflection::database::{
    init_pool, init_pool_for_migrations, migrations, InMemoryStore, PgHistoryStore,
    PgSemanticCache,
};
use reflection::{Error, Result, VERSION};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "reflection",
    author = "Reflection Contributors",
    version = VERSION,
    about = "Reflection - Gemini chat assistant with persistent history",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the history and cache tables
    Migrate,

    /// Send one message and print the reply
    Send {
        /// Session identifier
        #[arg(short, long)]
        session: String,
        /// Text sent to the model
        #[arg(short, long)]
        message: String,
        /// Customer's original text (defaults to the message)
        #[arg(long)]
        original: Option<String>,
        /// Record a cache entry for this exchange
        #[arg(long)]
        cache: bool,
        /// Request embedding as comma-separated floats
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        embedding: Vec<f32>,
    },

    /// Interactive chat in one session
    Chat {
        /// Session identifier
        #[arg(short, long, default_value = "cli")]
        session: String,
    },

    /// Print the stored turns of a session
    History {
        /// Session identifier
        #[arg(short, long)]
        session: String,
        /// Print raw JSON documents
        #[arg(long)]
        json: bool,
    },

    /// Validate configuration and check the store
    Status,

    /// Write a default configuration file
    InitConfig {
        /// Target path (defaults to the standard config location)
        #[arg(long)]
        path: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::InitConfig { path, force } => init_config(path, force),
        Commands::Migrate => run_migrations(&setup()?).await,
        Commands::Send {
            session,
            message,
            original,
            cache,
            embedding,
        } => {
            let mut request = ChatRequest::new(session, message).with_cache(cache, embedding);
            if let Some(original) = original {
                request = request.with_original(original);
            }
            send_once(&setup()?, &request).await
        }
        Commands::Chat { session } => interactive_chat(&setup()?, &session).await,
        Commands::History { session, json } => print_history(&setup()?, &session, json).await,
        Commands::Status => check_status(&setup()?).await,
    }
}

/// Load configuration and start logging; `init-config` skips this so a
/// broken file can still be replaced
fn setup() -> Result<Config> {
    let config = Config::from_env()?;
    init_tracing(&config);
    Ok(config)
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.log.format == "json" {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn theme() -> ColorfulTheme {
    ColorfulTheme::default()
}

// ============================================================================
// Wiring
// ============================================================================

/// Stores selected by configuration
struct Stores {
    history: Arc<dyn HistoryStore>,
    cache: Arc<dyn SemanticCacheStore>,
}

async fn open_stores(config: &Config) -> Result<Stores> {
    let collections = &config.storage.collections;

    match config.storage.backend {
        StorageBackendType::Postgres => {
            let postgres = config
                .storage
                .postgres
                .as_ref()
                .ok_or_else(|| Error::Config("PostgreSQL not configured. Set DATABASE_URL.".into()))?;
            let pool = init_pool(postgres).await?;

            Ok(Stores {
                history: Arc::new(PgHistoryStore::new(pool.clone(), &collections.chat_history)?),
                cache: Arc::new(PgSemanticCache::new(pool, &collections.semantic_cache)?),
            })
        }
        StorageBackendType::Memory => {
            warn!("Using in-memory storage; history is discarded on exit");
            let store = Arc::new(InMemoryStore::new());
            Ok(Stores {
                history: store.clone(),
                cache: store,
            })
        }
    }
}

async fn build_manager(config: &Config) -> Result<ConversationManager> {
    let gemini = config
        .provider
        .gemini
        .clone()
        .ok_or_else(|| Error::Config("Gemini not configured. Set GEMINI_API_KEY environment variable.".into()))?;
    let client = Arc::new(GeminiClient::new(gemini)?);

    let stores = open_stores(config).await?;
    let system_prompt = resolve_system_prompt(config.assistant.system_prompt_file.as_deref())?;

    info!(
        model = %client.model(),
        history = stores.history.id(),
        cache = stores.cache.id(),
        "Conversation manager ready"
    );

    Ok(ConversationManager::new(client, stores.history, stores.cache).with_system_prompt(system_prompt))
}

// ============================================================================
// Commands
// ============================================================================

/// Run database migrations
async fn run_migrations(config: &Config) -> Result<()> {
    println!("Running database migrations...\n");

    let postgres = config
        .storage
        .postgres
        .as_ref()
        .ok_or_else(|| Error::Config("PostgreSQL not configured for migrations".into()))?;
    // Skip the pgvector check; migrations create the extension
    let pool = init_pool_for_migrations(postgres).await?;

    migrations::run(&pool, &config.storage.collections).await?;

    println!("{} Migrations completed", style("✓").green());
    Ok(())
}

async fn send_once(config: &Config, request: &ChatRequest) -> Result<()> {
    let manager = build_manager(config).await?;
    let reply = manager.send(request).await?;
    println!("{}", reply);
    Ok(())
}

async fn interactive_chat(config: &Config, session: &str) -> Result<()> {
    let manager = build_manager(config).await?;

    println!();
    println!("{}", style("╔══════════════════════════════════════════════════╗").cyan());
    println!("{}", style("║              🌸 Reflection Chat                  ║").cyan());
    println!("{}", style("╚══════════════════════════════════════════════════╝").cyan());
    println!();
    println!("   {} Session: {}", style("✓").green(), style(session).cyan());
    println!("   {}  - Exit chat", style("/quit").yellow());
    println!("   {}  - Show stored turns", style("/history").yellow());
    println!();

    loop {
        let user_input: String = Input::with_theme(&theme())
            .with_prompt(style("You").green().bold().to_string())
            .allow_empty(true)
            .interact_text()
            .map_err(|e| Error::Config(format!("Input error: {}", e)))?;

        let input = user_input.trim();
        if input.is_empty() {
            continue;
        }

        match input.to_lowercase().as_str() {
            "/quit" | "/exit" | "/q" => {
                println!("\n{} Goodbye!\n", style("👋").bold());
                break;
            }
            "/history" | "/h" => {
                for turn in manager.history(session).await? {
                    print_turn(turn.kind(), turn.content());
                }
                continue;
            }
            _ => {}
        }

        match manager.send(&ChatRequest::new(session, input)).await {
            Ok(reply) => print_turn(TurnKind::Ai, &reply),
            Err(e) => {
                println!("{} {}", style("Error:").red().bold(), e);
                if e.is_retryable() {
                    println!("{}", style("   The request can be retried.").dim());
                }
            }
        }
    }

    Ok(())
}

fn print_turn(kind: TurnKind, content: &str) {
    match kind {
        TurnKind::Human => println!("{} {}", style("You:").green().bold(), content),
        TurnKind::Ai => println!("{} {}\n", style("Assistant:").magenta().bold(), content),
    }
}

async fn print_history(config: &Config, session: &str, json: bool) -> Result<()> {
    let stores = open_stores(config).await?;
    let turns = stores.history.find_by_session(session).await?;

    if turns.is_empty() {
        println!("No turns stored for session {}", style(session).cyan());
        return Ok(());
    }

    for turn in &turns {
        if json {
            println!("{}", serde_json::to_string_pretty(turn)?);
        } else {
            print_turn(turn.kind(), turn.content());
        }
    }

    Ok(())
}

/// Check configuration and store connectivity
async fn check_status(config: &Config) -> Result<()> {
    println!("🔍 Reflection Status\n");

    let validation = validate_config(config);
    if validation.valid {
        println!("Configuration: ✅ Valid");
    } else {
        println!("Configuration: ❌ Invalid");
    }
    for issue in &validation.errors {
        println!("  {} {}", style("error").red(), issue);
    }
    for issue in &validation.warnings {
        println!("  {} {}", style("warn").yellow(), issue);
    }

    let model = config
        .provider
        .gemini
        .as_ref()
        .map(|g| g.model.as_str())
        .unwrap_or("not configured");
    println!("  Model: {}", model);
    println!("  Storage: {}", config.storage.backend);

    if config.storage.backend == StorageBackendType::Postgres {
        match open_stores(config).await {
            Ok(_) => println!("PostgreSQL: ✅ Connected"),
            Err(e) => println!("PostgreSQL: ❌ {}", e),
        }
    }

    Ok(())
}

fn init_config(path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = path.unwrap_or_else(config_path);
    if path.exists() && !force {
        return Err(Error::Config(format!(
            "{} already exists. Use --force to overwrite.",
            path.display()
        )));
    }

    let mut config = Config::default();
    config.provider.gemini = Some(GeminiConfig::new(String::new()));
    save_config(&config, &path)?;

    println!("{} Wrote {}", style("✓").green(), path.display());
    println!("   Set GEMINI_API_KEY (and DATABASE_URL for PostgreSQL) in the environment or .env");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reflection::config::load_config_from_path;

    #[test]
    fn test_init_config_replaces_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ provider: [oops").unwrap();
        assert!(load_config_from_path(&path).is_err());

        init_config(Some(path.clone()), true).unwrap();

        let config = load_config_from_path(&path).unwrap();
        assert!(config.provider.gemini.is_some());
    }

    #[test]
    fn test_init_config_keeps_existing_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ provider: [oops").unwrap();

        assert!(init_config(Some(path.clone()), false).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ provider: [oops");
    }
}
