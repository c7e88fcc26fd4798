//! notionsync CLI - Publish markdown notes to a Notion database.
//!
//! This tool syncs single documents or whole folders of a vault, lists the
//! databases shared with the integration and manages the settings file.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use notionsync_common::{ApiToken, DocumentPath};
use notionsync_notion::{HttpNotionClient, NotionApi};
use notionsync_storage::LocalStore;
use notionsync_sync::{
    Clipboard, CommandClipboard, FolderSync, NoClipboard, Notice, Notifier, Settings,
    SyncConfig, SyncEngine, TracingNotifier,
};

#[derive(Parser)]
#[command(name = "notionsync")]
#[command(about = "notionsync - Publish markdown notes to a Notion database")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file (default: <config dir>/notionsync/settings.json).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Vault directory holding the markdown documents.
    #[arg(long, global = true, default_value = ".")]
    vault: PathBuf,

    /// Do not copy page links to the clipboard.
    #[arg(long, global = true)]
    no_clipboard: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync one document.
    Sync {
        /// Document path, relative to the vault or inside it.
        file: String,

        /// Open the page in the browser afterwards.
        #[arg(long)]
        open: bool,
    },

    /// Sync every document below a folder of the vault.
    SyncFolder {
        /// Folder within the vault (default: the whole vault).
        prefix: Option<String>,

        /// Stop after this many documents; 0 syncs all.
        #[arg(short, long, default_value_t = 0)]
        max_files: usize,

        /// Destination database instead of the configured one.
        #[arg(short, long)]
        database: Option<String>,
    },

    /// List the databases shared with the integration.
    Databases,

    /// Query a database with a raw filter body and print the response.
    Query {
        /// JSON request body, e.g. '{"page_size": 10}'.
        #[arg(short, long, default_value = "{}")]
        filter: String,

        /// Database to query instead of the configured one.
        #[arg(short, long)]
        database: Option<String>,
    },

    /// Show or change settings.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Print shell completions.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the settings, token masked.
    Show,

    /// Change one setting.
    Set {
        /// One of notionAPI, databaseID, bannerUrl, notionID, allowTags, requestIntervalMs.
        key: String,

        /// New value. Omit for notionAPI to enter the token without echo.
        value: Option<String>,
    },

    /// Print the settings file location.
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let settings_path = match &cli.config {
        Some(path) => path.clone(),
        None => Settings::default_path().context("Could not determine the config directory")?,
    };

    match &cli.command {
        Commands::Sync { file, open } => cmd_sync(&cli, &settings_path, file, *open).await,

        Commands::SyncFolder {
            prefix,
            max_files,
            database,
        } => {
            let prefix = prefix.as_deref().unwrap_or("");
            cmd_sync_folder(&cli, &settings_path, prefix, *max_files, database.as_deref()).await
        }

        Commands::Databases => cmd_databases(&settings_path).await,

        Commands::Query { filter, database } => {
            cmd_query(&settings_path, filter, database.as_deref()).await
        }

        Commands::Config { action } => cmd_config(&settings_path, action).await,

        Commands::Completions { shell } => {
            clap_complete::generate(
                *shell,
                &mut Cli::command(),
                "notionsync",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    }
}

/// Load settings and freeze them for a sync run. `database` overrides the
/// configured destination and stands in for a missing one.
async fn load_sync_config(settings_path: &Path, database: Option<&str>) -> Result<SyncConfig> {
    let mut settings = Settings::load(settings_path)
        .await
        .context("Failed to load settings")?;
    if let Some(database) = database {
        settings.database_id = database.to_string();
    }

    SyncConfig::from_settings(&settings).map_err(|e| {
        TracingNotifier.notify(Notice::SettingsMissing);
        anyhow::Error::new(e)
    })
}

/// Token only, for commands that do not need a destination.
async fn load_token(settings_path: &Path) -> Result<(Settings, ApiToken)> {
    let settings = Settings::load(settings_path)
        .await
        .context("Failed to load settings")?;

    if settings.notion_api.trim().is_empty() {
        TracingNotifier.notify(Notice::SettingsMissing);
        anyhow::bail!("notionAPI is not set; run `notionsync config set notionAPI`");
    }
    let token = ApiToken::new(settings.notion_api.trim());
    Ok((settings, token))
}

fn http_client(config: &SyncConfig) -> Result<Arc<dyn NotionApi>> {
    let client = HttpNotionClient::new(config.token.clone()).context("Failed to create API client")?;
    Ok(Arc::new(client))
}

fn build_engine(cli: &Cli, config: SyncConfig, api: Arc<dyn NotionApi>) -> Result<SyncEngine> {
    let store = LocalStore::new(&cli.vault).context("Failed to open vault")?;
    let clipboard: Arc<dyn Clipboard> = if cli.no_clipboard {
        Arc::new(NoClipboard)
    } else {
        Arc::new(CommandClipboard::system())
    };

    Ok(SyncEngine::new(config, api, Arc::new(store)).with_clipboard(clipboard))
}

/// Resolve `file` to a vault path. Accepts paths inside the vault as seen
/// from the working directory, or vault-relative paths.
fn document_path(vault: &Path, file: &str) -> Result<DocumentPath> {
    if let (Ok(root), Ok(full)) = (vault.canonicalize(), Path::new(file).canonicalize()) {
        if let Ok(relative) = full.strip_prefix(&root) {
            return DocumentPath::parse(&relative.to_string_lossy())
                .context("Invalid document path");
        }
    }
    DocumentPath::parse(file).context("Invalid document path")
}

/// Sync one document.
async fn cmd_sync(cli: &Cli, settings_path: &Path, file: &str, open_page: bool) -> Result<()> {
    let config = load_sync_config(settings_path, None).await?;
    let api = http_client(&config)?;
    let engine = build_engine(cli, config, api)?;
    let path = document_path(&cli.vault, file)?;

    info!("Syncing {}", path);
    let report = engine
        .sync_file(&path)
        .await
        .with_context(|| format!("Failed to sync {}", path))?;

    println!("Synced {}", report.path);
    println!("  Page: {}", report.page_id);
    println!("  Link: {}", report.url);
    if let Some(old) = &report.replaced {
        println!("  Replaced: {}", old);
    }
    if report.appended_chunks > 0 {
        println!("  Appended in {} extra requests", report.appended_chunks);
    }

    if open_page {
        open::that(&report.url).context("Failed to open the page in a browser")?;
    }

    Ok(())
}

/// Sync a folder.
async fn cmd_sync_folder(
    cli: &Cli,
    settings_path: &Path,
    prefix: &str,
    max_files: usize,
    database: Option<&str>,
) -> Result<()> {
    let config = load_sync_config(settings_path, database).await?;
    let api = http_client(&config)?;
    run_sync_folder(cli, config, api, prefix, max_files).await
}

async fn run_sync_folder(
    cli: &Cli,
    config: SyncConfig,
    api: Arc<dyn NotionApi>,
    prefix: &str,
    max_files: usize,
) -> Result<()> {
    let prefix = DocumentPath::parse(prefix).context("Invalid folder path")?;

    // A wrong destination would fail every document; check it once up front.
    let database = api
        .get_database(&config.database_id)
        .await
        .with_context(|| format!("Database {} is not accessible", config.database_id))?;
    info!("Target database: {} ({})", database.title, database.id);

    let engine = build_engine(cli, config, api)?;
    let batch = engine
        .sync_folder(FolderSync { prefix, max_files })
        .await
        .context("Failed to sync folder")?;

    println!(
        "Synced {} of {} documents to {} ({})",
        batch.synced.len(),
        batch.attempted(),
        database.title,
        database.id
    );
    for record in &batch.errors {
        println!("  [FAIL] {} - {}", record.path, record.reason);
    }
    if let Some(report) = &batch.report {
        println!("Error report written to {}", report);
    }

    if !batch.errors.is_empty() {
        anyhow::bail!("{} documents failed to sync", batch.errors.len());
    }
    Ok(())
}

/// List databases.
async fn cmd_databases(settings_path: &Path) -> Result<()> {
    let (settings, token) = load_token(settings_path).await?;
    let client = HttpNotionClient::new(token).context("Failed to create API client")?;

    let databases = client
        .search_databases()
        .await
        .context("Failed to list databases")?;

    if databases.is_empty() {
        println!("No databases are shared with this integration.");
    } else {
        for db in databases {
            let marker = if db.id == settings.database_id { "*" } else { " " };
            let title = if db.title.is_empty() { "(untitled)" } else { db.title.as_str() };
            println!("{} {}  {}", marker, db.id, title);
        }
    }

    Ok(())
}

/// Query a database.
async fn cmd_query(settings_path: &Path, filter: &str, database: Option<&str>) -> Result<()> {
    let (settings, token) = load_token(settings_path).await?;
    let database = match database {
        Some(id) => id.to_string(),
        None if !settings.database_id.trim().is_empty() => settings.database_id.trim().to_string(),
        None => {
            TracingNotifier.notify(Notice::SettingsMissing);
            anyhow::bail!("No database given and databaseID is not set");
        }
    };

    let body: serde_json::Value =
        serde_json::from_str(filter).context("Filter is not valid JSON")?;
    let client = HttpNotionClient::new(token).context("Failed to create API client")?;

    let response = client
        .query_database(&database, body)
        .await
        .context("Failed to query database")?;
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}

/// Settings management.
async fn cmd_config(settings_path: &Path, action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let settings = Settings::load(settings_path)
                .await
                .context("Failed to load settings")?;
            println!("{}", serde_json::to_string_pretty(&settings.redacted())?);
        }
        ConfigAction::Set { key, value } => {
            let value = match (key.as_str(), value) {
                (_, Some(value)) => value.clone(),
                ("notionAPI", None) => rpassword::prompt_password("Notion API token: ")
                    .context("Failed to read token")?,
                (_, None) => anyhow::bail!("A value is required for {}", key),
            };

            let mut settings = Settings::load(settings_path)
                .await
                .context("Failed to load settings")?;
            settings.set(key, &value)?;
            settings
                .save(settings_path)
                .await
                .context("Failed to save settings")?;
            println!("Updated {}", key);
        }
        ConfigAction::Path => println!("{}", settings_path.display()),
    }
    Ok(())
}
