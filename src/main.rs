use std::net::IpAddr;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use serde::Serialize;

use queryvault::client::cache::LocalCache;
use queryvault::client::{Draft, Gateway, Snippet, SnippetGateway, Source};
use queryvault::config::{
    AppPaths, DEFAULT_API_URL, DEFAULT_DB_NAME, DEFAULT_HOST, DEFAULT_PORT, ServerConfig,
};
use queryvault::errors::{QvError, Result};
use queryvault::storage::SnippetStorage;
use queryvault::storage::models::SnippetQuery;
use queryvault::storage::sqlite::SqliteStorage;
use queryvault::{api, logging, tui};

/// Snippets shown by `check`.
const CHECK_LATEST: usize = 3;

#[derive(Parser)]
#[command(name = "qv", version, about = "Store, tag, and search SQL snippets")]
struct Cli {
    /// Output results as JSON
    #[arg(short = 'j', long = "json", global = true)]
    json: bool,

    /// Base URL of the query service API
    #[arg(long, global = true, env = "QV_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the query service
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Address to bind
        #[arg(long, env = "HOST", default_value = DEFAULT_HOST)]
        host: IpAddr,

        /// Database name, stored under the data directory
        #[arg(long, env = "DB_NAME", default_value = DEFAULT_DB_NAME)]
        db_name: String,

        /// Explicit database file, overrides --db-name
        #[arg(long, env = "DB_PATH")]
        db_path: Option<PathBuf>,
    },

    /// Interactive terminal client
    Tui,

    /// List snippets, newest first
    List {
        /// Only snippets whose title or SQL contains this
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Create a snippet
    Add {
        #[arg(short, long)]
        title: String,

        /// The SQL text
        #[arg(short, long)]
        sql: String,

        #[arg(short, long)]
        description: Option<String>,

        /// Tag name, repeatable
        #[arg(long = "tag")]
        tags: Vec<String>,

        #[arg(short, long)]
        author: Option<String>,
    },

    /// List tag names
    Tags,

    /// Ask the service whether it and its store are up
    Status,

    /// Open the store directly and report what is in it
    Check {
        #[arg(long, env = "DB_NAME", default_value = DEFAULT_DB_NAME)]
        db_name: String,

        #[arg(long, env = "DB_PATH")]
        db_path: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct Listed<'a> {
    source: Source,
    snippets: &'a [Snippet],
}

fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(e) = run(cli) {
        if json {
            eprintln!("{}", serde_json::json!({"error": e.to_string()}));
        } else {
            eprintln!("error: {}", e);
        }
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let paths = AppPaths::new();
    let json = cli.json;
    let api_url = cli.api_url;

    match cli.command {
        Some(Commands::Serve {
            port,
            host,
            db_name,
            db_path,
        }) => {
            logging::init_stderr();
            let config = ServerConfig {
                host,
                port,
                db_path: paths.db_path(&db_name, db_path),
            };
            let runtime = tokio::runtime::Runtime::new()
                .map_err(|e| QvError::Server(format!("failed to start runtime: {e}")))?;
            runtime.block_on(api::serve(config))
        }
        Some(Commands::Check { db_name, db_path }) => {
            cmd_check(&paths.db_path(&db_name, db_path), json)
        }
        None => cmd_list(&client(&paths, api_url)?, None, json),
        Some(Commands::List { search }) => {
            cmd_list(&client(&paths, api_url)?, search.as_deref(), json)
        }
        Some(Commands::Add {
            title,
            sql,
            description,
            tags,
            author,
        }) => {
            let draft = Draft::parse(
                &title,
                description.as_deref().unwrap_or(""),
                &sql,
                &tags.join(","),
                author.as_deref().unwrap_or(""),
            )?;
            cmd_add(&client(&paths, api_url)?, draft, json)
        }
        Some(Commands::Tags) => cmd_tags(&client(&paths, api_url)?, json),
        Some(Commands::Status) => cmd_status(&client(&paths, api_url)?, json),
        Some(Commands::Tui) => tui::run(client(&paths, api_url)?),
    }
}

/// Client commands log to a file and talk to the service through the gateway.
fn client(paths: &AppPaths, api_url: String) -> Result<Gateway> {
    logging::init_file(&paths.log_file)?;
    Ok(Gateway::new(api_url, LocalCache::new(paths.cache_file.clone())))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

fn cmd_list(gateway: &Gateway, search: Option<&str>, json: bool) -> Result<()> {
    let (snippets, source) = match search {
        Some(term) => (gateway.try_search(term)?, Source::Service),
        None => {
            let fetched = gateway.load_all()?;
            (fetched.value, fetched.source)
        }
    };

    if json {
        return print_json(&Listed {
            source,
            snippets: &snippets,
        });
    }

    if source == Source::LocalCache {
        eprintln!("service unreachable, showing the local cache");
    }
    if snippets.is_empty() {
        println!("No snippets found.");
        return Ok(());
    }
    for snippet in &snippets {
        print_snippet_row(snippet);
    }
    Ok(())
}

fn cmd_add(gateway: &Gateway, draft: Draft, json: bool) -> Result<()> {
    let created = gateway.create(draft)?;
    if json {
        return print_json(&serde_json::json!({
            "id": created.value.id,
            "source": created.source,
        }));
    }
    match created.source {
        Source::Service => println!("Created snippet #{}.", created.value.id),
        Source::LocalCache => println!(
            "Service unreachable; saved snippet #{} to the local cache.",
            created.value.id
        ),
    }
    Ok(())
}

fn cmd_tags(gateway: &Gateway, json: bool) -> Result<()> {
    let tags = gateway.list_tags()?;
    if json {
        return print_json(&tags);
    }
    if tags.is_empty() {
        println!("No tags.");
    }
    for tag in &tags {
        println!("{tag}");
    }
    Ok(())
}

fn cmd_status(gateway: &Gateway, json: bool) -> Result<()> {
    let health = gateway.health()?;
    if json {
        return print_json(&health);
    }
    println!("{}: {}", health.status, health.message);
    if !health.is_ok() {
        return Err(QvError::Server(health.message));
    }
    Ok(())
}

fn cmd_check(db_path: &std::path::Path, json: bool) -> Result<()> {
    let storage = SqliteStorage::open(db_path)?;
    storage.ping()?;
    let stats = storage.stats()?;
    let latest: Vec<_> = storage
        .list(SnippetQuery::default())?
        .into_iter()
        .take(CHECK_LATEST)
        .collect();

    if json {
        return print_json(&serde_json::json!({
            "db_path": db_path.display().to_string(),
            "stats": stats,
            "latest": latest,
        }));
    }

    println!("Store Check");
    println!("───────────");
    println!("Database:   {}", db_path.display());
    println!("Snippets:   {}", stats.snippets);
    println!("Tags:       {}", stats.tags);
    println!("Links:      {}", stats.links);
    if let Some(oldest) = stats.oldest {
        println!("Oldest:     {}", oldest.format("%Y-%m-%d %H:%M"));
    }
    if let Some(newest) = stats.newest {
        println!("Newest:     {}", newest.format("%Y-%m-%d %H:%M"));
    }
    if !latest.is_empty() {
        println!();
        println!("Latest:");
        for snippet in &latest {
            println!("{:>6}  {}", snippet.id, snippet.title);
        }
    }
    Ok(())
}

fn print_snippet_row(snippet: &Snippet) {
    let author = snippet
        .author
        .as_deref()
        .map(|a| format!(" @{a}"))
        .unwrap_or_default();
    let tags = if snippet.tags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", snippet.tags.join(", "))
    };
    println!(
        "{:>6}  {}  {}{}{}",
        snippet.id,
        snippet.created_at.format("%Y-%m-%d"),
        snippet.title,
        author,
        tags
    );
}
