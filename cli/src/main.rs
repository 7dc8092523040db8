//! Sesame CLI: command-line interface for Sesame RDF servers
//!
//! Uses the sesame library's `Connection` and `RepositoryClient`.

use clap::{Parser, Subcommand};
use comfy_table::{ContentArrangement, Table};
use sesame::{
    AddOptions, ClientConfig, Connection, QueryOptions, RepositoryClient, ResultFormat,
    StatementFilter,
};
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "sesame", version, about = "Sesame RDF server CLI")]
struct Cli {
    /// Server base URL
    #[arg(
        long,
        default_value = "http://localhost:8080/openrdf-sesame",
        global = true,
        env = "SESAME_URL"
    )]
    url: String,

    /// YAML client configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format for listings
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    /// Log every request
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the server protocol version
    Protocol,
    /// List repositories
    Repos,
    /// Evaluate a query
    Query {
        /// Repository id
        repo: String,
        /// Query text
        query: String,
        /// Result format (json, xml, binary, turtle, rdfxml, ...)
        #[arg(long, default_value = "json")]
        result_format: ResultFormat,
        /// Send the query in a POST body
        #[arg(long)]
        post: bool,
        /// Query language
        #[arg(long, default_value = "sparql")]
        lang: String,
        /// Exclude inferred statements
        #[arg(long)]
        no_infer: bool,
        /// External variable binding, name=<N-Triples value>
        #[arg(long = "bind", value_parser = parse_key_value)]
        bindings: Vec<(String, String)>,
    },
    /// Export statements
    Statements {
        repo: String,
        /// Filter field, key=value (subj, pred, obj, context, infer)
        #[arg(long = "filter", value_parser = parse_key_value)]
        filter: Vec<(String, String)>,
        #[arg(long, default_value = "turtle")]
        result_format: ResultFormat,
    },
    /// Add statements from a file
    Add {
        repo: String,
        file: PathBuf,
        #[arg(long, default_value = "turtle")]
        data_format: ResultFormat,
        /// Target context (N-Triples encoded, or `null`)
        #[arg(long)]
        context: Vec<String>,
        #[arg(long)]
        base_uri: Option<String>,
    },
    /// Replace all statements with the contents of a file
    Replace {
        repo: String,
        file: PathBuf,
        #[arg(long, default_value = "n3")]
        data_format: ResultFormat,
    },
    /// Delete statements
    Delete {
        repo: String,
        /// Filter field, key=value (subj, pred, obj, context, infer)
        #[arg(long = "filter", value_parser = parse_key_value)]
        filter: Vec<(String, String)>,
        /// Allow deleting without a subj/pred/obj filter
        #[arg(long)]
        all: bool,
    },
    /// Count statements
    Size { repo: String },
    /// List contexts
    Contexts { repo: String },
    /// List namespaces
    Namespaces { repo: String },
    /// Manage a single namespace
    Namespace {
        repo: String,
        #[command(subcommand)]
        action: NamespaceAction,
    },
}

#[derive(Subcommand)]
enum NamespaceAction {
    /// Look up a prefix
    Get { prefix: String },
    /// Bind a prefix
    Set { prefix: String, namespace: String },
    /// Remove a prefix
    Delete { prefix: String },
    /// Remove every prefix
    Clear,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", s))
}

/// Log filter used when `RUST_LOG` is not set
fn default_log_filter(verbose: bool) -> &'static str {
    if verbose {
        "sesame=debug,sesame_cli=debug"
    } else {
        "warn"
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_log_filter(cli.verbose))),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let config = match &cli.config {
        Some(path) => {
            debug!("Loading client configuration from {}", path.display());
            ClientConfig::from_file(path)?
        }
        None => ClientConfig::default(),
    };
    debug!("Connecting to {} with {:?}", cli.url, config);
    let connection = Connection::connect(&cli.url, &config).await?;

    match cli.command {
        Commands::Protocol => {
            println!("{}", connection.protocol_version().await?);
        }
        Commands::Repos => run_repos(&connection, &cli.format).await?,
        Commands::Query {
            repo,
            query,
            result_format,
            post,
            lang,
            no_infer,
            bindings,
        } => {
            let mut options = QueryOptions::new()
                .result_format(result_format)
                .query_language(lang)
                .infer(!no_infer);
            if post {
                options = options.post();
            }
            for (name, value) in bindings {
                options = options.bind(name, value);
            }
            let repo = open_repository(&connection, &repo).await?;
            write_body(&repo.query(&query, &options).await?)?;
        }
        Commands::Statements {
            repo,
            filter,
            result_format,
        } => {
            let repo = open_repository(&connection, &repo).await?;
            let filter = StatementFilter::from_params(filter);
            write_body(&repo.get_statements(&filter, result_format).await?)?;
        }
        Commands::Add {
            repo,
            file,
            data_format,
            context,
            base_uri,
        } => {
            let data = std::fs::read_to_string(&file)?;
            let mut options = AddOptions::new().data_format(data_format);
            for c in context {
                options = options.context(sesame::Context::parse(&c));
            }
            if let Some(base_uri) = base_uri {
                options = options.base_uri(base_uri);
            }
            let repo = open_repository(&connection, &repo).await?;
            repo.add_statements(&data, &options).await?;
            println!("Added {} to {}", file.display(), repo.id());
        }
        Commands::Replace {
            repo,
            file,
            data_format,
        } => {
            let data = std::fs::read_to_string(&file)?;
            let repo = open_repository(&connection, &repo).await?;
            repo.replace_statements(&data, data_format).await?;
            println!("Replaced contents of {}", repo.id());
        }
        Commands::Delete { repo, filter, all } => {
            let repo = open_repository(&connection, &repo).await?;
            let filter = StatementFilter::from_params(filter);
            repo.delete_statements(&filter, !all).await?;
            println!("OK");
        }
        Commands::Size { repo } => {
            let repo = open_repository(&connection, &repo).await?;
            println!("{}", repo.size().await?);
        }
        Commands::Contexts { repo } => {
            let repo = open_repository(&connection, &repo).await?;
            let contexts = repo.contexts().await?;
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&contexts)?),
                OutputFormat::Table => {
                    for context in &contexts {
                        println!("{}", context);
                    }
                    println!("{} context(s)", contexts.len());
                }
            }
        }
        Commands::Namespaces { repo } => {
            let repo = open_repository(&connection, &repo).await?;
            let namespaces = repo.namespaces().await?;
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&namespaces)?),
                OutputFormat::Table => {
                    let mut table = Table::new();
                    table.set_content_arrangement(ContentArrangement::Dynamic);
                    table.set_header(vec!["prefix", "namespace"]);
                    for (prefix, namespace) in &namespaces {
                        table.add_row(vec![prefix.as_str(), namespace.as_str()]);
                    }
                    println!("{}", table);
                }
            }
        }
        Commands::Namespace { repo, action } => {
            let repo = open_repository(&connection, &repo).await?;
            run_namespace(&repo, action).await?;
        }
    }

    Ok(())
}

/// Copy a response body to stdout byte for byte
fn write_body(body: &[u8]) -> CliResult<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(body)?;
    stdout.flush()?;
    Ok(())
}

async fn open_repository(connection: &Connection, id: &str) -> CliResult<RepositoryClient> {
    connection
        .repository(id)
        .await?
        .ok_or_else(|| format!("Repository not found: {}", id).into())
}

async fn run_repos(connection: &Connection, format: &OutputFormat) -> CliResult<()> {
    let repos = connection.repositories().await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(repos.as_slice())?);
        }
        OutputFormat::Table => {
            if repos.is_empty() {
                println!("(no repositories)");
                return Ok(());
            }

            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec!["id", "title", "readable", "writable", "uri"]);
            for r in repos.iter() {
                table.add_row(vec![
                    r.id.clone(),
                    r.title.clone(),
                    r.readable.to_string(),
                    r.writable.to_string(),
                    r.uri.clone(),
                ]);
            }

            println!("{}", table);
            println!("{} repositor{}", repos.len(), if repos.len() == 1 { "y" } else { "ies" });
        }
    }

    Ok(())
}

async fn run_namespace(repo: &RepositoryClient, action: NamespaceAction) -> CliResult<()> {
    match action {
        NamespaceAction::Get { prefix } => match repo.namespace(&prefix).await? {
            Some(namespace) => println!("{}", namespace),
            None => {
                eprintln!("Undefined prefix: {}", prefix);
                std::process::exit(2);
            }
        },
        NamespaceAction::Set { prefix, namespace } => {
            repo.set_namespace(&prefix, &namespace).await?;
            println!("{}: {}", prefix, namespace);
        }
        NamespaceAction::Delete { prefix } => {
            repo.delete_namespace(&prefix).await?;
            println!("Deleted {}", prefix);
        }
        NamespaceAction::Clear => {
            repo.delete_all_namespaces().await?;
            println!("Deleted all namespaces");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("subj=<urn:a=b>").unwrap(),
            ("subj".to_string(), "<urn:a=b>".to_string())
        );
        assert!(parse_key_value("subj").is_err());
    }

    #[test]
    fn test_cli_parses_query() {
        let cli = Cli::try_parse_from([
            "sesame", "query", "test", "ASK {}", "--result-format", "boolean", "--bind", "x=\"5\"",
        ])
        .unwrap();
        match cli.command {
            Commands::Query { result_format, bindings, .. } => {
                assert_eq!(result_format, ResultFormat::PlainTextBoolean);
                assert_eq!(bindings, vec![("x".to_string(), "\"5\"".to_string())]);
            }
            _ => panic!("Expected query command"),
        }
    }

    #[test]
    fn test_verbose_logs_cli_and_library() {
        let filter = default_log_filter(true);
        assert!(filter.contains("sesame=debug"));
        assert!(filter.contains("sesame_cli=debug"));
        assert!(EnvFilter::try_new(filter).is_ok());
        assert_eq!(default_log_filter(false), "warn");
    }

    #[test]
    fn test_cli_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["sesame", "statements", "test", "--result-format", "yaml"]).is_err());
    }
}
