use std::env;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};

use weave_client::{ClientConfig, QuerySlot, SessionState, StreamClient, StreamEvent};
use weave_history::{HistoryConfig, HistoryEntry, HistoryStore};
use weave_query::{compose, AnswerRequest, GeneratorConfig, QueryPayload};
use weave_registry::{Command, SearchContext, WidgetConfiguration, WidgetState};

#[derive(Parser)]
#[command(name = "weave")]
#[command(about = "Streamed answers from a remote search service", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a question and stream the answer
    Ask(AskArgs),
    /// List saved answers, most recent first
    History(HistoryArgs),
}

#[derive(Args)]
struct AskArgs {
    /// The question to ask
    question: String,

    /// Base URL of the search service (falls back to WEAVE_URL)
    #[arg(long)]
    url: Option<String>,

    /// Streaming resource path under the base URL
    #[arg(long, default_value = "answer")]
    resource: String,

    /// Semantic index to search (repeatable)
    #[arg(long = "index")]
    indexes: Vec<String>,

    /// Full-text field to match against (repeatable)
    #[arg(long = "field")]
    fields: Vec<String>,

    /// Use semantic/vector search instead of field matching
    #[arg(long)]
    semantic: bool,

    /// Maximum number of source documents
    #[arg(long, default_value_t = 5)]
    limit: usize,

    /// Generation model name
    #[arg(long, default_value = "default")]
    model: String,

    /// Optional system prompt for the generator
    #[arg(long)]
    system_prompt: Option<String>,

    /// Extra request header as `name: value` (repeatable)
    #[arg(long = "header")]
    headers: Vec<String>,

    /// History file location
    #[arg(long)]
    history: Option<PathBuf>,

    /// Skip saving the finished answer to history
    #[arg(long)]
    no_save: bool,
}

#[derive(Args)]
struct HistoryArgs {
    /// History file location
    #[arg(long)]
    history: Option<PathBuf>,

    /// Show at most this many entries
    #[arg(long, default_value_t = 10)]
    limit: usize,
}

fn init_logging(verbose: bool, quiet: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();
}

fn parse_headers(raw: &[String]) -> Result<Vec<(String, String)>> {
    raw.iter()
        .map(|entry| {
            let (name, value) = entry
                .split_once(':')
                .with_context(|| format!("Header '{entry}' is not in 'name: value' form"))?;
            Ok((name.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

fn history_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| env::var_os("WEAVE_HISTORY").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(".weave/history.json"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Ask(args) => ask(args).await,
        Commands::History(args) => history(args),
    }
}

async fn ask(args: AskArgs) -> Result<()> {
    let url = args
        .url
        .clone()
        .or_else(|| env::var("WEAVE_URL").ok())
        .unwrap_or_else(|| "http://localhost:8000".to_string());
    let headers = parse_headers(&args.headers)?;
    let context = SearchContext::with_headers(url, headers);

    // Publish the submission the way a search-box widget would, then build
    // the request from the committed snapshot like a consuming widget.
    let query = compose(&args.question, &args.fields, None, args.semantic);
    context.dispatch(Command::SetWidget(WidgetState {
        needs_query: true,
        root_query: true,
        is_semantic: args.semantic,
        query: Some(query),
        semantic_query: args.semantic.then(|| args.question.clone()),
        value: args.question.clone(),
        submitted_at: context.next_stamp(),
        configuration: Some(WidgetConfiguration {
            indexes: args.indexes.clone(),
            limit: Some(args.limit),
        }),
        ..WidgetState::new("search")
    }));

    let snapshot = context.snapshot();
    let submitted = snapshot
        .registry
        .iter()
        .find(|widget| widget.root_query && widget.submitted_at > 0)
        .context("No submitted root query in the registry")?;
    let widget_query = submitted
        .query
        .as_ref()
        .context("Submitted widget carries no query")?;
    let configuration = submitted.configuration.clone().unwrap_or_default();

    let request = AnswerRequest {
        query: QueryPayload::from_query(
            widget_query,
            configuration.indexes,
            configuration.limit.unwrap_or(args.limit),
            args.fields.clone(),
        ),
        summarizer: GeneratorConfig {
            model: args.model,
            max_tokens: None,
            temperature: None,
        },
        system_prompt: args.system_prompt,
    };

    let client = StreamClient::new(
        ClientConfig::new(snapshot.base_url)
            .with_headers(snapshot.headers)
            .with_resource(args.resource),
    );

    let mut slot = QuerySlot::new();
    slot.start(&client, &request);

    let mut stdout = io::stdout();
    while let Some(event) = slot.next_event().await {
        if let StreamEvent::Chunk(fragment) = event {
            stdout.write_all(fragment.as_bytes())?;
            stdout.flush()?;
        }
    }
    println!();

    let session = slot.session();
    if session.state() == SessionState::Errored {
        bail!(
            "answer stream failed: {}",
            session.error().unwrap_or("unknown error")
        );
    }

    let cited = weave_citations::all_ids(session.text());
    if !cited.is_empty() {
        println!("\nSources: {}", cited.join(", "));
    }

    if !args.no_save {
        let mut store = HistoryStore::open(HistoryConfig::new(history_path(args.history)));
        store.record(HistoryEntry::new(args.question, session.text(), cited));
    }

    Ok(())
}

fn history(args: HistoryArgs) -> Result<()> {
    let store = HistoryStore::open(HistoryConfig::new(history_path(args.history)));
    if store.entries().is_empty() {
        println!("No saved answers.");
        return Ok(());
    }
    for entry in store.entries().iter().take(args.limit) {
        // Render citation markers as sequential footnotes for display.
        let rendered = weave_citations::replace(&entry.answer, |ids, all| {
            let numbers: Vec<String> = ids
                .iter()
                .filter_map(|id| all.iter().position(|seen| seen == id))
                .map(|index| (index + 1).to_string())
                .collect();
            format!("[{}]", numbers.join(","))
        });
        println!("Q: {}", entry.question);
        println!("A: {rendered}");
        if !entry.cited_ids.is_empty() {
            println!("   sources: {}", entry.cited_ids.join(", "));
        }
        println!();
    }
    Ok(())
}
