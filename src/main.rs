//! reactive-html CLI - render and inspect reactive pages

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::{Map, Value};

use reactive_html::expr::{self, Frame};
use reactive_html::value::{display_opt, type_name};
use reactive_html::{
    Document, EngineConfig, EventKind, FixSuggestion, ReactiveError, ReactiveStore,
};

#[derive(Parser)]
#[command(name = "reactive-html")]
#[command(about = "Reactive key/value store bound to a markup document")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bind a page to a state, apply writes and print the result
    Render {
        /// Path to the page markup
        page: String,

        /// Initial state (YAML or JSON mapping)
        #[arg(short, long)]
        state: Option<String>,

        /// Store write applied after the initial render (name=value, value parsed as JSON)
        #[arg(long = "set", value_name = "NAME=VALUE")]
        sets: Vec<String>,

        /// Markup file injected into the element with the given id
        #[arg(long = "fragment", value_name = "ID=FILE")]
        fragments: Vec<String>,

        /// Engine configuration (YAML)
        #[arg(short, long)]
        config: Option<String>,

        /// Print change events to stderr as JSON lines
        #[arg(long)]
        events: bool,
    },

    /// List the bindings discovered in a page
    Bindings {
        /// Path to the page markup
        page: String,

        /// Initial state (YAML or JSON mapping)
        #[arg(short, long)]
        state: Option<String>,
    },

    /// Evaluate a generic-attribute expression against a state
    Eval {
        /// Expression, e.g. "count >= 3 && !done"
        expression: String,

        /// State (YAML or JSON mapping)
        #[arg(short, long)]
        state: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Render {
            page,
            state,
            sets,
            fragments,
            config,
            events,
        } => render(&page, state.as_deref(), &sets, &fragments, config.as_deref(), events).await,
        Commands::Bindings { page, state } => bindings(&page, state.as_deref()).await,
        Commands::Eval { expression, state } => eval(&expression, state.as_deref()).await,
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        if let Some(suggestion) = e
            .downcast_ref::<ReactiveError>()
            .and_then(|err| err.fix_suggestion())
        {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

async fn render(
    page: &str,
    state: Option<&str>,
    sets: &[String],
    fragments: &[String],
    config: Option<&str>,
    events: bool,
) -> anyhow::Result<()> {
    let config = match config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let initial = load_state(state).await?;
    let html = read(page).await?;

    // Parse every argument before touching the store
    let sets = sets
        .iter()
        .map(|s| parse_assignment(s))
        .collect::<Result<Vec<_>, _>>()?;
    let mut injections = Vec::with_capacity(fragments.len());
    for fragment in fragments {
        let (id, file) = fragment
            .split_once('=')
            .ok_or_else(|| ReactiveError::InvalidAssignment {
                input: fragment.clone(),
            })?;
        injections.push((id.trim().to_string(), read(file.trim()).await?));
    }

    let mut store = ReactiveStore::with_config(Document::parse(&html), initial, config);

    if events {
        store.on(EventKind::Change, |event| {
            if let Ok(line) = serde_json::to_string(event) {
                eprintln!("{}", line);
            }
        });
    }

    for (id, markup) in injections {
        let node = store
            .document()
            .find_by_id(&id)
            .ok_or_else(|| ReactiveError::TargetNotFound { id: id.clone() })?;
        store.inject(node, &markup);
    }

    for (name, value) in sets {
        store.set(&name, value);
    }

    println!("{}", store.render());
    Ok(())
}

async fn bindings(page: &str, state: Option<&str>) -> anyhow::Result<()> {
    let initial = load_state(state).await?;
    let html = read(page).await?;
    let store = ReactiveStore::from_html(&html, initial);

    let registry = store.registry();
    let vars = registry.variables();
    if vars.is_empty() {
        println!("{}", "No bindings".dimmed());
        return Ok(());
    }
    for var in vars {
        let locations = registry
            .bindings_for(&var)
            .iter()
            .map(|b| format!("{}{}", b.kind, b.node))
            .collect::<Vec<_>>()
            .join(", ");
        println!("{}: {}", var.cyan().bold(), locations);
    }
    Ok(())
}

async fn eval(expression: &str, state: Option<&str>) -> anyhow::Result<()> {
    let values = load_state(state).await?;
    let result = expr::evaluate(expression, &Frame::new(&values)).map_err(ReactiveError::from)?;
    println!("{}", display_opt(result.as_ref()));
    Ok(())
}

async fn read(path: &str) -> anyhow::Result<String> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(ReactiveError::from)
        .with_context(|| format!("reading {}", path))?;
    Ok(content)
}

/// State file as a top-level mapping; no file means an empty store
async fn load_state(path: Option<&str>) -> anyhow::Result<Map<String, Value>> {
    let Some(path) = path else {
        return Ok(Map::new());
    };
    let text = read(path).await?;
    let value: Value = serde_yaml::from_str(&text)
        .map_err(ReactiveError::from)
        .with_context(|| format!("parsing {}", path))?;
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(ReactiveError::StateNotMapping {
            found: type_name(Some(&other)).to_string(),
        }
        .into()),
    }
}

/// `name=value`, with the value read as JSON and falling back to a plain string
fn parse_assignment(input: &str) -> Result<(String, Value), ReactiveError> {
    let (name, raw) = input
        .split_once('=')
        .filter(|(name, _)| !name.trim().is_empty())
        .ok_or_else(|| ReactiveError::InvalidAssignment {
            input: input.to_string(),
        })?;
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((name.trim().to_string(), value))
}
