//! Query Template Engine CLI
//!
//! Usage:
//!   qte [OPTIONS] render <SCHEMA> <TEMPLATE>
//!   qte [OPTIONS] plan <OPERATION_TYPE> <TEMPLATE>
//!
//! Options:
//!   -r, --root <DIR>       Directory holding template resources [default: .]
//!   -c, --config <FILE>    Engine configuration (TOML format)
//!   -p, --params <JSON>    Parameters as a JSON object [default: {}]
//!   -h, --help             Print help

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use query_template_engine::{
    bind, resolve_query, BackendRequest, EngineConfig, EngineError, FsSource, Renderer,
    TemplateStore,
};

#[derive(Parser)]
#[command(name = "qte")]
#[command(about = "Render and inspect parameterised search query templates")]
struct Cli {
    /// Directory holding template resources
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Engine configuration (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Parameters as a JSON object
    #[arg(short, long, default_value = "{}")]
    params: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render an ad-hoc template and print the payload
    Render {
        /// Schema (collection) the template belongs to
        schema: String,
        /// Template file name within the schema directory
        template: String,
    },
    /// Resolve a grouped template and print the request it would send
    Plan {
        /// Operation type naming the template group
        operation_type: String,
        /// Template name within the group
        template: String,
    },
}

fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match EngineConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => EngineConfig::default(),
    };

    let params: Value = match serde_json::from_str(&cli.params) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Error parsing --params: {}", e);
            std::process::exit(1);
        }
    };

    let store = TemplateStore::new(FsSource::new(&cli.root), config.templates);
    let renderer = Renderer::new(config.render);

    let result = match &cli.command {
        Command::Render { schema, template } => {
            render_adhoc(&store, &renderer, schema, template, &params)
        }
        Command::Plan {
            operation_type,
            template,
        } => plan(&store, &renderer, operation_type, template, &params),
    };

    match result {
        Ok(output) => println!("{}", output),
        Err(e) => {
            match e.report() {
                Some(report) => eprintln!("{}", report),
                None => eprintln!("Error: {}", e),
            }
            std::process::exit(1);
        }
    }
}

fn render_adhoc(
    store: &TemplateStore,
    renderer: &Renderer,
    schema: &str,
    template: &str,
    params: &Value,
) -> Result<String, EngineError> {
    let text = store.load_template(schema, template)?;
    let ctx = bind(params)?;
    renderer.render_named(template, &text, &ctx)
}

fn plan(
    store: &TemplateStore,
    renderer: &Renderer,
    operation_type: &str,
    template: &str,
    params: &Value,
) -> Result<String, EngineError> {
    let query = resolve_query(store, renderer, operation_type, template, params)?;
    let request = BackendRequest::for_query(&query);
    let mut out = format!("{} {}", request.method, request.path());
    if let Some(body) = &request.body {
        out.push('\n');
        out.push_str(body);
    }
    Ok(out)
}
