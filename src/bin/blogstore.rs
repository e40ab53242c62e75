use blogstore::{Action, BlogConfig, BlogErrors, BlogStore, Entity};
use clap::{Parser, Subcommand};
use log::{error, info};
use serde_json::Value;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file; environment only when absent
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an object and print its id
    Create { category: String, input: String },
    /// Find objects and print them as a JSON array
    Find {
        category: String,
        #[arg(default_value = "{}")]
        input: String,
    },
    /// Update the object identified by `id`
    Update { category: String, input: String },
    /// Remove the object identified by `id`
    Remove { category: String, input: String },
    /// Remove all data from every category
    Clear,
}

fn parse_input(input: &str) -> Result<Entity, String> {
    match serde_json::from_str::<Value>(input) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(format!("input must be a JSON object, got {}", other)),
        Err(e) => Err(format!("invalid JSON input: {}", e)),
    }
}

fn report(errors: &BlogErrors) {
    match serde_json::to_string_pretty(errors) {
        Ok(json) => eprintln!("{}", json),
        Err(_) => eprintln!("{}", errors),
    }
}

async fn run(store: &BlogStore, command: Command) -> Result<Option<Value>, BlogErrors> {
    let (category, action, input) = match command {
        Command::Clear => {
            store.clear().await?;
            return Ok(None);
        }
        Command::Create { category, input } => (category, Action::Create, input),
        Command::Find { category, input } => (category, Action::Find, input),
        Command::Update { category, input } => (category, Action::Update, input),
        Command::Remove { category, input } => (category, Action::Remove, input),
    };
    let input = parse_input(&input).map_err(blogstore::BlogError::bad_field_value)?;
    info!("{} {}", action, category);
    match action {
        Action::Create => Ok(Some(Value::String(store.create(&category, &input).await?))),
        Action::Find => {
            let found = store.find(&category, &input).await?;
            Ok(Some(Value::Array(found.into_iter().map(Value::Object).collect())))
        }
        Action::Update => store.update(&category, &input).await.map(|_| None),
        Action::Remove => store.remove(&category, &input).await.map(|_| None),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => BlogConfig::from_file(path),
        None => BlogConfig::from_env(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load configuration: {}", e);
            return ExitCode::from(2);
        }
    };
    blogstore::logging::init_from_config(&config);

    let store = match BlogStore::from_config(&config).await {
        Ok(store) => store,
        Err(errors) => {
            error!("failed to open store: {}", errors);
            report(&errors);
            return ExitCode::FAILURE;
        }
    };

    match run(&store, cli.command).await {
        Ok(Some(output)) => {
            match serde_json::to_string_pretty(&output) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    error!("failed to encode output: {}", e);
                    return ExitCode::FAILURE;
                }
            }
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::SUCCESS,
        Err(errors) => {
            report(&errors);
            ExitCode::FAILURE
        }
    }
}
