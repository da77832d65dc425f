mod genai;
mod telemetry;
mod timeline;
mod web;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use crate::telemetry::{HttpTelemetrySource, TelemetrySource};
use crate::web::Config;

#[derive(Parser)]
#[command(name = "iss-o-mat")]
#[command(about = "Live International Space Station dashboard backend")]
struct Cli {
    /// Path to the YAML config file; defaults apply when it is absent
    #[arg(short, long, global = true)]
    config: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the web server with the telemetry pollers
    Serve,
    /// Validate the config file
    CheckConfig,
    /// Fetch and print the current station position
    Position,
    /// Ask the assistant a single question
    Ask { prompt: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = match load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Serve => serve(config).await,
        Commands::CheckConfig => check_config(&config),
        Commands::Position => position(&config).await,
        Commands::Ask { prompt } => ask(&config, &prompt).await,
    }
}

fn load_config(path: Option<&str>) -> Result<Config, web::config::ConfigError> {
    match path {
        Some(path) => Config::from_file(path),
        None => Ok(Config::default()),
    }
}

async fn serve(config: Config) -> ExitCode {
    match web::run_server(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn check_config(config: &Config) -> ExitCode {
    println!("Config is valid");
    println!("  bind: {}", config.web.bind);
    println!(
        "  telemetry: {} every {:?}, {} trail points",
        config.telemetry.endpoint, config.telemetry.interval, config.telemetry.trail_capacity
    );
    let settings = config.assistant.client_settings();
    println!(
        "  assistant: {} ({} retries from {:?}), key {}",
        settings.model,
        settings.retry.max_retries,
        settings.retry.initial_backoff,
        if settings.api_key.is_some() {
            "present"
        } else {
            "missing"
        }
    );
    match &config.conditions {
        Some(c) => println!("  conditions: {} every {:?}", c.endpoint, c.interval),
        None => println!("  conditions: disabled"),
    }
    ExitCode::SUCCESS
}

async fn position(config: &Config) -> ExitCode {
    let source = match HttpTelemetrySource::new(
        &config.telemetry.endpoint,
        config.telemetry.request_timeout,
    ) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let sample = match source.fetch().await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Telemetry error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match serde_json::to_string_pretty(&sample) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn ask(config: &Config, prompt: &str) -> ExitCode {
    let assistant = match web::build_assistant(config) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match assistant.client().inner().generate(prompt).await {
        Ok(answer) => {
            println!("{}", answer);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Assistant error: {}", e);
            ExitCode::FAILURE
        }
    }
}
