#![cfg(not(tarpaulin_include))]

use catalog::app;
use catalog::config::Config;
use catalog::google::GoogleSheets;
use catalog::store::MemorySheets;
use std::env;
use std::path::PathBuf;

fn usage(program: &str) {
    eprintln!(
        "Usage: {} [--config <file.json>] [--bind <addr>] [--demo <seed.json>] [--inline-images]",
        program
    );
}

/// Main entry point for the catalog web application
///
/// Reads the configuration, opens either the remote spreadsheet or an
/// in-memory demo document, and serves the catalog until stopped.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let mut config_file: Option<PathBuf> = None;
    let mut bind: Option<String> = None;
    let mut demo: Option<PathBuf> = None;
    let mut inline_images = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "--bind" | "--demo" if i + 1 >= args.len() => {
                usage(&args[0]);
                return Ok(());
            }
            "--config" => {
                config_file = Some(PathBuf::from(&args[i + 1]));
                i += 1;
            }
            "--bind" => {
                bind = Some(args[i + 1].clone());
                i += 1;
            }
            "--demo" => {
                demo = Some(PathBuf::from(&args[i + 1]));
                i += 1;
            }
            "--inline-images" => inline_images = true,
            "-h" | "--help" => {
                usage(&args[0]);
                return Ok(());
            }
            other => {
                eprintln!("Error: unknown argument '{}'", other);
                usage(&args[0]);
                return Ok(());
            }
        }
        i += 1;
    }

    let mut config = Config::load(config_file.as_deref())?;
    if let Some(bind) = bind {
        config.bind = bind;
    }
    if demo.is_some() {
        config.demo_data = demo;
    }
    if inline_images {
        config.image_mode = catalog::gallery::ImageMode::Inline;
    }

    match &config.demo_data {
        Some(seed) => {
            log::info!("serving demo data from {}", seed.display());
            let store = MemorySheets::from_json_file(seed)?;
            app::run(&config.bind, store, config.image_mode).await
        }
        None => {
            let store = GoogleSheets::open(&config.sheet_url, config.access_token()?)?;
            log::info!("serving spreadsheet {}", store.spreadsheet_id());
            app::run(&config.bind, store, config.image_mode).await
        }
    }
}
