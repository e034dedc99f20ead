use anyhow::{Context, Result};
use folio_config::Config;
use folio_engine::{Scroll, snapshot::outline};
use std::{env, path::PathBuf, process};
use tracing_subscriber::{EnvFilter, fmt};

mod script;

fn usage(program: &str) -> ! {
    eprintln!("Usage: {program} <script.json> [config.toml]");
    eprintln!("Without a config argument, {} is used if present", Config::config_path().display());
    process::exit(1);
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let program = args.first().map_or("folio-cli", String::as_str);

    let (script_path, config) = match args.as_slice() {
        [_, script] => (PathBuf::from(script), Config::load()?),
        [_, script, config] => {
            let config = Config::load_from_path(config)?
                .with_context(|| format!("config file {config} not found"))?;
            (PathBuf::from(script), Some(config))
        }
        _ => usage(program),
    };
    let config = config.unwrap_or_default();

    // RUST_LOG wins over the config file.
    let filter = EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(config.log_filter.as_deref().unwrap_or("warn"))
    })?;
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let source = std::fs::read_to_string(&script_path)
        .with_context(|| format!("failed to read script {}", script_path.display()))?;
    let ops = script::parse(&source)
        .with_context(|| format!("failed to parse script {}", script_path.display()))?;

    let mut scroll = Scroll::new(config.schema())?;
    script::run(&mut scroll, &ops)?;
    tracing::info!(ops = ops.len(), blots = scroll.blot_count(), "script applied");

    println!("{}", outline(&scroll));
    println!("{}", serde_json::to_string_pretty(&scroll.runs())?);
    Ok(())
}
