//! CIL proxy daemon and command-line client
//!
//! ```text
//! cil-proxy --config cil-proxy.toml send '{"type":"Slew","ra_deg":10.5,"dec_deg":-20.0}'
//! cil-proxy --config cil-proxy.toml run < commands.jsonl
//! cil-proxy config
//! ```

use cil_proxy::{Command, Config, ProxyServer, Result};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Config used when `--config` is not given and the file exists
const DEFAULT_CONFIG_PATH: &str = "/etc/cil-proxy.toml";

/// Command/response bridge to the telescope control system
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured wire dialect (tcs, simulator)
    #[arg(short, long)]
    dialect: Option<String>,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Execute one JSON-encoded command and print its result
    Send {
        /// Command as JSON, e.g. '{"type":"Show","key":"AZIMUTH"}'
        command: String,
    },
    /// Execute JSON commands read from stdin, one per line
    Run,
    /// Print the effective configuration
    Config,
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Config::from_file(DEFAULT_CONFIG_PATH)?,
        None => Config::default(),
    };
    if let Some(dialect) = &args.dialect {
        config.proxy.dialect = dialect.clone();
    }
    Ok(config)
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    match run(&args, &config) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns whether every executed command succeeded
fn run(args: &Args, config: &Config) -> Result<bool> {
    match &args.action {
        Action::Config => {
            print!("{}", config.to_toml()?);
            Ok(true)
        }
        Action::Send { command } => {
            let command: Command = serde_json::from_str(command)?;
            let mut server = ProxyServer::start(config)?;
            let result = server.execute(command);
            println!("{}", serde_json::to_string(&result)?);
            server.shutdown()?;
            Ok(result.success)
        }
        Action::Run => {
            let running = Arc::new(AtomicBool::new(true));
            let r = Arc::clone(&running);
            ctrlc::set_handler(move || {
                log::info!("Received shutdown signal");
                r.store(false, Ordering::Relaxed);
            })
            .map_err(|e| cil_proxy::Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

            let mut server = ProxyServer::start(config)?;
            log::info!(
                "CIL proxy running ({} dialect). Reading commands from stdin.",
                server.translator_name()
            );

            let mut all_ok = true;
            let stdout = io::stdout();
            for line in io::stdin().lock().lines() {
                if !running.load(Ordering::Relaxed) {
                    break;
                }
                let line = line?;
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                let result = match serde_json::from_str::<Command>(line) {
                    Ok(command) => server.execute(command),
                    Err(e) => {
                        log::warn!("Skipping unparseable command {:?}: {}", line, e);
                        all_ok = false;
                        continue;
                    }
                };
                all_ok &= result.success;
                let mut out = stdout.lock();
                writeln!(out, "{}", serde_json::to_string(&result)?)?;
                out.flush()?;
            }

            server.shutdown()?;
            Ok(all_ok)
        }
    }
}
