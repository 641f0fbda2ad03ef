use std::path::Path;
use std::rc::Rc;

use anyhow::Result;
use clap::arg;
use clap::command;
use clap::Parser;
use expiring_store::auth::LogNotifier;
use expiring_store::backend::build_backend;
use expiring_store::config::proc_loader::file_to_config;
use expiring_store::console::{Command, Reply, Session};
use expiring_store::helpers::time::SystemClock;
use expiring_store::utils::constants::{DEFAULT_CONFIG_PATH, PROMPT_HINT};
use expiring_store::utils::logging;
use expiring_store::utils::logging::LogLevel;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: String,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Load YAML config
    // -------------------------------

    let args = Args::parse();
    let service_config = file_to_config(Path::new(&args.config))?;
    logging::run(&service_config, args.log_level);

    // -------------------------------
    // 2. Build backend and stores
    // -------------------------------

    let backend = build_backend(&service_config.settings.backend);
    let navigator = |route: &str| info!(route, "navigate");
    let session = Session::from_config(
        &service_config,
        backend,
        Rc::new(SystemClock),
        navigator,
        LogNotifier,
    )?;
    info!(stores = service_config.stores.len(), "{}", PROMPT_HINT);

    // -------------------------------
    // 3. Serve commands from stdin
    // -------------------------------

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("ERR {e}");
                continue;
            }
        };

        match session.execute(command) {
            Ok(Reply::Text(text)) => println!("{text}"),
            Ok(Reply::Sleep(duration)) => tokio::time::sleep(duration).await,
            Ok(Reply::Quit) => break,
            Err(e) => {
                error!(error = %e, "command failed");
                println!("ERR {e:#}");
            }
        }
    }

    Ok(())
}
