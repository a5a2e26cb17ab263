//! `rolltable-host`: runs a table and reads host commands from stdin.
//!
//! Configured through `ROLLTABLE_*` environment variables (see
//! [`HostConfig::from_env`]); log filtering through `RUST_LOG`.

use rolltable::console::{self, ConsoleCommand};
use rolltable::prelude::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), RolltableError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = HostConfig::from_env();
    let server = HostServer::builder().config(config).build().await?;
    let host = server.handle();
    info!(addr = ?server.local_addr().ok(), "table open");

    tokio::spawn(print_feed(host.clone()));
    let console = tokio::spawn(read_console(host.clone()));

    tokio::select! {
        result = server.run() => {
            if let Err(e) = &result {
                error!(error = %e, "server stopped");
            }
            result?;
        }
        _ = console => info!("console closed"),
        _ = tokio::signal::ctrl_c() => info!("interrupted"),
    }

    if let Err(e) = host.shutdown().await {
        warn!(error = %e, "host already stopped");
    }
    Ok(())
}

async fn print_feed(host: HostHandle) {
    let mut feed = host.subscribe();
    loop {
        match feed.recv().await {
            Ok(msg) => {
                if let Some(line) = console::describe(&msg) {
                    println!("* {line}");
                }
            }
            Err(RecvError::Lagged(n)) => warn!(skipped = n, "event feed lagged"),
            Err(RecvError::Closed) => break,
        }
    }
}

/// Returns when stdin closes or the host types `quit`.
async fn read_console(host: HostHandle) {
    println!("{}", console::HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "stdin read failed");
                break;
            }
        };
        let cmd = match console::parse_command(&line) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => continue,
            Err(e) => {
                println!("! {e}");
                continue;
            }
        };
        if cmd == ConsoleCommand::Quit {
            break;
        }
        match console::execute(&host, cmd).await {
            Ok(Some(text)) => println!("{text}"),
            Ok(None) => {}
            Err(e) => println!("! {e}"),
        }
    }
}
