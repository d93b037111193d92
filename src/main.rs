mod aggregate;
mod attendance;
mod clock;
mod config;
mod db;
mod ipc;
mod resolver;
mod snapshot;
mod store;

use clap::Parser;
use std::io::{self, BufRead, Write};

fn main() -> anyhow::Result<()> {
    let cfg = config::Config::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cfg.log_level))
        .target(env_logger::Target::Stderr)
        .init();

    let mut state = ipc::AppState {
        workspace: None,
        db: None,
        clock: cfg.clock(),
        store_timeout: cfg.store_timeout(),
    };
    if let Some(path) = cfg.workspace.as_ref() {
        // A bad startup workspace is not fatal; attendance requests then
        // follow the unavailable-store policy until workspace.select succeeds.
        match db::open_db(path, state.store_timeout) {
            Ok(conn) => {
                log::info!("workspace opened at {}", path.to_string_lossy());
                state.workspace = Some(path.clone());
                state.db = Some(conn);
            }
            Err(e) => log::error!("failed to open workspace {}: {:#}", path.to_string_lossy(), e),
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                log::error!("stdin closed: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                log::warn!("unparseable request: {}", e);
                let _ = writeln!(
                    stdout,
                    "{}",
                    serde_json::json!({
                        "ok": false,
                        "error": { "code": "bad_json", "message": e.to_string() }
                    })
                );
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }

    Ok(())
}
