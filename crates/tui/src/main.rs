mod app;
mod events;
mod logging;
mod persist;
mod strings;
mod terminal;
mod theme;
mod ui;

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use providers::{TogetherClient, TogetherConfig};
use terminal::TerminalGuard;
use tracing::{error, info};

fn build_client() -> Result<TogetherClient> {
    let cfg = TogetherConfig::from_env_and_file()?;
    TogetherClient::new(cfg)
}

fn main() -> Result<()> {
    let _log_guard = logging::init()?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?;
    let _enter = runtime.enter();

    // Without a client the UI still runs; submitting reports why.
    let (client, client_error) = match build_client() {
        Ok(c) => (Some(Arc::new(c)), None),
        Err(e) => {
            error!(target: "tui", "client unavailable: {:#}", e);
            (None, Some(format!("{:#}", e)))
        }
    };
    info!(target: "tui", "starting codelyft (client ready: {})", client.is_some());

    let mut app = app::App::new(client, client_error, runtime.handle().clone());
    let res = {
        let mut term = TerminalGuard::new()?;
        events::run(&mut term.terminal, &mut app)
    };
    app.cancel_pending();
    drop(_enter);
    runtime.shutdown_timeout(Duration::from_secs(1));
    res
}
