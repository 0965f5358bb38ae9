use std::sync::Arc;

use kkbridge::server::{self, AppState};
use kkbridge_link::Bridge;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::cmd::ServeArgs;
use crate::exit::{io_error, link_error, CliResult, SUCCESS};

pub fn run(args: ServeArgs) -> CliResult<i32> {
    let config = args.emulator.link_config()?;
    let bridge = Bridge::connect(&config).map_err(|err| link_error("connect failed", err))?;
    let state = Arc::new(AppState::new(bridge, config.max_payload_size));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| io_error("failed starting runtime", err))?;

    runtime.block_on(async {
        let listener = TcpListener::bind(args.listen)
            .await
            .map_err(|err| io_error(&format!("bind {} failed", args.listen), err))?;

        server::serve(listener, state, shutdown_signal())
            .await
            .map_err(|err| io_error("server failed", err))
    })?;

    Ok(SUCCESS)
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown requested"),
        Err(err) => {
            // Without a signal handler the server runs until killed.
            warn!(error = %err, "failed installing ctrl-c handler");
            std::future::pending::<()>().await;
        }
    }
}
