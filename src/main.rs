use std::sync::Arc;

use anyhow::Context;
use log::{info, warn};
use serving::{Registry, Service, ServingConfig, transport};
use tokio::{net::TcpListener, signal};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = ServingConfig::from_env().context("reading configuration")?;
    let registry = Registry::load(&config).with_context(|| {
        format!(
            "loading model bundles from '{}'",
            config.artifacts_dir().display()
        )
    })?;
    let service = Service::new(Arc::new(registry));

    let addr = config.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("listening on {addr}");

    tokio::select! {
        res = accept_loop(listener, service) => res?,
        _ = signal::ctrl_c() => info!("shutting down"),
    }

    Ok(())
}

async fn accept_loop(listener: TcpListener, service: Service) -> anyhow::Result<()> {
    loop {
        let (stream, peer) = listener.accept().await.context("accepting connection")?;
        info!(peer:% = peer; "client connected");

        let service = service.clone();
        tokio::spawn(async move {
            let (rx, tx) = stream.into_split();
            match transport::serve(rx, tx, &service).await {
                Ok(()) => info!(peer:% = peer; "client disconnected"),
                Err(e) => warn!(peer:% = peer; "connection closed: {e}"),
            }
        });
    }
}
