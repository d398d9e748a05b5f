mod config;
mod http;
mod metrics;

use std::{convert::Infallible, env, process, str::FromStr, sync::Arc};

use config::{AppConfig, ConfigError, Environment};
use depot_store::{seed::seed_demo, DepotStore, StoreError};
use hyper::{server::conn::http1, service::service_fn};
use hyper_util::rt::TokioIo;
use log::error;
use metrics::ApiMetrics;
use thiserror::Error;
use tokio::net::TcpListener;
use transfer_engine::TransferController;

use crate::http::ApiContext;

fn main() {
    if let Err(err) = run() {
        eprintln!("wasteworks failed: {err}");
        process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    env_logger::init();
    let config = AppConfig::load(parse_environment()?);

    let store = Arc::new(DepotStore::open(&config.store)?);
    if config.seed_on_boot && seed_demo(&store)? {
        println!("Seeded demo fixtures into an empty store");
    }
    let controller = TransferController::new(Arc::clone(&store));
    let api_metrics = Arc::new(ApiMetrics::new()?);

    println!(
        "wasteworks booted in {} mode; depot state at {:?}",
        config.env_label(),
        config.store.state_dir()
    );
    let (warehouse_count, organization_count) =
        store.read(|state| (state.warehouses().count(), state.organizations().count()));
    println!(
        "Store holds {} warehouses and {} organizations",
        warehouse_count, organization_count
    );
    println!(
        "Listening on http://{}; press Ctrl+C to shut down",
        config.listen_addr
    );

    let ctx = Arc::new(ApiContext::new(
        controller,
        api_metrics,
        config.testing_routes,
    ));
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(serve(ctx, config))
}

async fn serve(ctx: Arc<ApiContext>, config: AppConfig) -> Result<(), AppError> {
    let listener = TcpListener::bind(config.listen_addr).await?;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("Shutdown signal received; stopping");
                return Ok(());
            }
            accepted = listener.accept() => {
                let (socket, _) = accepted?;
                let io = TokioIo::new(socket);
                let ctx = Arc::clone(&ctx);
                let service = service_fn(move |req| {
                    let ctx = Arc::clone(&ctx);
                    async move { Ok::<_, Infallible>(http::handle(ctx, req).await) }
                });
                tokio::spawn(async move {
                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        error!("error serving connection: {err:?}");
                    }
                });
            }
        }
    }
}

fn parse_environment() -> Result<Environment, AppError> {
    let arg = env::args().nth(1).ok_or(AppError::Usage)?;
    Environment::from_str(&arg).map_err(AppError::from)
}

#[derive(Debug, Error)]
enum AppError {
    #[error("usage: wasteworks <dev|prod>")]
    Usage,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("metrics registry error: {0}")]
    Metrics(#[from] prometheus::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
