use std::fs;
use std::sync::Arc;
use tokio::signal;
use tradepost::api;
use tradepost::logger::*;
use tradepost::server::*;
use tradepost::settings::*;
use warp::Filter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logger = Logger::new_bootstrap();

    let project_settings = parse_settings(cli.settings.as_deref())?;
    info!(?project_settings);
    let logger_config = LogConfig {
        filter: project_settings.log.filter.clone(),
        ansi: project_settings.log.ansi,
    };
    logger.reload_from_config(&logger_config)?;

    let address: std::net::SocketAddr = project_settings.http.address.parse()?;
    if let Some(tls) = &project_settings.http.tls {
        for (what, path) in [("cert", &tls.cert_path), ("key", &tls.key_path)] {
            if !fs::metadata(path)?.is_file() {
                return Err(anyhow::anyhow!("TLS {} is not a regular file: {:?}", what, path));
            }
        }
    }

    let server = Arc::new(Server::try_new(&project_settings).await?);

    let api_v1 = warp::path("api")
        .and(warp::path("v1"))
        .and(api::v1::routes(server.clone()))
        .recover(api::v1::recover_error)
        .with(warp::trace::request());

    let shutdown_signal = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("could not listen for SIGINT: {e}");
        }
    };

    match &project_settings.http.tls {
        Some(tls) => {
            warp::serve(api_v1)
                .tls()
                .cert_path(tls.cert_path.clone())
                .key_path(tls.key_path.clone())
                .bind_with_graceful_shutdown(address, shutdown_signal)
                .1
                .await
        }
        None => {
            let (bound, serving) =
                warp::serve(api_v1).try_bind_with_graceful_shutdown(address, shutdown_signal)?;
            info!(%bound, "listening without TLS");
            serving.await
        }
    }

    let shutdown_timeout = std::time::Duration::from_secs(100);
    match tokio::time::timeout(shutdown_timeout, server.shutdown()).await {
        Ok(_) => tracing::info!("server shutdown successfully"),
        Err(_) => tracing::error!("server shutdown timed out"),
    }

    Ok(())
}
