//! Keystack Server - event access key verification service.
//!
//! Issues and verifies `sk_*` secrets and `id_*` identifiers for webhook
//! event ingestion.
//!
//! # Usage
//!
//! ```text
//! ENCRYPTION_PASSWORD=<32 bytes> GATEWAY_LISTEN=0.0.0.0:4580 keystack-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GATEWAY_LISTEN` | `0.0.0.0:4580` | Bind address |
//! | `ENCRYPTION_PASSWORD` | *(required)* | 32-byte key encryption password |
//! | `ENCRYPTION_PASSWORD_PREVIOUS` | *(unset)* | Comma-separated retired passwords |
//! | `SECRET_CACHE_TTL_SECONDS` | `3600` | Secret verification cache TTL |
//! | `MAX_SECRET_KEYS` | `1000` | Secret records per tenant |
//! | `DEFAULT_NAMESPACE` | `default` | Namespace for new keys |
//! | `TRUST_TENANT_HEADER` | `false` | Trust `x-keystack-tenant` from a fronting gateway (local/dev) |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

mod gateway;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use keystack_access_core::config::AccessConfig;
use keystack_access_core::handler::KeystackAccessHandler;
use keystack_access_core::provider::KeystackAccess;
use keystack_access_core::store::InMemoryRecordStore;
use keystack_access_http::service::{AccessHttpConfig, AccessHttpService};
use keystack_access_http::dispatch::AccessHandler;
use keystack_core::KeystackConfig;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::gateway::GatewayService;

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// How often expired cache entries are purged.
const CACHE_PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Build the [`AccessHttpConfig`] from the [`AccessConfig`].
fn build_http_config(config: &AccessConfig) -> AccessHttpConfig {
    AccessHttpConfig {
        trust_tenant_header: config.trust_tenant_header,
    }
}

/// Run the accept loop, serving connections until a shutdown signal is received.
async fn serve<H: AccessHandler>(listener: TcpListener, service: GatewayService<H>) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    // Wait for in-flight requests to complete.
    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

/// Perform a health check by connecting to the gateway and requesting the health endpoint.
async fn run_health_check(addr: &str) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let (mut reader, mut writer) = stream.into_split();

    let request =
        format!("GET /_keystack/health HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    writer.write_all(request.as_bytes()).await?;
    writer.shutdown().await?;

    let mut response = String::new();
    reader.read_to_string(&mut response).await?;

    if is_healthy_response(&response) {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}")
    }
}

fn is_healthy_response(response: &str) -> bool {
    response.contains("200 OK") && response.contains("\"running\"")
}

/// Periodically purge expired verification cache entries.
fn spawn_cache_purger(provider: Arc<KeystackAccess>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(CACHE_PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            provider.purge_expired_cache();
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = KeystackConfig::from_env();

    // Handle --health-check flag for Docker HEALTHCHECK.
    if std::env::args().any(|a| a == "--health-check") {
        let addr = config.gateway_listen.replace("0.0.0.0", "127.0.0.1");
        let healthy = run_health_check(&addr).await.is_ok();
        std::process::exit(i32::from(!healthy));
    }

    init_tracing(&config.log_level)?;

    let access_config = AccessConfig::from_env().context("invalid event access configuration")?;
    info!(
        previous_passwords = access_config.previous_passwords.len(),
        secret_cache_ttl_secs = access_config.secret_cache_ttl.as_secs(),
        max_secret_keys = access_config.max_secret_keys,
        default_namespace = %access_config.default_namespace,
        trust_tenant_header = access_config.trust_tenant_header,
        "initializing event access service",
    );

    let http_config = build_http_config(&access_config);
    let provider = Arc::new(KeystackAccess::new(
        access_config,
        Arc::new(InMemoryRecordStore::new()),
    ));
    spawn_cache_purger(Arc::clone(&provider));

    let handler = KeystackAccessHandler::new(provider);
    let gateway = GatewayService::new(AccessHttpService::new(Arc::new(handler), http_config));

    let addr: SocketAddr = config
        .gateway_listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.gateway_listen))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(%addr, version = VERSION, "starting Keystack Server");

    serve(listener, gateway).await
}
