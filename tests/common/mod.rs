//! Shared harness for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use waitlist_api::config::ApiConfig;
use waitlist_api::http::HttpServer;
use waitlist_api::lifecycle::Shutdown;
use waitlist_api::store::Store;

/// A server instance running against its own temporary database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub db_path: String,
    pub shutdown: Shutdown,
    /// Feeds the server's config applier, standing in for the file watcher.
    pub config_updates: mpsc::UnboundedSender<ApiConfig>,
    _db_dir: TempDir,
}

impl TestApp {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Defaults with the limiter opened wide, so only tests that tighten
/// it ever hit 429.
pub fn test_config() -> ApiConfig {
    let mut config = ApiConfig::default();
    config.rate_limit.limit = 10_000;
    config.observability.metrics_enabled = false;
    config
}

/// Spawn the server on an ephemeral port with a fresh database file.
pub async fn spawn_app(mut config: ApiConfig) -> TestApp {
    let db_dir = tempfile::tempdir().expect("create temp dir");
    let db_path = db_dir
        .path()
        .join("waitlist.db")
        .to_string_lossy()
        .into_owned();
    config.database.path = db_path.clone();

    let store = Store::open(&config.database.path, config.database.max_connections)
        .await
        .expect("open store");

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
    let addr = listener.local_addr().expect("local addr");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let (config_tx, config_rx) = mpsc::unbounded_channel();

    let server = HttpServer::new(config, store);
    tokio::spawn(async move {
        let _ = server.run(listener, config_rx, server_shutdown).await;
    });

    wait_until_ready(addr).await;

    TestApp {
        addr,
        db_path,
        shutdown,
        config_updates: config_tx,
        _db_dir: db_dir,
    }
}

/// Client with pooling off, so every request opens a fresh connection.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .expect("build client")
}

/// Second handle onto a test app's database, for direct assertions.
pub async fn open_test_db(db_path: &str) -> sqlx::SqlitePool {
    sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&format!("sqlite:{db_path}"))
        .await
        .expect("open test db")
}

async fn wait_until_ready(addr: SocketAddr) {
    for _ in 0..100 {
        if tokio::net::TcpStream::connect(addr).await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("server at {addr} never became ready");
}
