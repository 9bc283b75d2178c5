use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use ::common::{IdentityHash, IdentityHasher};
use reqwest::{Certificate, Client};
use serde_json::Value;
use tempfile::TempDir;

use linkboard::config::{
    AppConfig, DatabaseConfig, IdentityConfig, LimitsConfig, RedirectConfig, ServerConfig,
    TlsConfig,
};
use linkboard::models::link::{LinkDraft, LinkResponse};
use linkboard::state::AppState;
use linkboard::store::LinkStore;

pub const PEPPER: &str = "test-pepper-for-integration-tests";
pub const INDEX_HTML: &str = "<!doctype html><title>linkboard</title>";

pub mod routes {
    pub const LINKS: &str = "/api/v1/links";
    pub const NEW_LINK: &str = "/api/v1/newlink";
    pub const EDIT_LINK: &str = "/api/v1/editlink";
    pub const DELETE_LINK: &str = "/api/v1/deletelink";
    pub const DELETE_ALL: &str = "/api/v1/deleteall";
}

/// Client addresses used to play different submitters.
pub mod ips {
    pub const ALICE: &str = "203.0.113.10";
    pub const BOB: &str = "203.0.113.20";
    pub const CAROL: &str = "2001:db8::30";
}

/// A running test server backed by its own SQLite file.
pub struct TestApp {
    pub addr: SocketAddr,
    scheme: &'static str,
    pub client: Client,
    pub store: LinkStore,
    pub hasher: IdentityHasher,
    _dir: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

/// Key, certificate and CA checked into `tests/fixtures/tls`. The certificate
/// is issued by the CA for `localhost` and `127.0.0.1`.
pub fn fixture_tls() -> TlsConfig {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/tls");
    TlsConfig {
        key: dir.join("key.pem"),
        cert: dir.join("cert.pem"),
        ca: dir.join("ca.pem"),
    }
}

/// HTTPS client trusting the fixture CA, optionally bound to a local address.
pub fn tls_client(local: Option<IpAddr>) -> Client {
    let ca = std::fs::read(fixture_tls().ca).expect("read fixture CA");
    Client::builder()
        .add_root_certificate(Certificate::from_pem(&ca).expect("parse fixture CA"))
        .local_address(local)
        .build()
        .expect("build TLS client")
}

pub fn test_config(dir: &TempDir) -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            static_dir: dir.path().join("static"),
            trust_proxy_headers: true,
            body_limit: 16 * 1024,
        },
        tls: fixture_tls(),
        redirect: RedirectConfig {
            enabled: false,
            port: 0,
            https_port: 8443,
        },
        database: DatabaseConfig {
            url: format!("sqlite://{}?mode=rwc", dir.path().join("links.db").display()),
            max_connections: 5,
        },
        identity: IdentityConfig {
            pepper: PEPPER.to_string(),
        },
        limits: LimitsConfig::default(),
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    pub async fn spawn_with(customize: impl FnOnce(&mut AppConfig)) -> Self {
        Self::start(customize, false).await
    }

    /// Serve through the rustls acceptor, with a client trusting the fixture CA.
    pub async fn spawn_tls() -> Self {
        Self::spawn_tls_with(|_| {}).await
    }

    pub async fn spawn_tls_with(customize: impl FnOnce(&mut AppConfig)) -> Self {
        Self::start(customize, true).await
    }

    async fn start(customize: impl FnOnce(&mut AppConfig), tls: bool) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        std::fs::create_dir_all(dir.path().join("static/css")).expect("create static dir");
        std::fs::write(dir.path().join("static/index.html"), INDEX_HTML).expect("write index");
        std::fs::write(dir.path().join("static/css/site.css"), "body{}").expect("write css");

        let mut config = test_config(&dir);
        customize(&mut config);
        let tls_config = config.tls.clone();

        let db = linkboard::database::init_db(&config.database)
            .await
            .expect("Failed to initialize test database");
        let store = LinkStore::new(db);
        let hasher = IdentityHasher::new(config.identity.pepper.clone());

        let app = linkboard::build_router(AppState::new(config, store.clone()))
            .into_make_service_with_connect_info::<SocketAddr>();

        let (addr, client, scheme) = if tls {
            let rustls = linkboard::tls::load_rustls_config(&tls_config)
                .await
                .expect("Failed to load fixture TLS files");
            let handle = axum_server::Handle::new();
            let server = axum_server::bind_rustls("127.0.0.1:0".parse().unwrap(), rustls)
                .handle(handle.clone());
            tokio::spawn(async move { server.serve(app).await.unwrap() });
            let addr = handle.listening().await.expect("TLS server failed to bind");
            (addr, tls_client(None), "https")
        } else {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("Failed to bind to random port");
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
            (addr, Client::new(), "http")
        };

        Self {
            addr,
            scheme,
            client,
            store,
            hasher,
            _dir: dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}://{}{}", self.scheme, self.addr, path)
    }

    pub fn identity(&self, ip: &str) -> IdentityHash {
        self.hasher.hash(ip)
    }

    pub async fn get_as(&self, path: &str, ip: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .header("X-Forwarded-For", ip)
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn post_as(&self, path: &str, body: &Value, ip: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("X-Forwarded-For", ip)
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn put_as(&self, path: &str, body: &Value, ip: &str) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .header("X-Forwarded-For", ip)
            .json(body)
            .send()
            .await
            .expect("Failed to send PUT request");

        TestResponse::from_response(res).await
    }

    pub async fn post_raw_as(
        &self,
        path: &str,
        content_type: &str,
        body: &'static str,
        ip: &str,
    ) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("X-Forwarded-For", ip)
            .header("Content-Type", content_type)
            .body(body)
            .send()
            .await
            .expect("Failed to send raw POST request");

        TestResponse::from_response(res).await
    }

    /// Create a link via the API and return the stored projection.
    pub async fn create_link(&self, ip: &str, link: &str, description: &str) -> LinkResponse {
        let res = self
            .post_as(
                routes::NEW_LINK,
                &serde_json::json!({ "link": link, "description": description }),
                ip,
            )
            .await;
        assert_eq!(res.status, 200, "create_link failed: {}", res.text);
        serde_json::from_value(res.body.clone())
            .unwrap_or_else(|_| panic!("create_link returned no link: {}", res.text))
    }

    /// Insert `n` notes for `ip` straight into the store.
    pub async fn seed_links(&self, ip: &str, n: usize) {
        let identity = self.identity(ip);
        for i in 0..n {
            let draft = LinkDraft::from_input(
                &identity,
                Some(format!("seeded note {i}")),
                Some(String::new()),
            )
            .expect("valid draft");
            self.store.insert(draft).await.expect("seed insert");
        }
    }

    pub async fn count_for(&self, ip: &str) -> u64 {
        self.store
            .count_by_identity(&self.identity(ip))
            .await
            .expect("count query")
    }

    pub async fn list_for(&self, ip: &str) -> Vec<LinkResponse> {
        let res = self.get_as(routes::LINKS, ip).await;
        assert_eq!(res.status, 200, "list failed: {}", res.text);
        serde_json::from_value(res.body).expect("list should be an array of links")
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }

    /// The uniform failure answer: `200` with a literal `null` body.
    pub fn assert_null(&self) {
        assert_eq!(self.status, 200, "unexpected status: {}", self.text);
        assert_eq!(self.text, "null", "expected null body, got {}", self.text);
    }
}
