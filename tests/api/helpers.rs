//! Spawns the application against a `wiremock` stand-in for the marketing platform.
use std::{net::SocketAddr, sync::OnceLock};

use anyhow::Result;
use secrecy::SecretString;
use signup_forwarder::{
    config::{AppConfig, MarketingConfig, NetConfig},
    init_dbg_tracing, App,
};
use wiremock::MockServer;

pub const LIST_ID: &str = "Lst123";
pub const API_KEY: &str = "pk_test_key";

pub struct TestApp {
    pub addr: SocketAddr,
    pub http_client: reqwest::Client,
    pub marketing_server: MockServer,
}

/// Set `TEST_LOG` to see the application logs while running the tests.
fn init_test_subscriber() {
    static SUBSCRIBER: OnceLock<()> = OnceLock::new();
    SUBSCRIBER.get_or_init(|| {
        if std::env::var("TEST_LOG").is_ok() {
            init_dbg_tracing();
        }
    });
}

impl TestApp {
    /// Spawns the app with valid marketing credentials.
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with_credentials(Some(API_KEY), Some(LIST_ID)).await
    }

    /// A helper function that tries to spawn a separate task to serve our app.
    /// Binding *port 0* triggers an OS scan for an available port.
    pub async fn spawn_with_credentials(
        api_key: Option<&str>,
        list_id: Option<&str>,
    ) -> Result<Self> {
        init_test_subscriber();

        let marketing_server = MockServer::start().await;

        let config = AppConfig {
            net_config: NetConfig {
                host: [127, 0, 0, 1],
                app_port: 0,
            },
            marketing_config: MarketingConfig {
                base_url: marketing_server.uri(),
                api_key: api_key.map(|key| SecretString::from(key.to_string())),
                list_id: list_id.map(str::to_string),
                api_revision: "2024-10-15".to_string(),
                source: "website".to_string(),
                timeout_millis: 500,
            },
        };

        let app = App::build_from_config(config).await?;
        let addr = app.listener.local_addr()?;

        tokio::spawn(signup_forwarder::serve(app));

        Ok(TestApp {
            addr,
            http_client: reqwest::Client::new(),
            marketing_server,
        })
    }

    pub async fn post_subscribe(&self, body: &serde_json::Value) -> Result<reqwest::Response> {
        let res = self
            .http_client
            .post(format!("http://{}/api/subscribe", self.addr))
            .json(body)
            .send()
            .await?;
        Ok(res)
    }
}
