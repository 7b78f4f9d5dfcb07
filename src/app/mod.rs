pub mod serve;

// re-export
pub use serve::serve;

use std::{net::SocketAddr, sync::Arc};

use derive_more::Deref;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::{config::AppConfig, MarketingClient, Result};

// ###################################
// ->  Structs
// ###################################
pub struct App {
    pub app_state: AppState,
    pub listener: TcpListener,
}
impl App {
    pub fn new(app_state: AppState, listener: TcpListener) -> Self {
        App {
            app_state,
            listener,
        }
    }

    /// Validates the marketing credentials once and binds the listener.
    /// Missing credentials don't stop the server: the error is logged and every signup
    /// is answered with a configuration error without contacting the platform.
    pub async fn build_from_config(config: AppConfig) -> Result<Self> {
        let marketing_config = config.marketing_config;

        let marketing_client = match marketing_config.credentials() {
            Ok(credentials) => Some(MarketingClient::new(
                &marketing_config.base_url,
                credentials,
                marketing_config.api_revision.clone(),
                marketing_config.timeout(),
            )?),
            Err(er) => {
                error!("{:<20} - {er}; signups will be rejected", "Marketing config:");
                None
            }
        };

        let app_state = AppState::new(marketing_client, marketing_config.source);

        let addr = SocketAddr::from((config.net_config.host, config.net_config.app_port));
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        info!("{:<20} - {}", "Listening on:", addr);

        let app = App::new(app_state, listener);
        Ok(app)
    }
}

pub struct InternalState {
    /// `None` when the marketing credentials failed validation at startup.
    pub marketing_client: Option<MarketingClient>,
    pub source: String,
}

/// Application state containing all global data.
/// It implements `Deref` to easily access the fields on `InternalState`
/// Uses an `Arc` so it can be cloned around.
#[derive(Clone, Deref)]
pub struct AppState(Arc<InternalState>);

impl AppState {
    pub fn new(marketing_client: Option<MarketingClient>, source: String) -> Self {
        AppState(Arc::new(InternalState {
            marketing_client,
            source,
        }))
    }
}
