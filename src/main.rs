use std::net::SocketAddr;
use std::sync::Arc;

use mongodb::{options::ClientOptions, Client};

use fundalerts::{
    config::{self, StoreBackend},
    routes,
    services::{db_init, mailer, notify_queue},
    store::{AlertStore, MemoryStore, MongoStore},
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let settings = config::load();

    let store: Arc<dyn AlertStore> = match settings.store {
        StoreBackend::Mongo => {
            let mut opts = ClientOptions::parse(&settings.mongodb_uri).await?;
            opts.connect_timeout = Some(settings.store_timeout);
            opts.server_selection_timeout = Some(settings.store_timeout);
            opts.app_name = Some("fundalerts".to_string());

            let client = Client::with_options(opts)?;
            let db = client.database(&settings.mongodb_db);

            if let Err(e) = db_init::ensure_indexes(&db).await {
                tracing::warn!(error = %e, "could not create alert indexes");
            }
            Arc::new(MongoStore::new(db))
        }
        StoreBackend::Memory => {
            tracing::warn!("using in-memory store; alerts are lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let mailer = mailer::from_settings(&settings);
    let (state, notify_rx) = AppState::new(settings.clone(), store, mailer)?;
    notify_queue::spawn_notification_worker(state.clone(), notify_rx);

    let app = routes::app(state);

    let addr = SocketAddr::from((settings.host.parse::<std::net::IpAddr>()?, settings.port));
    tracing::info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
