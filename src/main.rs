mod config;
mod db;
mod frame;
mod push;
mod routes;
mod services;
mod state;

use std::sync::Arc;

use services::store::ChatStore;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = config::ServerConfig::from_env().expect("invalid server configuration");

    let store: Arc<dyn ChatStore> = match &config.database_url {
        Some(url) => {
            let pool = db::init_pool(url, config.db_max_connections)
                .await
                .expect("database init failed");
            Arc::new(services::pg_store::PgChatStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory chat store, data is lost on restart");
            Arc::new(services::memory_store::MemoryChatStore::new())
        }
    };

    // Push is optional: live socket delivery works without it.
    let push: Option<Arc<dyn push::PushSender>> = match push::PushClient::from_env() {
        Ok(client) => {
            tracing::info!(endpoint = client.endpoint(), "push client initialized");
            Some(Arc::new(client))
        }
        Err(e) => {
            tracing::warn!(error = %e, "push not configured; push notifications disabled");
            None
        }
    };

    let state = state::AppState::new(store, push).with_ws_client_buffer(config.ws_client_buffer);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .expect("failed to bind");

    tracing::info!(port = config.port, "jammit listening");
    axum::serve(listener, app).await.expect("server failed");
}
