use std::{env, time::Duration};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

/// How the creation path hands its notification event to the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyTransport {
    // background task calls the dispatcher in-process
    Inline,
    // background task POSTs to `{notify_base_url}/alerts/notify`
    Http,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub store: StoreBackend,
    pub mongodb_uri: String,
    pub mongodb_db: String,
    pub store_timeout: Duration,
    pub host: String,
    pub port: u16,

    pub jwt_secret: String,
    pub jwt_cookie_name: String,

    pub resend_api_key: String,
    pub resend_api_url: String,
    pub mail_from: String,

    pub notify_base_url: String,
    pub notify_transport: NotifyTransport,
    pub notify_timeout: Duration,
}

fn secs_var(name: &str, default: u64) -> Duration {
    let secs = env::var(name)
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|s| *s > 0)
        .unwrap_or(default);
    Duration::from_secs(secs)
}

pub fn load() -> Settings {
    // Loads .env if present (no crash if missing)
    dotenvy::dotenv().ok();

    let store = match env::var("STORE").unwrap_or_default().to_lowercase().as_str() {
        "memory" => StoreBackend::Memory,
        _ => StoreBackend::Mongo,
    };

    let mongodb_uri = env::var("MONGODB_URI")
        .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());

    let mongodb_db = env::var("MONGODB_DB")
        .unwrap_or_else(|_| "fundalerts".to_string());

    let host = env::var("HOST")
        .unwrap_or_else(|_| "127.0.0.1".to_string());

    let port = env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| "change-me-dev-secret".to_string());
    let jwt_cookie_name = env::var("JWT_COOKIE_NAME").unwrap_or_else(|_| "auth".to_string());

    let resend_api_key = env::var("RESEND_API_KEY").unwrap_or_default();
    let resend_api_url = env::var("RESEND_API_URL")
        .unwrap_or_else(|_| "https://api.resend.com".to_string());
    let mail_from = env::var("MAIL_FROM")
        .unwrap_or_else(|_| "Fund Alerts <alerts@example.com>".to_string());

    let notify_base_url = env::var("NOTIFY_BASE_URL")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "http://localhost:3000".to_string());

    let notify_transport = match env::var("NOTIFY_TRANSPORT").unwrap_or_default().to_lowercase().as_str() {
        "http" => NotifyTransport::Http,
        _ => NotifyTransport::Inline,
    };

    Settings {
        store,
        mongodb_uri,
        mongodb_db,
        store_timeout: secs_var("STORE_TIMEOUT_SECS", 8),
        host,
        port,
        jwt_secret,
        jwt_cookie_name,
        resend_api_key,
        resend_api_url,
        mail_from,
        notify_base_url,
        notify_transport,
        notify_timeout: secs_var("NOTIFY_TIMEOUT_SECS", 8),
    }
}
