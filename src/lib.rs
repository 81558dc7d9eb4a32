//! Library entrypoint for the fund alert service.
//!
//! Integration tests under `tests/` import the app state, routers and
//! services from here.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod models;
pub mod store;

#[path = "middleware/auth.rs"]
pub mod auth;

pub mod services;
pub mod templates;

pub mod controllers;
pub mod routes;

use services::{
    mailer::Mailer,
    notifier::Notifier,
    notify_queue::{self, NotifyRx, NotifyTx},
};
use store::{AlertStore, TimedStore};

#[derive(Clone)]
pub struct AppState {
    pub settings: config::Settings,
    pub store: Arc<dyn AlertStore>,
    pub notifier: Notifier,
    pub notify_tx: NotifyTx,
}

impl AppState {
    /// Builds the state plus the receiving end of the notification queue,
    /// which the caller hands to `spawn_notification_worker`. Every store call
    /// is bounded by `settings.store_timeout`.
    pub fn new(
        settings: config::Settings,
        store: Arc<dyn AlertStore>,
        mailer: Arc<dyn Mailer>,
    ) -> Result<(Self, NotifyRx), handlebars::TemplateError> {
        let store: Arc<dyn AlertStore> = Arc::new(TimedStore::new(store, settings.store_timeout));
        let notifier = Notifier::new(mailer, templates::build_handlebars()?, settings.notify_timeout);
        let (notify_tx, notify_rx) = notify_queue::channel();

        let state = AppState {
            settings,
            store,
            notifier,
            notify_tx,
        };
        Ok((state, notify_rx))
    }
}
