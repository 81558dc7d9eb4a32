pub mod db_init;

pub mod alerts_service;
pub mod gateway;
pub mod mailer;
pub mod notifier;
pub mod notify_queue;
