use std::{env::var, sync::Arc};

use dotenv::dotenv;
use eyre::{Context, Error};
use log::info;

const DEFAULT_RUST_LOG: &str = "info";

#[derive(Clone)]
pub struct Env(Arc<EnvInner>);

#[derive(Clone)]
pub struct EnvInner {
    mongo_url: String,
    rust_log: String,
    payment_notifier_schedule: Option<String>,
    rating_schedule: Option<String>,
}

impl Env {
    pub fn mongo_url(&self) -> &str {
        &self.0.mongo_url
    }

    pub fn rust_log(&self) -> &str {
        &self.0.rust_log
    }

    /// Overrides the payment notifier trigger, e.g. `every day at 09:00`.
    pub fn payment_notifier_schedule(&self) -> Option<&str> {
        self.0.payment_notifier_schedule.as_deref()
    }

    /// Overrides the rating trigger, e.g. `every 6 hours`.
    pub fn rating_schedule(&self) -> Option<&str> {
        self.0.rating_schedule.as_deref()
    }

    pub fn load() -> Result<Env, Error> {
        if let Err(err) = dotenv() {
            info!("Failed to load .env file: {}", err);
        }

        Ok(Env(Arc::new(EnvInner {
            mongo_url: var("MONGO_URL").context("MONGO_URL is not set")?,
            rust_log: var("RUST_LOG").unwrap_or_else(|_| DEFAULT_RUST_LOG.to_owned()),
            payment_notifier_schedule: var("PAYMENT_NOTIFIER_SCHEDULE").ok(),
            rating_schedule: var("RATING_SCHEDULE").ok(),
        })))
    }
}
