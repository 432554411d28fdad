use std::sync::Arc;

use async_trait::async_trait;
use chrono::Local;
use env::Env;
use eyre::{eyre, Context as _, Error, Result};
use log::{error, info, warn};
use process::{payment::PaymentNotifier, rating::RatingBg};
use storage::Storage;
use store::JobStore;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use trigger::Trigger;

pub mod process;
pub mod store;
pub mod trigger;

#[async_trait]
pub trait Task {
    const NAME: &'static str;
    /// Default trigger, see [`Trigger`] for the syntax.
    const SCHEDULE: &'static str;

    async fn process(&mut self) -> Result<(), Error>;
}

pub struct Schedules<'a> {
    pub payment_notifier: Option<&'a str>,
    pub rating: Option<&'a str>,
}

impl<'a> From<&'a Env> for Schedules<'a> {
    fn from(env: &'a Env) -> Self {
        Schedules {
            payment_notifier: env.payment_notifier_schedule(),
            rating: env.rating_schedule(),
        }
    }
}

pub async fn start(storage: Storage, schedules: Schedules<'_>) -> Result<JobScheduler> {
    let store: Arc<dyn JobStore> = Arc::new(storage);
    let scheduler = JobScheduler::new().await?;

    register(
        &scheduler,
        PaymentNotifier::new(store.clone()),
        schedules.payment_notifier,
    )
    .await?;
    register(&scheduler, RatingBg::new(store), schedules.rating).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

async fn register<T: Task + Send + 'static>(
    scheduler: &JobScheduler,
    task: T,
    schedule: Option<&str>,
) -> Result<()> {
    let trigger: Trigger = schedule
        .unwrap_or(T::SCHEDULE)
        .parse()
        .with_context(|| format!("Invalid schedule of {}", T::NAME))?;
    let task = Arc::new(Mutex::new(task));

    let job = match trigger {
        Trigger::Every(period) => Job::new_repeated_async(period, move |_uuid, _lock| {
            let task = task.clone();
            Box::pin(async move { tick(task).await })
        })?,
        Trigger::DailyAt(_) => {
            let cron = trigger
                .cron()
                .ok_or_else(|| eyre!("No cron expression for {}", trigger))?;
            Job::new_async_tz(cron.as_str(), Local, move |_uuid, _lock| {
                let task = task.clone();
                Box::pin(async move { tick(task).await })
            })?
        }
    };
    scheduler.add(job).await?;
    info!("Task {} scheduled {}", T::NAME, trigger);
    Ok(())
}

/// One scheduled run. A tick that arrives while the previous run is still in
/// progress is dropped.
async fn tick<T: Task>(task: Arc<Mutex<T>>) {
    let Ok(mut task) = task.try_lock() else {
        warn!("Task {} is still running, skipping tick", T::NAME);
        return;
    };
    info!("Running task {}", T::NAME);
    if let Err(err) = task.process().await {
        error!("Task {} failed: {:#}", T::NAME, err);
    }
}
