use crate::{store::JobStore, Task};
use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use eyre::{Context as _, Error};
use log::{debug, info, warn};
use model::{
    errors::DataError,
    subscription::{DuePayment, Reminder},
};
use std::sync::Arc;

/// Creates "payment due tomorrow" notifications and rolls due dates forward.
#[derive(Clone)]
pub struct PaymentNotifier {
    store: Arc<dyn JobStore>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PaymentReport {
    pub scanned: usize,
    pub notified: usize,
    /// Due rows whose notification survived an earlier, interrupted run.
    pub already_notified: usize,
    /// Rows past their notify date that were reminded but never advanced.
    pub recovered: usize,
    pub skipped: usize,
}

#[async_trait]
impl Task for PaymentNotifier {
    const NAME: &'static str = "payment_notifier";
    const SCHEDULE: &'static str = "every day at 00:00";

    async fn process(&mut self) -> Result<(), Error> {
        let today = Local::now().date_naive();
        let report = self.notify(today).await?;
        info!("Payment reminders for {}: {:?}", today, report);
        Ok(())
    }
}

impl PaymentNotifier {
    pub fn new(store: Arc<dyn JobStore>) -> PaymentNotifier {
        PaymentNotifier { store }
    }

    pub async fn notify(&self, today: NaiveDate) -> Result<PaymentReport, Error> {
        let histories = self
            .store
            .subscription_histories_with_relations()
            .await
            .context("load subscription histories")?;

        let mut report = PaymentReport {
            scanned: histories.len(),
            ..Default::default()
        };
        for row in histories {
            match row.reminder(today) {
                Ok(Some(Reminder::Due(due))) => {
                    if self.remind(&due).await? {
                        report.notified += 1;
                    } else {
                        report.already_notified += 1;
                    }
                }
                Ok(Some(Reminder::Missed(due))) => {
                    if self.recover(&due).await? {
                        report.recovered += 1;
                    }
                }
                Ok(None) => {
                    debug!(
                        "{}: no reminder today for history {} (due {})",
                        row.nickname().unwrap_or_default(),
                        row.history.id,
                        row.history.next_pay_at
                    );
                }
                Err(err @ DataError::SubscriptionDeleted { .. }) => {
                    debug!("Skip history {}: {}", row.history.id, err);
                    report.skipped += 1;
                }
                Err(err) => {
                    warn!("Skip history {}: {}", row.history.id, err);
                    report.skipped += 1;
                }
            }
        }
        Ok(report)
    }

    /// Returns false if the notification already existed.
    async fn remind(&self, due: &DuePayment) -> Result<bool, Error> {
        let notification = due.notification();
        let created = if self.store.has_notification(notification.dedup_key()).await? {
            warn!(
                "Notification {} already exists, advancing due date only",
                notification.dedup_key()
            );
            false
        } else {
            let notification = self
                .store
                .create_notification(notification)
                .await
                .context("create notification")?;
            info!("Notification created: {}", notification.title);
            true
        };

        self.store
            .update_next_pay_at(due.history_id, due.next_pay_at)
            .await
            .with_context(|| format!("advance history {}", due.history_id))?;
        Ok(created)
    }

    /// Advances a row whose notify date passed while its reminder was already
    /// stored. Rows that were never reminded are left alone.
    async fn recover(&self, due: &DuePayment) -> Result<bool, Error> {
        let key = due.key().encode();
        if !self.store.has_notification(&key).await? {
            debug!(
                "History {} missed its reminder for {}",
                due.history_id, due.pay_date
            );
            return Ok(false);
        }
        info!(
            "Advancing history {} to {} after notification {}",
            due.history_id, due.next_pay_at, key
        );
        self.store
            .update_next_pay_at(due.history_id, due.next_pay_at)
            .await
            .with_context(|| format!("advance history {}", due.history_id))?;
        Ok(true)
    }
}
