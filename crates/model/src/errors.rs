use bson::oid::ObjectId;
use chrono::NaiveDate;
use thiserror::Error;

/// A subscription history row that can not be processed as stored.
///
/// These never abort a job run: the row is logged and skipped, and will be
/// looked at again on the next tick.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    #[error("Subscription history {history} has no subscription")]
    MissingSubscription { history: ObjectId },
    #[error("Subscription {subscription} has no user")]
    MissingUser { subscription: ObjectId },
    #[error("Subscription {subscription} has no platform")]
    MissingPlatform { subscription: ObjectId },
    #[error("Subscription {subscription} is deleted")]
    SubscriptionDeleted { subscription: ObjectId },
    #[error("Subscription {subscription} has zero billing period")]
    ZeroPeriod { subscription: ObjectId },
    #[error("Date out of range: {date} (history {history})")]
    DateOverflow { history: ObjectId, date: NaiveDate },
}
