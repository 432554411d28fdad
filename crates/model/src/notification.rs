use bson::oid::ObjectId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::subscription::DuePayment;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Notification {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user_id: ObjectId,
    pub user_subscription_id: ObjectId,
    pub subscription_history_id: ObjectId,
    pub title: String,
    pub is_read: bool,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "crate::datetime::optional")]
    pub read_at: Option<DateTime<Utc>>,
    dedup_key: String,
}

impl Notification {
    pub fn payment_due(due: &DuePayment) -> Notification {
        Notification {
            id: ObjectId::new(),
            user_id: due.user_id,
            user_subscription_id: due.user_subscription_id,
            subscription_history_id: due.history_id,
            title: payment_due_title(&due.nickname, &due.platform_title),
            is_read: false,
            created_at: Utc::now(),
            read_at: None,
            dedup_key: NotificationKey::PaymentDue {
                history_id: due.history_id,
                pay_date: due.pay_date,
            }
            .encode(),
        }
    }

    pub fn dedup_key(&self) -> &str {
        &self.dedup_key
    }
}

pub fn payment_due_title(nickname: &str, platform_title: &str) -> String {
    format!("{} {} payment due in 1 day.", nickname, platform_title)
}

/// Identity of the event a notification was created for. At most one
/// notification exists per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKey {
    PaymentDue {
        history_id: ObjectId,
        pay_date: NaiveDate,
    },
}

impl NotificationKey {
    pub fn encode(&self) -> String {
        match self {
            NotificationKey::PaymentDue {
                history_id,
                pay_date,
            } => format!("{}:{}", history_id.to_hex(), pay_date.format("%Y-%m-%d")),
        }
    }
}
