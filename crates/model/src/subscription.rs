use bson::oid::ObjectId;
use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    errors::DataError,
    notification::{Notification, NotificationKey},
    platform::Platform,
    user::User,
};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserSubscription {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user_id: ObjectId,
    pub platform_id: ObjectId,
    pub started_date: NaiveDate,
    pub payment_method: String,
    /// Months between two charges.
    pub period: u32,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub account_pw: Option<String>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
    #[serde(default, with = "crate::datetime::optional")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl UserSubscription {
    pub fn new(
        user_id: ObjectId,
        platform_id: ObjectId,
        started_date: NaiveDate,
        payment_method: String,
        period: u32,
    ) -> Self {
        let now = Utc::now();
        UserSubscription {
            id: ObjectId::new(),
            user_id,
            platform_id,
            started_date,
            payment_method,
            period,
            account_id: None,
            account_pw: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Billing cadence state of one subscription.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SubscriptionHistory {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user_subscription_id: ObjectId,
    pub next_pay_at: NaiveDate,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl SubscriptionHistory {
    pub fn new(user_subscription_id: ObjectId, next_pay_at: NaiveDate) -> Self {
        let now = Utc::now();
        SubscriptionHistory {
            id: ObjectId::new(),
            user_subscription_id,
            next_pay_at,
            created_at: now,
            updated_at: now,
        }
    }
}

/// The day a reminder should go out: one calendar day before payment.
pub fn notify_date(pay_date: NaiveDate) -> Option<NaiveDate> {
    pay_date.pred_opt()
}

/// Calendar month addition. The day of month is clamped to the length of the
/// target month, so Jan 31 + 1 month is the last day of February.
pub fn next_pay_date(pay_date: NaiveDate, period: u32) -> Option<NaiveDate> {
    pay_date.checked_add_months(Months::new(period))
}

#[derive(Debug, Clone)]
pub struct SubscriptionRelations {
    pub subscription: UserSubscription,
    pub user: Option<User>,
    pub platform: Option<Platform>,
}

/// A history row with its owning subscription, user and platform loaded.
#[derive(Debug, Clone)]
pub struct HistoryWithRelations {
    pub history: SubscriptionHistory,
    pub subscription: Option<SubscriptionRelations>,
}

impl HistoryWithRelations {
    /// Classifies the row against `today`: [`Reminder::Due`] on its notify
    /// date, [`Reminder::Missed`] once that date has passed and the due date
    /// was never advanced.
    pub fn reminder(&self, today: NaiveDate) -> Result<Option<Reminder>, DataError> {
        let history = &self.history;
        let relations = self
            .subscription
            .as_ref()
            .ok_or(DataError::MissingSubscription { history: history.id })?;
        let subscription = &relations.subscription;
        if subscription.is_deleted() {
            return Err(DataError::SubscriptionDeleted {
                subscription: subscription.id,
            });
        }
        let user = relations.user.as_ref().ok_or(DataError::MissingUser {
            subscription: subscription.id,
        })?;
        let platform = relations
            .platform
            .as_ref()
            .ok_or(DataError::MissingPlatform {
                subscription: subscription.id,
            })?;
        if subscription.period == 0 {
            return Err(DataError::ZeroPeriod {
                subscription: subscription.id,
            });
        }

        let pay_date = history.next_pay_at;
        let overflow = DataError::DateOverflow {
            history: history.id,
            date: pay_date,
        };
        let notify_at = notify_date(pay_date).ok_or(overflow.clone())?;
        if notify_at > today {
            return Ok(None);
        }
        let due = DuePayment {
            history_id: history.id,
            user_subscription_id: subscription.id,
            user_id: subscription.user_id,
            nickname: user.nickname.clone(),
            platform_title: platform.title.clone(),
            pay_date,
            next_pay_at: next_pay_date(pay_date, subscription.period).ok_or(overflow)?,
        };
        Ok(Some(if notify_at == today {
            Reminder::Due(due)
        } else {
            Reminder::Missed(due)
        }))
    }

    pub fn nickname(&self) -> Option<&str> {
        self.subscription
            .as_ref()
            .and_then(|s| s.user.as_ref())
            .map(|u| u.nickname.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reminder {
    /// `today` is the notify date: remind and advance.
    Due(DuePayment),
    /// The notify date has passed. Only advance if the reminder went out.
    Missed(DuePayment),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuePayment {
    pub history_id: ObjectId,
    pub user_subscription_id: ObjectId,
    pub user_id: ObjectId,
    pub nickname: String,
    pub platform_title: String,
    pub pay_date: NaiveDate,
    pub next_pay_at: NaiveDate,
}

impl DuePayment {
    pub fn notification(&self) -> Notification {
        Notification::payment_due(self)
    }

    pub fn key(&self) -> NotificationKey {
        NotificationKey::PaymentDue {
            history_id: self.history_id,
            pay_date: self.pay_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(next_pay_at: NaiveDate, period: u32) -> HistoryWithRelations {
        let user = User::new("neo".to_owned());
        let platform = Platform::new("Netflix".to_owned());
        let subscription = UserSubscription::new(
            user.id,
            platform.id,
            date(2024, 1, 11),
            "card".to_owned(),
            period,
        );
        HistoryWithRelations {
            history: SubscriptionHistory::new(subscription.id, next_pay_at),
            subscription: Some(SubscriptionRelations {
                subscription,
                user: Some(user),
                platform: Some(platform),
            }),
        }
    }

    #[test]
    fn test_notify_date() {
        assert_eq!(notify_date(date(2024, 6, 11)), Some(date(2024, 6, 10)));
        assert_eq!(notify_date(date(2024, 3, 1)), Some(date(2024, 2, 29)));
        assert_eq!(notify_date(date(2024, 1, 1)), Some(date(2023, 12, 31)));
    }

    #[test]
    fn test_next_pay_date_clamps_to_month_end() {
        assert_eq!(next_pay_date(date(2024, 1, 31), 1), Some(date(2024, 2, 29)));
        assert_eq!(next_pay_date(date(2023, 1, 31), 1), Some(date(2023, 2, 28)));
        assert_eq!(next_pay_date(date(2024, 8, 31), 3), Some(date(2024, 11, 30)));
        assert_eq!(next_pay_date(date(2024, 6, 11), 1), Some(date(2024, 7, 11)));
        assert_eq!(next_pay_date(date(2024, 11, 15), 12), Some(date(2025, 11, 15)));
    }

    #[test]
    fn test_reminder() {
        let row = row(date(2024, 6, 11), 1);
        let Some(Reminder::Due(due)) = row.reminder(date(2024, 6, 10)).unwrap() else {
            panic!("expected a due reminder");
        };
        assert_eq!(due.history_id, row.history.id);
        assert_eq!(due.pay_date, date(2024, 6, 11));
        assert_eq!(due.next_pay_at, date(2024, 7, 11));
        assert_eq!(due.nickname, "neo");
        assert_eq!(due.platform_title, "Netflix");
    }

    #[test]
    fn test_not_due() {
        let row = row(date(2024, 6, 15), 1);
        assert_eq!(row.reminder(date(2024, 6, 10)), Ok(None));
        assert_eq!(row.reminder(date(2024, 6, 13)), Ok(None));
    }

    #[test]
    fn test_missed_notify_date() {
        let row = row(date(2024, 6, 11), 1);
        // the due day itself is too late for a fresh reminder
        let Some(Reminder::Missed(missed)) = row.reminder(date(2024, 6, 11)).unwrap() else {
            panic!("expected a missed reminder");
        };
        assert_eq!(missed.pay_date, date(2024, 6, 11));
        assert_eq!(missed.next_pay_at, date(2024, 7, 11));
        assert_eq!(
            missed.key(),
            NotificationKey::PaymentDue {
                history_id: row.history.id,
                pay_date: date(2024, 6, 11),
            }
        );
        assert!(matches!(
            row.reminder(date(2024, 8, 1)),
            Ok(Some(Reminder::Missed(_)))
        ));
    }

    #[test]
    fn test_broken_rows() {
        let mut zero = row(date(2024, 6, 11), 0);
        let sub_id = zero.subscription.as_ref().unwrap().subscription.id;
        assert_eq!(
            zero.reminder(date(2024, 6, 10)),
            Err(DataError::ZeroPeriod {
                subscription: sub_id
            })
        );

        zero.subscription.as_mut().unwrap().platform = None;
        assert_eq!(
            zero.reminder(date(2024, 6, 10)),
            Err(DataError::MissingPlatform {
                subscription: sub_id
            })
        );

        let mut deleted = row(date(2024, 6, 11), 1);
        deleted.subscription.as_mut().unwrap().subscription.deleted_at =
            Some(Utc::now());
        assert!(matches!(
            deleted.reminder(date(2024, 6, 10)),
            Err(DataError::SubscriptionDeleted { .. })
        ));

        let orphan = HistoryWithRelations {
            subscription: None,
            ..row(date(2024, 6, 11), 1)
        };
        assert_eq!(
            orphan.reminder(date(2024, 6, 10)),
            Err(DataError::MissingSubscription {
                history: orphan.history.id
            })
        );
    }
}
