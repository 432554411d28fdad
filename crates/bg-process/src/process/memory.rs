use std::collections::HashMap;

use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::{NaiveDate, Utc};
use eyre::{bail, eyre, Result};
use model::{
    notification::Notification,
    platform::{Platform, Review, ReviewWithPlatform},
    subscription::{
        HistoryWithRelations, SubscriptionHistory, SubscriptionRelations, UserSubscription,
    },
    user::User,
};
use parking_lot::Mutex;

use crate::store::JobStore;

/// In-memory stand-in for the Mongo storage.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<ObjectId, User>,
    platforms: HashMap<ObjectId, Platform>,
    subscriptions: HashMap<ObjectId, UserSubscription>,
    histories: Vec<SubscriptionHistory>,
    notifications: Vec<Notification>,
    reviews: Vec<Review>,
    fail_history_updates: bool,
}

impl MemoryStore {
    pub fn add_platform(&self, title: &str, rating: Option<i32>) -> ObjectId {
        let mut platform = Platform::new(title.to_owned());
        platform.rating = rating;
        let id = platform.id;
        self.inner.lock().platforms.insert(id, platform);
        id
    }

    pub fn add_review(&self, platform_id: ObjectId, rate: i32) {
        self.inner
            .lock()
            .reviews
            .push(Review::new(platform_id, ObjectId::new(), rate));
    }

    /// User, platform, subscription and one history row. Returns the history id.
    pub fn subscribe(
        &self,
        nickname: &str,
        platform: &str,
        period: u32,
        next_pay_at: NaiveDate,
    ) -> ObjectId {
        let platform_id = self.add_platform(platform, None);
        let user = User::new(nickname.to_owned());
        let subscription = UserSubscription::new(
            user.id,
            platform_id,
            next_pay_at,
            "card".to_owned(),
            period,
        );
        let history = SubscriptionHistory::new(subscription.id, next_pay_at);
        let history_id = history.id;

        let mut inner = self.inner.lock();
        inner.users.insert(user.id, user);
        inner.subscriptions.insert(subscription.id, subscription);
        inner.histories.push(history);
        history_id
    }

    /// Another history row for the subscription owning `history_id`.
    pub fn add_history_like(&self, history_id: ObjectId, next_pay_at: NaiveDate) -> ObjectId {
        let mut inner = self.inner.lock();
        let subscription_id = inner
            .histories
            .iter()
            .find(|h| h.id == history_id)
            .map(|h| h.user_subscription_id)
            .unwrap();
        let history = SubscriptionHistory::new(subscription_id, next_pay_at);
        let id = history.id;
        inner.histories.push(history);
        id
    }

    pub fn orphan_history(&self, next_pay_at: NaiveDate) -> ObjectId {
        let history = SubscriptionHistory::new(ObjectId::new(), next_pay_at);
        let id = history.id;
        self.inner.lock().histories.push(history);
        id
    }

    pub fn delete_subscription_of(&self, history_id: ObjectId) {
        let mut inner = self.inner.lock();
        let subscription_id = inner
            .histories
            .iter()
            .find(|h| h.id == history_id)
            .map(|h| h.user_subscription_id)
            .unwrap();
        if let Some(subscription) = inner.subscriptions.get_mut(&subscription_id) {
            subscription.deleted_at = Some(Utc::now());
        }
    }

    pub fn fail_history_updates(&self, fail: bool) {
        self.inner.lock().fail_history_updates = fail;
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.inner.lock().notifications.clone()
    }

    pub fn next_pay_at(&self, history_id: ObjectId) -> NaiveDate {
        self.inner
            .lock()
            .histories
            .iter()
            .find(|h| h.id == history_id)
            .map(|h| h.next_pay_at)
            .unwrap()
    }

    pub fn rating(&self, platform_id: ObjectId) -> Option<i32> {
        self.inner.lock().platforms[&platform_id].rating
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn subscription_histories_with_relations(&self) -> Result<Vec<HistoryWithRelations>> {
        let inner = self.inner.lock();
        Ok(inner
            .histories
            .iter()
            .map(|history| HistoryWithRelations {
                history: history.clone(),
                subscription: inner.subscriptions.get(&history.user_subscription_id).map(
                    |subscription| SubscriptionRelations {
                        subscription: subscription.clone(),
                        user: inner.users.get(&subscription.user_id).cloned(),
                        platform: inner.platforms.get(&subscription.platform_id).cloned(),
                    },
                ),
            })
            .collect())
    }

    async fn has_notification(&self, dedup_key: &str) -> Result<bool> {
        Ok(self
            .inner
            .lock()
            .notifications
            .iter()
            .any(|n| n.dedup_key() == dedup_key))
    }

    async fn create_notification(&self, notification: Notification) -> Result<Notification> {
        let mut inner = self.inner.lock();
        if inner
            .notifications
            .iter()
            .any(|n| n.dedup_key() == notification.dedup_key())
        {
            bail!("duplicate key {}", notification.dedup_key());
        }
        inner.notifications.push(notification.clone());
        Ok(notification)
    }

    async fn update_next_pay_at(&self, history_id: ObjectId, next_pay_at: NaiveDate) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.fail_history_updates {
            bail!("storage is unavailable");
        }
        let history = inner
            .histories
            .iter_mut()
            .find(|h| h.id == history_id)
            .ok_or_else(|| eyre!("history {} not found", history_id))?;
        history.next_pay_at = next_pay_at;
        Ok(())
    }

    async fn reviews_with_platform(&self) -> Result<Vec<ReviewWithPlatform>> {
        let inner = self.inner.lock();
        Ok(inner
            .reviews
            .iter()
            .map(|review| ReviewWithPlatform {
                review: review.clone(),
                platform: inner.platforms.get(&review.platform_id).cloned(),
            })
            .collect())
    }

    async fn update_platform_rating(&self, platform_id: ObjectId, rating: i32) -> Result<()> {
        if let Some(platform) = self.inner.lock().platforms.get_mut(&platform_id) {
            platform.rating = Some(rating);
        }
        Ok(())
    }
}
