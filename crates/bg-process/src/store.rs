use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::NaiveDate;
use eyre::Result;
use model::{
    notification::Notification, platform::ReviewWithPlatform,
    subscription::HistoryWithRelations,
};
use storage::Storage;

/// Storage operations the background tasks rely on.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Every history row with its subscription, user and platform joined.
    async fn subscription_histories_with_relations(&self) -> Result<Vec<HistoryWithRelations>>;
    async fn has_notification(&self, dedup_key: &str) -> Result<bool>;
    async fn create_notification(&self, notification: Notification) -> Result<Notification>;
    async fn update_next_pay_at(&self, history_id: ObjectId, next_pay_at: NaiveDate) -> Result<()>;
    async fn reviews_with_platform(&self) -> Result<Vec<ReviewWithPlatform>>;
    async fn update_platform_rating(&self, platform_id: ObjectId, rating: i32) -> Result<()>;
}

#[async_trait]
impl JobStore for Storage {
    async fn subscription_histories_with_relations(&self) -> Result<Vec<HistoryWithRelations>> {
        self.histories.with_relations().await
    }

    async fn has_notification(&self, dedup_key: &str) -> Result<bool> {
        self.notifications.has(dedup_key).await
    }

    async fn create_notification(&self, notification: Notification) -> Result<Notification> {
        self.notifications.insert(&notification).await?;
        Ok(notification)
    }

    async fn update_next_pay_at(&self, history_id: ObjectId, next_pay_at: NaiveDate) -> Result<()> {
        self.histories.set_next_pay_at(history_id, next_pay_at).await
    }

    async fn reviews_with_platform(&self) -> Result<Vec<ReviewWithPlatform>> {
        self.reviews.with_platform().await
    }

    async fn update_platform_rating(&self, platform_id: ObjectId, rating: i32) -> Result<()> {
        self.platforms.set_rating(platform_id, rating).await
    }
}
