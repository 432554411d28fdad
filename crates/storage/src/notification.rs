use std::sync::Arc;

use crate::session::Db;
use bson::doc;
use eyre::Result;
use model::notification::Notification;
use mongodb::{options::IndexOptions, Collection, IndexModel};

const TABLE_NAME: &str = "notifications";

#[derive(Clone)]
pub struct NotificationStore {
    store: Arc<Collection<Notification>>,
}

impl NotificationStore {
    pub async fn new(db: &Db) -> Result<Self> {
        let store = db.collection(TABLE_NAME);
        store
            .create_index(IndexModel::builder().keys(doc! { "user_id": 1 }).build())
            .await?;
        store
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "dedup_key": 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build(),
            )
            .await?;

        Ok(NotificationStore {
            store: Arc::new(store),
        })
    }

    pub async fn has(&self, dedup_key: &str) -> Result<bool> {
        let filter = doc! { "dedup_key": dedup_key };
        let count = self.store.count_documents(filter).await?;
        Ok(count > 0)
    }

    pub async fn insert(&self, notification: &Notification) -> Result<()> {
        self.store.insert_one(notification).await?;
        Ok(())
    }
}
