use std::sync::Arc;

use bson::{doc, oid::ObjectId};
use eyre::Error;
use log::info;
use model::platform::Platform;
use mongodb::Collection;

use crate::session::Db;

pub(crate) const COLLECTION: &str = "platforms";

#[derive(Clone)]
pub struct PlatformStore {
    store: Arc<Collection<Platform>>,
}

impl PlatformStore {
    pub(crate) fn new(db: &Db) -> Self {
        PlatformStore {
            store: Arc::new(db.collection(COLLECTION)),
        }
    }

    pub async fn set_rating(&self, id: ObjectId, rating: i32) -> Result<(), Error> {
        info!("Set platform {} rating to {}", id, rating);
        self.store
            .update_one(doc! { "_id": id }, doc! { "$set": { "rating": rating } })
            .await?;
        Ok(())
    }
}
