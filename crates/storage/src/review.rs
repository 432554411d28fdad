use std::sync::Arc;

use bson::doc;
use eyre::{Context as _, Error};
use futures_util::TryStreamExt as _;
use model::platform::{Platform, Review, ReviewWithPlatform};
use mongodb::{Collection, IndexModel};
use serde::Deserialize;

use crate::{platform, session::Db};

const COLLECTION: &str = "reviews";

#[derive(Clone)]
pub struct ReviewStore {
    store: Arc<Collection<Review>>,
}

impl ReviewStore {
    pub(crate) async fn new(db: &Db) -> Result<Self, Error> {
        let store = db.collection(COLLECTION);
        store
            .create_index(IndexModel::builder().keys(doc! { "platform_id": 1 }).build())
            .await?;
        Ok(ReviewStore {
            store: Arc::new(store),
        })
    }

    pub async fn with_platform(&self) -> Result<Vec<ReviewWithPlatform>, Error> {
        let pipeline = vec![
            doc! {
                "$lookup": {
                    "from": platform::COLLECTION,
                    "localField": "platform_id",
                    "foreignField": "_id",
                    "as": "platform",
                }
            },
            doc! {
                "$unwind": {
                    "path": "$platform",
                    "preserveNullAndEmptyArrays": true,
                }
            },
            doc! {
                "$project": {
                    "review": "$$ROOT",
                    "platform": 1,
                }
            },
        ];
        let rows: Vec<ReviewRow> = self
            .store
            .aggregate(pipeline)
            .await
            .context("reviews lookup")?
            .with_type::<ReviewRow>()
            .try_collect()
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| ReviewWithPlatform {
                review: row.review,
                platform: row.platform,
            })
            .collect())
    }
}

#[derive(Deserialize)]
struct ReviewRow {
    review: Review,
    #[serde(default)]
    platform: Option<Platform>,
}
