use std::sync::Arc;

use bson::{doc, oid::ObjectId, Document};
use chrono::{NaiveDate, Utc};
use eyre::{Context as _, Error};
use futures_util::TryStreamExt as _;
use log::debug;
use model::{
    platform::Platform,
    subscription::{HistoryWithRelations, SubscriptionHistory, SubscriptionRelations, UserSubscription},
    user::User,
};
use mongodb::Collection;
use serde::Deserialize;

use crate::{platform, session::Db, USERS, USER_SUBSCRIPTIONS};

const COLLECTION: &str = "subscription_histories";

#[derive(Clone)]
pub struct HistoryStore {
    store: Arc<Collection<SubscriptionHistory>>,
}

impl HistoryStore {
    pub(crate) fn new(db: &Db) -> Self {
        HistoryStore {
            store: Arc::new(db.collection(COLLECTION)),
        }
    }

    /// All histories joined with subscription, user and platform in one
    /// aggregation.
    pub async fn with_relations(&self) -> Result<Vec<HistoryWithRelations>, Error> {
        let rows: Vec<HistoryRow> = self
            .store
            .aggregate(relations_pipeline())
            .await
            .context("subscription histories lookup")?
            .with_type::<HistoryRow>()
            .try_collect()
            .await?;
        debug!("Loaded {} subscription histories", rows.len());
        Ok(rows.into_iter().map(HistoryRow::into_relations).collect())
    }

    pub async fn set_next_pay_at(&self, id: ObjectId, next_pay_at: NaiveDate) -> Result<(), Error> {
        let updated_at = bson::DateTime::from_chrono(Utc::now());
        self.store
            .update_one(
                doc! { "_id": id },
                doc! {
                    "$set": {
                        "next_pay_at": next_pay_at.format("%Y-%m-%d").to_string(),
                        "updated_at": updated_at,
                    }
                },
            )
            .await?;
        Ok(())
    }
}

fn lookup_one(from: &str, local_field: &str, target: &str) -> [Document; 2] {
    [
        doc! {
            "$lookup": {
                "from": from,
                "localField": local_field,
                "foreignField": "_id",
                "as": target,
            }
        },
        doc! {
            "$unwind": {
                "path": format!("${}", target),
                "preserveNullAndEmptyArrays": true,
            }
        },
    ]
}

fn relations_pipeline() -> Vec<Document> {
    let mut pipeline = Vec::with_capacity(7);
    pipeline.extend(lookup_one(
        USER_SUBSCRIPTIONS,
        "user_subscription_id",
        "subscription",
    ));
    pipeline.extend(lookup_one(USERS, "subscription.user_id", "user"));
    pipeline.extend(lookup_one(
        platform::COLLECTION,
        "subscription.platform_id",
        "platform",
    ));
    pipeline.push(doc! {
        "$project": {
            "history": "$$ROOT",
            "subscription": 1,
            "user": 1,
            "platform": 1,
        }
    });
    pipeline
}

#[derive(Deserialize)]
struct HistoryRow {
    history: SubscriptionHistory,
    #[serde(default)]
    subscription: Option<UserSubscription>,
    #[serde(default)]
    user: Option<User>,
    #[serde(default)]
    platform: Option<Platform>,
}

impl HistoryRow {
    fn into_relations(self) -> HistoryWithRelations {
        HistoryWithRelations {
            history: self.history,
            subscription: self.subscription.map(|subscription| SubscriptionRelations {
                subscription,
                user: self.user,
                platform: self.platform,
            }),
        }
    }
}
