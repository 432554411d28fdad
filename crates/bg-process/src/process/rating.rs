use std::{collections::HashMap, sync::Arc};

use crate::{store::JobStore, Task};
use async_trait::async_trait;
use bson::oid::ObjectId;
use eyre::{Context as _, Error};
use log::{info, warn};
use model::platform::{average_rating, ReviewWithPlatform};

/// Recomputes every reviewed platform's rating from scratch.
#[derive(Clone)]
pub struct RatingBg {
    store: Arc<dyn JobStore>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RatingReport {
    pub reviews: usize,
    pub platforms_updated: usize,
    pub skipped: usize,
}

#[async_trait]
impl Task for RatingBg {
    const NAME: &'static str = "rating";
    const SCHEDULE: &'static str = "every day at 00:00";

    async fn process(&mut self) -> Result<(), Error> {
        let report = self.recalculate().await?;
        info!("Platform ratings recalculated: {:?}", report);
        Ok(())
    }
}

impl RatingBg {
    pub fn new(store: Arc<dyn JobStore>) -> RatingBg {
        RatingBg { store }
    }

    pub async fn recalculate(&self) -> Result<RatingReport, Error> {
        let reviews = self
            .store
            .reviews_with_platform()
            .await
            .context("load reviews")?;
        let mut report = RatingReport {
            reviews: reviews.len(),
            ..Default::default()
        };

        let (rates, skipped) = group_rates(reviews);
        report.skipped = skipped;

        for (platform_id, rates) in rates {
            let Some(rating) = average_rating(&rates) else {
                continue;
            };
            self.store
                .update_platform_rating(platform_id, rating)
                .await
                .with_context(|| format!("update rating of platform {}", platform_id))?;
            report.platforms_updated += 1;
        }
        Ok(report)
    }
}

/// Rates per platform. Reviews of platforms that no longer exist are counted
/// and dropped.
fn group_rates(reviews: Vec<ReviewWithPlatform>) -> (HashMap<ObjectId, Vec<i32>>, usize) {
    let mut rates: HashMap<ObjectId, Vec<i32>> = HashMap::new();
    let mut skipped = 0;
    for ReviewWithPlatform { review, platform } in reviews {
        if platform.is_none() {
            warn!(
                "Review {} points to missing platform {}",
                review.id, review.platform_id
            );
            skipped += 1;
            continue;
        }
        rates.entry(review.platform_id).or_default().push(review.rate);
    }
    (rates, skipped)
}
