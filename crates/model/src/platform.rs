use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Platform {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    #[serde(default)]
    pub rating: Option<i32>,
}

impl Platform {
    pub fn new(title: String) -> Self {
        Platform {
            id: ObjectId::new(),
            title,
            rating: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Review {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub platform_id: ObjectId,
    pub user_id: ObjectId,
    pub rate: i32,
}

impl Review {
    pub fn new(platform_id: ObjectId, user_id: ObjectId, rate: i32) -> Self {
        Review {
            id: ObjectId::new(),
            platform_id,
            user_id,
            rate,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReviewWithPlatform {
    pub review: Review,
    pub platform: Option<Platform>,
}

/// Mean of `rates` rounded to the nearest integer, halves away from zero.
/// `None` for an empty slice.
pub fn average_rating(rates: &[i32]) -> Option<i32> {
    if rates.is_empty() {
        return None;
    }
    let total: i64 = rates.iter().map(|rate| *rate as i64).sum();
    let average = total as f64 / rates.len() as f64;
    Some(average.round() as i32)
}
