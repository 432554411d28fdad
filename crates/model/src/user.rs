use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub nickname: String,
}

impl User {
    pub fn new(nickname: String) -> User {
        User {
            id: ObjectId::new(),
            nickname,
        }
    }
}
