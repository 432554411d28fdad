pub mod history;
pub mod notification;
pub mod platform;
pub mod review;
pub mod session;

use eyre::Result;
use history::HistoryStore;
use notification::NotificationStore;
use platform::PlatformStore;
use review::ReviewStore;
use session::Db;

const DB_NAME: &str = "subscriptions_db";

pub(crate) const USER_SUBSCRIPTIONS: &str = "user_subscriptions";
pub(crate) const USERS: &str = "users";

#[derive(Clone)]
pub struct Storage {
    pub db: Db,
    pub histories: HistoryStore,
    pub notifications: NotificationStore,
    pub reviews: ReviewStore,
    pub platforms: PlatformStore,
}

impl Storage {
    pub async fn new(uri: &str) -> Result<Self> {
        let db = Db::new(uri, DB_NAME).await?;
        let histories = HistoryStore::new(&db);
        let notifications = NotificationStore::new(&db).await?;
        let reviews = ReviewStore::new(&db).await?;
        let platforms = PlatformStore::new(&db);

        Ok(Storage {
            db,
            histories,
            notifications,
            reviews,
            platforms,
        })
    }
}
