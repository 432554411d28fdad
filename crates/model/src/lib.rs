pub mod datetime;
pub mod errors;
pub mod notification;
pub mod platform;
pub mod subscription;
pub mod user;
