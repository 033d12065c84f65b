pub mod assessment;
pub mod auth;
pub mod chat;
pub mod conversations;
pub mod profile;
pub mod tracking;
