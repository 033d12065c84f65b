mod assessment;
mod auth;
mod chat;
mod conversations;
mod profile;
mod tracking;

pub use assessment::*;
pub use auth::*;
pub use chat::*;
pub use conversations::*;
pub use profile::*;
pub use tracking::*;
