pub mod assessment;
pub mod conversation;
pub mod message;
pub mod profile;
pub mod tracking;
pub mod user;

pub use assessment::{HealthAssessment, MealSuggestion};
pub use conversation::{Conversation, ConversationSummary};
pub use message::{Message, Role};
pub use profile::UserProfile;
pub use tracking::ProgressEntry;
pub use user::User;
