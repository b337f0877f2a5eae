pub mod conversation;
pub mod document;
pub mod message;
pub mod usage;

pub use conversation::{ConversationState, SessionId};
pub use document::{context_block, Document};
pub use message::{Message, Role};
pub use usage::{UsageBucket, UsageRecord, UsageSummary};
