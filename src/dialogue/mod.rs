//! Multi-turn dialogue: slot filling over the conversation log

pub mod engine;
pub mod locks;
pub mod recovery;
pub mod response;

pub use engine::{SlotFillingEngine, TurnRequest};
pub use locks::ConversationLocks;
pub use recovery::{find_pending, is_confirmation, recover_fields, PendingIntent};
pub use response::{MissingFieldsResponse, SuggestionResponse, TurnResponse};
