//! Domain models: sessions, messages and the inbox.

mod inbox;
mod message;
mod session;
pub mod wire;

pub use inbox::Inbox;
pub use message::{Message, MessageId};
pub use session::Session;
