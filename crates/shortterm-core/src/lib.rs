//! # shortterm-core
//!
//! Client library for the `ShortTermEmail` temporary email service.
//!
//! This crate provides:
//! - **Session lifecycle**: generate, persist, restore and expire a
//!   temporary address
//! - **Inbox refresh**: a recurring poll plus optional push delivery, both
//!   funnelled through one event queue
//! - **Safe rendering**: escaping of plain fields and sanitization of
//!   untrusted HTML bodies
//! - **HTTP API client** over `reqwest`
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use shortterm_core::{Config, Coordinator, HttpApi, NoPush, SystemClock};
//!
//! #[tokio::main]
//! async fn main() -> shortterm_core::Result<()> {
//!     let config = Config::load()?;
//!     let api = HttpApi::from_config(&config)?;
//!     let mut coordinator = Coordinator::new(
//!         api,
//!         NoPush,
//!         config.store(),
//!         Arc::new(SystemClock),
//!         config.refresh_interval(),
//!     );
//!
//!     coordinator.start().await?;
//!     if !coordinator.is_active() {
//!         coordinator.generate().await?;
//!     }
//!
//!     loop {
//!         for message in coordinator.process_next().await {
//!             println!("New mail: {}", message.subject);
//!         }
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod api;
pub mod clock;
pub mod config;
mod error;
pub mod model;
pub mod render;
pub mod session;
pub mod store;

pub use api::{ApiStatus, GeneratedAddress, HttpApi, MailApi, NoPush, PushChannel, PushHub};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{Error, Result};
pub use model::{Inbox, Message, MessageId, Session};
pub use render::{Body, InboxRow, RenderedMessage, escape_html, sanitize_html};
pub use session::{
    Coordinator, Event, InboxUpdate, Notice, NoticeLevel, RestoreOutcome, SessionManager,
};
pub use store::{FileStore, KeyValueStore, MemoryStore};
