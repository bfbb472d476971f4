pub mod client;
pub mod events;
pub mod signature;

pub use client::{SlackApi, SlackWebClient};
pub use events::{EventCallback, EventKind, SlackEnvelope, SlackEvent};
