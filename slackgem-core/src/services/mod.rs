pub mod message_handler;
pub mod relay_service;

pub use message_handler::{EventOutcome, MessageHandler, ParsedRequest, Reply, TimePeriod};
pub use relay_service::RelayService;
