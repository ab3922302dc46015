#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Journals and event plumbing shared by the planning kernel.

/// Append-only JSON-lines journals and structured log records.
#[path = "../logging.rs"]
pub mod logging;
/// Event bus abstractions for planner notifications.
#[path = "../bus.rs"]
pub mod bus;

pub use bus::{EventPublisher, EventRecord, EventSubscriber, FileEventPublisher, MemoryEventBus};
pub use logging::{read_journal, JsonLinesJournal, LogLevel, LogRecord};
