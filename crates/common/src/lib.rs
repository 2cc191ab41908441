//! Shared infrastructure for the OptiMeet workspace: structured logging and
//! the in-process event bus.

pub mod event_bus;
pub mod structured_logging;
pub mod topics;

pub use event_bus::{EventBus, EventEnvelope, Topic};
pub use structured_logging::{
    init_structured_logging, JsonLayer, LogFormat, LoggingConfig, OperationTimer,
    StructuredLogEntry,
};
