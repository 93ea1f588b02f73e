//! Logging for the DCA engine.

mod logging;

pub use logging::{setup_logging, LogFormat};
