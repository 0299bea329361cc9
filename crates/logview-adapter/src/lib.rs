/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public logview adapter crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod http;
pub mod source;
pub mod types;

// Re-export commonly used types from http
pub use http::{ClientConfig, LogviewClient, LogviewError, Result};

pub use source::LogSource;

// Re-export all types
pub use types::*;
