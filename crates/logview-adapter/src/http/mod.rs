/*
[INPUT]:  HTTP client configuration and log endpoint
[OUTPUT]: HTTP responses and typed log pages
[POS]:    HTTP layer - log server communication
[UPDATE]: When adding new endpoints or changing client behavior
*/

pub mod client;
pub mod error;
pub mod logs;

pub use error::{LogviewError, Result};

pub use client::{ClientConfig, LogviewClient};
