/*
[INPUT]:  Log server schema definitions and serde requirements
[OUTPUT]: Typed Rust structs with serialization support
[POS]:    Data layer - type definitions for log server communication
[UPDATE]: When the log server schema changes or new types are added
*/

pub mod requests;
pub mod responses;

pub use requests::*;
pub use responses::*;
