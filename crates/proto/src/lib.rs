//! Wire types for the DeepSeek API.
//!
//! This crate models the payloads exchanged with the service: messages and
//! requests that are validated before they leave the process, and the
//! closed set of response shapes the service may send back. It performs no
//! I/O, see `deepseek-api-client` for the transport side.
//!
//! Response bodies are not uniformly tagged, so [`Response::classify`]
//! inspects the raw JSON first and then decodes it into exactly one of the
//! known shapes.

#![deny(missing_docs)]

mod chunk;
mod error;
mod message;
mod request;
mod response;

pub use chunk::*;
pub use error::*;
pub use message::*;
pub use request::*;
pub use response::*;
