//! A client library for the DeepSeek API.
//!
//! The wire types live in [`proto`] and the HTTP client in [`client`]. The
//! most common items of both are re-exported at the crate root.
//!
//! The crate also ships `deepseek-chat`, a small terminal chat program
//! built on this library (enabled by the `cli` feature).

#![deny(missing_docs)]

pub use deepseek_api_client::{
    ClientBuilder, DeepSeekClient, Error, ErrorKind,
};
pub use deepseek_api_proto::{
    ChatRequest, CompletionChunk, CompletionRequest, Message, Response,
    ResponseKind, ValidationError, Violation,
};

/// Re-exports of [`deepseek_api_proto`] crate.
pub mod proto {
    pub use deepseek_api_proto::*;
}

/// Re-exports of [`deepseek_api_client`] crate.
pub mod client {
    pub use deepseek_api_client::*;
}
