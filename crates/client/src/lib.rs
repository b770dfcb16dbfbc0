//! An HTTP client for the DeepSeek API.
//!
//! Every call goes through one dispatcher: the request is validated, sent
//! with bearer authentication, and the JSON reply is classified into one of
//! the shapes in [`deepseek_api_proto::Response`]. Service errors come back
//! as [`Error::Api`] rather than as a successful value.
//!
//! Streaming requests use [`DeepSeekClient::send_streaming`], which reads
//! the server-sent event stream and hands each chunk to a callback.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod client;
mod config;
mod error;
mod io;

pub use client::{
    BALANCE_PATH, CHAT_PATH, COMPLETIONS_PATH, DeepSeekClient, MODELS_PATH,
};
pub use config::{ClientBuilder, DEFAULT_HOST, DEFAULT_SCHEME, DEFAULT_TIMEOUT};
pub use error::{BoxError, Error, ErrorKind};
pub use reqwest::{Client as HttpClient, Method, StatusCode};
