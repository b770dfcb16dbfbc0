use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};

use deepseek_api_proto::{
    ClassifyError, ErrorBody, ResponseKind, ValidationError,
};
use reqwest::StatusCode;

use crate::io::SseError;

/// A boxed error returned by a stream handler.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// The coarse category of an [`Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The client is misconfigured.
    Config,
    /// The request broke field constraints; nothing was sent.
    Validation,
    /// The request could not be serialized; nothing was sent.
    Encoding,
    /// The transport failed.
    Transport,
    /// The service answered with a status other than 200.
    HttpStatus,
    /// The body matched no known response shape, or could not be decoded.
    Classification,
    /// The service reported a structured error.
    Api,
    /// The dispatch path does not fit the request's stream mode, or the
    /// event stream is malformed.
    Streaming,
    /// A stream handler aborted the call.
    Handler,
}

/// Error type for [`DeepSeekClient`](crate::DeepSeekClient).
#[derive(Debug)]
pub enum Error {
    /// The client could not be built.
    InvalidConfig(String),
    /// The request failed validation.
    Validation(ValidationError),
    /// The transport failed; passed through unmodified.
    Transport(reqwest::Error),
    /// The service answered with a non-200 status. The body is discarded.
    HttpStatus(StatusCode),
    /// The response body could not be classified.
    Classification(ClassifyError),
    /// The service reported an error object.
    Api(ErrorBody),
    /// The request could not be serialized.
    Encode(serde_json::Error),
    /// A stream event could not be decoded.
    Json(serde_json::Error),
    /// A streaming request was passed to the buffered dispatch path.
    StreamingUnsupported,
    /// A non-streaming request was passed to the streaming dispatch path.
    StreamingRequired,
    /// The event stream is malformed.
    Stream(String),
    /// The stream handler returned an error.
    Handler(BoxError),
    /// The body was classified as a shape the endpoint never returns.
    UnexpectedResponse {
        /// The shape the endpoint returns.
        expected: ResponseKind,
        /// The shape that was received.
        actual: ResponseKind,
    },
}

impl Error {
    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidConfig(_) => ErrorKind::Config,
            Error::Validation(_) => ErrorKind::Validation,
            Error::Encode(_) => ErrorKind::Encoding,
            Error::Transport(_) => ErrorKind::Transport,
            Error::HttpStatus(_) => ErrorKind::HttpStatus,
            Error::Classification(_)
            | Error::Json(_)
            | Error::UnexpectedResponse { .. } => ErrorKind::Classification,
            Error::Api(_) => ErrorKind::Api,
            Error::StreamingUnsupported
            | Error::StreamingRequired
            | Error::Stream(_) => ErrorKind::Streaming,
            Error::Handler(_) => ErrorKind::Handler,
        }
    }

    /// Returns the HTTP status of an [`Error::HttpStatus`].
    #[inline]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::HttpStatus(status) => Some(*status),
            _ => None,
        }
    }

    /// Returns the violations of an [`Error::Validation`].
    #[inline]
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            Error::Validation(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the error object of an [`Error::Api`].
    #[inline]
    pub fn api_error(&self) -> Option<&ErrorBody> {
        match self {
            Error::Api(body) => Some(body),
            _ => None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidConfig(reason) => {
                write!(f, "invalid client configuration: {reason}")
            }
            Error::Validation(err) => write!(f, "invalid request: {err}"),
            Error::Transport(err) => Display::fmt(err, f),
            Error::HttpStatus(status) => write!(
                f,
                "HTTP request failed with status code {}",
                status.as_u16()
            ),
            Error::Classification(err) => Display::fmt(err, f),
            Error::Api(body) => Display::fmt(body, f),
            Error::Encode(err) => write!(f, "failed to encode request: {err}"),
            Error::Json(err) => write!(f, "JSON error: {err}"),
            Error::StreamingUnsupported => {
                f.write_str("streaming is not supported on this dispatch path")
            }
            Error::StreamingRequired => {
                f.write_str("streaming dispatch requires stream to be enabled")
            }
            Error::Stream(reason) => {
                write!(f, "malformed event stream: {reason}")
            }
            Error::Handler(err) => write!(f, "stream handler failed: {err}"),
            Error::UnexpectedResponse { expected, actual } => write!(
                f,
                "expected a {expected} response, got a {actual} response"
            ),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Validation(err) => Some(err),
            Error::Transport(err) => Some(err),
            Error::Classification(err) => Some(err),
            Error::Api(body) => Some(body),
            Error::Encode(err) | Error::Json(err) => Some(err),
            Error::Handler(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Error::Validation(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(err)
    }
}

impl From<ClassifyError> for Error {
    fn from(err: ClassifyError) -> Self {
        Error::Classification(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

impl From<SseError> for Error {
    fn from(err: SseError) -> Self {
        match err {
            SseError::Transport(err) => Error::Transport(err),
            SseError::InvalidPayload => {
                Error::Stream("invalid event payload".to_owned())
            }
        }
    }
}
