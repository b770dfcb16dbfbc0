use std::fmt::{self, Debug};

use deepseek_api_proto::{
    ApiRequest, BalanceResponse, ChatCompletionResponse, ChatRequest,
    CompletionChunk, CompletionRequest, ErrorResponse, ModelListResponse,
    Response, ResponseKind, TextCompletionResponse,
};
use mime::Mime;
use reqwest::{Client, Method, RequestBuilder, StatusCode, header};
use serde_json::{Map, Value};

use crate::io::{Chunks, Sse};
use crate::{BoxError, ClientBuilder, Error};

/// Path of the chat completion endpoint.
pub const CHAT_PATH: &str = "/chat/completions";
/// Path of the legacy (FIM) completion endpoint.
pub const COMPLETIONS_PATH: &str = "/beta/completions";
/// Path of the model listing endpoint.
pub const MODELS_PATH: &str = "/models";
/// Path of the balance endpoint.
pub const BALANCE_PATH: &str = "/user/balance";

const DONE_MARKER: &str = "[DONE]";

/// A client for the DeepSeek API.
///
/// Cloning is cheap, clones share the transport's connection pool.
#[derive(Clone)]
pub struct DeepSeekClient {
    scheme: String,
    host: String,
    api_key: String,
    http_client: Client,
}

impl DeepSeekClient {
    /// Creates a client for the public endpoint with the default
    /// transport.
    ///
    /// See [`ClientBuilder`] for other options.
    #[inline]
    pub fn new<S: Into<String>>(api_key: S) -> Result<Self, Error> {
        ClientBuilder::with_api_key(api_key).build()
    }

    #[inline]
    pub(crate) fn from_parts(
        scheme: String,
        host: String,
        api_key: String,
        http_client: Client,
    ) -> Self {
        Self {
            scheme,
            host,
            api_key,
            http_client,
        }
    }

    /// Returns the protocol scheme, e.g. `https`.
    #[inline]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Sets the protocol scheme.
    #[inline]
    pub fn set_scheme<S: Into<String>>(&mut self, scheme: S) -> &mut Self {
        self.scheme = scheme.into();
        self
    }

    /// Returns the host, including the port if one was set.
    #[inline]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Sets the host, optionally with a port.
    #[inline]
    pub fn set_host<S: Into<String>>(&mut self, host: S) -> &mut Self {
        self.host = host.into();
        self
    }

    /// Returns the API key sent as the bearer token.
    #[inline]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Replaces the API key used by subsequent calls.
    #[inline]
    pub fn set_api_key<S: Into<String>>(&mut self, api_key: S) -> &mut Self {
        self.api_key = api_key.into();
        self
    }

    /// Returns the underlying transport.
    #[inline]
    pub fn http_client(&self) -> &Client {
        &self.http_client
    }

    /// Replaces the transport used by subsequent calls.
    #[inline]
    pub fn set_http_client(&mut self, http_client: Client) -> &mut Self {
        self.http_client = http_client;
        self
    }

    /// Sends a chat completion request.
    pub async fn chat(
        &self,
        req: &ChatRequest,
    ) -> Result<ChatCompletionResponse, Error> {
        match self.send(Method::POST, CHAT_PATH, Some(req)).await? {
            Response::ChatCompletion(resp) => Ok(resp),
            other => Err(unexpected(ResponseKind::ChatCompletion, &other)),
        }
    }

    /// Sends a legacy (FIM) completion request.
    pub async fn completions(
        &self,
        req: &CompletionRequest,
    ) -> Result<TextCompletionResponse, Error> {
        match self.send(Method::POST, COMPLETIONS_PATH, Some(req)).await? {
            Response::TextCompletion(resp) => Ok(resp),
            other => Err(unexpected(ResponseKind::TextCompletion, &other)),
        }
    }

    /// Lists the available models.
    pub async fn models(&self) -> Result<ModelListResponse, Error> {
        match self.send(Method::GET, MODELS_PATH, None).await? {
            Response::ModelList(resp) => Ok(resp),
            other => Err(unexpected(ResponseKind::ModelList, &other)),
        }
    }

    /// Queries the account balance.
    pub async fn balance(&self) -> Result<BalanceResponse, Error> {
        match self.send(Method::GET, BALANCE_PATH, None).await? {
            Response::Balance(resp) => Ok(resp),
            other => Err(unexpected(ResponseKind::Balance, &other)),
        }
    }

    /// Streams a chat completion, calling `handler` for every chunk.
    #[inline]
    pub async fn chat_stream<F, E>(
        &self,
        req: &ChatRequest,
        handler: F,
    ) -> Result<(), Error>
    where
        F: FnMut(CompletionChunk) -> Result<(), E>,
        E: Into<BoxError>,
    {
        self.send_streaming(Method::POST, CHAT_PATH, req, handler)
            .await
    }

    /// Streams a legacy completion, calling `handler` for every chunk.
    #[inline]
    pub async fn completions_stream<F, E>(
        &self,
        req: &CompletionRequest,
        handler: F,
    ) -> Result<(), Error>
    where
        F: FnMut(CompletionChunk) -> Result<(), E>,
        E: Into<BoxError>,
    {
        self.send_streaming(Method::POST, COMPLETIONS_PATH, req, handler)
            .await
    }

    /// Sends one request and returns the classified response body.
    ///
    /// Requests are validated before anything is sent. A request that
    /// asks for streaming is rejected, use [`send_streaming`] for those.
    /// If the service reports an error object, it is returned as
    /// [`Error::Api`], so `Ok` always holds a success shape.
    ///
    /// [`send_streaming`]: DeepSeekClient::send_streaming
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        req: Option<&dyn ApiRequest>,
    ) -> Result<Response, Error> {
        let body = match req {
            Some(req) if req.stream_mode() => {
                return Err(Error::StreamingUnsupported);
            }
            Some(req) => Some(encode(req)?),
            None => None,
        };

        let mut builder = self.request(method, path, mime::APPLICATION_JSON);
        if let Some(body) = body {
            builder = builder.body(body);
        }
        let resp = builder.send().await?;
        check_status(resp.status())?;

        let body = resp.bytes().await?;
        let resp = Response::classify(&body)?;
        trace!("classified response as {}", resp.kind());
        resp.into_result().map_err(Error::Api)
    }

    /// Sends a streaming request and feeds every received chunk to
    /// `handler`, on the calling task, until the stream ends.
    ///
    /// The request must ask for streaming. An error returned by `handler`
    /// stops reading and becomes the result of the call.
    pub async fn send_streaming<F, E>(
        &self,
        method: Method,
        path: &str,
        req: &dyn ApiRequest,
        mut handler: F,
    ) -> Result<(), Error>
    where
        F: FnMut(CompletionChunk) -> Result<(), E>,
        E: Into<BoxError>,
    {
        if !req.stream_mode() {
            return Err(Error::StreamingRequired);
        }
        let body = encode(req)?;

        let resp = self
            .request(method, path, mime::TEXT_EVENT_STREAM)
            .body(body)
            .send()
            .await?;
        check_status(resp.status())?;

        // The service answers with a plain JSON body when it rejects the
        // request before starting the stream.
        if has_content_type(&resp, &mime::APPLICATION_JSON) {
            let body = resp.bytes().await?;
            let kind = Response::classify(&body)?
                .into_result()
                .map_err(Error::Api)?
                .kind();
            return Err(Error::Stream(format!(
                "expected an event stream, got a {kind} response"
            )));
        }

        let mut sse = Sse::new(Chunks::from_response(resp));
        while let Some(event) = sse.next_event().await? {
            trace!("got sse event: {event}");
            if event == DONE_MARKER {
                break;
            }
            let chunk = decode_chunk(&event)?;
            handler(chunk).map_err(|err| Error::Handler(err.into()))?;
        }
        Ok(())
    }

    #[inline]
    fn url(&self, path: &str) -> String {
        format!("{}://{}{}", self.scheme, self.host, path)
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        accept: Mime,
    ) -> RequestBuilder {
        let url = self.url(path);
        debug!("sending {method} {url}");
        self.http_client
            .request(method, url)
            .bearer_auth(&self.api_key)
            .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
            .header(header::ACCEPT, accept.as_ref())
    }
}

impl Debug for DeepSeekClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeepSeekClient")
            .field("scheme", &self.scheme)
            .field("host", &self.host)
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

fn encode(req: &dyn ApiRequest) -> Result<Vec<u8>, Error> {
    req.validate()?;
    req.to_body().map_err(Error::Encode)
}

#[inline]
fn check_status(status: StatusCode) -> Result<(), Error> {
    if status != StatusCode::OK {
        warn!("request failed with status {status}");
        return Err(Error::HttpStatus(status));
    }
    Ok(())
}

fn has_content_type(resp: &reqwest::Response, expected: &Mime) -> bool {
    resp.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<Mime>().ok())
        .is_some_and(|m| m.essence_str() == expected.essence_str())
}

fn decode_chunk(event: &str) -> Result<CompletionChunk, Error> {
    let view: Map<String, Value> = serde_json::from_str(event)?;
    if view.get("error").is_some_and(|error| !error.is_null()) {
        let resp: ErrorResponse = serde_json::from_value(Value::Object(view))?;
        return Err(Error::Api(resp.error));
    }
    Ok(serde_json::from_value(Value::Object(view))?)
}

#[inline]
fn unexpected(expected: ResponseKind, actual: &Response) -> Error {
    Error::UnexpectedResponse {
        expected,
        actual: actual.kind(),
    }
}
