mod client;
mod helpers;

pub use client::CurlTransport;

use crate::error::TransportError;
use url::Url;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    /// Leading bytes of the body, lossily decoded. Bounded by the transport config.
    pub body_excerpt: String,
}

/// Issues the GET behind an HTTP probe. Swappable so tests and custom TLS
/// setups do not touch runner logic.
pub trait HttpTransport: Send + Sync {
    fn get(&self, url: &Url) -> Result<HttpResponse, TransportError>;
}
