use super::helpers::map_curl_error;
use super::{HttpResponse, HttpTransport};
use crate::config::TransportConfig;
use crate::error::TransportError;
use curl::Error as CurlError;
use curl::easy::{Easy2, Handler, WriteError};
use url::Url;

/// Keeps the first `limit` bytes of a body and aborts the transfer once they
/// are in; the status line is all a probe needs.
#[derive(Default)]
struct BodyCollector {
    body: Vec<u8>,
    limit: usize,
    limit_reached: bool,
}

impl BodyCollector {
    fn new(limit: usize) -> Self {
        Self {
            body: Vec::new(),
            limit,
            limit_reached: false,
        }
    }
}

impl Handler for BodyCollector {
    fn write(&mut self, data: &[u8]) -> Result<usize, WriteError> {
        let remaining = self.limit.saturating_sub(self.body.len());
        let take = data.len().min(remaining);
        self.body.extend_from_slice(&data[..take]);
        if self.body.len() >= self.limit {
            self.limit_reached = true;
        }

        Ok(data.len())
    }

    fn progress(&mut self, _dltotal: f64, _dlnow: f64, _ultotal: f64, _ulnow: f64) -> bool {
        !self.limit_reached
    }
}

/// libcurl-backed transport. A fresh handle is built per request so one
/// instance can be shared by every runner thread.
#[derive(Clone, Debug)]
pub struct CurlTransport {
    config: TransportConfig,
}

impl CurlTransport {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    fn configure(&self, easy: &mut Easy2<BodyCollector>, url: &Url) -> Result<(), CurlError> {
        easy.url(url.as_str())?;
        easy.get(true)?;
        easy.signal(false)?;
        easy.follow_location(self.config.follow_redirects)?;
        easy.accept_encoding("")?;
        easy.progress(true)?;
        easy.timeout(self.config.timeout)?;
        easy.connect_timeout(self.config.connect_timeout)?;
        if let Some(ca_cert) = &self.config.ca_cert {
            easy.cainfo(ca_cert)?;
        }
        Ok(())
    }
}

impl HttpTransport for CurlTransport {
    fn get(&self, url: &Url) -> Result<HttpResponse, TransportError> {
        let mut easy = Easy2::new(BodyCollector::new(self.config.max_body_bytes));
        self.configure(&mut easy, url)
            .map_err(|err| map_curl_error(&err))?;

        if let Err(err) = easy.perform() {
            let aborted_by_limit = easy.get_ref().limit_reached
                && (err.is_write_error() || err.is_aborted_by_callback());
            if !aborted_by_limit {
                return Err(map_curl_error(&err));
            }
        }

        let status = easy.response_code().map_err(|err| map_curl_error(&err))?;
        let body_excerpt = String::from_utf8_lossy(&easy.get_ref().body).into_owned();

        Ok(HttpResponse {
            status: u16::try_from(status).unwrap_or(u16::MAX),
            body_excerpt,
        })
    }
}
