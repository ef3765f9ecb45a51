use crate::error::{TransportError, TransportErrorKind};
use curl::Error as CurlError;

pub(super) fn map_curl_error(err: &CurlError) -> TransportError {
    let message = err.to_string();

    let kind = if err.is_couldnt_resolve_host() || err.is_couldnt_resolve_proxy() {
        TransportErrorKind::Dns
    } else if err.is_operation_timedout() {
        if is_dns_timeout_message(&message) {
            TransportErrorKind::Dns
        } else {
            TransportErrorKind::Timeout
        }
    } else if err.is_couldnt_connect() {
        TransportErrorKind::Connect
    } else if err.is_ssl_connect_error()
        || err.is_ssl_cacert()
        || err.is_ssl_cacert_badfile()
        || err.is_ssl_certproblem()
        || err.is_ssl_cipher()
        || err.is_peer_failed_verification()
    {
        TransportErrorKind::Tls
    } else if err.is_unsupported_protocol() || err.is_url_malformed() {
        TransportErrorKind::Protocol
    } else {
        TransportErrorKind::Io
    };

    TransportError::new(kind, message)
}

pub(super) fn is_dns_timeout_message(message: &str) -> bool {
    message.to_ascii_lowercase().contains("resolving timed out")
}

#[cfg(test)]
mod tests {
    use super::*;

    // libcurl error codes, see curl/curl.h
    const CURLE_COULDNT_RESOLVE_HOST: u32 = 6;
    const CURLE_COULDNT_CONNECT: u32 = 7;
    const CURLE_OPERATION_TIMEDOUT: u32 = 28;

    #[test]
    fn resolve_failure_maps_to_dns() {
        let err = map_curl_error(&CurlError::new(CURLE_COULDNT_RESOLVE_HOST));
        assert_eq!(err.kind, TransportErrorKind::Dns);
    }

    #[test]
    fn refused_connection_maps_to_connect() {
        let err = map_curl_error(&CurlError::new(CURLE_COULDNT_CONNECT));
        assert_eq!(err.kind, TransportErrorKind::Connect);
    }

    #[test]
    fn timeout_maps_to_timeout() {
        let err = map_curl_error(&CurlError::new(CURLE_OPERATION_TIMEDOUT));
        assert_eq!(err.kind, TransportErrorKind::Timeout);
    }

    #[test]
    fn dns_timeout_message_is_detected() {
        assert!(is_dns_timeout_message("Resolving timed out after 5000 milliseconds"));
        assert!(!is_dns_timeout_message("Operation timed out"));
    }
}
