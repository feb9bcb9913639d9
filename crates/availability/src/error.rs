/// Errors from the reservation service client.
///
/// Every variant that saw a response keeps its raw body so failures can be
/// reported with the payload that caused them.
#[derive(Debug, thiserror::Error)]
pub enum AvailabilityError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with a non-2xx status code.
    #[error("Reservation service returned HTTP {status}")]
    HttpStatus { status: u16, body: String },

    /// The body could not be decoded into the expected shape.
    #[error("Failed to decode response: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
        body: String,
    },

    /// The client is missing configuration required for this call.
    #[error("Client not configured: {0}")]
    NotConfigured(&'static str),
}

impl AvailabilityError {
    /// HTTP status of the failed response, when one was received.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            Self::Decode { .. } | Self::NotConfigured(_) => None,
        }
    }

    /// Raw response body, when one was received.
    pub fn raw_body(&self) -> Option<&str> {
        match self {
            Self::HttpStatus { body, .. } | Self::Decode { body, .. } => Some(body),
            Self::Request(_) | Self::NotConfigured(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_display_and_accessors() {
        let err = AvailabilityError::HttpStatus {
            status: 429,
            body: "slow down".to_string(),
        };
        assert_eq!(err.to_string(), "Reservation service returned HTTP 429");
        assert_eq!(err.http_status(), Some(429));
        assert_eq!(err.raw_body(), Some("slow down"));
    }

    #[test]
    fn decode_error_keeps_body() {
        let source = serde_json::from_str::<Vec<u8>>("{").unwrap_err();
        let err = AvailabilityError::Decode {
            source,
            body: "{".to_string(),
        };
        assert!(err.to_string().starts_with("Failed to decode response"));
        assert_eq!(err.http_status(), None);
        assert_eq!(err.raw_body(), Some("{"));
    }
}
