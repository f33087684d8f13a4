use facet::Facet;

use crate::ProxyError;

/// A body that is known to be a well-formed JSON document.
///
/// The original text is kept so the relay can pass it on byte-for-byte in
/// both directions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonBody {
    text: String,
}

impl JsonBody {
    /// Accepts a caller-supplied request body.
    pub fn parse(bytes: &[u8]) -> Result<Self, ProxyError> {
        let text = std::str::from_utf8(bytes).map_err(|e| ProxyError::InvalidRequest {
            reason: format!("body is not utf-8: {e}"),
        })?;
        check_json(text).map_err(|reason| ProxyError::InvalidRequest { reason })?;
        Ok(Self {
            text: text.to_string(),
        })
    }

    /// Accepts a body received from upstream with a success status.
    pub fn from_upstream(text: String) -> Result<Self, ProxyError> {
        check_json(&text).map_err(|reason| ProxyError::MalformedUpstreamResponse { reason })?;
        Ok(Self { text })
    }

    pub fn encode<T>(value: &T) -> Result<Self, ProxyError>
    where
        T: for<'facet> Facet<'facet>,
    {
        let text = facet_json::to_string(value).map_err(|e| ProxyError::InvalidRequest {
            reason: format!("encode body: {e}"),
        })?;
        Ok(Self { text })
    }

    /// Decodes an upstream body into a typed value.
    pub fn decode<T>(&self) -> Result<T, ProxyError>
    where
        T: for<'facet> Facet<'facet>,
    {
        facet_json::from_str::<T>(&self.text).map_err(|e| ProxyError::MalformedUpstreamResponse {
            reason: format!("unexpected body shape: {e}"),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

fn check_json(text: &str) -> Result<(), String> {
    facet_json::from_str::<facet_value::Value>(text)
        .map(|_| ())
        .map_err(|e| format!("body is not json: {e}"))
}
