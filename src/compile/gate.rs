// src/compile/gate.rs
use serde::de::DeserializeOwned;

use crate::errors::{Result, ServerError};

/// Validates request bodies and the confirmation key before any work starts.
#[derive(Debug, Clone, Default)]
pub struct RequestGate {
    confirmation_key: Option<String>,
}

impl RequestGate {
    pub fn new(confirmation_key: Option<String>) -> Self {
        Self { confirmation_key }
    }

    /// Decode a JSON body. Anything that does not match `T` is rejected.
    pub fn decode<T: DeserializeOwned>(&self, body: &[u8]) -> Result<T> {
        serde_json::from_slice(body).map_err(|e| ServerError::BadRequest(e.to_string()))
    }

    /// Check the supplied key against the configured one, if any.
    pub fn confirm(&self, supplied: Option<&str>) -> Result<()> {
        match &self.confirmation_key {
            None => Ok(()),
            Some(expected) if supplied == Some(expected.as_str()) => Ok(()),
            Some(_) => Err(ServerError::Unauthorized),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::result::CompileRequest;

    #[test]
    fn test_open_gate_accepts_anything() {
        let gate = RequestGate::new(None);
        assert!(gate.confirm(None).is_ok());
        assert!(gate.confirm(Some("whatever")).is_ok());
    }

    #[test]
    fn test_key_must_match() {
        let gate = RequestGate::new(Some("secret".to_string()));
        assert!(gate.confirm(Some("secret")).is_ok());
        assert!(matches!(gate.confirm(Some("Secret")), Err(ServerError::Unauthorized)));
        assert!(matches!(gate.confirm(None), Err(ServerError::Unauthorized)));
    }

    #[test]
    fn test_decode_rejects_malformed_bodies() {
        let gate = RequestGate::default();

        let err = gate.decode::<CompileRequest>(b"{\"content\": ").unwrap_err();
        assert!(matches!(err, ServerError::BadRequest(_)));

        let err = gate.decode::<CompileRequest>(b"{\"content\": 42}").unwrap_err();
        assert!(matches!(err, ServerError::BadRequest(_)));

        let err = gate.decode::<CompileRequest>(b"").unwrap_err();
        assert!(matches!(err, ServerError::BadRequest(_)));
    }
}
