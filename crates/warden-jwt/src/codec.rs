//! Compact JWS serialization: `base64url(header).base64url(payload).base64url(signature)`.

use crate::algorithm::Algorithm;
use crate::claims::Claims;
use crate::error::TokenError;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

/// The `typ` value written to every issued header.
pub const TOKEN_TYPE: &str = "JWT";

/// JOSE header.
///
/// `alg` stays a string on decode: an unsupported name is an algorithm
/// mismatch for the verifier, not a parse error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
}

impl Header {
    pub fn new(alg: Algorithm) -> Self {
        Self {
            alg: alg.as_str().to_string(),
            typ: Some(TOKEN_TYPE.to_string()),
        }
    }
}

pub fn encode_segment(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

pub fn decode_segment(segment: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(segment)
}

/// Encode `header.payload`, the input to the signing primitive.
pub(crate) fn signing_input(header: &Header, claims: &Claims) -> Result<String, TokenError> {
    let header_json =
        serde_json::to_vec(header).map_err(|e| TokenError::Signing(e.to_string()))?;
    let payload_json =
        serde_json::to_vec(claims).map_err(|e| TokenError::Signing(e.to_string()))?;
    Ok(format!(
        "{}.{}",
        encode_segment(&header_json),
        encode_segment(&payload_json)
    ))
}

/// Append the signature segment. An empty signature yields the unsigned form `h.p.`.
pub(crate) fn assemble(signing_input: &str, signature: &[u8]) -> String {
    format!("{signing_input}.{}", encode_segment(signature))
}

/// A token split into decoded segments. Nothing here is trusted yet.
#[derive(Debug)]
pub struct RawToken<'a> {
    signing_input: &'a str,
    header: Vec<u8>,
    payload: Vec<u8>,
    signature: Vec<u8>,
}

impl<'a> RawToken<'a> {
    /// Split and base64url-decode the three segments.
    ///
    /// Header and payload must be non-empty. The signature segment may be empty
    /// (unsigned tokens); whether that is acceptable is decided by the verifier.
    pub fn split(token: &'a str) -> Result<Self, TokenError> {
        let mut parts = token.split('.');
        let (Some(header), Some(payload), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::Malformed(
                "expected three dot-separated segments".to_string(),
            ));
        };

        if header.is_empty() || payload.is_empty() {
            return Err(TokenError::Malformed(
                "header and payload segments must not be empty".to_string(),
            ));
        }

        let decode = |segment: &str, name: &str| {
            decode_segment(segment)
                .map_err(|e| TokenError::Malformed(format!("invalid {name} encoding: {e}")))
        };

        Ok(Self {
            signing_input: &token[..header.len() + 1 + payload.len()],
            header: decode(header, "header")?,
            payload: decode(payload, "payload")?,
            signature: decode(signature, "signature")?,
        })
    }

    /// `header.payload` exactly as received.
    pub fn signing_input(&self) -> &'a str {
        self.signing_input
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    pub fn header(&self) -> Result<Header, TokenError> {
        serde_json::from_slice(&self.header)
            .map_err(|e| TokenError::Malformed(format!("invalid header JSON: {e}")))
    }

    /// Decode the payload. It must be a JSON object.
    pub fn claims(&self) -> Result<Claims, TokenError> {
        serde_json::from_slice(&self.payload)
            .map_err(|e| TokenError::Malformed(format!("invalid payload JSON: {e}")))
    }
}

/// Information about a token (for inspection).
#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub header: Header,
    pub claims: Claims,
    /// Whether the signature segment is non-empty. Says nothing about validity.
    pub signed: bool,
}

/// Decode a token without verifying anything. For debugging only: the result
/// must never be used for an authorization decision.
pub fn inspect_token_unverified(token: &str) -> Result<TokenInfo, TokenError> {
    let raw = RawToken::split(token)?;
    Ok(TokenInfo {
        header: raw.header()?,
        claims: raw.claims()?,
        signed: !raw.signature().is_empty(),
    })
}
