//! Claims model and the builder that assembles the canonical claim set.

use crate::clock::{Clock, SystemClock};
use crate::error::TokenError;
use crate::id::{IdGenerator, RandomUuid};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

pub const ISSUER: &str = "iss";
pub const SUBJECT: &str = "sub";
pub const AUDIENCE: &str = "aud";
pub const ISSUED_AT: &str = "iat";
pub const EXPIRATION: &str = "exp";
pub const NOT_BEFORE: &str = "nbf";
pub const JWT_ID: &str = "jti";

/// Claim names owned by the engine. Custom claims can never set these.
pub const REGISTERED_CLAIMS: [&str; 7] = [
    ISSUER, SUBJECT, AUDIENCE, ISSUED_AT, EXPIRATION, NOT_BEFORE, JWT_ID,
];

/// A token's claim set: registered claims plus any custom claims.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn issuer(&self) -> Option<&str> {
        self.get(ISSUER).and_then(Value::as_str)
    }

    pub fn subject(&self) -> Option<&str> {
        self.get(SUBJECT).and_then(Value::as_str)
    }

    pub fn jwt_id(&self) -> Option<&str> {
        self.get(JWT_ID).and_then(Value::as_str)
    }

    /// The `aud` claim. A single string is accepted as a one-element audience.
    pub fn audience(&self) -> Vec<String> {
        match self.get(AUDIENCE) {
            Some(Value::String(aud)) => vec![aud.clone()],
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp(ISSUED_AT)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp(EXPIRATION)
    }

    pub fn not_before(&self) -> Option<DateTime<Utc>> {
        self.timestamp(NOT_BEFORE)
    }

    /// Entries that are not registered claims.
    pub fn custom(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0
            .iter()
            .filter(|(name, _)| !REGISTERED_CLAIMS.contains(&name.as_str()))
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    /// A NumericDate claim in unix seconds.
    ///
    /// Absent is `Ok(None)`; present but not a number is `ClaimsInvalid`.
    pub(crate) fn numeric_date(&self, name: &str) -> Result<Option<i64>, TokenError> {
        match self.get(name) {
            None => Ok(None),
            Some(value) => numeric_seconds(value)
                .map(Some)
                .ok_or_else(|| TokenError::ClaimsInvalid(format!("{name} is not a numeric date"))),
        }
    }

    fn timestamp(&self, name: &str) -> Option<DateTime<Utc>> {
        self.get(name)
            .and_then(numeric_seconds)
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    fn insert(&mut self, name: &str, value: impl Into<Value>) {
        self.0.insert(name.to_string(), value.into());
    }
}

impl From<Map<String, Value>> for Claims {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn numeric_seconds(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.is_finite()).map(|f| f.floor() as i64))
}

/// Caller input for one issuance.
#[derive(Debug, Clone, Default)]
pub struct ClaimsRequest {
    /// Empty means "omit `sub`".
    pub subject: String,
    /// Empty means "omit `aud`".
    pub audience: Vec<String>,
    pub custom: Map<String, Value>,
    pub ttl: Option<Duration>,
    pub not_before: Option<DateTime<Utc>>,
}

impl ClaimsRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn with_audience<I, S>(mut self, audience: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.audience = audience.into_iter().map(Into::into).collect();
        self
    }

    /// Add a custom claim.
    pub fn with_claim(mut self, name: impl Into<String>, value: Value) -> Self {
        self.custom.insert(name.into(), value);
        self
    }

    pub fn with_claims(mut self, claims: Map<String, Value>) -> Self {
        self.custom.extend(claims);
        self
    }

    /// Expire `ttl` after issuance.
    pub fn expires_in(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn valid_from(mut self, not_before: DateTime<Utc>) -> Self {
        self.not_before = Some(not_before);
        self
    }
}

/// Builds the canonical claim set for an issuer.
#[derive(Clone)]
pub struct ClaimsBuilder {
    issuer: String,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl ClaimsBuilder {
    /// Create a builder stamping `iss` with `issuer`, using the wall clock and random UUIDs.
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            clock: Arc::new(SystemClock),
            ids: Arc::new(RandomUuid),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Arc::new(ids);
        self
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Assemble the claim set for `request`.
    ///
    /// `now` is captured once and shared by `iat` and `exp`. Custom claims are
    /// merged first and every registered name is then cleared and rewritten, so a
    /// caller can never supply `iss`, `jti`, or any other registered claim.
    pub fn build(&self, request: &ClaimsRequest) -> Result<Claims, TokenError> {
        let now = self.clock.now();

        let expires_at = match request.ttl {
            Some(ttl) => Some(expiry(now, ttl)?),
            None => None,
        };
        let jti = self.ids.generate()?;

        let mut claims = Claims::from(request.custom.clone());
        for name in REGISTERED_CLAIMS {
            claims.0.remove(name);
        }

        claims.insert(ISSUER, self.issuer.as_str());
        claims.insert(JWT_ID, jti);
        claims.insert(ISSUED_AT, now.timestamp());
        if !request.subject.is_empty() {
            claims.insert(SUBJECT, request.subject.as_str());
        }
        if !request.audience.is_empty() {
            claims.insert(AUDIENCE, request.audience.clone());
        }
        if let Some(exp) = expires_at {
            claims.insert(EXPIRATION, exp);
        }
        if let Some(nbf) = request.not_before {
            claims.insert(NOT_BEFORE, nbf.timestamp());
        }

        Ok(claims)
    }
}

impl fmt::Debug for ClaimsBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClaimsBuilder")
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

/// Shortest TTL that still yields an `exp` after `iat` at second granularity.
pub const MIN_TTL: Duration = Duration::seconds(1);

/// `exp` for a token issued at `now`. Validity depends on `ttl` alone, never on the
/// fractional part of `now`.
fn expiry(now: DateTime<Utc>, ttl: Duration) -> Result<i64, TokenError> {
    let invalid = || TokenError::ExpirationInvalid {
        ttl_ms: ttl.num_milliseconds(),
    };
    if ttl < MIN_TTL {
        return Err(invalid());
    }
    Ok(now.checked_add_signed(ttl).ok_or_else(invalid)?.timestamp())
}
