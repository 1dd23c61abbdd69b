//! Integration tests for issuing and verifying tokens across all strategies.
//!
//! Run with: cargo test --package warden-jwt --test token_flow

use chrono::{DateTime, Duration};
use serde_json::{Map, json};
use std::sync::Arc;
use warden_jwt::{
    AsymmetricIssuer, AsymmetricVerifier, ClaimsRequest, FixedClock, IdGenerator, Issuer,
    SymmetricIssuer, SymmetricVerifier, TokenError, TokenIssuer, TokenVerifier, UnsignedIssuer,
    UnsignedVerifier, Verifier, inspect_token_unverified, read_rsa_private_key_pkcs8,
    read_rsa_public_key_x509,
};

const NOW: i64 = 1_700_000_000;
const SECRET: &[u8] = b"integration-test-secret-0123456789";
const PRIVATE_PEM: &str = include_str!("../testdata/rsa-private-pkcs8.pem");
const PUBLIC_PEM: &str = include_str!("../testdata/rsa-public-x509.pem");

fn shared_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::at_timestamp(NOW).unwrap())
}

/// Matching (issuer, verifier) pairs for every strategy, sharing one clock.
fn pairs(clock: &Arc<FixedClock>) -> Vec<(Issuer, Verifier)> {
    let private_key = read_rsa_private_key_pkcs8(PRIVATE_PEM).unwrap();
    let public_key = read_rsa_public_key_x509(PUBLIC_PEM).unwrap();

    vec![
        (
            UnsignedIssuer::new("auth.example.dev").into(),
            UnsignedVerifier::new().into(),
        ),
        (
            SymmetricIssuer::new("auth.example.dev", SECRET.to_vec())
                .unwrap()
                .into(),
            SymmetricVerifier::new(SECRET.to_vec()).unwrap().into(),
        ),
        (
            AsymmetricIssuer::new("auth.example.dev", private_key)
                .unwrap()
                .into(),
            AsymmetricVerifier::new(public_key).unwrap().into(),
        ),
    ]
    .into_iter()
    .map(|(issuer, verifier): (Issuer, Verifier)| {
        (
            issuer.with_clock(clock.clone()),
            verifier.with_clock(clock.clone()),
        )
    })
    .collect()
}

#[test]
fn test_round_trip_all_strategies() {
    let clock = shared_clock();
    let mut custom = Map::new();
    custom.insert("role".into(), json!("admin"));
    custom.insert("scopes".into(), json!(["read", "write"]));

    for (issuer, verifier) in pairs(&clock) {
        let nbf = DateTime::from_timestamp(NOW - 10, 0).unwrap();
        let token = issuer
            .issue_token(
                "user-42",
                &["billing".to_string(), "reports".to_string()],
                custom.clone(),
                Some(Duration::minutes(15)),
                Some(nbf),
            )
            .unwrap();

        let claims = verifier.verify(&token).unwrap();
        assert_eq!(claims.issuer(), Some("auth.example.dev"));
        assert_eq!(claims.subject(), Some("user-42"));
        assert_eq!(claims.audience(), vec!["billing", "reports"]);
        assert_eq!(claims.get("role"), Some(&json!("admin")));
        assert_eq!(claims.get("scopes"), Some(&json!(["read", "write"])));
        assert_eq!(claims.issued_at().unwrap().timestamp(), NOW);
        assert_eq!(claims.expires_at().unwrap().timestamp(), NOW + 900);
        assert_eq!(claims.not_before().unwrap().timestamp(), NOW - 10);
        assert!(claims.jwt_id().is_some());
    }
}

#[test]
fn test_expiry_boundary() {
    let clock = shared_clock();

    for (issuer, verifier) in pairs(&clock) {
        clock.set(DateTime::from_timestamp(NOW, 0).unwrap());
        let token = issuer
            .issue(&ClaimsRequest::new().expires_in(Duration::seconds(60)))
            .unwrap();

        clock.advance(Duration::seconds(59));
        assert!(verifier.verify(&token).is_ok());

        clock.advance(Duration::seconds(1));
        let err = verifier.verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::ClaimsInvalid(_)), "{err:?}");
    }
}

#[test]
fn test_one_second_ttl_expiry_boundary() {
    let clock = shared_clock();

    for (issuer, verifier) in pairs(&clock) {
        clock.set(DateTime::from_timestamp(NOW, 0).unwrap());
        let token = issuer
            .issue(&ClaimsRequest::new().expires_in(Duration::seconds(1)))
            .unwrap();

        assert!(verifier.verify(&token).is_ok());

        clock.advance(Duration::seconds(1));
        let err = verifier.verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::ClaimsInvalid(_)), "{err:?}");
    }
}

#[test]
fn test_ttl_outcome_independent_of_issuance_millis() {
    let clock = shared_clock();

    for (issuer, _) in pairs(&clock) {
        for millis in [200, 800] {
            clock.set(DateTime::from_timestamp(NOW, millis * 1_000_000).unwrap());

            let short = issuer.issue(&ClaimsRequest::new().expires_in(Duration::milliseconds(400)));
            assert!(
                matches!(short.unwrap_err().cause(), TokenError::ExpirationInvalid { .. }),
                "400ms ttl at .{millis}"
            );
            assert!(
                issuer
                    .issue(&ClaimsRequest::new().expires_in(Duration::seconds(1)))
                    .is_ok(),
                "1s ttl at .{millis}"
            );
        }
    }
}

#[test]
fn test_not_before_boundary() {
    let clock = shared_clock();

    for (issuer, verifier) in pairs(&clock) {
        clock.set(DateTime::from_timestamp(NOW, 0).unwrap());
        let nbf = DateTime::from_timestamp(NOW + 5, 0).unwrap();
        let token = issuer
            .issue(&ClaimsRequest::new().valid_from(nbf))
            .unwrap();

        let err = verifier.verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::ClaimsInvalid(_)), "{err:?}");

        clock.advance(Duration::seconds(4));
        assert!(verifier.verify(&token).is_err());

        clock.advance(Duration::seconds(1));
        assert!(verifier.verify(&token).is_ok());
    }
}

#[test]
fn test_negative_ttl_rejected_by_every_issuer() {
    let clock = shared_clock();

    for (issuer, _) in pairs(&clock) {
        let err = issuer
            .issue(&ClaimsRequest::new().expires_in(Duration::seconds(-1)))
            .unwrap_err();
        assert!(matches!(err, TokenError::IssuanceFailed { .. }));
        assert!(matches!(err.cause(), TokenError::ExpirationInvalid { .. }));
        assert!(!err.is_retryable());
    }
}

#[test]
fn test_custom_claims_cannot_override_registered() {
    let clock = shared_clock();
    let mut custom = Map::new();
    custom.insert("iss".into(), json!("attacker"));
    custom.insert("jti".into(), json!("forged"));
    custom.insert("iat".into(), json!(0));
    custom.insert("exp".into(), json!(i64::MAX));

    for (issuer, verifier) in pairs(&clock) {
        let token = issuer
            .issue(&ClaimsRequest::new().with_claims(custom.clone()))
            .unwrap();
        let claims = verifier.verify(&token).unwrap();

        assert_eq!(claims.issuer(), Some("auth.example.dev"));
        assert_ne!(claims.jwt_id(), Some("forged"));
        assert_eq!(claims.issued_at().unwrap().timestamp(), NOW);
        assert!(claims.expires_at().is_none());
    }
}

#[test]
fn test_jti_is_fresh_per_issuance() {
    let clock = shared_clock();

    for (issuer, verifier) in pairs(&clock) {
        let first = verifier
            .verify(&issuer.issue(&ClaimsRequest::new()).unwrap())
            .unwrap();
        let second = verifier
            .verify(&issuer.issue(&ClaimsRequest::new()).unwrap())
            .unwrap();
        assert_ne!(first.jwt_id(), second.jwt_id());
    }
}

#[test]
fn test_empty_subject_and_audience_are_omitted() {
    let clock = shared_clock();

    for (issuer, _) in pairs(&clock) {
        let token = issuer.issue_token("", &[], Map::new(), None, None).unwrap();
        let claims = inspect_token_unverified(&token).unwrap().claims;
        assert!(!claims.contains("sub"));
        assert!(!claims.contains("aud"));
        assert!(!claims.contains("exp"));
        assert!(!claims.contains("nbf"));
    }
}

#[test]
fn test_tampered_payload_rejected() {
    let clock = shared_clock();
    let forged_payload = warden_jwt::codec::encode_segment(
        json!({"iss": "auth.example.dev", "sub": "admin"})
            .to_string()
            .as_bytes(),
    );

    for (issuer, verifier) in pairs(&clock).into_iter().skip(1) {
        let token = issuer
            .issue(&ClaimsRequest::new().with_subject("user-1"))
            .unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        let err = verifier.verify(&forged).unwrap_err();
        assert!(matches!(err, TokenError::VerificationFailed(_)), "{err:?}");
    }
}

#[test]
fn test_wrong_key_rejected() {
    let clock = shared_clock();
    let token = SymmetricIssuer::new("auth", SECRET.to_vec())
        .unwrap()
        .with_clock(clock.clone())
        .issue(&ClaimsRequest::new())
        .unwrap();
    let verifier = SymmetricVerifier::new(b"a-different-secret".to_vec()).unwrap();
    assert!(matches!(
        verifier.verify(&token),
        Err(TokenError::VerificationFailed(_))
    ));

    let other_public =
        read_rsa_public_key_x509(include_str!("../testdata/rsa-other-public-x509.pem")).unwrap();
    let token = AsymmetricIssuer::new("auth", read_rsa_private_key_pkcs8(PRIVATE_PEM).unwrap())
        .unwrap()
        .issue(&ClaimsRequest::new())
        .unwrap();
    assert!(matches!(
        AsymmetricVerifier::new(other_public).unwrap().verify(&token),
        Err(TokenError::VerificationFailed(_))
    ));
}

#[test]
fn test_malformed_tokens() {
    let verifier = SymmetricVerifier::new(SECRET.to_vec()).unwrap();

    for token in [
        "",
        "not-a-token",
        "only.two",
        "a.b.c.d",
        "!!!.e30.",
        "e30.%%%.",
        "bm90IGpzb24.e30.",
    ] {
        let err = verifier.verify(token).unwrap_err();
        assert!(matches!(err, TokenError::Malformed(_)), "{token}: {err:?}");
    }
}

struct ExhaustedIds;

impl IdGenerator for ExhaustedIds {
    fn generate(&self) -> Result<String, TokenError> {
        Err(TokenError::IdGenerationFailed("entropy source unavailable".into()))
    }
}

#[test]
fn test_id_generation_failure_is_retryable() {
    let err = SymmetricIssuer::new("auth", SECRET.to_vec())
        .unwrap()
        .with_id_generator(ExhaustedIds)
        .issue(&ClaimsRequest::new())
        .unwrap_err();

    assert!(matches!(err, TokenError::IssuanceFailed { .. }));
    assert!(matches!(err.cause(), TokenError::IdGenerationFailed(_)));
    assert!(err.is_retryable());
}

#[test]
fn test_concurrent_issue_and_verify() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Issuer>();
    assert_send_sync::<Verifier>();

    let clock = shared_clock();
    let (issuer, verifier) = pairs(&clock).swap_remove(1);

    let ids: Vec<String> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|n| {
                let issuer = &issuer;
                let verifier = &verifier;
                scope.spawn(move || {
                    let token = issuer
                        .issue(&ClaimsRequest::new().with_subject(format!("user-{n}")))
                        .unwrap();
                    let claims = verifier.verify(&token).unwrap();
                    assert_eq!(claims.subject(), Some(format!("user-{n}").as_str()));
                    claims.jwt_id().unwrap().to_string()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let mut unique = ids.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), ids.len());
}
