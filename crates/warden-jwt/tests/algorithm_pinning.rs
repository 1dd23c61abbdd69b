//! Algorithm-confusion tests: a verifier only accepts the algorithm it was built with.
//!
//! Run with: cargo test --package warden-jwt --test algorithm_pinning

use serde_json::json;
use warden_jwt::codec::encode_segment;
use warden_jwt::{
    Algorithm, AsymmetricIssuer, AsymmetricVerifier, ClaimsRequest, Issuer, SymmetricIssuer,
    SymmetricVerifier, TokenError, TokenIssuer, TokenVerifier, UnsignedIssuer, UnsignedVerifier,
    Verifier, read_rsa_private_key_pkcs8, read_rsa_public_key_x509,
};

const SECRET: &[u8] = b"pinning-test-secret-0123456789abc";
const PRIVATE_PEM: &str = include_str!("../testdata/rsa-private-pkcs8.pem");
const PUBLIC_PEM: &str = include_str!("../testdata/rsa-public-x509.pem");

fn issuers() -> Vec<Issuer> {
    let private_key = read_rsa_private_key_pkcs8(PRIVATE_PEM).unwrap();
    vec![
        UnsignedIssuer::new("auth").into(),
        SymmetricIssuer::new("auth", SECRET.to_vec()).unwrap().into(),
        AsymmetricIssuer::new("auth", private_key).unwrap().into(),
    ]
}

fn verifiers() -> Vec<Verifier> {
    let public_key = read_rsa_public_key_x509(PUBLIC_PEM).unwrap();
    vec![
        UnsignedVerifier::new().into(),
        SymmetricVerifier::new(SECRET.to_vec()).unwrap().into(),
        AsymmetricVerifier::new(public_key).unwrap().into(),
    ]
}

fn with_signature(token: &str, signature: &[u8]) -> String {
    let input = token.rsplit_once('.').unwrap().0;
    format!("{input}.{}", encode_segment(signature))
}

#[test]
fn test_cross_strategy_tokens_rejected() {
    let garbage = [0x41u8; 256];

    for issuer in issuers() {
        let token = issuer.issue(&ClaimsRequest::new()).unwrap();

        for verifier in verifiers() {
            if verifier.algorithm() == issuer.algorithm() {
                assert!(verifier.verify(&token).is_ok());
                continue;
            }

            for candidate in [
                token.clone(),
                with_signature(&token, &garbage),
                with_signature(&token, &[]),
            ] {
                let err = verifier.verify(&candidate).unwrap_err();
                assert!(
                    matches!(err, TokenError::VerificationFailed(_)),
                    "{} token accepted-or-misclassified by {} verifier: {err:?}",
                    issuer.algorithm(),
                    verifier.algorithm()
                );
            }
        }
    }
}

#[test]
fn test_none_token_rejected_by_signing_verifiers() {
    let header = encode_segment(json!({"alg": "none", "typ": "JWT"}).to_string().as_bytes());
    let payload = encode_segment(json!({"sub": "admin"}).to_string().as_bytes());
    let token = format!("{header}.{payload}.");

    for verifier in verifiers().into_iter().skip(1) {
        assert!(matches!(
            verifier.verify(&token),
            Err(TokenError::VerificationFailed(_))
        ));
    }
}

#[test]
fn test_hmac_signed_with_public_key_rejected() {
    // Classic confusion: sign HS256 using the RSA public key PEM as the secret.
    let issuer = SymmetricIssuer::new("auth", PUBLIC_PEM.as_bytes().to_vec()).unwrap();
    let token = issuer.issue(&ClaimsRequest::new()).unwrap();

    let verifier = AsymmetricVerifier::new(read_rsa_public_key_x509(PUBLIC_PEM).unwrap()).unwrap();
    assert!(matches!(
        verifier.verify(&token),
        Err(TokenError::VerificationFailed(_))
    ));
}

#[test]
fn test_same_family_different_digest_rejected() {
    let private_key = read_rsa_private_key_pkcs8(PRIVATE_PEM).unwrap();
    let public_key = read_rsa_public_key_x509(PUBLIC_PEM).unwrap();

    let token = AsymmetricIssuer::with_algorithm("auth", private_key, Algorithm::RS512)
        .unwrap()
        .issue(&ClaimsRequest::new())
        .unwrap();

    let rs256 = AsymmetricVerifier::new(public_key.clone()).unwrap();
    assert!(matches!(
        rs256.verify(&token),
        Err(TokenError::VerificationFailed(_))
    ));

    let rs512 = AsymmetricVerifier::with_algorithm(public_key, Algorithm::RS512).unwrap();
    assert!(rs512.verify(&token).is_ok());
}
