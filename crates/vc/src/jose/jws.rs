//! # JSON Web Signature (JWS)
//!
//! JWS ([RFC7515]) represents content secured with digital signatures using
//! JSON-based data structures. Credentials travel either as a signed compact
//! JWS or as an unsecured JWT ([RFC7519] §6) whose header declares
//! `"alg": "none"` and whose signature part is empty.
//!
//! [RFC7515]: https://www.rfc-editor.org/rfc/rfc7515
//! [RFC7519]: https://www.rfc-editor.org/rfc/rfc7519

use std::str;

use anyhow::{anyhow, bail};
use base64ct::{Base64UrlUnpadded, Encoding};
use ecdsa::signature::Verifier as _;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::jose::jwk::{Curve, PublicKeyJwk};

/// Resolves a key id to the public key used for signature verification.
pub type PublicKeyFetcher = Box<dyn Fn(&str) -> anyhow::Result<PublicKeyJwk> + Send + Sync>;

/// Compact JOSE header.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Header {
    /// Signature algorithm, e.g. "`EdDSA`", or "`none`" for unsecured JWTs.
    pub alg: String,

    /// Identifier of the signing key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    /// Token type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
}

/// A decoded JWT: header plus claims.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Jwt<T> {
    /// The JOSE header.
    pub header: Header,

    /// The claims set.
    pub claims: T,
}

/// Returns `true` when the bytes look like a signed compact JWS: three
/// dot-separated parts, a decodable header, and a non-empty signature.
pub fn is_jws(data: &[u8]) -> bool {
    let Ok(token) = str::from_utf8(data) else {
        return false;
    };
    let parts: Vec<&str> = token.split('.').collect();

    parts.len() == 3 && !parts[2].is_empty() && decode_header(parts[0]).is_ok()
}

/// Returns `true` when the bytes look like an unsecured JWT: three
/// dot-separated parts, a decodable header, and an empty signature.
pub fn is_jwt_unsecured(data: &[u8]) -> bool {
    let Ok(token) = str::from_utf8(data) else {
        return false;
    };
    let parts: Vec<&str> = token.split('.').collect();

    parts.len() == 3 && parts[2].is_empty() && decode_header(parts[0]).is_ok()
}

/// Decode a compact JWS, verifying its signature with the key resolved by
/// `pk_fetcher`, and return the claims.
///
/// # Errors
///
/// Fails when the compact form is malformed, the algorithm is not
/// recognised, the key cannot be fetched, or the signature does not verify.
pub fn decode<T>(token: &str, pk_fetcher: &PublicKeyFetcher) -> anyhow::Result<Jwt<T>>
where
    T: DeserializeOwned,
{
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        bail!("invalid Compact JWS format");
    }

    let header = decode_header(parts[0])?;
    let sig = Base64UrlUnpadded::decode_vec(parts[2])
        .map_err(|e| anyhow!("issue decoding signature: {e}"))?;

    // check algorithm
    if !(header.alg == "ES256K" || header.alg == "EdDSA") {
        bail!("'alg' is not recognised");
    }

    let Some(kid) = header.kid.clone() else {
        bail!("'kid' is not set");
    };

    // the signature is checked before any claims are extracted
    let jwk = pk_fetcher(&kid)?;
    verify(&jwk, &format!("{}.{}", parts[0], parts[1]), &sig)?;

    Ok(Jwt { header, claims: decode_claims(parts[1])? })
}

/// Decode an unsecured JWT and return the claims. The header MUST declare
/// `"alg": "none"` and the signature part MUST be empty.
///
/// # Errors
///
/// Fails when the compact form is malformed or the header declares a
/// signing algorithm.
pub fn decode_unsecured<T>(token: &str) -> anyhow::Result<Jwt<T>>
where
    T: DeserializeOwned,
{
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        bail!("invalid unsecured JWT format");
    }

    let header = decode_header(parts[0])?;
    if header.alg != "none" {
        bail!("unsecured JWT must have 'alg' set to \"none\"");
    }
    if !parts[2].is_empty() {
        bail!("unsecured JWT must have an empty signature");
    }

    Ok(Jwt { header, claims: decode_claims(parts[1])? })
}

fn decode_header(part: &str) -> anyhow::Result<Header> {
    let decoded =
        Base64UrlUnpadded::decode_vec(part).map_err(|e| anyhow!("issue decoding header: {e}"))?;
    serde_json::from_slice(&decoded).map_err(|e| anyhow!("issue deserializing header: {e}"))
}

fn decode_claims<T: DeserializeOwned>(part: &str) -> anyhow::Result<T> {
    let decoded =
        Base64UrlUnpadded::decode_vec(part).map_err(|e| anyhow!("issue decoding claims: {e}"))?;
    serde_json::from_slice(&decoded).map_err(|e| anyhow!("issue deserializing claims: {e}"))
}

/// Verify the signature of the provided message using the JWK.
///
/// # Errors
///
/// Will return an error if the signature is invalid, the JWK is invalid, or
/// the algorithm is unsupported.
pub fn verify(jwk: &PublicKeyJwk, msg: &str, sig: &[u8]) -> anyhow::Result<()> {
    match jwk.crv {
        Curve::Es256K => verify_es256k(jwk, msg, sig),
        Curve::Ed25519 => verify_eddsa(jwk, msg, sig),
    }
}

// Verify the signature of the provided message using the ES256K algorithm.
fn verify_es256k(jwk: &PublicKeyJwk, msg: &str, sig: &[u8]) -> anyhow::Result<()> {
    use ecdsa::{Signature, VerifyingKey};
    use k256::Secp256k1;

    // build verifying key
    let y = jwk.y.as_ref().ok_or_else(|| anyhow!("verification JWK 'y' is invalid"))?;
    let mut sec1 = vec![0x04]; // uncompressed format
    sec1.append(&mut Base64UrlUnpadded::decode_vec(&jwk.x)?);
    sec1.append(&mut Base64UrlUnpadded::decode_vec(y)?);

    let verifying_key = VerifyingKey::<Secp256k1>::from_sec1_bytes(&sec1)?;
    let signature: Signature<Secp256k1> = Signature::from_slice(sig)?;
    let normalised = signature.normalize_s().unwrap_or(signature);

    Ok(verifying_key.verify(msg.as_bytes(), &normalised)?)
}

// Verify the signature of the provided message using the EdDSA algorithm.
fn verify_eddsa(jwk: &PublicKeyJwk, msg: &str, sig_bytes: &[u8]) -> anyhow::Result<()> {
    use ed25519_dalek::{Signature, VerifyingKey};

    // build verifying key
    let x_bytes = Base64UrlUnpadded::decode_vec(&jwk.x)
        .map_err(|e| anyhow!("unable to base64 decode JWK 'x': {e}"))?;
    let bytes = &x_bytes.try_into().map_err(|_| anyhow!("invalid public key length"))?;
    let verifying_key = VerifyingKey::from_bytes(bytes)
        .map_err(|e| anyhow!("unable to build verifying key: {e}"))?;
    let signature =
        Signature::from_slice(sig_bytes).map_err(|e| anyhow!("unable to build signature: {e}"))?;

    verifying_key
        .verify(msg.as_bytes(), &signature)
        .map_err(|e| anyhow!("unable to verify signature: {e}"))
}
