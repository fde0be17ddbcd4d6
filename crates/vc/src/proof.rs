//! # Enveloping Proofs
//!
//! A credential may arrive wrapped in a JOSE envelope: a signed compact JWS
//! or an unsecured JWT. In both cases the credential itself travels in the
//! `vc` claim and the registered JWT claims ([RFC7519]) overlay the
//! corresponding credential members; the envelope wins where they overlap.
//! The inverse direction, [`Credential::jwt_claims`], lifts the credential
//! members back out into the registered claims.
//!
//! [RFC7519]: https://www.rfc-editor.org/rfc/rfc7519

use anyhow::{anyhow, bail, Context as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::Quota;
use crate::error::Error;
use crate::jose::jws::{self, Jwt, PublicKeyFetcher};
use crate::model::vc::Credential;

/// An embedded proof, preserved verbatim through decode and re-serialization.
/// Proof creation and verification are the concern of an external collaborator.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Proof(pub Value);

/// JWT claims carrying a Verifiable Credential in the `vc` claim, as defined
/// by the [JWT encoding] of the data model.
///
/// [JWT encoding]: https://www.w3.org/TR/vc-data-model/#json-web-token
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct JwtCredClaims {
    /// MUST be the `issuer` of the credential.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub iss: String,

    /// MUST be the `credentialSubject.id` of the credential.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sub: String,

    /// MUST be the `id` of the credential.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub jti: String,

    /// MUST be the credential's `issuanceDate`, encoded as a UNIX timestamp
    /// (`NumericDate`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    /// MUST be the credential's `expirationDate`, encoded as a UNIX
    /// timestamp (`NumericDate`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Intended audience of the token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<Quota<String>>,

    /// The Verifiable Credential.
    pub vc: Value,
}

impl Credential {
    /// Converts the credential into JWT claims, ready to be serialized into
    /// a JWS.
    ///
    /// With `minimize` set, credential members that map onto registered
    /// claims (`id`, `issuanceDate`, `expirationDate`, and a bare
    /// string-form issuer) are dropped from the embedded `vc` claim: they
    /// live only in the envelope and are restored on decode. An issuer
    /// carrying a name is kept, as the envelope only carries its id.
    ///
    /// # Errors
    ///
    /// Fails when the credential cannot be marshaled to JSON.
    pub fn jwt_claims(&self, minimize: bool) -> Result<JwtCredClaims, Error> {
        let mut vc = serde_json::to_value(self).map_err(|e| Error::Marshal(e.to_string()))?;

        if minimize {
            if let Some(obj) = vc.as_object_mut() {
                obj.remove("id");
                obj.remove("issuanceDate");
                obj.remove("expirationDate");
                if self.issuer.name.is_none() {
                    obj.remove("issuer");
                }
            }
        }

        Ok(JwtCredClaims {
            iss: self.issuer.id.clone(),
            sub: self.subject_id().unwrap_or_default(),
            jti: self.id.clone().unwrap_or_default(),
            nbf: self.issued.map(|t| t.timestamp()),
            exp: self.expired.map(|t| t.timestamp()),
            aud: None,
            vc,
        })
    }
}

/// Unwraps a credential from its envelope. JWS input is verified with the
/// key resolved through `fetcher`; unsecured JWT input requires
/// `"alg": "none"`; anything else is passed through as JSON.
pub(crate) fn decode_envelope(
    data: &[u8], fetcher: Option<&PublicKeyFetcher>,
) -> anyhow::Result<Vec<u8>> {
    if jws::is_jws(data) {
        let Some(fetcher) = fetcher else {
            bail!("public key fetcher is not defined");
        };
        let token = std::str::from_utf8(data).context("JWS decoding")?;
        let jwt: Jwt<JwtCredClaims> = jws::decode(token, fetcher).context("JWS decoding")?;
        return refine_vc(jwt.claims).context("JWS decoding");
    }

    if jws::is_jwt_unsecured(data) {
        let token = std::str::from_utf8(data).context("unsecured JWT decoding")?;
        let jwt: Jwt<JwtCredClaims> =
            jws::decode_unsecured(token).context("unsecured JWT decoding")?;
        return refine_vc(jwt.claims).context("unsecured JWT decoding");
    }

    Ok(data.to_vec())
}

// Overlays the registered JWT claims onto the embedded `vc` claim. The
// envelope takes precedence over members the credential already carries.
fn refine_vc(claims: JwtCredClaims) -> anyhow::Result<Vec<u8>> {
    let JwtCredClaims { iss, sub, jti, nbf, exp, aud, vc } = claims;
    let Value::Object(mut obj) = vc else {
        bail!("JWT 'vc' claim is not an object");
    };

    if !iss.is_empty() {
        match obj.get_mut("issuer") {
            // the object form keeps its remaining members
            Some(Value::Object(issuer)) => {
                issuer.insert("id".into(), Value::String(iss));
            }
            _ => {
                obj.insert("issuer".into(), Value::String(iss));
            }
        }
    }

    if !jti.is_empty() {
        obj.insert("id".into(), Value::String(jti));
    }

    if !sub.is_empty() {
        if let Some(Value::Object(subject)) = obj.get_mut("credentialSubject") {
            subject.insert("id".into(), Value::String(sub));
        }
    }

    if let Some(nbf) = nbf {
        let issued = DateTime::<Utc>::from_timestamp(nbf, 0)
            .ok_or_else(|| anyhow!("JWT 'nbf' claim is out of range"))?;
        obj.insert("issuanceDate".into(), serde_json::to_value(issued)?);
    }

    if let Some(exp) = exp {
        let expired = DateTime::<Utc>::from_timestamp(exp, 0)
            .ok_or_else(|| anyhow!("JWT 'exp' claim is out of range"))?;
        obj.insert("expirationDate".into(), serde_json::to_value(expired)?);
    }

    if let Some(aud) = aud {
        obj.insert("audience".into(), serde_json::to_value(aud)?);
    }

    Ok(serde_json::to_vec(&Value::Object(obj))?)
}
