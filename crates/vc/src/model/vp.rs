//! # Verifiable Presentations
//!
//! [Verifiable Presentations](https://www.w3.org/TR/vc-data-model/#presentations-0)
//!
//! A presentation encloses one or more credentials for delivery to a
//! verifier. Serialization follows the same collapse rules as the credential
//! model: a single context or type is emitted as a bare string.

use serde::ser::Serializer;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::core::Kind;
use crate::error::Error;
use crate::model::vc::{context_to_serialize, types_to_serialize, Credential, VP_TYPE};
use crate::proof::Proof;

/// A Verifiable Presentation is used to combine and present credentials to a
/// verifier.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Presentation {
    /// Ordered context URIs.
    pub context: Vec<String>,

    /// Context entries following the URI prefix.
    pub custom_context: Vec<Kind<Value>>,

    /// Presentation identifier URI.
    pub id: Option<String>,

    /// Ordered presentation types. Contains [`VP_TYPE`].
    pub types: Vec<String>,

    /// The enclosed credentials, in their marshaled JSON form.
    pub verifiable_credential: Vec<Value>,

    /// URI of the entity generating the presentation.
    pub holder: Option<String>,

    /// Embedded proof, preserved verbatim.
    pub proof: Option<Proof>,
}

#[derive(Serialize)]
struct RawPresentation {
    #[serde(rename = "@context")]
    context: Value,

    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,

    #[serde(rename = "type")]
    type_: Value,

    #[serde(rename = "verifiableCredential", skip_serializing_if = "Vec::is_empty")]
    verifiable_credential: Vec<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    holder: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    proof: Option<Proof>,
}

impl Serialize for Presentation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RawPresentation {
            context: context_to_serialize(&self.context, &self.custom_context),
            id: self.id.clone(),
            type_: types_to_serialize(&self.types),
            verifiable_credential: self.verifiable_credential.clone(),
            holder: self.holder.clone(),
            proof: self.proof.clone(),
        }
        .serialize(serializer)
    }
}

impl Credential {
    /// Encloses the credential into a presentation: the credential's context
    /// is carried over, the type is [`VP_TYPE`], and the credential is the
    /// sole `verifiableCredential` entry.
    ///
    /// # Errors
    ///
    /// Fails when the credential cannot be marshaled to JSON.
    pub fn presentation(&self) -> Result<Presentation, Error> {
        let vc = serde_json::to_value(self).map_err(|e| Error::Marshal(e.to_string()))?;

        Ok(Presentation {
            context: self.context.clone(),
            custom_context: self.custom_context.clone(),
            id: Some(format!("urn:uuid:{}", Uuid::new_v4())),
            types: vec![VP_TYPE.into()],
            verifiable_credential: vec![vc],
            holder: None,
            proof: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::vc::CredentialOptions;

    #[test]
    fn presentation_from_credential() {
        let doc = json!({
            "@context": ["https://www.w3.org/2018/credentials/v1"],
            "type": ["VerifiableCredential"],
            "issuer": "did:example:123",
            "issuanceDate": "2010-01-01T19:23:24Z",
            "credentialSubject": {"id": "did:example:abc"}
        });
        let data = serde_json::to_vec(&doc).expect("should serialize");
        let (vc, _) =
            Credential::decode(&data, &CredentialOptions::new()).expect("should decode");

        let vp = vc.presentation().expect("should build presentation");
        assert_eq!(vp.context, vc.context);
        assert_eq!(vp.types, vec![VP_TYPE]);
        assert_eq!(vp.verifiable_credential.len(), 1);

        let vp_json = serde_json::to_value(&vp).expect("should serialize");
        assert_eq!(*vp_json.get("type").expect("type should be set"), json!(VP_TYPE));
        assert_eq!(
            *vp_json.get("verifiableCredential").expect("credential should be enclosed"),
            json!([serde_json::to_value(&vc).expect("should serialize")])
        );
        assert!(
            vp_json
                .get("id")
                .and_then(Value::as_str)
                .is_some_and(|id| id.starts_with("urn:uuid:")),
            "presentation id should be a urn:uuid"
        );
    }
}
