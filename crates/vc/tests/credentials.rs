//! End-to-end credential processing through the public API.

use base64ct::{Base64UrlUnpadded, Encoding};
use serde_json::{json, Value};
use veridian_vc::{Credential, CredentialOptions, Validation, BASE_CONTEXT, VP_TYPE};

fn sample_vc() -> Value {
    json!({
        "@context": [
            "https://www.w3.org/2018/credentials/v1",
            "https://www.w3.org/2018/credentials/examples/v1"
        ],
        "id": "http://example.edu/credentials/1872",
        "type": ["VerifiableCredential", "UniversityDegreeCredential"],
        "issuer": {"id": "did:example:76e12ec712ebc6f1c221ebfeb1f", "name": "Example University"},
        "issuanceDate": "2010-01-01T19:23:24Z",
        "credentialSubject": {
            "id": "did:example:ebfeb1f712ebc6f1c276e12ec21",
            "degree": {"type": "BachelorDegree", "name": "Bachelor of Science and Arts"}
        },
        "referenceNumber": 83_294_847
    })
}

#[test]
fn json_credential_round_trip() {
    let data = serde_json::to_vec(&sample_vc()).expect("should serialize");
    let (vc, bytes) = Credential::decode(&data, &CredentialOptions::new()).expect("should decode");

    assert_eq!(vc.issuer.id, "did:example:76e12ec712ebc6f1c221ebfeb1f");
    assert_eq!(vc.issuer.name.as_deref(), Some("Example University"));
    assert_eq!(vc.context[0], BASE_CONTEXT);
    assert_eq!(vc.custom_fields["referenceNumber"], json!(83_294_847));
    assert_eq!(bytes, data);

    let emitted = serde_json::to_value(&vc).expect("should serialize");
    assert_eq!(emitted, sample_vc(), "re-emitted JSON should equal the source document");
}

#[test]
fn unsecured_jwt_to_presentation() {
    let claims = json!({
        "vc": {
            "@context": ["https://www.w3.org/2018/credentials/v1"],
            "type": ["VerifiableCredential"],
            "credentialSubject": {"id": "did:example:ebfeb1f712ebc6f1c276e12ec21"}
        },
        "iss": "did:example:76e12ec712ebc6f1c221ebfeb1f",
        "jti": "urn:uuid:1872",
        "nbf": 1_262_373_804
    });
    let token = format!(
        "{}.{}.",
        Base64UrlUnpadded::encode_string(br#"{"alg":"none"}"#),
        Base64UrlUnpadded::encode_string(&serde_json::to_vec(&claims).expect("should encode"))
    );

    let (vc, _) =
        Credential::decode(token.as_bytes(), &CredentialOptions::new()).expect("should decode");
    assert_eq!(vc.id.as_deref(), Some("urn:uuid:1872"));

    let vp = vc.presentation().expect("should build presentation");
    let vp_json = serde_json::to_value(&vp).expect("should serialize");
    assert_eq!(vp_json["type"], json!(VP_TYPE));
    assert_eq!(
        vp_json["verifiableCredential"][0]["issuer"],
        json!("did:example:76e12ec712ebc6f1c221ebfeb1f")
    );
}

#[test]
fn validation_modes_govern_extensions() {
    let data = serde_json::to_vec(&sample_vc()).expect("should serialize");

    let base_only = CredentialOptions::new().validation(Validation::BaseOnly);
    Credential::decode(&data, &base_only).expect_err("extended credential should fail base-only");

    let extended = CredentialOptions::new().validation(Validation::BaseExtended {
        contexts: vec!["https://www.w3.org/2018/credentials/examples/v1".into()],
        types: vec!["UniversityDegreeCredential".into()],
    });
    Credential::decode(&data, &extended).expect("allow-listed extension should pass");
}
