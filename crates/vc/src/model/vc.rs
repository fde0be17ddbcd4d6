//! # W3C Verifiable Credentials Data Model
//!
//! An implementation of the W3C [Verifiable Credentials Data Model v1.1]
//! focused on lossless ingestion. [`Credential::decode`] accepts a credential
//! serialized as bare JSON, as an unsecured JWT, or as a signed JWS, and
//! produces the canonical [`Credential`] plus the normalized JSON document it
//! was decoded from. Serializing a [`Credential`] reverses the mapping,
//! collapsing single-element fields back to their scalar forms and merging
//! preserved custom fields into the output.
//!
//! [Verifiable Credentials Data Model v1.1]: https://www.w3.org/TR/vc-data-model

use std::any::Any;

use anyhow::{anyhow, bail, Context as _};
use chrono::{DateTime, Utc};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::{Kind, Quota};
use crate::error::Error;
use crate::jose::jws::PublicKeyFetcher;
use crate::proof::{self, Proof};
use crate::schema::{self, CredentialSchemaLoader};

/// The base context of the Verifiable Credentials data model.
///
/// See <https://www.w3.org/TR/vc-data-model/#contexts>.
pub const BASE_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";

/// The base credential type.
///
/// See <https://www.w3.org/TR/vc-data-model/#types>.
pub const VC_TYPE: &str = "VerifiableCredential";

/// The base presentation type.
///
/// See <https://www.w3.org/TR/vc-data-model/#presentations-0>.
pub const VP_TYPE: &str = "VerifiablePresentation";

/// Top-level members consumed by the credential data model. A custom field
/// is never allowed to shadow one of these on output.
const RESERVED_FIELDS: [&str; 13] = [
    "@context",
    "id",
    "type",
    "credentialSubject",
    "issuanceDate",
    "expirationDate",
    "proof",
    "credentialStatus",
    "issuer",
    "credentialSchema",
    "evidence",
    "termsOfUse",
    "refreshService",
];

/// `Credential` is the canonical in-memory form of a Verifiable Credential.
///
/// It is produced by [`Credential::decode`] and is not intended to be mutated
/// afterwards. Unknown top-level members of the source document are carried
/// in `custom_fields` and re-emitted verbatim on serialization.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Credential {
    /// Ordered context URIs. The first entry is always [`BASE_CONTEXT`].
    pub context: Vec<String>,

    /// Context entries following the URI prefix: JSON-LD context objects and
    /// any values trailing them, in their original order.
    pub custom_context: Vec<Kind<Value>>,

    /// Credential identifier URI.
    pub id: Option<String>,

    /// Ordered credential types. Contains [`VC_TYPE`].
    pub types: Vec<String>,

    /// Claims about the credential subject(s): a string, an object, or an
    /// array of objects, passed through opaquely.
    pub subject: Option<Value>,

    /// The credential issuer.
    pub issuer: Issuer,

    /// The date-time the credential was issued.
    pub issued: Option<DateTime<Utc>>,

    /// The date-time the credential expires.
    pub expired: Option<DateTime<Utc>>,

    /// Embedded proof, preserved verbatim.
    pub proof: Option<Proof>,

    /// Credential status entry.
    pub status: Option<TypedId>,

    /// Declared credential schemas.
    pub schemas: Vec<TypedId>,

    /// Supporting evidence, passed through opaquely.
    pub evidence: Option<Value>,

    /// Terms under which the credential was issued.
    pub terms_of_use: Vec<TypedId>,

    /// Link to the issuer's refresh service.
    pub refresh_service: Option<TypedId>,

    /// Every top-level member of the source document not consumed by the
    /// fields above.
    pub custom_fields: Map<String, Value>,
}

/// Issuer of a Verifiable Credential.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Issuer {
    /// The issuer URI.
    pub id: String,

    /// Optional human-readable issuer name.
    pub name: Option<String>,
}

/// `TypedId` is an `{id, type}` pair used by credential status, schema,
/// terms-of-use, and refresh-service entries.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct TypedId {
    /// Entry URI.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,

    /// Entry type: a single type string or a set of them.
    #[serde(rename = "type")]
    pub type_: Quota<String>,
}

/// The wire shape of a credential. Polymorphic members are held as plain
/// JSON values and interpreted by the field decoders; everything that is not
/// a mapped field falls through into `custom_fields`.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub(crate) struct RawCredential {
    #[serde(rename = "@context", skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<Value>,

    #[serde(rename = "credentialSubject", skip_serializing_if = "Option::is_none")]
    pub subject: Option<Value>,

    #[serde(rename = "issuanceDate", skip_serializing_if = "Option::is_none")]
    pub issued: Option<DateTime<Utc>>,

    #[serde(rename = "expirationDate", skip_serializing_if = "Option::is_none")]
    pub expired: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof: Option<Proof>,

    #[serde(rename = "credentialStatus", skip_serializing_if = "Option::is_none")]
    pub status: Option<TypedId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<Value>,

    #[serde(rename = "credentialSchema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Value>,

    #[serde(rename = "termsOfUse", skip_serializing_if = "Vec::is_empty")]
    pub terms_of_use: Vec<TypedId>,

    #[serde(rename = "refreshService", skip_serializing_if = "Option::is_none")]
    pub refresh_service: Option<TypedId>,

    /// All unmapped members end up here.
    #[serde(flatten)]
    pub custom_fields: Map<String, Value>,
}

/// Structural validation applied to the decoded credential, after JSON-Schema
/// validation has passed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Validation {
    /// Only the base context and base type are allowed. Any extension is
    /// rejected.
    BaseOnly,

    /// Every context and type must appear in the respective allow-list. The
    /// lists are automatically augmented with [`BASE_CONTEXT`] and
    /// [`VC_TYPE`].
    BaseExtended {
        /// Allowed context URIs.
        contexts: Vec<String>,
        /// Allowed credential types.
        types: Vec<String>,
    },

    /// Validation through JSON-LD expansion, delegated to an external
    /// validator. Without one wired in, this mode accepts the credential.
    #[default]
    JsonLd,
}

/// Options for decoding a Verifiable Credential.
#[derive(Default)]
pub struct CredentialOptions {
    pub(crate) disable_custom_schema: bool,
    pub(crate) public_key_fetcher: Option<PublicKeyFetcher>,
    pub(crate) schema_loader: Option<CredentialSchemaLoader>,
    pub(crate) validation: Validation,
}

impl CredentialOptions {
    /// Returns options with defaults: custom schemas are resolved and
    /// downloaded, no public key fetcher is set, and model validation runs in
    /// [`Validation::JsonLd`] mode.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Disables download of schemas declared by the credential; the default
    /// embedded schema is used instead.
    #[must_use]
    pub fn no_custom_schema_check(mut self) -> Self {
        self.disable_custom_schema = true;
        self
    }

    /// Sets the public key fetcher used when decoding from a JWS.
    #[must_use]
    pub fn public_key_fetcher(mut self, fetcher: PublicKeyFetcher) -> Self {
        self.public_key_fetcher = Some(fetcher);
        self
    }

    /// Overrides the default schema loader.
    #[must_use]
    pub fn schema_loader(mut self, loader: CredentialSchemaLoader) -> Self {
        self.schema_loader = Some(loader);
        self
    }

    /// Sets the model validation mode.
    #[must_use]
    pub fn validation(mut self, mode: Validation) -> Self {
        self.validation = mode;
        self
    }
}

impl Credential {
    /// Decodes a Verifiable Credential from bytes holding marshaled JSON, an
    /// unsecured JWT, or a signed JWS.
    ///
    /// Returns the decoded [`Credential`] together with its marshaled JSON:
    /// for JSON input the bytes are returned unchanged, for JWT/JWS input
    /// they are the embedded `vc` claim refined with the registered JWT
    /// claims. The returned JSON can be unmarshalled into an extended data
    /// structure to pick up fields outside of the base model.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] labelled with the pipeline stage that failed:
    /// envelope decoding, JSON unmarshalling, schema loading, schema or
    /// model validation, or credential building.
    pub fn decode(vc_data: &[u8], opts: &CredentialOptions) -> Result<(Self, Vec<u8>), Error> {
        tracing::debug!("Credential::decode");

        let decoded = proof::decode_envelope(vc_data, opts.public_key_fetcher.as_ref())
            .map_err(|e| Error::Envelope(e.to_string()))?;

        let doc: Value =
            serde_json::from_slice(&decoded).map_err(|e| Error::Json(e.to_string()))?;
        let raw: RawCredential =
            serde_json::from_value(doc.clone()).map_err(|e| Error::Json(e.to_string()))?;

        let schemas = match &raw.schema {
            Some(declared) => decode_credential_schema(declared)
                .map_err(|e| Error::Schema(format!("load credential schema: {e}")))?,
            None => Vec::new(),
        };

        let default_loader;
        let loader = match &opts.schema_loader {
            Some(loader) => loader,
            None => {
                default_loader = CredentialSchemaLoader::builder().build();
                &default_loader
            }
        };

        let schema_doc = if opts.disable_custom_schema {
            loader.default_schema()
        } else {
            loader.resolve(&schemas)?
        };
        schema::validate_against_schema(&doc, &schema_doc)?;

        let vc = Self::from_raw(raw, schemas).map_err(|e| Error::Field(e.to_string()))?;
        vc.post_validate(&opts.validation)?;

        Ok((vc, decoded))
    }

    /// Returns the id of the single credential subject.
    ///
    /// # Errors
    ///
    /// Fails when the credential has no subject, more than one subject, a
    /// subject without an id, or a subject id that is not a string.
    pub fn subject_id(&self) -> Result<String, Error> {
        match &self.subject {
            Some(subject) => subject_id(subject),
            None => Err(Error::Subject("subject of unknown structure".into())),
        }
    }

    fn from_raw(raw: RawCredential, schemas: Vec<TypedId>) -> anyhow::Result<Self> {
        let types = decode_type(raw.type_.as_ref()).context("fill credential types from raw")?;
        let issuer =
            decode_issuer(raw.issuer.as_ref()).context("fill credential issuer from raw")?;
        let (context, custom_context) =
            decode_context(raw.context.as_ref()).context("fill credential context from raw")?;

        Ok(Self {
            context,
            custom_context,
            id: raw.id,
            types,
            subject: raw.subject,
            issuer,
            issued: raw.issued,
            expired: raw.expired,
            proof: raw.proof,
            status: raw.status,
            schemas,
            evidence: raw.evidence,
            terms_of_use: raw.terms_of_use,
            refresh_service: raw.refresh_service,
            custom_fields: raw.custom_fields,
        })
    }

    fn post_validate(&self, mode: &Validation) -> Result<(), Error> {
        match mode {
            // JSON-LD expansion is the concern of an external validator.
            Validation::JsonLd => Ok(()),
            Validation::BaseOnly => self.validate_base_only(),
            Validation::BaseExtended { contexts, types } => {
                self.validate_base_extended(contexts, types)
            }
        }
    }

    fn validate_base_only(&self) -> Result<(), Error> {
        if self.types.len() > 1 || self.types.first().map(String::as_str) != Some(VC_TYPE) {
            return Err(Error::ModelValidate(
                "violated type constraint: not base only type defined".into(),
            ));
        }

        if self.context.len() > 1
            || !self.custom_context.is_empty()
            || self.context.first().map(String::as_str) != Some(BASE_CONTEXT)
        {
            return Err(Error::ModelValidate(
                "violated @context constraint: not base only @context defined".into(),
            ));
        }

        Ok(())
    }

    fn validate_base_extended(&self, contexts: &[String], types: &[String]) -> Result<(), Error> {
        for context in &self.context {
            if context != BASE_CONTEXT && !contexts.contains(context) {
                return Err(Error::ModelValidate(format!("not allowed @context: {context}")));
            }
        }

        for type_ in &self.types {
            if type_ != VC_TYPE && !types.contains(type_) {
                return Err(Error::ModelValidate(format!("not allowed type: {type_}")));
            }
        }

        Ok(())
    }

    pub(crate) fn raw(&self) -> RawCredential {
        let mut custom_fields = self.custom_fields.clone();
        custom_fields.retain(|k, _| !RESERVED_FIELDS.contains(&k.as_str()));

        RawCredential {
            context: Some(context_to_serialize(&self.context, &self.custom_context)),
            id: self.id.clone(),
            type_: Some(types_to_serialize(&self.types)),
            subject: self.subject.clone(),
            issued: self.issued,
            expired: self.expired,
            proof: self.proof.clone(),
            status: self.status.clone(),
            issuer: Some(issuer_to_serialize(&self.issuer)),
            schema: if self.schemas.is_empty() {
                None
            } else {
                serde_json::to_value(&self.schemas).ok()
            },
            evidence: self.evidence.clone(),
            terms_of_use: self.terms_of_use.clone(),
            refresh_service: self.refresh_service.clone(),
            custom_fields,
        }
    }
}

impl Serialize for Credential {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw().serialize(serializer)
    }
}

/// A factory for credentials with an extended data model.
pub trait CustomCredentialProducer {
    /// Checks whether this producer can build an extended credential from
    /// the base credential.
    fn accept(&self, vc: &Credential) -> bool;

    /// Builds the extended credential from the base credential and its
    /// marshaled JSON.
    ///
    /// # Errors
    ///
    /// The implementation should fail when the extended model cannot be
    /// built from the supplied credential.
    fn apply(&self, vc: &Credential, data_json: &[u8]) -> anyhow::Result<Box<dyn Any>>;
}

/// Creates an extended credential from bytes holding marshaled JSON or a
/// serialized JWT/JWS.
///
/// The input is first decoded into the base [`Credential`]. Each producer is
/// then probed in order; the first one accepting the credential builds the
/// extended model. When none accepts, the base credential itself is
/// returned.
///
/// # Errors
///
/// Fails when decoding the base credential fails, or when the accepting
/// producer fails to apply.
pub fn create_custom_credential(
    vc_data: &[u8], producers: &[&dyn CustomCredentialProducer], opts: &CredentialOptions,
) -> Result<Box<dyn Any>, Error> {
    let (vc, vc_bytes) = Credential::decode(vc_data, opts)?;

    for producer in producers {
        if producer.accept(&vc) {
            return producer.apply(&vc, &vc_bytes).map_err(|e| Error::Producer(e.to_string()));
        }
    }

    Ok(Box::new(vc))
}

/// Returns the id of a single credential subject: an object carrying a
/// string `id`, or a one-element array of such objects.
///
/// # Errors
///
/// Fails when no subject or more than one subject is defined, the id is
/// missing or not a string, or the subject has an unrecognized structure.
pub fn subject_id(subject: &Value) -> Result<String, Error> {
    let id_of = |subject: &Map<String, Value>| match subject.get("id") {
        None => Err(Error::Subject("subject id is not defined".into())),
        Some(Value::String(id)) => Ok(id.clone()),
        Some(_) => Err(Error::Subject("subject id is not string".into())),
    };

    match subject {
        Value::Object(subject) => id_of(subject),
        Value::Array(subjects) => {
            if subjects.is_empty() {
                return Err(Error::Subject("no subject is defined".into()));
            }
            if subjects.len() > 1 {
                return Err(Error::Subject("more than one subject is defined".into()));
            }
            match &subjects[0] {
                Value::Object(subject) => id_of(subject),
                _ => Err(Error::Subject("subject of unknown structure".into())),
            }
        }
        _ => Err(Error::Subject("subject of unknown structure".into())),
    }
}

// Decodes the raw issuer: a string holding the issuer id, or an object with
// a mandatory "id" member and an optional "name".
fn decode_issuer(issuer: Option<&Value>) -> anyhow::Result<Issuer> {
    let string_entry = |map: &Map<String, Value>, key: &str| -> anyhow::Result<Option<String>> {
        match map.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => bail!("value of key '{key}' is not a string"),
        }
    };

    match issuer {
        Some(Value::String(id)) => Ok(Issuer { id: id.clone(), name: None }),
        Some(Value::Object(map)) => {
            let id = string_entry(map, "id")?.unwrap_or_default();
            if id.is_empty() {
                bail!("issuer ID is not defined");
            }
            let name = string_entry(map, "name")?.filter(|name| !name.is_empty());

            Ok(Issuer { id, name })
        }
        _ => bail!("unsupported format of issuer"),
    }
}

// Decodes the raw @context into URI strings and trailing custom entries. The
// leading run of strings forms the context; everything after the first
// non-string entry is preserved as custom context in its original order, so
// re-serialization does not reorder the array.
fn decode_context(context: Option<&Value>) -> anyhow::Result<(Vec<String>, Vec<Kind<Value>>)> {
    let (context, custom_context) = match context {
        Some(Value::String(context)) => (vec![context.clone()], Vec::new()),
        Some(Value::Array(entries)) => {
            if entries.is_empty() {
                bail!("credential @context cannot be empty");
            }

            let mut context = Vec::new();
            let mut custom_context = Vec::new();
            for entry in entries {
                match entry {
                    Value::String(s) if custom_context.is_empty() => context.push(s.clone()),
                    Value::String(s) => custom_context.push(Kind::String(s.clone())),
                    Value::Object(_) => custom_context.push(Kind::Object(entry.clone())),
                    _ => bail!("credential @context of unsupported format"),
                }
            }
            (context, custom_context)
        }
        _ => bail!("credential @context of unsupported format"),
    };

    if context.first().map(String::as_str) != Some(BASE_CONTEXT) {
        bail!("credential @context must start with {BASE_CONTEXT}");
    }

    Ok((context, custom_context))
}

// Decodes the raw type: a single type string or a non-empty array of them.
fn decode_type(type_: Option<&Value>) -> anyhow::Result<Vec<String>> {
    match type_ {
        Some(Value::String(type_)) => Ok(vec![type_.clone()]),
        Some(Value::Array(entries)) => {
            if entries.is_empty() {
                bail!("credential type cannot be empty");
            }
            entries
                .iter()
                .map(|entry| {
                    entry
                        .as_str()
                        .map(String::from)
                        .ok_or_else(|| anyhow!("credential type of unsupported format"))
                })
                .collect()
        }
        _ => bail!("credential type of unsupported format"),
    }
}

// Decodes credentialSchema declared as a single object or an array of
// objects.
pub(crate) fn decode_credential_schema(declared: &Value) -> anyhow::Result<Vec<TypedId>> {
    match declared {
        Value::Object(_) => {
            let schema: TypedId = serde_json::from_value(declared.clone())
                .map_err(|_| anyhow!("verifiable credential schema of unsupported format"))?;
            Ok(vec![schema])
        }
        Value::Array(_) => serde_json::from_value::<Vec<TypedId>>(declared.clone())
            .map_err(|_| anyhow!("verifiable credential schema of unsupported format")),
        _ => bail!("verifiable credential schema of unsupported format"),
    }
}

pub(crate) fn types_to_serialize(types: &[String]) -> Value {
    if types.len() == 1 {
        // as string
        Value::String(types[0].clone())
    } else {
        // as string array
        Value::Array(types.iter().cloned().map(Value::String).collect())
    }
}

pub(crate) fn context_to_serialize(context: &[String], custom: &[Kind<Value>]) -> Value {
    if !custom.is_empty() {
        let mut entries: Vec<Value> =
            context.iter().cloned().map(Value::String).collect();
        for entry in custom {
            match entry {
                Kind::String(s) => entries.push(Value::String(s.clone())),
                Kind::Object(v) => entries.push(v.clone()),
            }
        }
        return Value::Array(entries);
    }

    if context.len() == 1 {
        // return single context
        return Value::String(context[0].clone());
    }

    Value::Array(context.iter().cloned().map(Value::String).collect())
}

fn issuer_to_serialize(issuer: &Issuer) -> Value {
    match &issuer.name {
        Some(name) => serde_json::json!({"id": issuer.id, "name": name}),
        None => Value::String(issuer.id.clone()),
    }
}
