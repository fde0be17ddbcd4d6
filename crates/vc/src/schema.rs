//! # Credential Schemas
//!
//! A credential may declare the JSON Schema its document conforms to via the
//! `credentialSchema` member. [`CredentialSchemaLoader`] turns those
//! declarations plus the caller's policy into exactly one schema document:
//! the first declaration of a supported type is downloaded (consulting an
//! injectable [`SchemaCache`] first), unsupported declarations are logged
//! and skipped, and in the absence of a usable declaration the embedded
//! [`DEFAULT_SCHEMA`] applies.
//!
//! The default [`ExpirableSchemaCache`] is a bounded byte-cache whose
//! entries carry their own expiry: eight little-endian bytes of unix-seconds
//! followed by the schema payload. Expired entries are dropped lazily on the
//! next read, so no background sweeper is needed.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use serde_json::Value;

use crate::error::Error;
use crate::model::vc::TypedId;

/// The credentialSchema type resolvable to a JSON Schema document.
///
/// See <https://www.w3.org/TR/vc-data-model/#data-schemas>.
pub(crate) const JSON_SCHEMA_2018_TYPE: &str = "JsonSchemaValidator2018";

/// The embedded JSON Schema applied when a credential declares no usable
/// custom schema. It enforces the mandatory members of the data model and
/// the base shapes of the typed-id members.
pub const DEFAULT_SCHEMA: &str = r##"{
  "required": [
    "@context",
    "type",
    "credentialSubject",
    "issuer",
    "issuanceDate"
  ],
  "properties": {
    "@context": {
      "type": "array",
      "items": [
        {
          "type": "string",
          "pattern": "^https://www.w3.org/2018/credentials/v1$"
        }
      ],
      "uniqueItems": true,
      "additionalItems": {
        "oneOf": [
          {
            "type": "object"
          },
          {
            "type": "string"
          }
        ]
      }
    },
    "id": {
      "type": "string",
      "format": "uri"
    },
    "type": {
      "oneOf": [
        {
          "type": "array",
          "items": [
            {
              "type": "string",
              "pattern": "^VerifiableCredential$"
            }
          ]
        },
        {
          "type": "string",
          "pattern": "^VerifiableCredential$"
        }
      ],
      "additionalItems": {
        "type": "string"
      }
    },
    "credentialSubject": {
      "anyOf": [
        {
          "type": "array"
        },
        {
          "type": "object"
        }
      ]
    },
    "issuer": {
      "anyOf": [
        {
          "type": "string",
          "format": "uri"
        },
        {
          "type": "object",
          "required": [
            "id"
          ],
          "properties": {
            "id": {
              "type": "string"
            }
          }
        }
      ]
    },
    "issuanceDate": {
      "type": "string",
      "format": "date-time"
    },
    "proof": {
      "type": "object",
      "required": [
        "type"
      ],
      "properties": {
        "type": {
          "type": "string"
        }
      }
    },
    "expirationDate": {
      "type": "string",
      "format": "date-time"
    },
    "credentialStatus": {
      "$ref": "#/definitions/typedID"
    },
    "credentialSchema": {
      "$ref": "#/definitions/typedIDs"
    },
    "evidence": {
      "$ref": "#/definitions/typedIDs"
    },
    "refreshService": {
      "$ref": "#/definitions/typedID"
    }
  },
  "definitions": {
    "typedID": {
      "type": "object",
      "required": [
        "id",
        "type"
      ],
      "properties": {
        "id": {
          "type": "string",
          "format": "uri"
        },
        "type": {
          "anyOf": [
            {
              "type": "string"
            },
            {
              "type": "array",
              "items": {
                "type": "string"
              }
            }
          ]
        }
      }
    },
    "typedIDs": {
      "anyOf": [
        {
          "$ref": "#/definitions/typedID"
        },
        {
          "type": "array",
          "items": {
            "$ref": "#/definitions/typedID"
          }
        }
      ]
    }
  }
}
"##;

/// A cache of credential schemas keyed by their URL. Implementations must be
/// safe for concurrent use.
pub trait SchemaCache: Send + Sync {
    /// Store `schema` under `url`.
    fn put(&self, url: &str, schema: &[u8]);

    /// Look up `url`. Returns `None` when the entry is absent or expired.
    fn get(&self, url: &str) -> Option<Vec<u8>>;
}

/// A [`SchemaCache`] over a bounded byte-cache with expirable entries. Each
/// entry stores its expiry inline with the payload and is dropped on the
/// first read past it.
pub struct ExpirableSchemaCache {
    cache: Mutex<ByteCache>,
    expiration: Duration,
    now: fn() -> i64,
}

impl ExpirableSchemaCache {
    /// Creates a cache bounded to `max_bytes` of payload whose entries
    /// expire `expiration` after insertion.
    #[must_use]
    pub fn new(max_bytes: usize, expiration: Duration) -> Self {
        Self::with_clock(max_bytes, expiration, unix_now)
    }

    fn with_clock(max_bytes: usize, expiration: Duration, now: fn() -> i64) -> Self {
        Self { cache: Mutex::new(ByteCache::new(max_bytes)), expiration, now }
    }
}

impl SchemaCache for ExpirableSchemaCache {
    fn put(&self, url: &str, schema: &[u8]) {
        let expires = (self.now)() + self.expiration.as_secs() as i64;

        let mut entry = Vec::with_capacity(8 + schema.len());
        entry.extend_from_slice(&(expires as u64).to_le_bytes());
        entry.extend_from_slice(schema);

        self.cache.lock().set(url, entry);
    }

    fn get(&self, url: &str) -> Option<Vec<u8>> {
        let mut cache = self.cache.lock();
        let entry = cache.get(url)?.clone();
        if entry.len() < 8 {
            cache.del(url);
            return None;
        }

        let mut expires = [0u8; 8];
        expires.copy_from_slice(&entry[..8]);
        if (u64::from_le_bytes(expires) as i64) < (self.now)() {
            // cache expires
            cache.del(url);
            return None;
        }

        Some(entry[8..].to_vec())
    }
}

fn unix_now() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| d.as_secs() as i64)
}

// A size-bounded byte store. Inserting past the bound evicts the oldest
// entries; the newest entry is always retained.
struct ByteCache {
    max_bytes: usize,
    used: usize,
    entries: HashMap<String, Vec<u8>>,
    order: VecDeque<String>,
}

impl ByteCache {
    fn new(max_bytes: usize) -> Self {
        Self { max_bytes, used: 0, entries: HashMap::new(), order: VecDeque::new() }
    }

    fn set(&mut self, key: &str, value: Vec<u8>) {
        self.del(key);
        self.used += value.len();
        self.entries.insert(key.to_string(), value);
        self.order.push_back(key.to_string());

        while self.used > self.max_bytes && self.order.len() > 1 {
            if let Some(oldest) = self.order.pop_front() {
                if let Some(evicted) = self.entries.remove(&oldest) {
                    self.used -= evicted.len();
                }
            }
        }
    }

    fn get(&self, key: &str) -> Option<&Vec<u8>> {
        self.entries.get(key)
    }

    fn del(&mut self, key: &str) {
        if let Some(removed) = self.entries.remove(key) {
            self.used -= removed.len();
            self.order.retain(|k| k != key);
        }
    }
}

/// Resolves the schema document used for credential validation: an injected
/// HTTP client downloads declared schemas, an optional [`SchemaCache`]
/// fronts the downloads, and the embedded [`DEFAULT_SCHEMA`] backstops both.
pub struct CredentialSchemaLoader {
    client: reqwest::blocking::Client,
    cache: Option<Arc<dyn SchemaCache>>,
    default_schema: Vec<u8>,
}

impl CredentialSchemaLoader {
    /// Returns a builder for the loader.
    #[must_use]
    pub fn builder() -> CredentialSchemaLoaderBuilder {
        CredentialSchemaLoaderBuilder::new()
    }

    pub(crate) fn default_schema(&self) -> Vec<u8> {
        self.default_schema.clone()
    }

    /// Returns the schema document for the declared schemas: the first
    /// declaration of a supported type, downloaded; otherwise the default.
    pub(crate) fn resolve(&self, schemas: &[TypedId]) -> Result<Vec<u8>, Error> {
        for schema in schemas {
            if schema.type_.contains(&JSON_SCHEMA_2018_TYPE.to_string()) {
                return self.fetch(&schema.id);
            }
            tracing::warn!(
                "unsupported credential schema: {:?}. Using default schema for validation",
                schema.type_
            );
        }

        // no custom schema chosen
        Ok(self.default_schema())
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>, Error> {
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(url) {
                return Ok(hit);
            }
        }

        let schema = self
            .load(url)
            .map_err(|reason| Error::SchemaFetch { url: url.to_string(), reason })?;

        if let Some(cache) = &self.cache {
            cache.put(url, &schema);
        }

        Ok(schema)
    }

    fn load(&self, url: &str) -> Result<Vec<u8>, String> {
        let resp =
            self.client.get(url).send().map_err(|e| format!("load credential schema: {e}"))?;

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            return Err(format!("credential schema endpoint HTTP failure [{}]", status.as_u16()));
        }

        // the body is read in full; the connection is released on every path
        let body = resp.bytes().map_err(|e| format!("credential schema: read response body: {e}"))?;

        Ok(body.to_vec())
    }
}

/// Builder of [`CredentialSchemaLoader`]. Creates a default HTTP client and
/// the embedded default schema if not defined.
#[derive(Default)]
pub struct CredentialSchemaLoaderBuilder {
    client: Option<reqwest::blocking::Client>,
    cache: Option<Arc<dyn SchemaCache>>,
    schema: Option<Vec<u8>>,
}

impl CredentialSchemaLoaderBuilder {
    /// Returns a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the HTTP client used to download declared schemas.
    #[must_use]
    pub fn schema_download_client(mut self, client: reqwest::blocking::Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Sets the schema cache consulted before downloading.
    #[must_use]
    pub fn cache(mut self, cache: Arc<dyn SchemaCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Overrides the default schema document.
    #[must_use]
    pub fn schema(mut self, document: &str) -> Self {
        self.schema = Some(document.as_bytes().to_vec());
        self
    }

    /// Builds the configured loader.
    #[must_use]
    pub fn build(self) -> CredentialSchemaLoader {
        CredentialSchemaLoader {
            client: self.client.unwrap_or_default(),
            cache: self.cache,
            default_schema: self.schema.unwrap_or_else(|| DEFAULT_SCHEMA.as_bytes().to_vec()),
        }
    }
}

/// Validates the credential document against the schema, aggregating every
/// reported violation with its field path into a single error.
pub(crate) fn validate_against_schema(doc: &Value, schema: &[u8]) -> Result<(), Error> {
    let schema: Value = serde_json::from_slice(schema)
        .map_err(|e| Error::SchemaValidate(format!("validation of verifiable credential: {e}")))?;

    let validator = jsonschema::options()
        .with_draft(jsonschema::Draft::Draft7)
        .build(&schema)
        .map_err(|e| Error::SchemaValidate(format!("validation of verifiable credential: {e}")))?;

    let failures: Vec<String> =
        validator.iter_errors(doc).map(|err| format!("{}: {err}", err.instance_path)).collect();

    if failures.is_empty() {
        Ok(())
    } else {
        Err(Error::SchemaValidate(format!(
            "verifiable credential does not pass schema validation: {}",
            failures.join("; ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicI64, Ordering};

    use serde_json::json;

    use super::*;
    use crate::core::Quota;

    #[test]
    fn cache_round_trip_and_expiry() {
        static NOW: AtomicI64 = AtomicI64::new(0);
        fn clock() -> i64 {
            NOW.load(Ordering::SeqCst)
        }

        NOW.store(1_000, Ordering::SeqCst);
        let cache =
            ExpirableSchemaCache::with_clock(64 * 1024, Duration::from_secs(60), clock);

        cache.put("https://schema.example/v1", b"{}");
        assert_eq!(cache.get("https://schema.example/v1"), Some(b"{}".to_vec()));

        // one second past the TTL the entry is dropped on read
        NOW.store(1_061, Ordering::SeqCst);
        assert_eq!(cache.get("https://schema.example/v1"), None);
        assert_eq!(cache.get("https://schema.example/v1"), None);
    }

    #[test]
    fn cache_evicts_oldest_beyond_bound() {
        let cache = ExpirableSchemaCache::new(150, Duration::from_secs(60));

        cache.put("first", &[1u8; 100]);
        cache.put("second", &[2u8; 100]);

        assert_eq!(cache.get("first"), None, "oldest entry should be evicted");
        assert_eq!(cache.get("second"), Some(vec![2u8; 100]));
    }

    #[test]
    fn resolves_custom_schema_over_http() {
        let mut server = mockito::Server::new();
        let body = r#"{"required": ["referenceNumber"]}"#;
        let mock =
            server.mock("GET", "/schema.json").with_status(200).with_body(body).create();

        let loader = CredentialSchemaLoader::builder().build();
        let schemas = vec![TypedId {
            id: format!("{}/schema.json", server.url()),
            type_: Quota::One(JSON_SCHEMA_2018_TYPE.into()),
        }];

        let doc = loader.resolve(&schemas).expect("should resolve");
        assert_eq!(doc, body.as_bytes());
        mock.assert();
    }

    #[test]
    fn http_failure_surfaces_status() {
        let mut server = mockito::Server::new();
        server.mock("GET", "/schema.json").with_status(404).create();

        let loader = CredentialSchemaLoader::builder().build();
        let schemas = vec![TypedId {
            id: format!("{}/schema.json", server.url()),
            type_: Quota::One(JSON_SCHEMA_2018_TYPE.into()),
        }];

        let err = loader.resolve(&schemas).expect_err("non-200 should fail");
        assert!(matches!(err, Error::SchemaFetch { .. }), "got: {err}");
        assert!(err.to_string().contains("HTTP failure [404]"), "got: {err}");
    }

    #[test]
    fn cache_hit_skips_download() {
        let mut server = mockito::Server::new();
        let mock = server.mock("GET", "/schema.json").expect(0).create();

        let url = format!("{}/schema.json", server.url());
        let cache = Arc::new(ExpirableSchemaCache::new(64 * 1024, Duration::from_secs(60)));
        cache.put(&url, b"{\"cached\": true}");

        let loader = CredentialSchemaLoader::builder().cache(cache).build();
        let schemas =
            vec![TypedId { id: url, type_: Quota::One(JSON_SCHEMA_2018_TYPE.into()) }];

        let doc = loader.resolve(&schemas).expect("should resolve from cache");
        assert_eq!(doc, b"{\"cached\": true}".to_vec());
        mock.assert();
    }

    #[test]
    fn download_populates_cache() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/schema.json")
            .with_status(200)
            .with_body("{}")
            .expect(1)
            .create();

        let url = format!("{}/schema.json", server.url());
        let cache = Arc::new(ExpirableSchemaCache::new(64 * 1024, Duration::from_secs(60)));
        let loader = CredentialSchemaLoader::builder()
            .cache(Arc::clone(&cache) as Arc<dyn SchemaCache>)
            .build();
        let schemas = vec![TypedId {
            id: url.clone(),
            type_: Quota::One(JSON_SCHEMA_2018_TYPE.into()),
        }];

        loader.resolve(&schemas).expect("should resolve");
        loader.resolve(&schemas).expect("second resolve should hit the cache");

        assert_eq!(cache.get(&url), Some(b"{}".to_vec()));
        mock.assert();
    }

    #[test]
    fn unsupported_schema_type_falls_back_to_default() {
        let loader = CredentialSchemaLoader::builder().build();
        let schemas = vec![TypedId {
            id: "https://schema.example/v1".into(),
            type_: Quota::One("ZkpSchema2021".into()),
        }];

        let doc = loader.resolve(&schemas).expect("should fall back");
        assert_eq!(doc, DEFAULT_SCHEMA.as_bytes());
    }

    #[test]
    fn validation_aggregates_failures() {
        let doc = json!({"@context": ["https://www.w3.org/2018/credentials/v1"]});
        let err = validate_against_schema(&doc, DEFAULT_SCHEMA.as_bytes())
            .expect_err("incomplete credential should fail");

        let msg = err.to_string();
        assert!(msg.contains("issuer"), "got: {msg}");
        assert!(msg.contains("credentialSubject"), "got: {msg}");
    }
}
