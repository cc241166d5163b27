//! Remote listing store
//!
//! The storefront only ever issues one query: every document of the listing
//! collection whose public flag is `true`. `FirestoreStore` speaks the
//! Firestore REST `runQuery` dialect; tests substitute their own store.

use std::time::Duration;

use futures::future::BoxFuture;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::config::StoreConfig;
use crate::error::FetchError;
use super::listing::Listing;

/// Source of public listings, injected into the controller at startup
pub trait ListingStore: Send + Sync {
    fn fetch_public(&self) -> BoxFuture<'_, Result<Vec<Listing>, FetchError>>;
}

pub struct FirestoreStore {
    client: reqwest::Client,
    query_url: String,
    api_key: Option<String>,
    collection: String,
    public_field: String,
}

#[derive(Deserialize)]
struct QueryRow {
    document: Option<Document>,
}

#[derive(Deserialize)]
struct Document {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

impl FirestoreStore {
    pub fn new(config: &StoreConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let query_url = format!(
            "{}/projects/{}/databases/(default)/documents:runQuery",
            config.endpoint.trim_end_matches('/'),
            config.project_id
        );

        Ok(Self {
            client,
            query_url,
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            collection: config.collection.clone(),
            public_field: config.public_field.clone(),
        })
    }

    fn query_body(&self) -> Value {
        json!({
            "structuredQuery": {
                "from": [{ "collectionId": self.collection }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": self.public_field },
                        "op": "EQUAL",
                        "value": { "booleanValue": true }
                    }
                }
            }
        })
    }

    async fn run_query(&self) -> Result<Vec<Listing>, FetchError> {
        tracing::debug!(url = %self.query_url, collection = %self.collection, "Listing query started");

        let mut request = self.client.post(&self.query_url).json(&self.query_body());
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::from_status(status.as_u16()));
        }

        let body = response.text().await?;
        parse_query_response(&body, &self.public_field)
    }
}

impl ListingStore for FirestoreStore {
    fn fetch_public(&self) -> BoxFuture<'_, Result<Vec<Listing>, FetchError>> {
        Box::pin(self.run_query())
    }
}

/// Map a `runQuery` response body to listings.
///
/// Rows without a document are read-time markers and carry nothing.
/// Documents that fail the public check or carry an unusable price are
/// skipped rather than failing the whole query.
pub fn parse_query_response(body: &str, public_field: &str) -> Result<Vec<Listing>, FetchError> {
    let rows: Vec<QueryRow> =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;

    let mut listings = Vec::with_capacity(rows.len());
    for document in rows.into_iter().filter_map(|row| row.document) {
        match listing_from_document(&document, public_field) {
            Ok(listing) => listings.push(listing),
            Err(reason) => {
                tracing::warn!(document = %document.name, reason, "Skipping listing document");
            }
        }
    }
    Ok(listings)
}

fn listing_from_document(document: &Document, public_field: &str) -> Result<Listing, &'static str> {
    let id = document
        .name
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
        .ok_or("document has no id")?
        .to_string();

    let fields = &document.fields;
    if field_bool(fields, public_field) != Some(true) {
        return Err("document is not public");
    }

    let price = match fields.get("price") {
        None => 0.0,
        Some(value) => typed_number(value).ok_or("price is not a number")?,
    };
    if !price.is_finite() || price < 0.0 {
        return Err("price is negative");
    }

    Ok(Listing {
        id,
        title: field_string(fields, "title").unwrap_or_default(),
        style: field_string(fields, "style").filter(|s| !s.is_empty()),
        price,
        owner_id: field_string(fields, "userId").unwrap_or_default(),
        preview_url: field_string(fields, "previewUrl").unwrap_or_default(),
        is_public: true,
    })
}

fn field_string(fields: &Map<String, Value>, name: &str) -> Option<String> {
    fields
        .get(name)?
        .get("stringValue")?
        .as_str()
        .map(|s| s.to_string())
}

fn field_bool(fields: &Map<String, Value>, name: &str) -> Option<bool> {
    fields.get(name)?.get("booleanValue")?.as_bool()
}

fn typed_number(value: &Value) -> Option<f64> {
    if let Some(v) = value.get("doubleValue") {
        return v.as_f64();
    }
    // Firestore encodes 64-bit integers as decimal strings
    if let Some(v) = value.get("integerValue") {
        return match v {
            Value::String(s) => s.parse::<i64>().ok().map(|n| n as f64),
            other => other.as_i64().map(|n| n as f64),
        };
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"[
      {
        "document": {
          "name": "projects/p/databases/(default)/documents/beats/abc123",
          "fields": {
            "title": { "stringValue": "Night Drive" },
            "style": { "stringValue": "Drill" },
            "price": { "integerValue": "25" },
            "userId": { "stringValue": "u-77" },
            "previewUrl": { "stringValue": "https://cdn.example/abc123.mp3" },
            "isPublic": { "booleanValue": true }
          },
          "createTime": "2024-03-01T10:00:00Z",
          "updateTime": "2024-03-01T10:00:00Z"
        },
        "readTime": "2024-03-02T10:00:00Z"
      },
      {
        "document": {
          "name": "projects/p/databases/(default)/documents/beats/def456",
          "fields": {
            "title": { "stringValue": "Sunset" },
            "price": { "doubleValue": 19.5 },
            "userId": { "stringValue": "u-12" },
            "previewUrl": { "stringValue": "/previews/def456.mp3" },
            "isPublic": { "booleanValue": true }
          }
        }
      }
    ]"#;

    #[test]
    fn maps_documents_to_listings() {
        let listings = parse_query_response(BODY, "isPublic").unwrap();
        assert_eq!(listings.len(), 2);

        let first = &listings[0];
        assert_eq!(first.id, "abc123");
        assert_eq!(first.title, "Night Drive");
        assert_eq!(first.style.as_deref(), Some("Drill"));
        assert_eq!(first.price, 25.0);
        assert_eq!(first.owner_id, "u-77");
        assert!(first.is_public);

        let second = &listings[1];
        assert_eq!(second.id, "def456");
        assert_eq!(second.style, None);
        assert_eq!(second.price, 19.5);
    }

    #[test]
    fn empty_result_is_a_read_time_marker() {
        let listings = parse_query_response(r#"[{"readTime": "2024-03-02T10:00:00Z"}]"#, "isPublic").unwrap();
        assert!(listings.is_empty());
    }

    #[test]
    fn non_array_body_is_malformed() {
        let err = parse_query_response(r#"{"error": {"code": 403}}"#, "isPublic").unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
        assert!(matches!(parse_query_response("not json", "isPublic"), Err(FetchError::Malformed(_))));
    }

    #[test]
    fn skips_private_and_badly_priced_documents() {
        let body = r#"[
          {"document": {"name": "x/beats/a", "fields": {"isPublic": {"booleanValue": false}}}},
          {"document": {"name": "x/beats/b", "fields": {"isPublic": {"booleanValue": true}, "price": {"doubleValue": -3.0}}}},
          {"document": {"name": "x/beats/c", "fields": {"isPublic": {"booleanValue": true}, "price": {"stringValue": "cheap"}}}},
          {"document": {"name": "x/beats/d", "fields": {"isPublic": {"booleanValue": true}}}}
        ]"#;
        let listings = parse_query_response(body, "isPublic").unwrap();
        let ids: Vec<&str> = listings.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["d"]);
        assert_eq!(listings[0].price, 0.0);
    }

    #[test]
    fn query_filters_on_configured_public_field() {
        let config = StoreConfig {
            public_field: "visible".to_string(),
            collection: "listings".to_string(),
            ..StoreConfig::default()
        };
        let store = FirestoreStore::new(&config).unwrap();
        let body = store.query_body();
        assert_eq!(body["structuredQuery"]["from"][0]["collectionId"], "listings");
        assert_eq!(body["structuredQuery"]["where"]["fieldFilter"]["field"]["fieldPath"], "visible");
        assert_eq!(body["structuredQuery"]["where"]["fieldFilter"]["value"]["booleanValue"], true);
        assert!(store.query_url.ends_with("/projects/beatsmarket/databases/(default)/documents:runQuery"));
    }
}
