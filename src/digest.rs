//! Per-entity content fingerprints.
//!
//! A snapshot is reduced to a map from entity key to a SHA-256 digest
//! (lowercase hex). Two snapshots can then be compared key by key without
//! decoding any module payload.
//!
//! ## Digest Streams
//!
//! - **Modules**: one stream per entity-type key, fed in stored order with
//!   the textual payload, else the binary payload, else a single `0x00`
//! - **`schema`**: image id, link target, title and content type per image
//! - **`attachment`**: id, file name, content type, size and recorded
//!   digest per attachment
//!
//! Every module entry and every image/attachment record is terminated by
//! `\n`, so `"ab" + "c"` and `"a" + "bc"` never collide.
//!
//! ## Map Order
//!
//! Module keys appear in first-encounter order, followed by `schema` and
//! then `attachment`. Those two are always present, even for a snapshot
//! without images or attachments. A module key only appears if at least
//! one module carries it.
//!
//! Binary content of images and attachments is never read.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::types::{Attachment, SchemaImage, Snapshot};

/// Fixed key of the schema image facet.
pub const SCHEMA_KEY: &str = "schema";

/// Fixed key of the attachment facet.
pub const ATTACHMENT_KEY: &str = "attachment";

const SEPARATOR: u8 = b'\n';
const EMPTY_PAYLOAD: u8 = 0;

/// Ordered mapping from entity key to hex digest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityFingerprints(IndexMap<String, String>);

impl EntityFingerprints {
    /// Digest of `key`, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Whether `key` has a digest.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Keys in map order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `(key, digest)` pairs in map order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for EntityFingerprints {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Compute the fingerprint map of a snapshot.
///
/// Deterministic for the same content in the same stored order.
pub fn fingerprint(snapshot: &Snapshot) -> EntityFingerprints {
    let mut digesters: IndexMap<String, Sha256> = IndexMap::new();

    for module in &snapshot.modules {
        let Some(key) = module.entity_key() else {
            continue;
        };
        let digester = digesters.entry(key.to_string()).or_insert_with(Sha256::new);

        match (&module.bean_json, &module.bean_bytes) {
            (Some(json), _) => digester.update(json.as_bytes()),
            (None, Some(bytes)) => digester.update(bytes),
            (None, None) => digester.update([EMPTY_PAYLOAD]),
        }
        digester.update([SEPARATOR]);
    }

    digesters.insert(SCHEMA_KEY.to_string(), schema_digester(&snapshot.schema));
    digesters.insert(ATTACHMENT_KEY.to_string(), attachment_digester(&snapshot.attachments));

    digesters
        .into_iter()
        .map(|(key, digester)| (key, hex::encode(digester.finalize())))
        .collect()
}

fn schema_digester(images: &[SchemaImage]) -> Sha256 {
    let mut digester = Sha256::new();
    for image in images {
        digester.update(image.id.to_string().as_bytes());
        if let Some(ext_ref) = &image.ext_ref {
            digester.update(ext_ref.href.as_deref().unwrap_or_default().as_bytes());
            digester.update(ext_ref.title.as_deref().unwrap_or_default().as_bytes());
            digester.update(ext_ref.content_type.as_deref().unwrap_or_default().as_bytes());
        }
        digester.update([SEPARATOR]);
    }
    digester
}

fn attachment_digester(attachments: &[Attachment]) -> Sha256 {
    let mut digester = Sha256::new();
    for attachment in attachments {
        digester.update(attachment.id.to_string().as_bytes());
        digester.update(attachment.file_name.as_deref().unwrap_or_default().as_bytes());
        digester.update(attachment.content_type.as_deref().unwrap_or_default().as_bytes());
        digester.update(attachment.content_size.to_string().as_bytes());
        digester.update(attachment.digest.as_deref().unwrap_or_default().as_bytes());
        digester.update([SEPARATOR]);
    }
    digester
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChartId, ExternalRef, ModuleEntity, RevisionRecord};
    use chrono::{TimeZone, Utc};

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    fn empty_snapshot() -> Snapshot {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        Snapshot::new(RevisionRecord::new(1, 0, ChartId::new(42), at, Some(at)))
    }

    fn sha256_hex(bytes: &[u8]) -> String {
        hex::encode(Sha256::digest(bytes))
    }

    #[test]
    fn test_empty_snapshot_has_fixed_facets_only() {
        let prints = fingerprint(&empty_snapshot());
        let keys: Vec<&str> = prints.keys().collect();
        assert_eq!(keys, vec![SCHEMA_KEY, ATTACHMENT_KEY]);
        assert_eq!(prints.get(SCHEMA_KEY), Some(EMPTY_SHA256));
        assert_eq!(prints.get(ATTACHMENT_KEY), Some(EMPTY_SHA256));
    }

    #[test]
    fn test_module_stream_matches_payload_plus_separator() {
        let snapshot = empty_snapshot().with_module(ModuleEntity::json(1, "progressNote", "A"));
        let prints = fingerprint(&snapshot);
        assert_eq!(prints.get("progressNote"), Some(sha256_hex(b"A\n").as_str()));
    }

    #[test]
    fn test_keys_in_encounter_order_then_facets() {
        let snapshot = empty_snapshot()
            .with_module(ModuleEntity::json(1, "soa", "s"))
            .with_module(ModuleEntity::json(2, "progressNote", "p"))
            .with_module(ModuleEntity::json(3, "soa", "s2"));

        let prints = fingerprint(&snapshot);
        let keys: Vec<&str> = prints.keys().collect();
        assert_eq!(keys, vec!["soa", "progressNote", SCHEMA_KEY, ATTACHMENT_KEY]);
        assert_eq!(prints.get("soa"), Some(sha256_hex(b"s\ns2\n").as_str()));
    }

    #[test]
    fn test_separator_prevents_concatenation_collisions() {
        let ab_c = empty_snapshot()
            .with_module(ModuleEntity::json(1, "note", "ab"))
            .with_module(ModuleEntity::json(2, "note", "c"));
        let a_bc = empty_snapshot()
            .with_module(ModuleEntity::json(1, "note", "a"))
            .with_module(ModuleEntity::json(2, "note", "bc"));

        assert_ne!(fingerprint(&ab_c).get("note"), fingerprint(&a_bc).get("note"));
    }

    #[test]
    fn test_payload_precedence() {
        let mut both = ModuleEntity::json(1, "note", "text");
        both.bean_bytes = Some(b"binary".to_vec());
        let json_only = ModuleEntity::json(1, "note", "text");
        let bytes_only = ModuleEntity::bytes(1, "note", b"binary".to_vec());
        let none = ModuleEntity {
            id: 1,
            entity: Some("note".to_string()),
            bean_json: None,
            bean_bytes: None,
        };

        let digest = |m: ModuleEntity| {
            fingerprint(&empty_snapshot().with_module(m))
                .get("note")
                .map(str::to_string)
        };

        assert_eq!(digest(both), digest(json_only));
        assert_eq!(digest(bytes_only), Some(sha256_hex(b"binary\n")));
        assert_eq!(digest(none), Some(sha256_hex(b"\x00\n")));
    }

    #[test]
    fn test_modules_without_key_are_skipped() {
        let snapshot = empty_snapshot()
            .with_module(ModuleEntity::json(1, "", "x"))
            .with_module(ModuleEntity {
                id: 2,
                entity: None,
                bean_json: Some("y".to_string()),
                bean_bytes: None,
            });
        assert_eq!(fingerprint(&snapshot).len(), 2);
    }

    #[test]
    fn test_schema_metadata_digest() {
        let snapshot = empty_snapshot()
            .with_schema(SchemaImage {
                id: 5,
                ext_ref: Some(ExternalRef {
                    href: Some("img://5".to_string()),
                    title: None,
                    content_type: Some("image/jpeg".to_string()),
                }),
                jpeg_bytes: Some(vec![1, 2, 3]),
            })
            .with_schema(SchemaImage {
                id: 6,
                ext_ref: None,
                jpeg_bytes: None,
            });

        let prints = fingerprint(&snapshot);
        assert_eq!(
            prints.get(SCHEMA_KEY),
            Some(sha256_hex(b"5img://5image/jpeg\n6\n").as_str())
        );
    }

    #[test]
    fn test_attachment_bytes_do_not_affect_digest() {
        let attachment = Attachment {
            id: 9,
            file_name: Some("scan.pdf".to_string()),
            content_type: Some("application/pdf".to_string()),
            content_size: 1024,
            digest: Some("d1".to_string()),
            bytes: Some(vec![1; 16]),
        };
        let with_bytes = empty_snapshot().with_attachment(attachment.clone());
        let without_bytes = empty_snapshot().with_attachment(Attachment {
            bytes: None,
            ..attachment
        });

        let prints = fingerprint(&with_bytes);
        assert_eq!(prints, fingerprint(&without_bytes));
        assert_eq!(
            prints.get(ATTACHMENT_KEY),
            Some(sha256_hex(b"9scan.pdfapplication/pdf1024d1\n").as_str())
        );
    }

    #[test]
    fn test_fingerprint_determinism() {
        let snapshot = empty_snapshot()
            .with_module(ModuleEntity::json(1, "progressNote", "A"))
            .with_module(ModuleEntity::bytes(2, "label", vec![7, 8, 9]));

        assert_eq!(fingerprint(&snapshot), fingerprint(&snapshot.clone()));
    }
}
