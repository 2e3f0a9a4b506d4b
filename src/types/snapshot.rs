//! Full document snapshots.
//!
//! A [`Snapshot`] is everything stored for one revision: the record itself,
//! its module payloads, schema (drawing) images and file attachments. The
//! digest engine only reads metadata from images and attachments, never
//! their bytes.

use serde::{Deserialize, Serialize};

use super::revision::RevisionRecord;

/// One module of a chart document (a progress note, an order, a label...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleEntity {
    /// Module row identifier.
    pub id: i64,
    /// Entity-type key; modules without one are ignored by fingerprinting.
    pub entity: Option<String>,
    /// Canonical textual payload.
    pub bean_json: Option<String>,
    /// Legacy binary payload, used when no textual payload exists.
    pub bean_bytes: Option<Vec<u8>>,
}

impl ModuleEntity {
    /// Module with a textual payload.
    pub fn json(id: i64, entity: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            id,
            entity: Some(entity.into()),
            bean_json: Some(payload.into()),
            bean_bytes: None,
        }
    }

    /// Module with only a binary payload.
    pub fn bytes(id: i64, entity: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            id,
            entity: Some(entity.into()),
            bean_json: None,
            bean_bytes: Some(payload),
        }
    }

    /// The entity key, if present and not blank.
    pub fn entity_key(&self) -> Option<&str> {
        self.entity.as_deref().filter(|e| !e.trim().is_empty())
    }
}

/// External reference describing a schema image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalRef {
    /// Link target.
    pub href: Option<String>,
    /// Display title.
    pub title: Option<String>,
    /// MIME type.
    pub content_type: Option<String>,
}

/// Schema (drawing) image attached to a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaImage {
    /// Image row identifier.
    pub id: i64,
    /// Reference metadata.
    pub ext_ref: Option<ExternalRef>,
    /// Encoded image bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jpeg_bytes: Option<Vec<u8>>,
}

/// File attachment of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Attachment row identifier.
    pub id: i64,
    /// Original file name.
    pub file_name: Option<String>,
    /// MIME type.
    pub content_type: Option<String>,
    /// Size of the content in bytes.
    pub content_size: i64,
    /// Digest of the content as recorded at upload.
    pub digest: Option<String>,
    /// Raw content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<Vec<u8>>,
}

/// Full content of one revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// The revision this snapshot belongs to.
    pub record: RevisionRecord,
    /// Modules in stored order.
    pub modules: Vec<ModuleEntity>,
    /// Schema images in stored order.
    pub schema: Vec<SchemaImage>,
    /// Attachments in stored order.
    pub attachments: Vec<Attachment>,
}

impl Snapshot {
    /// Snapshot with no content.
    pub fn new(record: RevisionRecord) -> Self {
        Self {
            record,
            modules: Vec::new(),
            schema: Vec::new(),
            attachments: Vec::new(),
        }
    }

    /// Append a module.
    pub fn with_module(mut self, module: ModuleEntity) -> Self {
        self.modules.push(module);
        self
    }

    /// Append a schema image.
    pub fn with_schema(mut self, image: SchemaImage) -> Self {
        self.schema.push(image);
        self
    }

    /// Append an attachment.
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Lightweight copy for transmission: attachment bytes and schema image
    /// bytes are dropped. `self` is left untouched.
    pub fn without_heavy_bytes(&self) -> Snapshot {
        Snapshot {
            record: self.record.clone(),
            modules: self.modules.clone(),
            schema: self
                .schema
                .iter()
                .map(|image| SchemaImage {
                    jpeg_bytes: None,
                    ..image.clone()
                })
                .collect(),
            attachments: self
                .attachments
                .iter()
                .map(|attachment| Attachment {
                    bytes: None,
                    ..attachment.clone()
                })
                .collect(),
        }
    }
}
