// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Versioned marker documents.
//!
//! Two envelopes are understood:
//!
//! - **v3** (current): `{v: 3, images: [...], activeImageIndex, workMode}`,
//!   one marker set per image.
//! - **legacy** (v2): top-level `items` and `meta` with no `images` array and
//!   an optional `v: 2`. All items belong to whatever image is active.
//!
//! Anything else is rejected as an unknown format. Individual marker records
//! that cannot be read are skipped with a warning instead of failing the whole
//! document.

use super::serialization::{record_from_value, Meta, SerializedMarkers, ShapeRecord};
use crate::models::image::{Jaw, WorkMode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

/// Version tag of the current envelope.
pub const DOCUMENT_VERSION: u64 = 3;

/// Errors that can occur while reading or writing marker documents.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Version tag missing or unsupported, or the envelope has neither shape.
    #[error("Unknown document format: {0}")]
    UnknownFormat(String),
}

/// One image of a v3 document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentImage<I = ShapeRecord> {
    pub id: String,
    pub image_url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub jaw: Option<Jaw>,
    #[serde(default = "yes")]
    pub can_mark: bool,
    #[serde(default = "yes")]
    pub can_draw: bool,
    #[serde(rename = "type")]
    pub kind: WorkMode,
    #[serde(default = "Vec::new")]
    pub items: Vec<I>,
    pub meta: Meta,
}

impl DocumentImage {
    pub fn markers(&self) -> SerializedMarkers {
        SerializedMarkers {
            items: self.items.clone(),
            meta: self.meta,
        }
    }
}

/// Current multi-image document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentV3 {
    pub images: Vec<DocumentImage>,
    pub active_image_index: usize,
    pub work_mode: WorkMode,
}

/// Legacy single-image document.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyDocument {
    pub markers: SerializedMarkers,
}

/// A decoded document of either version.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Current(DocumentV3),
    Legacy(LegacyDocument),
}

fn yes() -> bool {
    true
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireV3<I> {
    v: u64,
    images: Vec<DocumentImage<I>>,
    #[serde(default)]
    active_image_index: usize,
    work_mode: WorkMode,
}

#[derive(Deserialize)]
struct WireLegacy {
    items: Vec<Value>,
    meta: Meta,
}

/// Parse a JSON document, picking the decoder from the envelope.
pub fn parse_document(json: &str) -> Result<Document, DocumentError> {
    let value: Value = serde_json::from_str(json)?;
    decode_document(value)
}

/// Decode an already parsed JSON value.
pub fn decode_document(value: Value) -> Result<Document, DocumentError> {
    let Some(obj) = value.as_object() else {
        return Err(DocumentError::UnknownFormat("not a JSON object".to_string()));
    };

    let version = match obj.get("v") {
        None => None,
        Some(v) => Some(v.as_u64().ok_or_else(|| {
            DocumentError::UnknownFormat(format!("version tag {} is not a number", v))
        })?),
    };
    let has_images = obj.get("images").is_some_and(Value::is_array);
    let has_items = obj.get("items").is_some_and(Value::is_array);

    match version {
        Some(DOCUMENT_VERSION) if has_images => decode_v3(value).map(Document::Current),
        None | Some(2) if !obj.contains_key("images") && has_items => {
            decode_legacy(value).map(Document::Legacy)
        }
        Some(v) => Err(DocumentError::UnknownFormat(format!("version {}", v))),
        None => Err(DocumentError::UnknownFormat(
            "no version tag and no items".to_string(),
        )),
    }
}

fn decode_v3(value: Value) -> Result<DocumentV3, DocumentError> {
    let wire: WireV3<Value> = serde_json::from_value(value)?;
    let images = wire
        .images
        .into_iter()
        .map(|img| DocumentImage {
            id: img.id,
            image_url: img.image_url,
            description: img.description,
            jaw: img.jaw,
            can_mark: img.can_mark,
            can_draw: img.can_draw,
            kind: img.kind,
            items: img.items.into_iter().filter_map(record_from_value).collect(),
            meta: img.meta,
        })
        .collect();

    Ok(DocumentV3 {
        images,
        active_image_index: wire.active_image_index,
        work_mode: wire.work_mode,
    })
}

fn decode_legacy(value: Value) -> Result<LegacyDocument, DocumentError> {
    let wire: WireLegacy = serde_json::from_value(value)?;
    Ok(LegacyDocument {
        markers: SerializedMarkers {
            items: wire.items.into_iter().filter_map(record_from_value).collect(),
            meta: wire.meta,
        },
    })
}

impl DocumentV3 {
    fn wire(&self) -> WireV3<ShapeRecord> {
        WireV3 {
            v: DOCUMENT_VERSION,
            images: self.images.clone(),
            active_image_index: self.active_image_index,
            work_mode: self.work_mode,
        }
    }

    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(&self.wire())?)
    }

    pub fn to_yaml(&self) -> Result<String, DocumentError> {
        Ok(serde_yaml::to_string(&self.wire())?)
    }
}

/// Export a document in JSON format.
pub fn export_json(doc: &DocumentV3, path: &Path) -> Result<(), DocumentError> {
    std::fs::write(path, doc.to_json()?)?;
    Ok(())
}

/// Export a document in YAML format.
pub fn export_yaml(doc: &DocumentV3, path: &Path) -> Result<(), DocumentError> {
    std::fs::write(path, doc.to_yaml()?)?;
    Ok(())
}

/// Import a JSON document of either version.
pub fn import_json(path: &Path) -> Result<Document, DocumentError> {
    let json = std::fs::read_to_string(path)?;
    parse_document(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::serialization::ShapeData;

    const V3: &str = r#"{
        "v": 3,
        "images": [
            {"id": "img_1", "imageUrl": "a.png", "description": "upper", "jaw": "upper",
             "canMark": true, "canDraw": true, "type": "SIMPLE",
             "items": [{"t":"point","v":2,"m":"blue_dot","sz":1,"cx":10,"cy":20,"radius":5},
                       {"t":"cross","v":2,"m":"white_cross","sz":1,"cx":1,"cy":1,"radius":1,"strokeWidth":1}],
             "meta": {"w": 1000, "h": 800, "mid": 400}},
            {"id": "img_2", "imageUrl": "b.png", "jaw": "lower", "type": "SIMPLE",
             "items": [], "meta": {"w": 500, "h": 400}}
        ],
        "activeImageIndex": 1,
        "workMode": "SIMPLE"
    }"#;

    #[test]
    fn test_v3_decodes_and_skips_bad_records() {
        let doc = parse_document(V3).unwrap();
        let Document::Current(doc) = doc else {
            panic!("expected v3");
        };
        assert_eq!(doc.images.len(), 2);
        assert_eq!(doc.active_image_index, 1);
        assert_eq!(doc.work_mode, WorkMode::Simple);
        assert_eq!(doc.images[0].items.len(), 1);
        assert_eq!(doc.images[0].jaw, Some(Jaw::Upper));
        assert_eq!(doc.images[0].meta.mid, Some(400.0));
        assert_eq!(doc.images[1].description, "");
        assert!(doc.images[1].can_mark);
    }

    #[test]
    fn test_legacy_without_version_tag() {
        let json = r#"{"items":[{"t":"point","m":"blue_dot","cx":500,"cy":400,"radius":20}],
                       "meta":{"w":1000,"h":800}}"#;
        let Document::Legacy(doc) = parse_document(json).unwrap() else {
            panic!("expected legacy");
        };
        assert_eq!(doc.markers.items.len(), 1);
        assert_eq!(doc.markers.items[0].v, 2);
        assert_eq!(doc.markers.items[0].sz, 1.0);
        assert!(matches!(doc.markers.items[0].shape, ShapeData::Point { cx, .. } if cx == 500.0));
    }

    #[test]
    fn test_legacy_with_version_two() {
        let json = r#"{"v":2,"items":[],"meta":{"w":10,"h":10}}"#;
        assert!(matches!(parse_document(json), Ok(Document::Legacy(_))));
    }

    #[test]
    fn test_unknown_formats_rejected() {
        for json in [
            r#"{"v":4,"images":[]}"#,
            r#"{"v":3,"items":[],"meta":{"w":1,"h":1}}"#,
            r#"{"v":"3","images":[]}"#,
            r#"{"images":[],"items":[],"meta":{"w":1,"h":1}}"#,
            r#"{"hello":"world"}"#,
            r#"[1,2,3]"#,
        ] {
            assert!(
                matches!(parse_document(json), Err(DocumentError::UnknownFormat(_))),
                "{} should be unknown",
                json
            );
        }
        assert!(matches!(parse_document("{"), Err(DocumentError::Json(_))));
    }

    #[test]
    fn test_v3_write_then_read() {
        let Document::Current(doc) = parse_document(V3).unwrap() else {
            panic!("expected v3");
        };
        let json = doc.to_json().unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["v"], 3);
        assert_eq!(value["images"][0]["imageUrl"], "a.png");
        assert_eq!(value["images"][0]["type"], "SIMPLE");
        assert_eq!(value["workMode"], "SIMPLE");

        let Document::Current(again) = parse_document(&json).unwrap() else {
            panic!("expected v3");
        };
        assert_eq!(again, doc);
        assert!(doc.to_yaml().unwrap().contains("workMode: SIMPLE"));
    }
}
