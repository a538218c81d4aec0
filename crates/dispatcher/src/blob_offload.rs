//! Blob-offload traversal (§4.9, §9 "dynamic trees of artifacts").
//!
//! A worker's reply carries every artifact inline. Before the dispatcher
//! persists it, this walks the JSON tree looking for keys the domain model
//! already knows are artifact-shaped (`is_blob_offload_key`) and, when the
//! value is larger than [`MAX_INLINE_ARTIFACT_BYTES`], moves it to the blob
//! store and replaces it in place with a [`BlobReference`].
//!
//! The walk happens in two passes rather than recursing with an `&mut` and
//! an `.await` in the same frame: the first pass (synchronous) collects JSON
//! pointers to oversized artifacts, the second (async) uploads them and
//! patches the tree via `Value::pointer_mut`.

use uuid::Uuid;

use authscope_domain::error::Result;
use authscope_domain::model::{is_blob_offload_key, BlobReference};
use authscope_domain::trace::TraceEvent;
use authscope_protocol::MAX_INLINE_ARTIFACT_BYTES;

use crate::store::BlobStore;

const ARTIFACT_BUCKET: &str = "authscope-artifacts";

struct OffloadTarget {
    pointer: String,
    key: String,
    bytes: Vec<u8>,
}

fn value_bytes(value: &serde_json::Value) -> Option<Vec<u8>> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.as_bytes().to_vec()),
        other => serde_json::to_vec(other).ok(),
    }
}

fn extension_for_key(key: &str) -> &'static str {
    if key.ends_with("_screenshot") {
        "png"
    } else if key.ends_with("_har") {
        "har"
    } else if key.ends_with("_storage_state") {
        "json"
    } else if key == "element_tree_markup" {
        "html"
    } else if key == "sitemap" || key == "robots" {
        "xml"
    } else {
        "json"
    }
}

fn collect(value: &serde_json::Value, path: &str, out: &mut Vec<OffloadTarget>) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, child) in map {
                let child_path = format!("{path}/{}", jsonptr_escape(key));
                if is_blob_offload_key(key) {
                    if let Some(bytes) = value_bytes(child) {
                        if bytes.len() > MAX_INLINE_ARTIFACT_BYTES {
                            out.push(OffloadTarget { pointer: child_path, key: key.clone(), bytes });
                            continue;
                        }
                    }
                }
                collect(child, &child_path, out);
            }
        }
        serde_json::Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                collect(child, &format!("{path}/{i}"), out);
            }
        }
        _ => {}
    }
}

fn jsonptr_escape(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

/// Offloads every oversized artifact found in `value` to `blobs`, mutating
/// `value` in place, and returns how many were offloaded.
pub async fn offload(task_id: &str, blobs: &dyn BlobStore, value: &mut serde_json::Value) -> Result<usize> {
    let mut targets = Vec::new();
    collect(value, "", &mut targets);
    let count = targets.len();

    for target in targets {
        let object_name = format!("{task_id}/{}-{}", target.key, Uuid::new_v4());
        let extension = extension_for_key(&target.key);
        blobs.put(ARTIFACT_BUCKET, &object_name, target.bytes).await?;
        TraceEvent::BlobOffloaded {
            task_id: task_id.to_string(),
            bucket: ARTIFACT_BUCKET.to_string(),
            object_name: object_name.clone(),
        }
        .emit();

        if let Some(slot) = value.pointer_mut(&target.pointer) {
            *slot = serde_json::to_value(BlobReference::new(ARTIFACT_BUCKET, object_name, extension))
                .unwrap_or(serde_json::Value::Null);
        }
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryBlobStore;

    #[tokio::test]
    async fn offloads_oversized_screenshot_and_leaves_small_fields_inline() {
        let blobs = InMemoryBlobStore::new();
        let big = "x".repeat(MAX_INLINE_ARTIFACT_BYTES + 1);
        let mut value = serde_json::json!({
            "identity_providers": [
                { "idp_name": "okta", "idp_screenshot": big, "element_inner_text": "sign in" }
            ]
        });

        let count = offload("task-1", &blobs, &mut value).await.unwrap();
        assert_eq!(count, 1);

        let screenshot = &value["identity_providers"][0]["idp_screenshot"];
        assert_eq!(screenshot["type"], "reference");
        assert_eq!(screenshot["data"]["extension"], "png");
        assert_eq!(value["identity_providers"][0]["element_inner_text"], "sign in");
    }

    #[tokio::test]
    async fn leaves_small_artifacts_inline() {
        let blobs = InMemoryBlobStore::new();
        let mut value = serde_json::json!({ "metadata_data": { "sitemap": "small" } });
        let count = offload("task-1", &blobs, &mut value).await.unwrap();
        assert_eq!(count, 0);
        assert_eq!(value["metadata_data"]["sitemap"], "small");
    }
}
