//! Persisted shape records used to seed a room on entry.

use crate::shapes::{Shape, UserId};
use crate::store::ShapeStore;
use crate::sync::{ShapeEnvelope, SyncResult, WireId, decode_payload};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One stored shape as handed over by the room loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedRecord {
    pub id: WireId,
    #[serde(default)]
    pub user_id: Option<String>,
    /// JSON-encoded `{"shape": ...}` envelope.
    pub data: Value,
}

impl SeedRecord {
    /// Build a live shape. The record id becomes the shape id and the
    /// creation time is the moment of loading.
    pub fn to_shape(&self) -> SyncResult<Shape> {
        let envelope: ShapeEnvelope = decode_payload(&self.data)?;
        let record = envelope.shape;
        let author = self
            .user_id
            .clone()
            .or_else(|| record.user_id.clone())
            .map(UserId::new)
            .unwrap_or_else(UserId::unknown);
        Ok(Shape::new(
            self.id.to_shape_id(),
            record.geometry()?,
            record.style(),
            author,
        ))
    }
}

/// Parse a JSON array of seed records.
pub fn parse_seed(json: &str) -> SyncResult<Vec<SeedRecord>> {
    Ok(serde_json::from_str(json)?)
}

/// Append every usable record to `store`, returning how many were loaded.
pub fn load_seed(records: &[SeedRecord], store: &mut ShapeStore) -> usize {
    let mut loaded = 0;
    for record in records {
        let shape = match record.to_shape() {
            Ok(shape) => shape,
            Err(e) => {
                log::error!("Failed to parse seed record {:?}: {}", record.id, e);
                continue;
            }
        };
        match store.append(shape) {
            Ok(()) => loaded += 1,
            Err(e) => log::warn!("Skipping seed record: {}", e),
        }
    }
    loaded
}
