use chrono::NaiveDateTime;
use uuid::Uuid;
use serde::{Deserialize, Serialize};
use crate::core::domain::Identifiable;
use crate::utils::date::serializer;

// HoldEntity is one patron's place in the queue for an asset. It is deleted when
// it is consumed to check the asset out to that patron.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct HoldEntity {
    pub hold_id: String,
    pub version: i64,
    pub asset_id: String,
    pub card_id: String,
    #[serde(with = "serializer")]
    pub hold_placed: NaiveDateTime,
}

impl HoldEntity {
    pub fn new(asset_id: &str, card_id: &str, hold_placed: NaiveDateTime) -> Self {
        Self {
            hold_id: Uuid::new_v4().to_string(),
            version: 0,
            asset_id: asset_id.to_string(),
            card_id: card_id.to_string(),
            hold_placed,
        }
    }
}

impl Identifiable for HoldEntity {
    fn id(&self) -> String {
        self.hold_id.to_string()
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }
}
