use chrono::{NaiveDateTime, Utc};
use uuid::Uuid;
use serde::{Deserialize, Serialize};
use crate::assets::domain::Asset;
use crate::core::domain::Identifiable;
use crate::core::library::AssetStatus;
use crate::utils::date::serializer;

// AssetEntity abstracts a catalogued library asset. The catalog owns identity and
// copy count; circulation only ever writes asset_status.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct AssetEntity {
    pub asset_id: String,
    pub version: i64,
    pub title: String,
    pub number_of_copies: i64,
    pub asset_status: AssetStatus,
    #[serde(with = "serializer")]
    pub created_at: NaiveDateTime,
    #[serde(with = "serializer")]
    pub updated_at: NaiveDateTime,
}

impl AssetEntity {
    pub fn new(title: &str, number_of_copies: i64) -> Self {
        Self {
            asset_id: Uuid::new_v4().to_string(),
            version: 0,
            title: title.to_string(),
            number_of_copies: number_of_copies.max(1),
            asset_status: AssetStatus::Available,
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        }
    }
}

impl Identifiable for AssetEntity {
    fn id(&self) -> String {
        self.asset_id.to_string()
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }
}

impl Asset for AssetEntity {
    fn status(&self) -> AssetStatus {
        self.asset_status
    }

    fn number_of_copies(&self) -> i64 {
        self.number_of_copies
    }
}
