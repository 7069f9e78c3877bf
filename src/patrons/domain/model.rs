use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::core::domain::Identifiable;
use crate::patrons::domain::Patron;
use crate::utils::date::serializer;

// LibraryCardEntity is the borrowing credential used by checkouts and holds.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct LibraryCardEntity {
    pub card_id: String,
    pub version: i64,
    #[serde(with = "serializer")]
    pub created_at: NaiveDateTime,
    #[serde(with = "serializer")]
    pub updated_at: NaiveDateTime,
}

impl LibraryCardEntity {
    pub fn new() -> Self {
        Self {
            card_id: Uuid::new_v4().to_string(),
            version: 0,
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        }
    }
}

impl Default for LibraryCardEntity {
    fn default() -> Self {
        Self::new()
    }
}

impl Identifiable for LibraryCardEntity {
    fn id(&self) -> String {
        self.card_id.to_string()
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }
}

// PatronEntity is the person a library card belongs to.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct PatronEntity {
    pub patron_id: String,
    pub version: i64,
    pub card_id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(with = "serializer")]
    pub created_at: NaiveDateTime,
    #[serde(with = "serializer")]
    pub updated_at: NaiveDateTime,
}

impl PatronEntity {
    pub fn new(card_id: &str, first_name: &str, last_name: &str) -> Self {
        Self {
            patron_id: Uuid::new_v4().to_string(),
            version: 0,
            card_id: card_id.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        }
    }
}

impl Identifiable for PatronEntity {
    fn id(&self) -> String {
        self.patron_id.to_string()
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }
}

impl Patron for PatronEntity {
    fn card_id(&self) -> String {
        self.card_id.to_string()
    }

    fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[cfg(test)]
mod tests {
    use crate::patrons::domain::Patron;
    use crate::patrons::domain::model::{LibraryCardEntity, PatronEntity};

    #[tokio::test]
    async fn test_should_build_patron_with_card() {
        let card = LibraryCardEntity::new();
        let patron = PatronEntity::new(card.card_id.as_str(), "Ada", "Lovelace");
        assert_eq!(card.card_id, patron.card_id());
        assert_eq!("Ada Lovelace", patron.full_name().as_str());
    }
}
