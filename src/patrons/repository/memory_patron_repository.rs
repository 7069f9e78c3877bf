use std::collections::HashMap;
use async_trait::async_trait;
use chrono::Utc;
use crate::core::library::{LibraryError, LibraryResult, PaginatedResult};
use crate::core::repository::Repository;
use crate::patrons::domain::model::{LibraryCardEntity, PatronEntity};
use crate::patrons::repository::{CardRepository, PatronRepository};
use crate::utils::memory::{find_row, insert_row, query_rows, remove_row, replace_row, MemoryTransaction};

#[async_trait]
impl Repository<LibraryCardEntity> for MemoryTransaction {
    async fn create(&self, entity: &LibraryCardEntity) -> LibraryResult<usize> {
        let entity = entity.clone();
        self.stage(move |tables| insert_row(&mut tables.cards, &entity, "card")).await
    }

    async fn update(&self, entity: &LibraryCardEntity) -> LibraryResult<usize> {
        let mut entity = entity.clone();
        entity.updated_at = Utc::now().naive_utc();
        self.stage(move |tables| replace_row(&mut tables.cards, &entity, "card")).await
    }

    async fn get(&self, id: &str) -> LibraryResult<LibraryCardEntity> {
        self.read(|tables| find_row(&tables.cards, id, "card")).await
    }

    async fn delete(&self, id: &str) -> LibraryResult<usize> {
        let id = id.to_string();
        self.stage(move |tables| Ok(remove_row(&mut tables.cards, id.as_str()))).await
    }

    async fn query(&self, predicate: &HashMap<String, String>,
                   page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<LibraryCardEntity>> {
        self.read(|tables| query_rows(&tables.cards, predicate, page, page_size)).await
    }
}

impl CardRepository for MemoryTransaction {}

#[async_trait]
impl Repository<PatronEntity> for MemoryTransaction {
    async fn create(&self, entity: &PatronEntity) -> LibraryResult<usize> {
        let entity = entity.clone();
        self.stage(move |tables| insert_row(&mut tables.patrons, &entity, "patron")).await
    }

    async fn update(&self, entity: &PatronEntity) -> LibraryResult<usize> {
        let mut entity = entity.clone();
        entity.updated_at = Utc::now().naive_utc();
        self.stage(move |tables| replace_row(&mut tables.patrons, &entity, "patron")).await
    }

    async fn get(&self, id: &str) -> LibraryResult<PatronEntity> {
        self.read(|tables| find_row(&tables.patrons, id, "patron")).await
    }

    async fn delete(&self, id: &str) -> LibraryResult<usize> {
        let id = id.to_string();
        self.stage(move |tables| Ok(remove_row(&mut tables.patrons, id.as_str()))).await
    }

    async fn query(&self, predicate: &HashMap<String, String>,
                   page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<PatronEntity>> {
        self.read(|tables| query_rows(&tables.patrons, predicate, page, page_size)).await
    }
}

#[async_trait]
impl PatronRepository for MemoryTransaction {
    async fn find_by_card(&self, card_id: &str) -> LibraryResult<PatronEntity> {
        self.read(|tables| {
            tables.patrons.iter()
                .find(|patron| patron.card_id == card_id)
                .cloned()
                .ok_or_else(|| LibraryError::not_found(
                    format!("patron not found for card {}", card_id).as_str()))
        }).await
    }
}
