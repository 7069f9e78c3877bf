pub mod memory_patron_repository;

use async_trait::async_trait;
use crate::core::library::LibraryResult;
use crate::core::repository::Repository;
use crate::patrons::domain::model::{LibraryCardEntity, PatronEntity};

// Cards and patrons are owned outside circulation and only read here.
pub trait CardRepository: Repository<LibraryCardEntity> {}

#[async_trait]
pub trait PatronRepository: Repository<PatronEntity> {
    async fn find_by_card(&self, card_id: &str) -> LibraryResult<PatronEntity>;
}
