pub mod memory_hold_repository;

use async_trait::async_trait;
use crate::hold::domain::model::HoldEntity;
use crate::core::library::LibraryResult;
use crate::core::repository::Repository;


#[async_trait]
pub trait HoldRepository: Repository<HoldEntity> {
    // holds of the asset in insertion order
    async fn find_by_asset(&self, asset_id: &str) -> LibraryResult<Vec<HoldEntity>>;
}
