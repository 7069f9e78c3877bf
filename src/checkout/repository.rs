pub mod memory_checkout_repository;

use async_trait::async_trait;
use crate::checkout::domain::model::{CheckoutEntity, CheckoutHistoryEntity};
use crate::core::library::LibraryResult;
use crate::core::repository::Repository;


#[async_trait]
pub trait CheckoutRepository: Repository<CheckoutEntity> {
    // active checkouts of the asset, in insertion order
    async fn find_by_asset(&self, asset_id: &str) -> LibraryResult<Vec<CheckoutEntity>>;
}

#[async_trait]
pub trait CheckoutHistoryRepository: Repository<CheckoutHistoryEntity> {
    // every loan episode of the asset, in insertion order
    async fn find_by_asset(&self, asset_id: &str) -> LibraryResult<Vec<CheckoutHistoryEntity>>;

    // episodes of the asset with no check-in time yet
    async fn find_open(&self, asset_id: &str) -> LibraryResult<Vec<CheckoutHistoryEntity>>;
}
