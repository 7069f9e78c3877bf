use std::collections::HashMap;
use async_trait::async_trait;
use chrono::Utc;
use crate::assets::domain::model::AssetEntity;
use crate::assets::repository::AssetRepository;
use crate::core::library::{LibraryResult, PaginatedResult};
use crate::core::repository::Repository;
use crate::utils::memory::{find_row, insert_row, query_rows, remove_row, replace_row, MemoryTransaction};

#[async_trait]
impl Repository<AssetEntity> for MemoryTransaction {
    async fn create(&self, entity: &AssetEntity) -> LibraryResult<usize> {
        let entity = entity.clone();
        self.stage(move |tables| insert_row(&mut tables.assets, &entity, "asset")).await
    }

    async fn update(&self, entity: &AssetEntity) -> LibraryResult<usize> {
        let mut entity = entity.clone();
        entity.updated_at = Utc::now().naive_utc();
        self.stage(move |tables| replace_row(&mut tables.assets, &entity, "asset")).await
    }

    async fn get(&self, id: &str) -> LibraryResult<AssetEntity> {
        self.read(|tables| find_row(&tables.assets, id, "asset")).await
    }

    async fn delete(&self, id: &str) -> LibraryResult<usize> {
        let id = id.to_string();
        self.stage(move |tables| Ok(remove_row(&mut tables.assets, id.as_str()))).await
    }

    async fn query(&self, predicate: &HashMap<String, String>,
                   page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<AssetEntity>> {
        self.read(|tables| query_rows(&tables.assets, predicate, page, page_size)).await
    }
}

impl AssetRepository for MemoryTransaction {}

#[cfg(test)]
mod tests {
    use crate::assets::domain::model::AssetEntity;
    use crate::core::library::AssetStatus;
    use crate::core::repository::{PersistenceGateway, Repository};
    use crate::utils::memory::MemoryStore;

    #[tokio::test]
    async fn test_should_create_update_asset() {
        let store = MemoryStore::new();
        let mut asset = AssetEntity::new("title", 3);
        let uow = store.begin(asset.asset_id.as_str()).await.expect("should begin");
        let size = uow.assets().create(&asset).await.expect("should create asset");
        assert_eq!(1, size);
        assert!(uow.assets().create(&asset).await.is_err());

        asset.asset_status = AssetStatus::OnHold;
        let size = uow.assets().update(&asset).await.expect("should update asset");
        assert_eq!(1, size);
        uow.commit().await.expect("should commit");

        let view = store.snapshot().await.expect("should open snapshot");
        let loaded = view.assets().get(asset.asset_id.as_str()).await.expect("should return asset");
        assert_eq!(AssetStatus::OnHold, loaded.asset_status);
        assert_eq!(1, loaded.version);
    }

    #[tokio::test]
    async fn test_should_create_delete_asset() {
        let store = MemoryStore::new();
        let asset = AssetEntity::new("title", 1);
        let uow = store.begin(asset.asset_id.as_str()).await.expect("should begin");
        uow.assets().create(&asset).await.expect("should create asset");
        let deleted = uow.assets().delete(asset.asset_id.as_str()).await.expect("should delete asset");
        assert_eq!(1, deleted);
        assert!(uow.assets().get(asset.asset_id.as_str()).await.is_err());
    }
}
