use std::collections::HashMap;
use async_trait::async_trait;
use crate::core::library::{LibraryResult, PaginatedResult};
use crate::core::repository::Repository;
use crate::hold::domain::model::HoldEntity;
use crate::hold::repository::HoldRepository;
use crate::utils::memory::{find_row, insert_row, query_rows, remove_row, replace_row, MemoryTransaction};

#[async_trait]
impl Repository<HoldEntity> for MemoryTransaction {
    async fn create(&self, entity: &HoldEntity) -> LibraryResult<usize> {
        let entity = entity.clone();
        self.stage(move |tables| insert_row(&mut tables.holds, &entity, "hold")).await
    }

    async fn update(&self, entity: &HoldEntity) -> LibraryResult<usize> {
        let entity = entity.clone();
        self.stage(move |tables| replace_row(&mut tables.holds, &entity, "hold")).await
    }

    async fn get(&self, id: &str) -> LibraryResult<HoldEntity> {
        self.read(|tables| find_row(&tables.holds, id, "hold")).await
    }

    async fn delete(&self, id: &str) -> LibraryResult<usize> {
        let id = id.to_string();
        self.stage(move |tables| Ok(remove_row(&mut tables.holds, id.as_str()))).await
    }

    async fn query(&self, predicate: &HashMap<String, String>,
                   page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<HoldEntity>> {
        self.read(|tables| query_rows(&tables.holds, predicate, page, page_size)).await
    }
}

#[async_trait]
impl HoldRepository for MemoryTransaction {
    async fn find_by_asset(&self, asset_id: &str) -> LibraryResult<Vec<HoldEntity>> {
        Ok(self.read(|tables| {
            tables.holds.iter()
                .filter(|hold| hold.asset_id == asset_id)
                .cloned()
                .collect()
        }).await)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use chrono::{Duration, NaiveDateTime};
    use crate::core::repository::{PersistenceGateway, Repository};
    use crate::hold::domain::model::HoldEntity;
    use crate::utils::date::DATE_FMT;
    use crate::utils::memory::MemoryStore;

    #[tokio::test]
    async fn test_should_keep_insertion_order() {
        let store = MemoryStore::new();
        let at = NaiveDateTime::parse_from_str("2023-04-11T11:11:11", DATE_FMT).expect("should parse date");
        let uow = store.begin("asset1").await.expect("should begin");
        let mut holds = vec![];
        for i in 0..5 {
            let hold = HoldEntity::new("asset1", format!("card{}", i).as_str(), at + Duration::seconds(5 - i));
            uow.holds().create(&hold).await.expect("should create hold");
            holds.push(hold);
        }
        uow.commit().await.expect("should commit");

        let view = store.snapshot().await.expect("should open snapshot");
        let loaded = view.holds().find_by_asset("asset1").await.expect("should find holds");
        assert_eq!(holds, loaded);
        let res = view.holds().query(&HashMap::from([("card_id".to_string(), "card3".to_string())]), None, 10)
            .await.expect("should query holds");
        assert_eq!(1, res.records.len());
    }

    #[tokio::test]
    async fn test_should_create_delete_hold() {
        let store = MemoryStore::new();
        let at = NaiveDateTime::parse_from_str("2023-04-11T11:11:11", DATE_FMT).expect("should parse date");
        let hold = HoldEntity::new("asset1", "card1", at);
        let uow = store.begin("asset1").await.expect("should begin");
        uow.holds().create(&hold).await.expect("should create hold");
        let deleted = uow.holds().delete(hold.hold_id.as_str()).await.expect("should delete hold");
        assert_eq!(1, deleted);
        assert!(uow.holds().get(hold.hold_id.as_str()).await.is_err());
    }
}
