use std::collections::HashMap;
use async_trait::async_trait;
use crate::checkout::domain::model::{CheckoutEntity, CheckoutHistoryEntity};
use crate::checkout::repository::{CheckoutHistoryRepository, CheckoutRepository};
use crate::core::library::{LibraryResult, PaginatedResult};
use crate::core::repository::Repository;
use crate::utils::memory::{find_row, insert_row, query_rows, remove_row, replace_row, MemoryTransaction};

#[async_trait]
impl Repository<CheckoutEntity> for MemoryTransaction {
    async fn create(&self, entity: &CheckoutEntity) -> LibraryResult<usize> {
        let entity = entity.clone();
        self.stage(move |tables| insert_row(&mut tables.checkouts, &entity, "checkout")).await
    }

    async fn update(&self, entity: &CheckoutEntity) -> LibraryResult<usize> {
        let entity = entity.clone();
        self.stage(move |tables| replace_row(&mut tables.checkouts, &entity, "checkout")).await
    }

    async fn get(&self, id: &str) -> LibraryResult<CheckoutEntity> {
        self.read(|tables| find_row(&tables.checkouts, id, "checkout")).await
    }

    async fn delete(&self, id: &str) -> LibraryResult<usize> {
        let id = id.to_string();
        self.stage(move |tables| Ok(remove_row(&mut tables.checkouts, id.as_str()))).await
    }

    async fn query(&self, predicate: &HashMap<String, String>,
                   page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<CheckoutEntity>> {
        self.read(|tables| query_rows(&tables.checkouts, predicate, page, page_size)).await
    }
}

#[async_trait]
impl CheckoutRepository for MemoryTransaction {
    async fn find_by_asset(&self, asset_id: &str) -> LibraryResult<Vec<CheckoutEntity>> {
        Ok(self.read(|tables| {
            tables.checkouts.iter()
                .filter(|checkout| checkout.asset_id == asset_id)
                .cloned()
                .collect()
        }).await)
    }
}

#[async_trait]
impl Repository<CheckoutHistoryEntity> for MemoryTransaction {
    async fn create(&self, entity: &CheckoutHistoryEntity) -> LibraryResult<usize> {
        let entity = entity.clone();
        self.stage(move |tables| insert_row(&mut tables.histories, &entity, "checkout history")).await
    }

    async fn update(&self, entity: &CheckoutHistoryEntity) -> LibraryResult<usize> {
        let entity = entity.clone();
        self.stage(move |tables| replace_row(&mut tables.histories, &entity, "checkout history")).await
    }

    async fn get(&self, id: &str) -> LibraryResult<CheckoutHistoryEntity> {
        self.read(|tables| find_row(&tables.histories, id, "checkout history")).await
    }

    async fn delete(&self, id: &str) -> LibraryResult<usize> {
        let id = id.to_string();
        self.stage(move |tables| Ok(remove_row(&mut tables.histories, id.as_str()))).await
    }

    async fn query(&self, predicate: &HashMap<String, String>,
                   page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<CheckoutHistoryEntity>> {
        self.read(|tables| query_rows(&tables.histories, predicate, page, page_size)).await
    }
}

#[async_trait]
impl CheckoutHistoryRepository for MemoryTransaction {
    async fn find_by_asset(&self, asset_id: &str) -> LibraryResult<Vec<CheckoutHistoryEntity>> {
        Ok(self.read(|tables| {
            tables.histories.iter()
                .filter(|history| history.asset_id == asset_id)
                .cloned()
                .collect()
        }).await)
    }

    async fn find_open(&self, asset_id: &str) -> LibraryResult<Vec<CheckoutHistoryEntity>> {
        let predicate = HashMap::from([
            ("asset_id".to_string(), asset_id.to_string()),
            ("checked_in".to_string(), String::new()),
        ]);
        let mut open = vec![];
        let mut page: Option<String> = None;
        loop {
            let res = self.read(|tables| query_rows(&tables.histories, &predicate, page.as_deref(), 100)).await?;
            open.extend(res.records);
            page = res.next_page;
            if page.is_none() {
                return Ok(open);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDateTime};
    use crate::checkout::domain::model::{CheckoutEntity, CheckoutHistoryEntity};
    use crate::core::repository::{PersistenceGateway, Repository};
    use crate::utils::date::DATE_FMT;
    use crate::utils::memory::MemoryStore;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, DATE_FMT).expect("should parse date")
    }

    #[tokio::test]
    async fn test_should_create_find_delete_checkout() {
        let store = MemoryStore::new();
        let uow = store.begin("asset1").await.expect("should begin");
        let checkout = CheckoutEntity::new("branch", "asset1", "card1", at("2023-04-11T11:11:11"), Duration::days(30))
            .expect("should build checkout");
        uow.checkouts().create(&checkout).await.expect("should create checkout");
        uow.checkouts().create(&CheckoutEntity::new("branch", "asset2", "card1", at("2023-04-11T11:11:11"), Duration::days(30))
            .expect("should build checkout"))
            .await.expect("should create checkout");

        let found = uow.checkouts().find_by_asset("asset1").await.expect("should find checkouts");
        assert_eq!(vec![checkout.clone()], found);

        let deleted = uow.checkouts().delete(checkout.checkout_id.as_str()).await.expect("should delete checkout");
        assert_eq!(1, deleted);
        assert!(uow.checkouts().find_by_asset("asset1").await.expect("should find checkouts").is_empty());
    }

    #[tokio::test]
    async fn test_should_find_open_history() {
        let store = MemoryStore::new();
        let uow = store.begin("asset1").await.expect("should begin");
        let mut closed = CheckoutHistoryEntity::opened("asset1", "card1", at("2023-04-11T11:11:11"));
        closed.close(at("2023-04-12T11:11:11"));
        let open = CheckoutHistoryEntity::opened("asset1", "card2", at("2023-04-13T11:11:11"));
        uow.histories().create(&closed).await.expect("should create history");
        uow.histories().create(&open).await.expect("should create history");
        uow.histories().create(&CheckoutHistoryEntity::opened("asset2", "card2", at("2023-04-13T11:11:11")))
            .await.expect("should create history");

        let all = uow.histories().find_by_asset("asset1").await.expect("should find history");
        assert_eq!(2, all.len());
        let res = uow.histories().find_open("asset1").await.expect("should find open history");
        assert_eq!(vec![open.clone()], res);

        let mut open = open;
        open.close(at("2023-04-14T11:11:11"));
        uow.histories().update(&open).await.expect("should close history");
        assert!(uow.histories().find_open("asset1").await.expect("should find open history").is_empty());
    }
}
