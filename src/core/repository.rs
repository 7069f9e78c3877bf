use async_trait::async_trait;
use std::collections::HashMap;
use crate::assets::repository::AssetRepository;
use crate::checkout::repository::{CheckoutHistoryRepository, CheckoutRepository};
use crate::core::library::{LibraryResult, PaginatedResult};
use crate::hold::repository::HoldRepository;
use crate::patrons::repository::{CardRepository, PatronRepository};

#[async_trait]
pub trait Repository<Entity>: Sync + Send {
    // create an entity
    async fn create(&self, entity: &Entity) -> LibraryResult<usize>;

    // updates an entity, the entity version must match the stored version
    async fn update(&self, entity: &Entity) -> LibraryResult<usize>;

    // get an entity
    async fn get(&self, id: &str) -> LibraryResult<Entity>;

    // delete an entity
    async fn delete(&self, id: &str) -> LibraryResult<usize>;

    // find by serialized field values
    async fn query(&self, predicate: &HashMap::<String, String>,
                   page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<Entity>>;
}

/// One atomic unit of work against the persistence gateway.
///
/// Reads observe the writes already staged in the same unit of work. Nothing is
/// durable until [`UnitOfWork::commit`] succeeds; dropping the unit of work
/// without committing discards every staged write.
#[async_trait]
pub trait UnitOfWork: Sync + Send {
    fn assets(&self) -> &dyn AssetRepository;
    fn cards(&self) -> &dyn CardRepository;
    fn patrons(&self) -> &dyn PatronRepository;
    fn checkouts(&self) -> &dyn CheckoutRepository;
    fn histories(&self) -> &dyn CheckoutHistoryRepository;
    fn holds(&self) -> &dyn HoldRepository;

    // makes all staged writes durable at once, or none of them
    async fn commit(&self) -> LibraryResult<()>;
}

/// Read/write access to circulation entities.
///
/// Implementations must serialize units of work opened with [`PersistenceGateway::begin`]
/// for the same key for as long as the unit of work is alive. The engine does not
/// lock on its own and relies on this for its invariants.
#[async_trait]
pub trait PersistenceGateway: Sync + Send {
    // opens a unit of work holding the exclusive scope for the given asset id
    async fn begin(&self, asset_id: &str) -> LibraryResult<Box<dyn UnitOfWork>>;

    // opens a read-only consistent view, commit on it fails
    async fn snapshot(&self) -> LibraryResult<Box<dyn UnitOfWork>>;
}
