use std::cmp;
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};
use std::sync::atomic::{AtomicUsize, Ordering};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{Mutex, OwnedMutexGuard};
use crate::assets::domain::model::AssetEntity;
use crate::assets::repository::AssetRepository;
use crate::checkout::domain::model::{CheckoutEntity, CheckoutHistoryEntity};
use crate::checkout::repository::{CheckoutHistoryRepository, CheckoutRepository};
use crate::core::domain::Identifiable;
use crate::core::library::{LibraryError, LibraryResult, PaginatedResult};
use crate::core::repository::{PersistenceGateway, UnitOfWork};
use crate::hold::domain::model::HoldEntity;
use crate::hold::repository::HoldRepository;
use crate::patrons::domain::model::{LibraryCardEntity, PatronEntity};
use crate::patrons::repository::{CardRepository, PatronRepository};

const MAX_PAGE_SIZE: usize = 500;

// Rows are kept in insertion order; enumeration order is part of the contract.
#[derive(Debug, Default, Clone)]
pub(crate) struct Tables {
    pub(crate) assets: Vec<AssetEntity>,
    pub(crate) cards: Vec<LibraryCardEntity>,
    pub(crate) patrons: Vec<PatronEntity>,
    pub(crate) checkouts: Vec<CheckoutEntity>,
    pub(crate) histories: Vec<CheckoutHistoryEntity>,
    pub(crate) holds: Vec<HoldEntity>,
}

type StagedWrite = Arc<dyn Fn(&mut Tables) -> LibraryResult<usize> + Send + Sync>;

struct Shared {
    tables: Mutex<Tables>,
    // entries live only while a unit of work holds or waits on them
    locks: StdMutex<HashMap<String, Arc<Mutex<()>>>>,
    failing_commits: AtomicUsize,
}

impl Shared {
    fn take_injected_failure(&self) -> bool {
        self.failing_commits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn lock_table(&self) -> MutexGuard<'_, HashMap<String, Arc<Mutex<()>>>> {
        match self.locks.lock() {
            Ok(locks) => locks,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

// Exclusive scope over one asset id. Dropping it releases the lock and removes
// the map entry when no other unit of work holds or waits on it.
struct AssetLock {
    shared: Arc<Shared>,
    asset_id: String,
    lock: Option<Arc<Mutex<()>>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl AssetLock {
    fn new(shared: Arc<Shared>, asset_id: &str) -> Self {
        let lock = shared.lock_table()
            .entry(asset_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        Self {
            shared,
            asset_id: asset_id.to_string(),
            lock: Some(lock),
            guard: None,
        }
    }

    async fn acquire(mut self) -> Self {
        if let Some(lock) = self.lock.clone() {
            self.guard = Some(lock.lock_owned().await);
        }
        self
    }
}

impl Drop for AssetLock {
    fn drop(&mut self) {
        self.guard.take();
        self.lock.take();
        let mut locks = self.shared.lock_table();
        let unused = locks.get(self.asset_id.as_str())
            .map(|lock| Arc::strong_count(lock) == 1)
            .unwrap_or(false);
        if unused {
            locks.remove(self.asset_id.as_str());
        }
    }
}

/// In-process persistence gateway.
///
/// Each unit of work reads from a private copy of the tables and journals its
/// writes. Commit replays the journal onto a fresh copy of the shared tables and
/// swaps it in only if every write applied, so a failed commit leaves the shared
/// state untouched. Units of work opened with `begin` hold a per-asset lock until
/// they are dropped.
#[derive(Clone)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                tables: Mutex::new(Tables::default()),
                locks: StdMutex::new(HashMap::new()),
                failing_commits: AtomicUsize::new(0),
            }),
        }
    }

    /// Makes the next `n` commits fail with a retryable database error.
    pub fn fail_next_commits(&self, n: usize) {
        self.shared.failing_commits.store(n, Ordering::SeqCst);
    }

    async fn asset_lock(&self, asset_id: &str) -> AssetLock {
        AssetLock::new(self.shared.clone(), asset_id).acquire().await
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PersistenceGateway for MemoryStore {
    async fn begin(&self, asset_id: &str) -> LibraryResult<Box<dyn UnitOfWork>> {
        let guard = self.asset_lock(asset_id).await;
        let tables = self.shared.tables.lock().await.clone();
        Ok(Box::new(MemoryTransaction::new(self.shared.clone(), tables, Some(guard))))
    }

    async fn snapshot(&self) -> LibraryResult<Box<dyn UnitOfWork>> {
        let tables = self.shared.tables.lock().await.clone();
        Ok(Box::new(MemoryTransaction::new(self.shared.clone(), tables, None)))
    }
}

struct Staged {
    tables: Tables,
    journal: Vec<StagedWrite>,
    committed: bool,
}

pub struct MemoryTransaction {
    shared: Arc<Shared>,
    staged: Mutex<Staged>,
    // None for read-only snapshots
    guard: Option<AssetLock>,
}

impl MemoryTransaction {
    fn new(shared: Arc<Shared>, tables: Tables, guard: Option<AssetLock>) -> Self {
        Self {
            shared,
            staged: Mutex::new(Staged { tables, journal: vec![], committed: false }),
            guard,
        }
    }

    fn is_read_only(&self) -> bool {
        self.guard.is_none()
    }

    pub(crate) async fn stage<F>(&self, write: F) -> LibraryResult<usize>
        where F: Fn(&mut Tables) -> LibraryResult<usize> + Send + Sync + 'static {
        if self.is_read_only() {
            return Err(LibraryError::validation("cannot write through a read-only snapshot", None));
        }
        let mut staged = self.staged.lock().await;
        if staged.committed {
            return Err(LibraryError::validation("unit of work already committed", None));
        }
        let write: StagedWrite = Arc::new(write);
        let res = (write.as_ref())(&mut staged.tables)?;
        staged.journal.push(write);
        Ok(res)
    }

    pub(crate) async fn read<T, F>(&self, read: F) -> T
        where F: FnOnce(&Tables) -> T + Send, T: Send {
        let staged = self.staged.lock().await;
        read(&staged.tables)
    }
}

#[async_trait]
impl UnitOfWork for MemoryTransaction {
    fn assets(&self) -> &dyn AssetRepository {
        self
    }

    fn cards(&self) -> &dyn CardRepository {
        self
    }

    fn patrons(&self) -> &dyn PatronRepository {
        self
    }

    fn checkouts(&self) -> &dyn CheckoutRepository {
        self
    }

    fn histories(&self) -> &dyn CheckoutHistoryRepository {
        self
    }

    fn holds(&self) -> &dyn HoldRepository {
        self
    }

    async fn commit(&self) -> LibraryResult<()> {
        if self.is_read_only() {
            return Err(LibraryError::validation("cannot commit a read-only snapshot", None));
        }
        let mut staged = self.staged.lock().await;
        if staged.committed {
            return Err(LibraryError::validation("unit of work already committed", None));
        }
        if self.shared.take_injected_failure() {
            return Err(LibraryError::database("memory store commit failed", Some("503".to_string()), true));
        }
        let mut tables = self.shared.tables.lock().await;
        let mut next = tables.clone();
        for write in staged.journal.iter() {
            (write.as_ref())(&mut next)?;
        }
        *tables = next;
        staged.journal.clear();
        staged.committed = true;
        Ok(())
    }
}

pub(crate) fn insert_row<E: Identifiable + Clone>(rows: &mut Vec<E>, entity: &E, kind: &str) -> LibraryResult<usize> {
    if rows.iter().any(|row| row.id() == entity.id()) {
        return Err(LibraryError::duplicate_key(format!("{} {} already exists", kind, entity.id()).as_str()));
    }
    rows.push(entity.clone());
    Ok(1)
}

pub(crate) fn replace_row<E: Identifiable + Clone>(rows: &mut [E], entity: &E, kind: &str) -> LibraryResult<usize> {
    if let Some(existing) = rows.iter_mut().find(|row| row.id() == entity.id()) {
        if existing.version() != entity.version() {
            return Err(LibraryError::version_conflict(format!("{} {} is at version {} not {}",
                                                              kind, entity.id(), existing.version(), entity.version()).as_str()));
        }
        let mut next = entity.clone();
        next.set_version(entity.version() + 1);
        *existing = next;
        Ok(1)
    } else {
        Err(LibraryError::not_found(format!("{} not found for {}", kind, entity.id()).as_str()))
    }
}

pub(crate) fn remove_row<E: Identifiable>(rows: &mut Vec<E>, id: &str) -> usize {
    let before = rows.len();
    rows.retain(|row| row.id() != id);
    before - rows.len()
}

pub(crate) fn find_row<E: Identifiable + Clone>(rows: &[E], id: &str, kind: &str) -> LibraryResult<E> {
    rows.iter()
        .find(|row| row.id() == id)
        .cloned()
        .ok_or_else(|| LibraryError::not_found(format!("{} not found for {}", kind, id).as_str()))
}

// Predicate keys are serialized field names. Strings compare as-is, null
// matches an empty value and other scalars compare by their JSON text.
fn matches_predicate<E: Serialize>(row: &E, predicate: &HashMap<String, String>) -> LibraryResult<bool> {
    let value = serde_json::to_value(row)?;
    Ok(predicate.iter().all(|(k, v)| match value.get(k) {
        Some(Value::String(s)) => s == v,
        Some(Value::Null) => v.is_empty(),
        Some(other) => other.to_string() == *v,
        None => false,
    }))
}

pub(crate) fn query_rows<E: Serialize + Clone>(rows: &[E], predicate: &HashMap<String, String>,
                                               page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<E>> {
    let offset = match page {
        Some(token) => token.parse::<usize>().map_err(|_| LibraryError::validation(
            format!("invalid page token {}", token).as_str(), Some("400".to_string())))?,
        None => 0,
    };
    let limit = cmp::min(cmp::max(page_size, 1), MAX_PAGE_SIZE);
    let mut matched = vec![];
    for row in rows {
        if matches_predicate(row, predicate)? {
            matched.push(row);
        }
    }
    let records: Vec<E> = matched.iter().skip(offset).take(limit).map(|row| (*row).clone()).collect();
    let consumed = offset + records.len();
    let next_page = if consumed < matched.len() { Some(consumed.to_string()) } else { None };
    Ok(PaginatedResult::new(page, page_size, next_page, records))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;
    use crate::assets::domain::model::AssetEntity;
    use crate::core::library::{AssetStatus, LibraryError};
    use crate::core::repository::{PersistenceGateway, Repository};
    use crate::utils::memory::{query_rows, MemoryStore};

    #[tokio::test]
    async fn test_should_commit_staged_writes() {
        let store = MemoryStore::new();
        let asset = AssetEntity::new("title", 1);
        let uow = store.begin(asset.asset_id.as_str()).await.expect("should begin");
        uow.assets().create(&asset).await.expect("should create asset");
        // staged writes are visible inside the unit of work only
        let _ = uow.assets().get(asset.asset_id.as_str()).await.expect("should read staged asset");
        let before = store.snapshot().await.expect("should open snapshot");
        assert!(before.assets().get(asset.asset_id.as_str()).await.is_err());
        uow.commit().await.expect("should commit");
        drop(uow);

        let after = store.snapshot().await.expect("should open snapshot");
        let loaded = after.assets().get(asset.asset_id.as_str()).await.expect("should load asset");
        assert_eq!(asset, loaded);
    }

    #[tokio::test]
    async fn test_should_discard_writes_on_drop() {
        let store = MemoryStore::new();
        let asset = AssetEntity::new("title", 1);
        {
            let uow = store.begin(asset.asset_id.as_str()).await.expect("should begin");
            uow.assets().create(&asset).await.expect("should create asset");
        }
        let view = store.snapshot().await.expect("should open snapshot");
        assert!(matches!(view.assets().get(asset.asset_id.as_str()).await, Err(LibraryError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_should_leave_nothing_applied_on_failed_commit() {
        let store = MemoryStore::new();
        let asset = AssetEntity::new("title", 1);
        store.fail_next_commits(1);
        let uow = store.begin(asset.asset_id.as_str()).await.expect("should begin");
        uow.assets().create(&asset).await.expect("should create asset");
        let err = uow.commit().await.expect_err("should fail commit");
        assert!(err.retryable());
        drop(uow);

        let view = store.snapshot().await.expect("should open snapshot");
        assert!(view.assets().get(asset.asset_id.as_str()).await.is_err());
    }

    #[tokio::test]
    async fn test_should_reject_writes_on_snapshot() {
        let store = MemoryStore::new();
        let view = store.snapshot().await.expect("should open snapshot");
        assert!(view.assets().create(&AssetEntity::new("title", 1)).await.is_err());
        assert!(view.commit().await.is_err());
    }

    #[tokio::test]
    async fn test_should_reject_stale_update() {
        let store = MemoryStore::new();
        let mut asset = AssetEntity::new("title", 1);
        let uow = store.begin(asset.asset_id.as_str()).await.expect("should begin");
        uow.assets().create(&asset).await.expect("should create asset");
        asset.asset_status = AssetStatus::Lost;
        uow.assets().update(&asset).await.expect("should update asset");
        let res = uow.assets().update(&asset).await;
        assert!(matches!(res, Err(LibraryError::VersionConflict { .. })));
        let loaded = uow.assets().get(asset.asset_id.as_str()).await.expect("should load asset");
        assert_eq!(1, loaded.version);
    }

    #[tokio::test]
    async fn test_should_serialize_units_of_work_per_asset() {
        let store = MemoryStore::new();
        let first = store.begin("asset1").await.expect("should begin");
        let other = store.begin("asset2").await;
        assert!(other.is_ok());

        let contender = store.clone();
        let waiting = tokio::spawn(async move {
            contender.begin("asset1").await.map(|_| ())
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiting.is_finished());
        drop(first);
        waiting.await.expect("should join").expect("should begin after release");
    }

    #[tokio::test]
    async fn test_should_forget_asset_locks_once_released() {
        let store = MemoryStore::new();
        for i in 0..1000 {
            let asset_id = format!("missing{}", i);
            let uow = store.begin(asset_id.as_str()).await.expect("should begin");
            assert!(uow.assets().get(asset_id.as_str()).await.is_err());
        }
        assert_eq!(0, store.shared.lock_table().len());

        let first = store.begin("asset1").await.expect("should begin");
        let contender = store.clone();
        let waiting = tokio::spawn(async move {
            contender.begin("asset1").await.map(|_| ())
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(first);
        // the waiter still needs the entry after the first holder lets go
        waiting.await.expect("should join").expect("should begin after release");
        assert_eq!(0, store.shared.lock_table().len());
    }

    #[tokio::test]
    async fn test_should_forget_asset_lock_when_wait_is_cancelled() {
        let store = MemoryStore::new();
        let first = store.begin("asset1").await.expect("should begin");
        let contender = store.clone();
        let waiting = tokio::spawn(async move {
            contender.begin("asset1").await.map(|_| ())
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        waiting.abort();
        assert!(waiting.await.is_err());
        drop(first);
        assert_eq!(0, store.shared.lock_table().len());
    }

    #[tokio::test]
    async fn test_should_page_through_query() {
        let rows: Vec<AssetEntity> = (0..5).map(|_| AssetEntity::new("title", 1)).collect();
        let predicate = HashMap::from([("title".to_string(), "title".to_string())]);
        let first = query_rows(&rows, &predicate, None, 2).expect("should query");
        assert_eq!(2, first.records.len());
        assert_eq!(Some("2".to_string()), first.next_page);
        let last = query_rows(&rows, &predicate, Some("4"), 2).expect("should query");
        assert_eq!(1, last.records.len());
        assert_eq!(None, last.next_page);
        let none = query_rows(&rows, &HashMap::from([("number_of_copies".to_string(), "2".to_string())]), None, 10)
            .expect("should query");
        assert!(none.records.is_empty());
    }
}
