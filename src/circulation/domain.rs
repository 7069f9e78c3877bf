use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use crate::checkout::dto::{CheckoutDto, CheckoutHistoryDto};
use crate::core::library::{LibraryResult, PaginatedResult};
use crate::hold::dto::HoldDto;

pub mod service;

// CheckoutOutcome tells a caller whether a checkout wrote anything.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub enum CheckoutOutcome {
    CheckedOut(CheckoutDto),
    AlreadyCheckedOut,
}

// CheckinOutcome tells a caller where a returned asset went.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub enum CheckinOutcome {
    Returned,
    HoldFulfilled {
        hold: HoldDto,
        checkout: CheckoutDto,
    },
}

/// Lifecycle operations and read queries for circulating assets.
///
/// Each mutating operation runs as a single unit of work. Implementations rely on
/// the persistence gateway to serialize units of work per asset id.
#[async_trait]
pub trait CirculationService: Sync + Send {
    async fn check_out(&self, asset_id: &str, card_id: &str) -> LibraryResult<CheckoutOutcome>;

    // card_id is only compared against the borrower for auditing
    async fn check_in(&self, asset_id: &str, card_id: Option<&str>) -> LibraryResult<CheckinOutcome>;

    async fn place_hold(&self, asset_id: &str, card_id: &str) -> LibraryResult<HoldDto>;

    async fn mark_lost(&self, asset_id: &str) -> LibraryResult<()>;

    async fn mark_found(&self, asset_id: &str) -> LibraryResult<()>;

    async fn is_checked_out(&self, asset_id: &str) -> LibraryResult<bool>;

    async fn get_available_copies(&self, asset_id: &str) -> LibraryResult<i64>;

    async fn get_number_of_copies(&self, asset_id: &str) -> LibraryResult<i64>;

    async fn get_latest_checkout(&self, asset_id: &str) -> LibraryResult<Option<CheckoutDto>>;

    async fn get_checkout_history(&self, asset_id: &str) -> LibraryResult<Vec<CheckoutHistoryDto>>;

    async fn get_current_holds(&self, asset_id: &str) -> LibraryResult<Vec<HoldDto>>;

    async fn get_current_patron(&self, asset_id: &str) -> LibraryResult<Option<String>>;

    async fn get_current_hold_patron_name(&self, hold_id: &str) -> LibraryResult<String>;

    async fn get_current_hold_placed(&self, hold_id: &str) -> LibraryResult<NaiveDateTime>;

    async fn get_checkout(&self, checkout_id: &str) -> LibraryResult<CheckoutDto>;

    async fn list_checkouts(&self, page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<CheckoutDto>>;
}
