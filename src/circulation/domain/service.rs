use std::collections::HashMap;
use std::sync::Arc;
use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime};
use tracing::{info, warn};
use crate::assets::domain::Asset;
use crate::assets::domain::model::AssetEntity;
use crate::checkout::domain::model::{CheckoutEntity, CheckoutHistoryEntity};
use crate::checkout::dto::{CheckoutDto, CheckoutHistoryDto};
use crate::circulation::domain::{CheckinOutcome, CheckoutOutcome, CirculationService};
use crate::core::clock::Clock;
use crate::core::domain::Configuration;
use crate::core::events::DomainEvent;
use crate::core::library::{AssetStatus, LibraryError, LibraryResult, PaginatedResult};
use crate::core::repository::{PersistenceGateway, Repository, UnitOfWork};
use crate::gateway::events::EventPublisher;
use crate::hold::domain::into_queue_order;
use crate::hold::domain::model::HoldEntity;
use crate::hold::dto::HoldDto;
use crate::patrons::domain::Patron;

const EVENT_GROUP: &str = "circulation";

pub(crate) struct CirculationServiceImpl {
    branch_id: String,
    loan_period: Duration,
    gateway: Arc<dyn PersistenceGateway>,
    clock: Arc<dyn Clock>,
    events_publisher: Box<dyn EventPublisher>,
}

impl CirculationServiceImpl {
    pub(crate) fn new(config: &Configuration, gateway: Arc<dyn PersistenceGateway>,
                      clock: Arc<dyn Clock>, events_publisher: Box<dyn EventPublisher>) -> LibraryResult<Self> {
        Ok(Self {
            branch_id: config.branch_id.to_string(),
            loan_period: config.loan_period()?,
            gateway,
            clock,
            events_publisher,
        })
    }

    // status, checkout and history row for a new loan, all staged in the caller's unit of work
    async fn issue(&self, uow: &dyn UnitOfWork, asset: &AssetEntity, card_id: &str,
                   now: NaiveDateTime) -> LibraryResult<CheckoutEntity> {
        save_status(uow, asset, AssetStatus::CheckedOut, now).await?;
        let checkout = CheckoutEntity::new(self.branch_id.as_str(), asset.asset_id.as_str(),
                                           card_id, now, self.loan_period)?;
        uow.checkouts().create(&checkout).await?;
        uow.histories().create(&CheckoutHistoryEntity::opened(asset.asset_id.as_str(), card_id, now)).await?;
        Ok(checkout)
    }

    fn metadata(&self) -> HashMap<String, String> {
        HashMap::from([("branch_id".to_string(), self.branch_id.to_string())])
    }

    // runs after commit, a failed publish is logged and never undoes the operation
    async fn publish(&self, events: Vec<serde_json::Result<DomainEvent>>) {
        for event in events {
            let res = match event {
                Ok(event) => self.events_publisher.publish(&event).await,
                Err(err) => Err(LibraryError::from(err)),
            };
            if let Err(err) = res {
                warn!(error = %err, "failed to publish circulation event");
            }
        }
    }
}

async fn save_status(uow: &dyn UnitOfWork, asset: &AssetEntity, status: AssetStatus,
                     now: NaiveDateTime) -> LibraryResult<()> {
    let mut asset = asset.clone();
    asset.asset_status = status;
    asset.updated_at = now;
    uow.assets().update(&asset).await?;
    Ok(())
}

async fn active_checkout(uow: &dyn UnitOfWork, asset_id: &str) -> LibraryResult<Option<CheckoutEntity>> {
    let mut checkouts = uow.checkouts().find_by_asset(asset_id).await?;
    if checkouts.len() > 1 {
        return Err(LibraryError::invariant_violation(
            format!("asset {} has {} active checkouts", asset_id, checkouts.len()).as_str()));
    }
    Ok(checkouts.pop())
}

async fn open_history(uow: &dyn UnitOfWork, asset_id: &str) -> LibraryResult<Option<CheckoutHistoryEntity>> {
    let mut open = uow.histories().find_open(asset_id).await?;
    if open.len() > 1 {
        return Err(LibraryError::invariant_violation(
            format!("asset {} has {} open checkout history rows", asset_id, open.len()).as_str()));
    }
    Ok(open.pop())
}

async fn patron_name(uow: &dyn UnitOfWork, card_id: &str) -> LibraryResult<String> {
    let patron = uow.patrons().find_by_card(card_id).await?;
    Ok(patron.full_name())
}

#[async_trait]
impl CirculationService for CirculationServiceImpl {
    async fn check_out(&self, asset_id: &str, card_id: &str) -> LibraryResult<CheckoutOutcome> {
        let now = self.clock.now();
        let uow = self.gateway.begin(asset_id).await?;
        let asset = uow.assets().get(asset_id).await?;
        let _ = uow.cards().get(card_id).await?;
        let checkout = active_checkout(uow.as_ref(), asset_id).await?;
        let history = open_history(uow.as_ref(), asset_id).await?;
        if let Some(existing) = checkout {
            warn!(asset_id, card_id, borrower = existing.card_id.as_str(), "asset is already checked out");
            return Ok(CheckoutOutcome::AlreadyCheckedOut);
        }
        if let Some(history) = history {
            return Err(LibraryError::invariant_violation(
                format!("asset {} has open history {} without an active checkout",
                        asset_id, history.history_id).as_str()));
        }

        let checkout = self.issue(uow.as_ref(), &asset, card_id, now).await?;
        uow.commit().await?;
        info!(asset_id, card_id, checkout_id = checkout.checkout_id.as_str(), "asset checked out");

        let checkout = CheckoutDto::from(&checkout);
        self.publish(vec![DomainEvent::added(
            "asset_checked_out", EVENT_GROUP, asset_id, &self.metadata(), &checkout)]).await;
        Ok(CheckoutOutcome::CheckedOut(checkout))
    }

    async fn check_in(&self, asset_id: &str, card_id: Option<&str>) -> LibraryResult<CheckinOutcome> {
        let now = self.clock.now();
        let uow = self.gateway.begin(asset_id).await?;
        let asset = uow.assets().get(asset_id).await?;
        let checkout = active_checkout(uow.as_ref(), asset_id).await?;
        let history = open_history(uow.as_ref(), asset_id).await?;

        if let (Some(card_id), Some(checkout)) = (card_id, &checkout) {
            if checkout.card_id != card_id {
                warn!(asset_id, card_id, borrower = checkout.card_id.as_str(),
                    "asset returned with a card other than the borrower's");
            }
        }
        if let Some(checkout) = &checkout {
            uow.checkouts().delete(checkout.checkout_id.as_str()).await?;
        }
        let closed = match history {
            Some(mut history) => {
                history.close(now);
                uow.histories().update(&history).await?;
                Some(CheckoutHistoryDto::from(&history))
            }
            None => None,
        };

        let queue = into_queue_order(uow.holds().find_by_asset(asset_id).await?);
        let outcome = match queue.into_iter().next() {
            Some(hold) => {
                uow.holds().delete(hold.hold_id.as_str()).await?;
                let issued = self.issue(uow.as_ref(), &asset, hold.card_id.as_str(), now).await?;
                CheckinOutcome::HoldFulfilled {
                    hold: HoldDto::from(&hold),
                    checkout: CheckoutDto::from(&issued),
                }
            }
            None => {
                save_status(uow.as_ref(), &asset, AssetStatus::Available, now).await?;
                CheckinOutcome::Returned
            }
        };
        uow.commit().await?;
        info!(asset_id, card_id = card_id.unwrap_or_default(), "asset checked in");

        let mut events = vec![DomainEvent::deleted(
            "asset_checked_in", EVENT_GROUP, asset_id, &self.metadata(), &closed)];
        if let CheckinOutcome::HoldFulfilled { hold, checkout } = &outcome {
            info!(asset_id, hold_id = hold.hold_id.as_str(), card_id = hold.card_id.as_str(),
                "returned asset issued to the earliest hold");
            events.push(DomainEvent::deleted("hold_fulfilled", EVENT_GROUP, asset_id, &self.metadata(), hold));
            events.push(DomainEvent::added("asset_checked_out", EVENT_GROUP, asset_id, &self.metadata(), checkout));
        }
        self.publish(events).await;
        Ok(outcome)
    }

    async fn place_hold(&self, asset_id: &str, card_id: &str) -> LibraryResult<HoldDto> {
        let now = self.clock.now();
        let uow = self.gateway.begin(asset_id).await?;
        let asset = uow.assets().get(asset_id).await?;
        let _ = uow.cards().get(card_id).await?;
        if asset.status() == AssetStatus::Available {
            save_status(uow.as_ref(), &asset, AssetStatus::OnHold, now).await?;
        }
        let hold = HoldEntity::new(asset_id, card_id, now);
        uow.holds().create(&hold).await?;
        uow.commit().await?;
        info!(asset_id, card_id, hold_id = hold.hold_id.as_str(), "hold placed");

        let hold = HoldDto::from(&hold);
        self.publish(vec![DomainEvent::added("hold_placed", EVENT_GROUP, asset_id, &self.metadata(), &hold)]).await;
        Ok(hold)
    }

    async fn mark_lost(&self, asset_id: &str) -> LibraryResult<()> {
        let now = self.clock.now();
        let uow = self.gateway.begin(asset_id).await?;
        let asset = uow.assets().get(asset_id).await?;
        // the open loan stays in place until the asset is found or checked in
        let checkout = active_checkout(uow.as_ref(), asset_id).await?;
        save_status(uow.as_ref(), &asset, AssetStatus::Lost, now).await?;
        uow.commit().await?;
        match checkout {
            Some(checkout) => {
                warn!(asset_id, card_id = checkout.card_id.as_str(),
                    checkout_id = checkout.checkout_id.as_str(), "asset marked lost with an open checkout");
            }
            None => {
                info!(asset_id, previous_status = %asset.status(), "asset marked lost");
            }
        }

        self.publish(vec![DomainEvent::updated(
            "asset_lost", EVENT_GROUP, asset_id, &self.metadata(), &AssetStatus::Lost)]).await;
        Ok(())
    }

    async fn mark_found(&self, asset_id: &str) -> LibraryResult<()> {
        let now = self.clock.now();
        let uow = self.gateway.begin(asset_id).await?;
        let asset = uow.assets().get(asset_id).await?;
        let checkout = active_checkout(uow.as_ref(), asset_id).await?;
        let history = open_history(uow.as_ref(), asset_id).await?;
        save_status(uow.as_ref(), &asset, AssetStatus::Available, now).await?;
        if let Some(checkout) = &checkout {
            uow.checkouts().delete(checkout.checkout_id.as_str()).await?;
        }
        if let Some(mut history) = history {
            history.close(now);
            uow.histories().update(&history).await?;
        }
        uow.commit().await?;
        info!(asset_id, previous_status = %asset.status(), closed_checkout = checkout.is_some(), "asset marked found");

        self.publish(vec![DomainEvent::updated(
            "asset_found", EVENT_GROUP, asset_id, &self.metadata(), &AssetStatus::Available)]).await;
        Ok(())
    }

    async fn is_checked_out(&self, asset_id: &str) -> LibraryResult<bool> {
        let view = self.gateway.snapshot().await?;
        let _ = view.assets().get(asset_id).await?;
        Ok(active_checkout(view.as_ref(), asset_id).await?.is_some())
    }

    async fn get_available_copies(&self, asset_id: &str) -> LibraryResult<i64> {
        let view = self.gateway.snapshot().await?;
        let asset = view.assets().get(asset_id).await?;
        let checked_out = if asset.status() == AssetStatus::CheckedOut {
            view.checkouts().find_by_asset(asset_id).await?.len() as i64
        } else {
            0
        };
        Ok(asset.number_of_copies() - checked_out)
    }

    async fn get_number_of_copies(&self, asset_id: &str) -> LibraryResult<i64> {
        let view = self.gateway.snapshot().await?;
        let asset = view.assets().get(asset_id).await?;
        Ok(asset.number_of_copies())
    }

    async fn get_latest_checkout(&self, asset_id: &str) -> LibraryResult<Option<CheckoutDto>> {
        let view = self.gateway.snapshot().await?;
        let _ = view.assets().get(asset_id).await?;
        let checkouts = view.checkouts().find_by_asset(asset_id).await?;
        Ok(checkouts.iter().max_by_key(|checkout| checkout.since).map(CheckoutDto::from))
    }

    async fn get_checkout_history(&self, asset_id: &str) -> LibraryResult<Vec<CheckoutHistoryDto>> {
        let view = self.gateway.snapshot().await?;
        let _ = view.assets().get(asset_id).await?;
        let mut history = view.histories().find_by_asset(asset_id).await?;
        history.sort_by_key(|row| row.checked_out);
        Ok(history.iter().map(CheckoutHistoryDto::from).collect())
    }

    async fn get_current_holds(&self, asset_id: &str) -> LibraryResult<Vec<HoldDto>> {
        let view = self.gateway.snapshot().await?;
        let _ = view.assets().get(asset_id).await?;
        let queue = into_queue_order(view.holds().find_by_asset(asset_id).await?);
        Ok(queue.iter().map(HoldDto::from).collect())
    }

    async fn get_current_patron(&self, asset_id: &str) -> LibraryResult<Option<String>> {
        let view = self.gateway.snapshot().await?;
        let _ = view.assets().get(asset_id).await?;
        match active_checkout(view.as_ref(), asset_id).await? {
            Some(checkout) => Ok(Some(patron_name(view.as_ref(), checkout.card_id.as_str()).await?)),
            None => Ok(None),
        }
    }

    async fn get_current_hold_patron_name(&self, hold_id: &str) -> LibraryResult<String> {
        let view = self.gateway.snapshot().await?;
        let hold = view.holds().get(hold_id).await?;
        patron_name(view.as_ref(), hold.card_id.as_str()).await
    }

    async fn get_current_hold_placed(&self, hold_id: &str) -> LibraryResult<NaiveDateTime> {
        let view = self.gateway.snapshot().await?;
        Ok(view.holds().get(hold_id).await?.hold_placed)
    }

    async fn get_checkout(&self, checkout_id: &str) -> LibraryResult<CheckoutDto> {
        let view = self.gateway.snapshot().await?;
        let checkout = view.checkouts().get(checkout_id).await?;
        Ok(CheckoutDto::from(&checkout))
    }

    async fn list_checkouts(&self, page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<CheckoutDto>> {
        let view = self.gateway.snapshot().await?;
        let res = view.checkouts().query(&HashMap::new(), page, page_size).await?;
        let records = res.records.iter().map(CheckoutDto::from).collect();
        Ok(PaginatedResult::new(page, page_size, res.next_page, records))
    }
}
