use std::sync::Arc;
use tracing::info;
use lms::assets::domain::model::AssetEntity;
use lms::circulation::command::checkin_asset_cmd::{CheckinAssetCommand, CheckinAssetCommandRequest};
use lms::circulation::command::checkout_asset_cmd::{CheckoutAssetCommand, CheckoutAssetCommandRequest};
use lms::circulation::command::place_hold_cmd::{PlaceHoldCommand, PlaceHoldCommandRequest};
use lms::circulation::domain::CirculationService;
use lms::circulation::factory::create_circulation_service;
use lms::core::command::Command;
use lms::core::domain::Configuration;
use lms::core::library::LibraryResult;
use lms::core::repository::{PersistenceGateway, Repository};
use lms::gateway::GatewayPublisherVia;
use lms::patrons::domain::model::{LibraryCardEntity, PatronEntity};
use lms::utils::logs::setup_tracing;
use lms::utils::memory::MemoryStore;

// seeds one single-copy asset and two patrons, returns (asset id, holder card, borrower card)
async fn seed(store: &MemoryStore) -> LibraryResult<(String, String, String)> {
    let asset = AssetEntity::new("A Wizard of Earthsea", 1);
    let uow = store.begin(asset.asset_id.as_str()).await?;
    uow.assets().create(&asset).await?;
    let mut cards = vec![];
    for (first, last) in [("Ursula", "Le Guin"), ("Octavia", "Butler")] {
        let card = LibraryCardEntity::new();
        uow.cards().create(&card).await?;
        uow.patrons().create(&PatronEntity::new(card.card_id.as_str(), first, last)).await?;
        cards.push(card.card_id);
    }
    uow.commit().await?;
    let borrower = cards.pop().unwrap_or_default();
    let holder = cards.pop().unwrap_or_default();
    Ok((asset.asset_id, holder, borrower))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_tracing();

    let store = MemoryStore::new();
    let (asset_id, holder, borrower) = seed(&store).await?;
    let svc: Arc<dyn CirculationService> = Arc::from(create_circulation_service(
        &Configuration::new("main"), Arc::new(store), GatewayPublisherVia::Logs)?);

    let hold = PlaceHoldCommand::new(svc.clone())
        .execute(PlaceHoldCommandRequest::new(asset_id.as_str(), holder.as_str()))
        .await.map_err(|err| format!("{:?}", err))?;
    let holder_name = svc.get_current_hold_patron_name(hold.hold.hold_id.as_str()).await?;
    info!(hold_id = hold.hold.hold_id.as_str(), "hold queued for {}", holder_name);

    let checkout = CheckoutAssetCommand::new(svc.clone())
        .execute(CheckoutAssetCommandRequest::new(asset_id.as_str(), borrower.as_str()))
        .await.map_err(|err| format!("{:?}", err))?;
    let patron = svc.get_current_patron(asset_id.as_str()).await?;
    info!(already_checked_out = checkout.already_checked_out, "direct checkout to {:?}", patron);

    let checkin = CheckinAssetCommand::new(svc.clone())
        .execute(CheckinAssetCommandRequest::new(asset_id.as_str(), Some(borrower.as_str())))
        .await.map_err(|err| format!("{:?}", err))?;
    let outcome = serde_json::to_string(&checkin.outcome)?;
    let patron = svc.get_current_patron(asset_id.as_str()).await?;
    info!(outcome = outcome.as_str(), "checked in, now with {:?}", patron);

    let holds = svc.get_current_holds(asset_id.as_str()).await?.len();
    let available = svc.get_available_copies(asset_id.as_str()).await?;
    info!(holds, available, "circulation demo finished");
    Ok(())
}
