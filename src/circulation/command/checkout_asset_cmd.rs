use std::sync::Arc;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::checkout::dto::CheckoutDto;
use crate::circulation::domain::{CheckoutOutcome, CirculationService};
use crate::core::command::{Command, CommandError};

pub struct CheckoutAssetCommand {
    circulation_service: Arc<dyn CirculationService>,
}

impl CheckoutAssetCommand {
    pub fn new(circulation_service: Arc<dyn CirculationService>) -> Self {
        Self {
            circulation_service,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CheckoutAssetCommandRequest {
    asset_id: String,
    card_id: String,
}

impl CheckoutAssetCommandRequest {
    pub fn new(asset_id: &str, card_id: &str) -> Self {
        Self {
            asset_id: asset_id.to_string(),
            card_id: card_id.to_string(),
        }
    }
}

// checkout is None when the asset was already checked out and nothing was written
#[derive(Debug, Serialize)]
pub struct CheckoutAssetCommandResponse {
    pub already_checked_out: bool,
    pub checkout: Option<CheckoutDto>,
}

impl From<CheckoutOutcome> for CheckoutAssetCommandResponse {
    fn from(outcome: CheckoutOutcome) -> Self {
        match outcome {
            CheckoutOutcome::CheckedOut(checkout) => Self { already_checked_out: false, checkout: Some(checkout) },
            CheckoutOutcome::AlreadyCheckedOut => Self { already_checked_out: true, checkout: None },
        }
    }
}

#[async_trait]
impl Command<CheckoutAssetCommandRequest, CheckoutAssetCommandResponse> for CheckoutAssetCommand {
    async fn execute(&self, req: CheckoutAssetCommandRequest) -> Result<CheckoutAssetCommandResponse, CommandError> {
        self.circulation_service.check_out(req.asset_id.as_str(), req.card_id.as_str())
            .await.map_err(CommandError::from).map(CheckoutAssetCommandResponse::from)
    }
}
