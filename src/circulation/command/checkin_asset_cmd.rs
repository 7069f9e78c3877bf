use std::sync::Arc;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::circulation::domain::{CheckinOutcome, CirculationService};
use crate::core::command::{Command, CommandError};

pub struct CheckinAssetCommand {
    circulation_service: Arc<dyn CirculationService>,
}

impl CheckinAssetCommand {
    pub fn new(circulation_service: Arc<dyn CirculationService>) -> Self {
        Self {
            circulation_service,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CheckinAssetCommandRequest {
    asset_id: String,
    #[serde(default)]
    card_id: Option<String>,
}

impl CheckinAssetCommandRequest {
    pub fn new(asset_id: &str, card_id: Option<&str>) -> Self {
        Self {
            asset_id: asset_id.to_string(),
            card_id: card_id.map(str::to_string),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CheckinAssetCommandResponse {
    pub outcome: CheckinOutcome,
}

impl CheckinAssetCommandResponse {
    pub fn new(outcome: CheckinOutcome) -> Self {
        Self {
            outcome,
        }
    }
}

#[async_trait]
impl Command<CheckinAssetCommandRequest, CheckinAssetCommandResponse> for CheckinAssetCommand {
    async fn execute(&self, req: CheckinAssetCommandRequest) -> Result<CheckinAssetCommandResponse, CommandError> {
        self.circulation_service.check_in(req.asset_id.as_str(), req.card_id.as_deref())
            .await.map_err(CommandError::from).map(CheckinAssetCommandResponse::new)
    }
}
