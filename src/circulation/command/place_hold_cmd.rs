use std::sync::Arc;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::circulation::domain::CirculationService;
use crate::core::command::{Command, CommandError};
use crate::hold::dto::HoldDto;

pub struct PlaceHoldCommand {
    circulation_service: Arc<dyn CirculationService>,
}

impl PlaceHoldCommand {
    pub fn new(circulation_service: Arc<dyn CirculationService>) -> Self {
        Self {
            circulation_service,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PlaceHoldCommandRequest {
    asset_id: String,
    card_id: String,
}

impl PlaceHoldCommandRequest {
    pub fn new(asset_id: &str, card_id: &str) -> Self {
        Self {
            asset_id: asset_id.to_string(),
            card_id: card_id.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlaceHoldCommandResponse {
    pub hold: HoldDto,
}

impl PlaceHoldCommandResponse {
    pub fn new(hold: HoldDto) -> Self {
        Self {
            hold,
        }
    }
}

#[async_trait]
impl Command<PlaceHoldCommandRequest, PlaceHoldCommandResponse> for PlaceHoldCommand {
    async fn execute(&self, req: PlaceHoldCommandRequest) -> Result<PlaceHoldCommandResponse, CommandError> {
        self.circulation_service.place_hold(req.asset_id.as_str(), req.card_id.as_str())
            .await.map_err(CommandError::from).map(PlaceHoldCommandResponse::new)
    }
}
