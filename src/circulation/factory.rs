use std::sync::Arc;
use crate::circulation::domain::CirculationService;
use crate::circulation::domain::service::CirculationServiceImpl;
use crate::core::clock::SystemClock;
use crate::core::domain::Configuration;
use crate::core::library::LibraryResult;
use crate::core::repository::PersistenceGateway;
use crate::gateway::factory::create_publisher;
use crate::gateway::GatewayPublisherVia;

pub fn create_circulation_service(config: &Configuration, gateway: Arc<dyn PersistenceGateway>,
                                  via: GatewayPublisherVia) -> LibraryResult<Box<dyn CirculationService>> {
    let publisher = create_publisher(via);
    Ok(Box::new(CirculationServiceImpl::new(config, gateway, Arc::new(SystemClock), publisher)?))
}
