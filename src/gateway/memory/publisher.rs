use std::sync::{Arc, Mutex};
use async_trait::async_trait;
use crate::core::events::DomainEvent;
use crate::core::library::LibraryError;
use crate::gateway::events::EventPublisher;

// MemoryPublisher keeps published events in process. Clones share the same
// event list so a caller can hand one clone to the engine and inspect another.
#[derive(Debug, Clone, Default)]
pub struct MemoryPublisher {
    events: Arc<Mutex<Vec<DomainEvent>>>,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DomainEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.events().iter().map(|event| event.name.to_string()).collect()
    }
}

#[async_trait]
impl EventPublisher for MemoryPublisher {
    async fn publish(&self, event: &DomainEvent) -> Result<(), LibraryError> {
        let mut events = self.events.lock()
            .map_err(|err| LibraryError::runtime(format!("event list poisoned {}", err).as_str(), None))?;
        events.push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use crate::core::events::DomainEvent;
    use crate::gateway::events::EventPublisher;
    use crate::gateway::factory::create_publisher;
    use crate::gateway::GatewayPublisherVia;
    use crate::gateway::memory::publisher::MemoryPublisher;

    #[tokio::test]
    async fn test_should_collect_published_events() {
        let publisher = MemoryPublisher::new();
        let handle = publisher.clone();
        let event = DomainEvent::added("hold_placed", "circulation", "asset1", &HashMap::new(), &"card1").expect("build event");
        publisher.publish(&event).await.expect("should publish");
        assert_eq!(vec!["hold_placed".to_string()], handle.names());
        assert_eq!(event, handle.events()[0]);
    }

    #[tokio::test]
    async fn test_should_create_publishers() {
        let event = DomainEvent::added("asset_lost", "circulation", "asset1", &HashMap::new(), &"asset1").expect("build event");
        for via in [GatewayPublisherVia::Logs, GatewayPublisherVia::Memory] {
            let publisher = create_publisher(via);
            publisher.publish(&event).await.expect("should publish");
        }
    }
}
