use crate::hold::domain::model::HoldEntity;

pub mod model;

// Orders holds first by placement time; equal timestamps keep the order the
// holds were enumerated in, which is insertion order for the gateway.
pub fn into_queue_order(mut holds: Vec<HoldEntity>) -> Vec<HoldEntity> {
    holds.sort_by_key(|hold| hold.hold_placed);
    holds
}
