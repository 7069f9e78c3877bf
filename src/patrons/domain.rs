use crate::core::domain::Identifiable;

pub mod model;

pub trait Patron: Identifiable {
    fn card_id(&self) -> String;
    fn full_name(&self) -> String;
}
