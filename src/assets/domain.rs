use crate::core::domain::Identifiable;
use crate::core::library::AssetStatus;

pub mod model;

pub trait Asset: Identifiable {
    fn status(&self) -> AssetStatus;
    fn number_of_copies(&self) -> i64;
}
