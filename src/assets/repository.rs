pub mod memory_asset_repository;

use crate::assets::domain::model::AssetEntity;
use crate::core::repository::Repository;

pub trait AssetRepository: Repository<AssetEntity> {}
