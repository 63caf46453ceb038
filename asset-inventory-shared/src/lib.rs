//! # Asset Inventory Shared
//!
//! Shared types for the asset inventory system: the derived `Asset` record,
//! its entity asset name (`Ean`) and the closed set of asset kinds.

mod asset;
mod ean;

pub use asset::{Asset, AssetAttributes, AssetKind};
pub use ean::Ean;
