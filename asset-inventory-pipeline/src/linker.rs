//! Relationship linker.
//!
//! Collectors fold every document into an `AssetLinker`. Looking up an EAN
//! either returns the asset already collected for it or creates a stub for an
//! entity that has only been referenced so far (a node seen through one of its
//! pods, a container seen through one of its services). Edges are appended
//! without duplicates, so folding the same documents again changes nothing.

use std::collections::HashMap;

use asset_inventory_shared::{Asset, Ean};

/// Ordered, EAN-keyed collection of the assets derived by one collector.
///
/// Assets keep the order in which their EAN was first seen.
#[derive(Debug, Default)]
pub struct AssetLinker {
    assets: Vec<Asset>,
    positions: HashMap<Ean, usize>,
}

impl AssetLinker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the asset for `ean`, creating it with `create` if it has not been seen.
    ///
    /// `create` must build an asset whose EAN is `ean`.
    pub fn find_or_create<F>(&mut self, ean: &Ean, create: F) -> &mut Asset
    where
        F: FnOnce() -> Asset,
    {
        let position = match self.positions.get(ean) {
            Some(position) => *position,
            None => {
                let asset = create();
                debug_assert_eq!(&asset.ean, ean);
                self.assets.push(asset);
                let position = self.assets.len() - 1;
                self.positions.insert(ean.clone(), position);
                position
            }
        };

        &mut self.assets[position]
    }

    /// Consume the linker, yielding assets in first-seen order.
    pub fn into_assets(self) -> Vec<Asset> {
        self.assets
    }
}
