use crate::model::{Atlas, Placement, Uv, UvBounds};
use serde::{Deserialize, Serialize};

/// Maps an item's original UVs into its rectangle on the atlas.
///
/// Packing space has its origin top-left with `y` down; UV space has its
/// origin bottom-left with `y` up. `flip_y` moves the rectangle to the
/// mirrored position without mirroring its content.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UvTransform {
    pub offset: Uv,
    pub scale: Uv,
    pub flip_y: f64,
    /// Normalized bounds of the item's original UVs.
    pub source: UvBounds,
}

impl UvTransform {
    pub fn for_placement<K>(atlas_width: u32, atlas_height: u32, placement: &Placement<'_, K>) -> Self {
        let aw = atlas_width as f64;
        let ah = atlas_height as f64;
        let offset = Uv::new(placement.x as f64 / aw, placement.y as f64 / ah);
        let scale = Uv::new(
            placement.item.width as f64 / aw,
            placement.item.height as f64 / ah,
        );
        let flip_y = (1.0 - offset.v) - (offset.v + scale.v);
        Self {
            offset,
            scale,
            flip_y,
            source: placement.item.bounds_rel,
        }
    }

    /// `local * scale + offset + (0, flip_y)`, where `local` is `uv` relative
    /// to the source bounds (zero along a degenerate axis).
    pub fn apply(&self, uv: Uv) -> Uv {
        let local = |c: f64, min: f64, extent: f64| {
            if extent > 0.0 { (c - min) / extent } else { 0.0 }
        };
        let lu = local(uv.u, self.source.min.u, self.source.width());
        let lv = local(uv.v, self.source.min.v, self.source.height());
        Uv::new(
            lu * self.scale.u + self.offset.u,
            lv * self.scale.v + self.offset.v + self.flip_y,
        )
    }

    pub fn apply_all(&self, uvs: &mut [Uv]) {
        for uv in uvs.iter_mut() {
            *uv = self.apply(*uv);
        }
    }

    /// Rectangle the source bounds map to, in atlas UV space.
    pub fn target_bounds(&self) -> UvBounds {
        UvBounds {
            min: self.apply(self.source.min),
            max: self.apply(self.source.max),
        }
    }
}

/// UV transforms for every bound item, in frontier order.
pub fn rewrite<K: Clone>(atlas: &Atlas<K>) -> Vec<(K, UvTransform)> {
    atlas
        .placements()
        .map(|p| {
            (
                p.item.key.clone(),
                UvTransform::for_placement(atlas.width, atlas.height, &p),
            )
        })
        .collect()
}
