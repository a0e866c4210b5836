use crate::error::{AtlasError, Result};
use crate::model::{Item, PixelBounds, Uv, UvBounds};
use serde::{Deserialize, Serialize};
use tracing::instrument;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Something that can be packed: a key, the UV points of its mesh and the
/// pixel size of the image those UVs refer to.
pub trait TextureSource {
    type Key: Clone + ToString;

    fn key(&self) -> Self::Key;
    fn uvs(&self) -> &[Uv];
    /// `None` when the mesh has no image assigned.
    fn image_size(&self) -> Option<(u32, u32)>;
}

/// Plain in-memory texture source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TexturedMesh<K = String> {
    pub key: K,
    pub uvs: Vec<Uv>,
    #[serde(default)]
    pub image_size: Option<(u32, u32)>,
}

impl<K> TexturedMesh<K> {
    pub fn new(key: K, uvs: Vec<Uv>, image_size: (u32, u32)) -> Self {
        Self {
            key,
            uvs,
            image_size: Some(image_size),
        }
    }

    /// A mesh whose UVs cover the full image.
    pub fn full_image(key: K, width: u32, height: u32) -> Self {
        Self::new(
            key,
            vec![
                Uv::new(0.0, 0.0),
                Uv::new(1.0, 0.0),
                Uv::new(1.0, 1.0),
                Uv::new(0.0, 1.0),
            ],
            (width, height),
        )
    }
}

impl<K: Clone + ToString> TextureSource for TexturedMesh<K> {
    type Key = K;

    fn key(&self) -> K {
        self.key.clone()
    }
    fn uvs(&self) -> &[Uv] {
        &self.uvs
    }
    fn image_size(&self) -> Option<(u32, u32)> {
        self.image_size
    }
}

/// Bounds a source must meet to be extracted by [`extract_all`] and packed.
/// With the `parallel` feature the source is shared across rayon workers, so
/// it must be `Sync` and its key `Send`.
#[cfg(feature = "parallel")]
pub trait PackSource: TextureSource<Key: Send> + Sync {}
#[cfg(feature = "parallel")]
impl<T> PackSource for T where T: TextureSource<Key: Send> + Sync {}

#[cfg(not(feature = "parallel"))]
pub trait PackSource: TextureSource {}
#[cfg(not(feature = "parallel"))]
impl<T: TextureSource> PackSource for T {}

/// Computes the bounding box of `source`'s UV footprint in normalized and
/// pixel space. Pixel coordinates are `uv * image_size * output_scale`,
/// truncated toward zero.
pub fn extract<S: TextureSource + ?Sized>(source: &S, output_scale: f64) -> Result<Item<S::Key>> {
    let uvs = source.uvs();
    let Some((first, rest)) = uvs.split_first() else {
        return Err(AtlasError::MissingUvs {
            key: source.key().to_string(),
        });
    };
    let (img_w, img_h) = match source.image_size() {
        Some((w, h)) if w > 0 && h > 0 => (w, h),
        _ => {
            return Err(AtlasError::MissingImage {
                key: source.key().to_string(),
            });
        }
    };

    let mut min = *first;
    let mut max = *first;
    for uv in std::iter::once(first).chain(rest) {
        if !uv.u.is_finite() || !uv.v.is_finite() {
            return Err(AtlasError::InvalidInput(format!(
                "item `{}` has a non-finite UV ({}, {})",
                source.key().to_string(),
                uv.u,
                uv.v
            )));
        }
        // pixel and normalized bounds must describe the same region
        if !(0.0..=1.0).contains(&uv.u) || !(0.0..=1.0).contains(&uv.v) {
            return Err(AtlasError::InvalidInput(format!(
                "item `{}` has a UV outside [0, 1] ({}, {})",
                source.key().to_string(),
                uv.u,
                uv.v
            )));
        }
        min.u = min.u.min(uv.u);
        min.v = min.v.min(uv.v);
        max.u = max.u.max(uv.u);
        max.v = max.v.max(uv.v);
    }

    let to_px = |c: f64, size: u32| (size as f64 * c * output_scale) as u32;
    let bounds_px = PixelBounds {
        left: to_px(min.u, img_w),
        top: to_px(min.v, img_h),
        right: to_px(max.u, img_w),
        bottom: to_px(max.v, img_h),
    };

    Ok(Item {
        key: source.key(),
        width: bounds_px.width(),
        height: bounds_px.height(),
        bounds_px,
        bounds_rel: UvBounds { min, max },
    })
}

/// Extracts every source and orders the items for packing: descending by
/// `area + width^3 + height^3`, ties in input order.
#[instrument(skip_all, fields(count = sources.len(), output_scale = output_scale))]
pub fn extract_all<S: PackSource>(sources: &[S], output_scale: f64) -> Result<Vec<Item<S::Key>>> {
    #[cfg(feature = "parallel")]
    let mut items = sources
        .par_iter()
        .map(|s| extract(s, output_scale))
        .collect::<Result<Vec<_>>>()?;
    #[cfg(not(feature = "parallel"))]
    let mut items = sources
        .iter()
        .map(|s| extract(s, output_scale))
        .collect::<Result<Vec<_>>>()?;

    // stable: equal weights keep input order
    items.sort_by(|a, b| b.packing_weight().cmp(&a.packing_weight()));
    Ok(items)
}
