//! Core library for packing cut-out sprite textures into a shared atlas.
//!
//! - Extraction: each mesh's UV footprint becomes a pixel-sized item (`extent`)
//! - Packing: greedy slot placement on a canvas that grows, and shrinks the items when it cannot grow any more (`packer`)
//! - UV rewrite: per-item offset/scale/flip mapping old UVs into the atlas (`uv`)
//! - Data model is serde-serializable; layout and DragonBones exporters live in `export`.
//!
//! Quick example:
//! ```ignore
//! use coa_atlas_core::prelude::*;
//! # fn main() -> Result<(), AtlasError> {
//! let sources = vec![
//!     TexturedMesh::full_image("head".to_string(), 120, 140),
//!     TexturedMesh::full_image("torso".to_string(), 200, 260),
//! ];
//! let cfg = AtlasConfig::builder().with_max_dimensions(1024, 1024).build();
//! let atlas = pack(&sources, &cfg)?;
//! for (key, t) in rewrite(&atlas) {
//!     println!("{key}: offset {:?} scale {:?}", t.offset, t.scale);
//! }
//! # Ok(()) }
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod extent;
pub mod geometry;
pub mod model;
pub mod packer;
pub mod slots;
pub mod uv;

pub use config::*;
pub use error::*;
pub use export::*;
pub use extent::*;
pub use model::*;
pub use packer::*;
pub use uv::*;

/// Convenience prelude for common types and functions.
/// Importing `coa_atlas_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::config::{AtlasConfig, AtlasConfigBuilder};
    pub use crate::error::AtlasError;
    pub use crate::extent::{PackSource, TextureSource, TexturedMesh, extract, extract_all};
    pub use crate::model::{Atlas, Item, PackStats, PixelBounds, Slot, Uv, UvBounds};
    pub use crate::packer::{pack, pack_items};
    pub use crate::uv::{UvTransform, rewrite};
    pub use crate::{to_dragonbones_json, to_layout_json};
}
