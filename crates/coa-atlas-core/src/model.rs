use serde::{Deserialize, Serialize};

/// Point in normalized texture space. Serialized as `[u, v]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Uv {
    pub u: f64,
    pub v: f64,
}

impl Uv {
    pub const fn new(u: f64, v: f64) -> Self {
        Self { u, v }
    }
}

impl From<[f64; 2]> for Uv {
    fn from([u, v]: [f64; 2]) -> Self {
        Self { u, v }
    }
}

impl From<Uv> for [f64; 2] {
    fn from(uv: Uv) -> Self {
        [uv.u, uv.v]
    }
}

/// Axis-aligned rectangle (pixels). `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Exclusive right edge (`x + w`).
    pub fn right(&self) -> u32 {
        self.x + self.w
    }
    /// Exclusive bottom edge (`y + h`).
    pub fn bottom(&self) -> u32 {
        self.y + self.h
    }
    /// True when the interiors overlap. Shared edges do not count.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// Pixel-space bounding box of an item's UV footprint, after output scale.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PixelBounds {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl PixelBounds {
    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }
    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }
}

/// Normalized bounding box of an item's UV footprint.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct UvBounds {
    pub min: Uv,
    pub max: Uv,
}

impl UvBounds {
    pub fn width(&self) -> f64 {
        self.max.u - self.min.u
    }
    pub fn height(&self) -> f64 {
        self.max.v - self.min.v
    }
}

/// One unit to pack: the visible UV footprint of a textured mesh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item<K = String> {
    /// Caller key identifying the owning object.
    pub key: K,
    pub bounds_px: PixelBounds,
    pub bounds_rel: UvBounds,
    /// Pixel width after output scale.
    pub width: u32,
    /// Pixel height after output scale.
    pub height: u32,
}

impl<K> Item<K> {
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Packing priority: `area + width^3 + height^3`. Larger goes first.
    pub fn packing_weight(&self) -> u128 {
        let w = self.width as u128;
        let h = self.height as u128;
        w * h + w.pow(3) + h.pow(3)
    }
}

/// Candidate placement origin on the canvas, open or bound to an item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot<K = String> {
    pub x: u32,
    pub y: u32,
    pub item: Option<Item<K>>,
}

impl<K> Slot<K> {
    pub fn open(x: u32, y: u32) -> Self {
        Self { x, y, item: None }
    }
    pub fn is_open(&self) -> bool {
        self.item.is_none()
    }
}

/// Final canvas state of a successful packing run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Atlas<K = String> {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub max_width: u32,
    pub max_height: u32,
    pub margin: u32,
    pub square: bool,
    /// Output scale the successful attempt ran at.
    pub output_scale: f64,
    /// Slots in frontier order (`y` ascending, then `x` descending).
    pub slots: Vec<Slot<K>>,
    /// Attempts discarded before the successful one.
    pub restarts: usize,
    /// Canvas doublings across all attempts.
    pub grows: usize,
    /// Output scale reductions across all attempts.
    pub rescales: usize,
}

/// An item together with the origin it was bound to.
#[derive(Debug, Clone, Copy)]
pub struct Placement<'a, K> {
    pub x: u32,
    pub y: u32,
    pub item: &'a Item<K>,
}

impl<K> Atlas<K> {
    /// Bound items in frontier order.
    pub fn placements(&self) -> impl Iterator<Item = Placement<'_, K>> {
        self.slots.iter().filter_map(|slot| {
            slot.item.as_ref().map(|item| Placement {
                x: slot.x,
                y: slot.y,
                item,
            })
        })
    }

    /// Number of bound items.
    pub fn len(&self) -> usize {
        self.placements().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Computes packing statistics for this atlas.
    pub fn stats(&self) -> PackStats {
        let canvas_area = self.width as u64 * self.height as u64;
        let mut num_items = 0;
        let mut used_area = 0u64;
        for p in self.placements() {
            num_items += 1;
            used_area += p.item.area();
        }
        let occupancy = if canvas_area > 0 {
            used_area as f64 / canvas_area as f64
        } else {
            0.0
        };
        PackStats {
            num_items,
            open_slots: self.slots.iter().filter(|s| s.is_open()).count(),
            width: self.width,
            height: self.height,
            canvas_area,
            used_area,
            occupancy,
            output_scale: self.output_scale,
            restarts: self.restarts,
            grows: self.grows,
            rescales: self.rescales,
        }
    }
}

/// Statistics about a packing run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PackStats {
    pub num_items: usize,
    /// Slots left unbound in the final frontier.
    pub open_slots: usize,
    pub width: u32,
    pub height: u32,
    pub canvas_area: u64,
    /// Sum of item areas (without margins).
    pub used_area: u64,
    /// used_area / canvas_area (0.0 to 1.0).
    pub occupancy: f64,
    pub output_scale: f64,
    pub restarts: usize,
    pub grows: usize,
    pub rescales: usize,
}

impl PackStats {
    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Items: {}, Canvas: {}x{}, Occupancy: {:.2}%, Used Area: {} px², Scale: {:.4}, Restarts: {} (grows: {}, rescales: {})",
            self.num_items,
            self.width,
            self.height,
            self.occupancy * 100.0,
            self.used_area,
            self.output_scale,
            self.restarts,
            self.grows,
            self.rescales,
        )
    }

    /// Returns wasted space in pixels.
    pub fn wasted_area(&self) -> u64 {
        self.canvas_area.saturating_sub(self.used_area)
    }

    /// Returns wasted space as a percentage (0.0 to 100.0).
    pub fn waste_percentage(&self) -> f64 {
        if self.canvas_area > 0 {
            (self.wasted_area() as f64 / self.canvas_area as f64) * 100.0
        } else {
            0.0
        }
    }
}
