use crate::config::AtlasConfig;
use crate::error::{AtlasError, Result};
use crate::extent::{PackSource, extract_all};
use crate::geometry::Quad;
use crate::model::{Atlas, Item, Rect};
use crate::slots::SlotFrontier;
use tracing::{debug, info, instrument, trace};

/// Canvas size and limits for one packing attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    pub max_width: u32,
    pub max_height: u32,
    pub margin: u32,
}

impl Canvas {
    pub fn from_config(cfg: &AtlasConfig) -> Self {
        Self {
            width: cfg.width,
            height: cfg.height,
            max_width: cfg.max_width,
            max_height: cfg.max_height,
            margin: cfg.margin,
        }
    }

    /// Canvas for the next attempt after a failed one, or `None` when both
    /// dimensions already sit at their maximum.
    ///
    /// Height doubles while the canvas is square (or wider than tall), width
    /// doubles while it is taller than wide. A dimension stuck at its max hands
    /// growth to the other one. Doubling clamps to the max.
    pub fn grown(&self) -> Option<Canvas> {
        let double = |v: u32, max: u32| v.saturating_mul(2).min(max);
        let mut next = *self;
        if self.height <= self.width && self.height < self.max_height {
            next.height = double(self.height, self.max_height);
        } else if self.width < self.max_width {
            next.width = double(self.width, self.max_width);
        } else if self.height < self.max_height {
            next.height = double(self.height, self.max_height);
        } else {
            return None;
        }
        Some(next)
    }

    /// `item` placed at `(x, y)` plus margin stays strictly inside the canvas.
    pub fn fits<K>(&self, x: u32, y: u32, item: &Item<K>) -> bool {
        let m = self.margin as u64;
        (x as u64 + item.width as u64 + m) < self.width as u64
            && (y as u64 + item.height as u64 + m) < self.height as u64
    }

    /// Occupied area of `item` at `(x, y)`, expanded by margin on the right
    /// and bottom edges.
    pub fn footprint<K>(&self, x: u32, y: u32, item: &Item<K>) -> Quad {
        Quad::from_rect(&Rect::new(
            x,
            y,
            item.width.saturating_add(self.margin),
            item.height.saturating_add(self.margin),
        ))
    }
}

/// Result of a single packing attempt.
#[derive(Debug)]
pub enum Attempt<K> {
    /// Every item is bound.
    Packed(SlotFrontier<K>),
    /// Item at `failed` (in packing order) found no open slot. Every item
    /// before it was bound, so `failed` is also the number placed.
    Restart { failed: usize },
}

/// Greedily places `items` (in the given order) on a fresh frontier.
///
/// Each item takes the first open slot, in frontier order, where it fits the
/// canvas and its footprint intersects no bound footprint. A placement opens
/// two slots: right of the item and below it. The attempt stops at the first
/// item that fits nowhere.
pub fn pack_attempt<K: Clone + ToString>(items: &[Item<K>], canvas: &Canvas) -> Attempt<K> {
    let mut frontier = SlotFrontier::new(canvas.margin);
    let mut placed: Vec<Quad> = Vec::with_capacity(items.len());

    for (idx, item) in items.iter().enumerate() {
        let found = frontier.open().find_map(|(key, slot)| {
            if !canvas.fits(slot.x, slot.y, item) {
                return None;
            }
            let candidate = canvas.footprint(slot.x, slot.y, item);
            if placed.iter().any(|q| q.intersects(&candidate)) {
                return None;
            }
            Some((key, candidate))
        });
        let Some((key, candidate)) = found else {
            return Attempt::Restart { failed: idx };
        };
        let Some((x, y)) = frontier.bind(key, item.clone()) else {
            return Attempt::Restart { failed: idx };
        };
        trace!(key = %item.key.to_string(), x, y, w = item.width, h = item.height, "placed");
        placed.push(candidate);
        frontier.insert(x + item.width + canvas.margin, y);
        frontier.insert(x, y + item.height + canvas.margin);
    }
    Attempt::Packed(frontier)
}

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    restarts: usize,
    grows: usize,
    rescales: usize,
}

fn finalize<K>(
    frontier: SlotFrontier<K>,
    canvas: Canvas,
    cfg: &AtlasConfig,
    output_scale: f64,
    counters: Counters,
) -> Atlas<K> {
    let mut width = canvas.width;
    // single doubling, clamped; may leave the canvas non-square
    if cfg.square && width < canvas.height {
        width = width.saturating_mul(2).min(canvas.max_width);
    }
    Atlas {
        name: cfg.name.clone(),
        width,
        height: canvas.height,
        max_width: canvas.max_width,
        max_height: canvas.max_height,
        margin: canvas.margin,
        square: cfg.square,
        output_scale,
        slots: frontier.into_slots(),
        restarts: counters.restarts,
        grows: counters.grows,
        rescales: counters.rescales,
    }
}

#[instrument(skip_all, fields(name = %cfg.name, count = sources.len()))]
/// Packs `sources` into a single atlas.
///
/// Notes:
/// - Items are extracted at `cfg.output_scale` and ordered by [`extract_all`].
/// - A failed attempt grows the canvas (see [`Canvas::grown`]) and starts over.
/// - Once the canvas is at its maximum, `output_scale` shrinks by
///   `cfg.rescale_factor`, items are re-extracted and the canvas resets to the
///   initial size.
/// - After `cfg.max_restarts` discarded attempts, returns [`AtlasError::RestartLimit`].
pub fn pack<S: PackSource>(sources: &[S], cfg: &AtlasConfig) -> Result<Atlas<S::Key>> {
    cfg.validate()?;
    if sources.is_empty() {
        return Err(AtlasError::Empty);
    }

    let initial = Canvas::from_config(cfg);
    let mut canvas = initial;
    let mut scale = cfg.output_scale;
    let mut items = extract_all(sources, scale)?;
    let mut counters = Counters::default();

    loop {
        let failed = match pack_attempt(&items, &canvas) {
            Attempt::Packed(frontier) => {
                let atlas = finalize(frontier, canvas, cfg, scale, counters);
                info!(
                    width = atlas.width,
                    height = atlas.height,
                    output_scale = scale,
                    restarts = counters.restarts,
                    "atlas packed"
                );
                return Ok(atlas);
            }
            Attempt::Restart { failed } => failed,
        };

        if cfg.max_restarts.is_some_and(|limit| counters.restarts >= limit) {
            return Err(AtlasError::RestartLimit {
                restarts: counters.restarts,
                width: canvas.width,
                height: canvas.height,
                output_scale: scale,
            });
        }
        counters.restarts += 1;

        match canvas.grown() {
            Some(next) => {
                debug!(
                    width = next.width,
                    height = next.height,
                    placed = failed,
                    failed = %items[failed].key.to_string(),
                    "atlas too small; increasing size and restarting"
                );
                canvas = next;
                counters.grows += 1;
            }
            None => {
                scale *= cfg.rescale_factor;
                debug!(
                    width = canvas.width,
                    height = canvas.height,
                    output_scale = scale,
                    "max atlas size reached; decreasing texture size and restarting"
                );
                items = extract_all(sources, scale)?;
                canvas = initial;
                counters.rescales += 1;
            }
        }
    }
}

#[instrument(skip_all, fields(name = %cfg.name, count = items.len()))]
/// Packs already-extracted items, growing the canvas but never rescaling.
///
/// Items are re-ordered with the extractor's ordering (stable). Returns
/// [`AtlasError::OutOfSpace`] when they do not fit the maximum canvas.
pub fn pack_items<K: Clone + ToString>(mut items: Vec<Item<K>>, cfg: &AtlasConfig) -> Result<Atlas<K>> {
    cfg.validate()?;
    if items.is_empty() {
        return Err(AtlasError::Empty);
    }
    items.sort_by(|a, b| b.packing_weight().cmp(&a.packing_weight()));

    let mut canvas = Canvas::from_config(cfg);
    let mut counters = Counters::default();
    loop {
        match pack_attempt(&items, &canvas) {
            Attempt::Packed(frontier) => {
                return Ok(finalize(frontier, canvas, cfg, cfg.output_scale, counters));
            }
            Attempt::Restart { failed } => {
                let Some(next) = canvas.grown() else {
                    return Err(AtlasError::OutOfSpace {
                        width: canvas.max_width,
                        height: canvas.max_height,
                    });
                };
                debug!(width = next.width, height = next.height, placed = failed, "growing canvas");
                canvas = next;
                counters.restarts += 1;
                counters.grows += 1;
            }
        }
    }
}
