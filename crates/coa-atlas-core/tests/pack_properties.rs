use coa_atlas_core::model::Rect;
use coa_atlas_core::prelude::*;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

fn random_sources(seed: u64, count: usize) -> Vec<TexturedMesh> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            let img_w = rng.gen_range(16..=256);
            let img_h = rng.gen_range(16..=256);
            // a partial footprint inside the image
            let u0 = rng.gen_range(0.0..0.4);
            let v0 = rng.gen_range(0.0..0.4);
            let u1 = rng.gen_range(0.6..=1.0);
            let v1 = rng.gen_range(0.6..=1.0);
            TexturedMesh::new(
                format!("sprite_{}", i),
                vec![
                    Uv::new(u0, v0),
                    Uv::new(u1, v0),
                    Uv::new(u1, v1),
                    Uv::new(u0, v1),
                ],
                (img_w, img_h),
            )
        })
        .collect()
}

fn footprints(atlas: &Atlas) -> Vec<Rect> {
    atlas
        .placements()
        .map(|p| {
            Rect::new(
                p.x,
                p.y,
                p.item.width + atlas.margin,
                p.item.height + atlas.margin,
            )
        })
        .collect()
}

#[test]
fn random_sets_do_not_overlap_and_stay_inside() {
    for (seed, margin) in [(1u64, 1u32), (7, 2), (2024, 0), (99, 4)] {
        let sources = random_sources(seed, 80);
        let cfg = AtlasConfig::builder()
            .with_dimensions(128, 128)
            .with_max_dimensions(4096, 4096)
            .margin(margin)
            .square(false)
            .build();
        let atlas = pack(&sources, &cfg).expect("pack");

        let rects = footprints(&atlas);
        for i in 0..rects.len() {
            for j in (i + 1)..rects.len() {
                assert!(
                    !rects[i].overlaps(&rects[j]),
                    "seed {seed}: footprints overlap: {:?} vs {:?}",
                    rects[i],
                    rects[j]
                );
            }
        }
        for p in atlas.placements() {
            assert!(p.x + p.item.width + margin < atlas.width);
            assert!(p.y + p.item.height + margin < atlas.height);
            assert!(p.x >= margin && p.y >= margin);
        }
        assert!(atlas.width <= atlas.max_width && atlas.height <= atlas.max_height);
    }
}

#[test]
fn every_item_is_bound_exactly_once() {
    let sources = random_sources(42, 120);
    let atlas = pack(&sources, &AtlasConfig::default()).expect("pack");
    let keys: Vec<_> = atlas.placements().map(|p| p.item.key.clone()).collect();
    assert_eq!(keys.len(), sources.len());
    let unique: HashSet<_> = keys.iter().collect();
    assert_eq!(unique.len(), sources.len());
    let stats = atlas.stats();
    assert_eq!(stats.num_items, sources.len());
    assert!(stats.occupancy > 0.0 && stats.occupancy <= 1.0);
}

#[test]
fn packing_is_deterministic() {
    let sources = random_sources(5, 60);
    let cfg = AtlasConfig::builder().with_dimensions(64, 64).build();
    let a = pack(&sources, &cfg).expect("pack");
    let b = pack(&sources, &cfg).expect("pack");

    let layout = |atlas: &Atlas| -> Vec<(u32, u32, Option<String>)> {
        atlas
            .slots
            .iter()
            .map(|s| (s.x, s.y, s.item.as_ref().map(|i| i.key.clone())))
            .collect()
    };
    assert_eq!((a.width, a.height), (b.width, b.height));
    assert_eq!(a.restarts, b.restarts);
    assert_eq!(layout(&a), layout(&b));
}

#[test]
fn slots_are_reported_in_frontier_order() {
    let atlas = pack(&random_sources(11, 30), &AtlasConfig::default()).expect("pack");
    for pair in atlas.slots.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        assert!(a.y < b.y || (a.y == b.y && a.x >= b.x), "{:?} before {:?}", (a.x, a.y), (b.x, b.y));
    }
}

#[test]
fn pack_items_matches_pack_for_same_scale() {
    let sources = random_sources(3, 40);
    let cfg = AtlasConfig::builder().with_dimensions(128, 128).build();
    let from_sources = pack(&sources, &cfg).expect("pack");
    assert_eq!(from_sources.rescales, 0);

    let items = extract_all(&sources, cfg.output_scale).expect("extract");
    let from_items = pack_items(items, &cfg).expect("pack items");
    let origins = |a: &Atlas| a.placements().map(|p| (p.item.key.clone(), p.x, p.y)).collect::<Vec<_>>();
    assert_eq!(origins(&from_sources), origins(&from_items));
    assert_eq!((from_sources.width, from_sources.height), (from_items.width, from_items.height));
}
