use crate::model::Atlas;
use crate::uv::UvTransform;
use serde_json::{Value, json};

/// Full layout document: canvas, stats and, per item, its slot, pixel and
/// normalized bounds and UV transform.
/// Shape: `{ name, width, height, outputScale, items: [...], stats }`.
pub fn to_layout_json<K: ToString>(atlas: &Atlas<K>) -> Value {
    let items: Vec<Value> = atlas
        .placements()
        .map(|p| {
            let t = UvTransform::for_placement(atlas.width, atlas.height, &p);
            let b = &p.item.bounds_px;
            json!({
                "key": p.item.key.to_string(),
                "slot": {"x": p.x, "y": p.y},
                "size": {"w": p.item.width, "h": p.item.height},
                "boundsPx": {"left": b.left, "top": b.top, "right": b.right, "bottom": b.bottom},
                "boundsRel": &p.item.bounds_rel,
                "uv": t,
            })
        })
        .collect();
    json!({
        "name": atlas.name,
        "width": atlas.width,
        "height": atlas.height,
        "margin": atlas.margin,
        "square": atlas.square,
        "outputScale": atlas.output_scale,
        "items": items,
        "stats": atlas.stats(),
    })
}

/// DragonBones texture atlas document (`*_tex.json`).
/// Shape: `{ name, imagePath, width, height, SubTexture: [{ name, x, y, width, height }] }`.
pub fn to_dragonbones_json<K: ToString>(atlas: &Atlas<K>, image_path: &str) -> Value {
    let sub_textures: Vec<Value> = atlas
        .placements()
        .map(|p| {
            json!({
                "name": p.item.key.to_string(),
                "x": p.x,
                "y": p.y,
                "width": p.item.width,
                "height": p.item.height,
            })
        })
        .collect();
    json!({
        "name": atlas.name,
        "imagePath": image_path,
        "width": atlas.width,
        "height": atlas.height,
        "SubTexture": sub_textures,
    })
}
