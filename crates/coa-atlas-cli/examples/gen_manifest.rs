//! Writes a random item manifest for trying out the CLI.
//!
//! cargo run -p coa-atlas-cli --example gen_manifest -- out/manifest.json 120 42

use rand::{Rng, SeedableRng};
use serde_json::json;
use std::fs;
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let out: PathBuf = args
        .next()
        .unwrap_or_else(|| "out/manifest.json".into())
        .into();
    let count: usize = args.next().map(|s| s.parse()).transpose()?.unwrap_or(60);
    let seed: u64 = args.next().map(|s| s.parse()).transpose()?.unwrap_or(42);

    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let items: Vec<_> = (0..count)
        .map(|i| {
            let w: u32 = rng.gen_range(24..=320);
            let h: u32 = rng.gen_range(24..=320);
            // most sprites use the full image; some only a sub-region
            let (u0, v0, u1, v1) = if rng.gen_bool(0.7) {
                (0.0, 0.0, 1.0, 1.0)
            } else {
                (
                    rng.gen_range(0.0..0.3),
                    rng.gen_range(0.0..0.3),
                    rng.gen_range(0.7..=1.0),
                    rng.gen_range(0.7..=1.0),
                )
            };
            json!({
                "key": format!("sprite_{:03}", i),
                "uvs": [[u0, v0], [u1, v0], [u1, v1], [u0, v1]],
                "image_size": [w, h],
            })
        })
        .collect();

    if let Some(dir) = out.parent() {
        fs::create_dir_all(dir)?;
    }
    let doc = json!({ "name": "random_atlas", "items": items });
    fs::write(&out, serde_json::to_string_pretty(&doc)?)?;
    println!("wrote {} items to {}", count, out.display());
    Ok(())
}
