use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgAction, Args, Parser, Subcommand};
use coa_atlas_core::{
    Atlas, AtlasConfig, TexturedMesh, Uv, pack, rewrite, to_dragonbones_json, to_layout_json,
};
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "coa-atlas",
    about = "Pack textured sprite meshes into a shared texture atlas",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pack a manifest and write atlas metadata
    Pack(PackArgs),
    /// Pack a manifest and print statistics only
    Stats(StatsArgs),
}

#[derive(Parser, Debug, Clone)]
struct PackArgs {
    // Input/Output
    /// Item manifest (JSON)
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    /// Output directory
    #[arg(short, long, default_value = "out", help_heading = "Input/Output")]
    out_dir: PathBuf,
    /// Atlas name (files will be name.json); defaults to the manifest name
    #[arg(short, long, help_heading = "Input/Output")]
    name: Option<String>,
    /// YAML config file path (overrides layout options)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,

    #[command(flatten)]
    layout: LayoutArgs,

    // Export
    /// Metadata format: layout | dragonbones
    #[arg(long, value_parser = ["layout", "dragonbones"], default_value = "layout", help_heading = "Export")]
    metadata: String,
    /// Image path written into DragonBones metadata (default: <name>.png)
    #[arg(long, help_heading = "Export")]
    image_path: Option<String>,
    /// Layout: include every item's rewritten per-vertex UVs
    #[arg(long, default_value_t = false, help_heading = "Export")]
    with_uvs: bool,
    /// Export packing stats (JSON) to this file
    #[arg(long, help_heading = "Export")]
    export_stats: Option<PathBuf>,
    /// Print the merged configuration (after CLI/YAML) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
    /// Dry run: pack and report but do not write files
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

#[derive(Parser, Debug, Clone)]
struct StatsArgs {
    /// Item manifest (JSON)
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    /// Atlas name; defaults to the manifest name
    #[arg(short, long, help_heading = "Input/Output")]
    name: Option<String>,
    /// YAML config file path (overrides layout options)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,

    #[command(flatten)]
    layout: LayoutArgs,

    /// Export packing stats (JSON) to this file
    #[arg(long, help_heading = "Export")]
    export_stats: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct LayoutArgs {
    /// Initial atlas width
    #[arg(long, default_value_t = 256, help_heading = "Layout")]
    width: u32,
    /// Initial atlas height
    #[arg(long, default_value_t = 256, help_heading = "Layout")]
    height: u32,
    /// Max width
    #[arg(long, default_value_t = 2048, help_heading = "Layout")]
    max_width: u32,
    /// Max height
    #[arg(long, default_value_t = 2048, help_heading = "Layout")]
    max_height: u32,
    /// Gap between items (pixels)
    #[arg(long, default_value_t = 1, help_heading = "Layout")]
    margin: u32,
    /// Square up the final atlas
    #[arg(long, default_value_t = true, action=ArgAction::Set, help_heading = "Layout")]
    square: bool,
    /// Scale applied to every item's pixel size
    #[arg(long, default_value_t = 1.0, help_heading = "Layout")]
    output_scale: f64,
    /// Scale factor applied when the max atlas size is reached
    #[arg(long, default_value_t = 0.95, help_heading = "Layout")]
    rescale_factor: f64,
    /// Give up after this many restarts
    #[arg(long, default_value_t = 1000, help_heading = "Layout")]
    max_restarts: usize,
    /// Never give up (may loop for a long time on huge inputs)
    #[arg(long, default_value_t = false, help_heading = "Layout")]
    no_restart_limit: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    match &cli.command {
        Commands::Pack(args) => run_pack(args),
        Commands::Stats(args) => run_stats(args),
    }
}

/// Item manifest as written by the exporter front ends.
#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    name: Option<String>,
    items: Vec<ManifestItem>,
}

#[derive(Debug, Deserialize)]
struct ManifestItem {
    key: String,
    uvs: Vec<Uv>,
    /// Pixel size of the item's image; read from `image` when missing.
    #[serde(default)]
    image_size: Option<(u32, u32)>,
    /// Image file, relative to the manifest.
    #[serde(default)]
    image: Option<PathBuf>,
}

struct LoadedManifest {
    name: Option<String>,
    sources: Vec<TexturedMesh>,
}

fn load_manifest(path: &Path) -> anyhow::Result<LoadedManifest> {
    let text =
        fs::read_to_string(path).with_context(|| format!("read manifest {}", path.display()))?;
    let manifest: Manifest = serde_json::from_str(&text)
        .with_context(|| format!("parse manifest {}", path.display()))?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));

    let mut sources = Vec::with_capacity(manifest.items.len());
    let mut seen = HashSet::with_capacity(manifest.items.len());
    for item in manifest.items {
        // keys name the output entries; duplicates would collide
        if !seen.insert(item.key.clone()) {
            anyhow::bail!("duplicate item key `{}` in {}", item.key, path.display());
        }
        let image_size = match (item.image_size, &item.image) {
            (Some(size), _) => Some(size),
            (None, Some(image)) => {
                let image_path = base.join(image);
                let size = image::image_dimensions(&image_path)
                    .with_context(|| format!("read image size {}", image_path.display()))?;
                Some(size)
            }
            (None, None) => {
                warn!(key = %item.key, "item has neither image_size nor image");
                None
            }
        };
        sources.push(TexturedMesh {
            key: item.key,
            uvs: item.uvs,
            image_size,
        });
    }
    Ok(LoadedManifest {
        name: manifest.name,
        sources,
    })
}

fn build_config(
    layout: &LayoutArgs,
    config: Option<&Path>,
    name: Option<&str>,
    manifest_name: Option<&str>,
) -> anyhow::Result<AtlasConfig> {
    let mut cfg = AtlasConfig {
        width: layout.width,
        height: layout.height,
        max_width: layout.max_width,
        max_height: layout.max_height,
        margin: layout.margin,
        square: layout.square,
        output_scale: layout.output_scale,
        rescale_factor: layout.rescale_factor,
        max_restarts: if layout.no_restart_limit {
            None
        } else {
            Some(layout.max_restarts)
        },
        ..Default::default()
    };
    if let Some(name) = manifest_name {
        cfg.name = name.to_string();
    }
    // Load config file if provided; it sets layout options en bloc
    if let Some(path) = config {
        let file = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let y: YamlConfig = serde_yaml::from_str(&file)
            .with_context(|| format!("parse config {}", path.display()))?;
        cfg = y.into_atlas_config(cfg);
    }
    if let Some(name) = name {
        cfg.name = name.to_string();
    }
    Ok(cfg)
}

/// The atlas name becomes a file stem inside the output directory.
fn check_output_name(name: &str) -> anyhow::Result<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || Path::new(name).is_absolute()
    {
        anyhow::bail!("atlas name `{}` is not a plain file name", name);
    }
    Ok(())
}

fn run_pack(cli: &PackArgs) -> anyhow::Result<()> {
    let manifest = load_manifest(&cli.input)?;
    let cfg = build_config(
        &cli.layout,
        cli.config.as_deref(),
        cli.name.as_deref(),
        manifest.name.as_deref(),
    )?;

    if cli.print_config {
        match cli.print_config_format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(&cfg)?),
            _ => println!("{}", serde_json::to_string_pretty(&cfg)?),
        }
        return Ok(());
    }

    check_output_name(&cfg.name)?;
    info!(count = manifest.sources.len(), "loaded manifest items");
    let atlas = pack(&manifest.sources, &cfg)
        .with_context(|| format!("pack atlas `{}`", cfg.name))?;

    let doc = match cli.metadata.as_str() {
        "layout" => {
            let mut doc = to_layout_json(&atlas);
            if cli.with_uvs {
                attach_rewritten_uvs(&mut doc, &atlas, &manifest.sources);
            }
            doc
        }
        "dragonbones" => {
            let image_path = cli
                .image_path
                .clone()
                .unwrap_or_else(|| format!("{}.png", atlas.name));
            to_dragonbones_json(&atlas, &image_path)
        }
        other => anyhow::bail!("unknown metadata format: {}", other),
    };

    let stats = atlas.stats();
    if cli.dry_run {
        println!("{}", stats.summary());
        return Ok(());
    }

    fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("create out_dir {}", cli.out_dir.display()))?;
    let json_path = cli.out_dir.join(format!("{}.json", atlas.name));
    fs::write(&json_path, serde_json::to_string_pretty(&doc)?)
        .with_context(|| format!("write {}", json_path.display()))?;
    info!(
        ?json_path,
        width = atlas.width,
        height = atlas.height,
        items = stats.num_items,
        "atlas written"
    );

    if let Some(stats_path) = &cli.export_stats {
        fs::write(stats_path, serde_json::to_string_pretty(&stats)?)
            .with_context(|| format!("write {}", stats_path.display()))?;
        info!(?stats_path, "stats exported");
    }
    Ok(())
}

fn run_stats(cli: &StatsArgs) -> anyhow::Result<()> {
    let manifest = load_manifest(&cli.input)?;
    let cfg = build_config(
        &cli.layout,
        cli.config.as_deref(),
        cli.name.as_deref(),
        manifest.name.as_deref(),
    )?;
    let atlas = pack(&manifest.sources, &cfg)
        .with_context(|| format!("pack atlas `{}`", cfg.name))?;
    let stats = atlas.stats();
    println!("{}", stats.summary());
    println!(
        "wasted={} px² ({:.2}%)",
        stats.wasted_area(),
        stats.waste_percentage()
    );
    if let Some(stats_path) = &cli.export_stats {
        fs::write(stats_path, serde_json::to_string_pretty(&stats)?)
            .with_context(|| format!("write {}", stats_path.display()))?;
    }
    Ok(())
}

/// Adds `atlasUvs` (the item's UVs remapped into the atlas) to every layout item.
fn attach_rewritten_uvs(doc: &mut serde_json::Value, atlas: &Atlas, sources: &[TexturedMesh]) {
    let by_key: HashMap<&str, &TexturedMesh> =
        sources.iter().map(|s| (s.key.as_str(), s)).collect();
    let transforms: HashMap<String, _> = rewrite(atlas).into_iter().collect();
    let Some(items) = doc.get_mut("items").and_then(|v| v.as_array_mut()) else {
        return;
    };
    for item in items {
        let Some(key) = item.get("key").and_then(|k| k.as_str()).map(str::to_owned) else {
            continue;
        };
        let (Some(source), Some(t)) = (by_key.get(key.as_str()), transforms.get(&key)) else {
            continue;
        };
        let mut uvs = source.uvs.clone();
        t.apply_all(&mut uvs);
        item["atlasUvs"] = serde_json::json!(uvs);
    }
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .try_init();
}

/// Layout options read from a YAML file. Unset fields keep the CLI value.
#[derive(Debug, Deserialize, Default)]
struct YamlConfig {
    name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    max_width: Option<u32>,
    max_height: Option<u32>,
    margin: Option<u32>,
    square: Option<bool>,
    output_scale: Option<f64>,
    rescale_factor: Option<f64>,
    max_restarts: Option<usize>,
}

impl YamlConfig {
    fn into_atlas_config(self, mut cfg: AtlasConfig) -> AtlasConfig {
        if let Some(v) = self.name {
            cfg.name = v;
        }
        if let Some(v) = self.width {
            cfg.width = v;
        }
        if let Some(v) = self.height {
            cfg.height = v;
        }
        if let Some(v) = self.max_width {
            cfg.max_width = v;
        }
        if let Some(v) = self.max_height {
            cfg.max_height = v;
        }
        if let Some(v) = self.margin {
            cfg.margin = v;
        }
        if let Some(v) = self.square {
            cfg.square = v;
        }
        if let Some(v) = self.output_scale {
            cfg.output_scale = v;
        }
        if let Some(v) = self.rescale_factor {
            cfg.rescale_factor = v;
        }
        if let Some(v) = self.max_restarts {
            cfg.max_restarts = Some(v);
        }
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    fn args(input: PathBuf) -> PackArgs {
        PackArgs::parse_from([OsString::from("pack"), input.into_os_string()])
    }

    #[test]
    fn manifest_reads_sizes_inline_and_from_images() {
        let dir = tempfile::tempdir().unwrap();
        image::RgbaImage::new(12, 7)
            .save(dir.path().join("hand.png"))
            .unwrap();
        let manifest_path = dir.path().join("hero.json");
        fs::write(
            &manifest_path,
            r#"{
                "name": "hero",
                "items": [
                    {"key": "head", "uvs": [[0, 0], [1, 1]], "image_size": [64, 48]},
                    {"key": "hand", "uvs": [[0, 0], [1, 1]], "image": "hand.png"},
                    {"key": "ghost", "uvs": [[0, 0], [1, 1]]}
                ]
            }"#,
        )
        .unwrap();

        let loaded = load_manifest(&manifest_path).unwrap();
        assert_eq!(loaded.name.as_deref(), Some("hero"));
        let sizes: Vec<_> = loaded.sources.iter().map(|s| s.image_size).collect();
        assert_eq!(sizes, vec![Some((64, 48)), Some((12, 7)), None]);
    }

    #[test]
    fn yaml_overrides_cli_values() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = dir.path().join("atlas.yaml");
        fs::write(&yaml, "max_width: 512\nsquare: false\nmax_restarts: 10\n").unwrap();

        let mut a = args(dir.path().join("unused.json"));
        a.config = Some(yaml);
        let cfg = build_config(&a.layout, a.config.as_deref(), None, Some("from_manifest")).unwrap();
        assert_eq!(cfg.max_width, 512);
        assert_eq!(cfg.max_height, 2048);
        assert!(!cfg.square);
        assert_eq!(cfg.max_restarts, Some(10));
        assert_eq!(cfg.name, "from_manifest");

        let named = build_config(&a.layout, a.config.as_deref(), Some("explicit"), Some("from_manifest"));
        assert_eq!(named.unwrap().name, "explicit");
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let manifest_path = dir.path().join("dupes.json");
        fs::write(
            &manifest_path,
            r#"{
                "items": [
                    {"key": "arm", "uvs": [[0, 0], [1, 1]], "image_size": [100, 20]},
                    {"key": "leg", "uvs": [[0, 0], [1, 1]], "image_size": [30, 30]},
                    {"key": "arm", "uvs": [[0, 0], [1, 1]], "image_size": [20, 100]}
                ]
            }"#,
        )
        .unwrap();

        let err = load_manifest(&manifest_path).err().expect("duplicate accepted");
        assert!(err.to_string().contains("duplicate item key `arm`"));
    }

    #[test]
    fn atlas_names_must_stay_inside_out_dir() {
        assert!(check_output_name("hero_atlas").is_ok());
        assert!(check_output_name("hero.v2").is_ok());
        for bad in ["", ".", "..", "../x", "sub/x", "sub\\x", "/abs"] {
            assert!(check_output_name(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn stats_takes_only_layout_and_stats_options() {
        let a = StatsArgs::try_parse_from(["stats", "m.json", "--max-width", "512"]).unwrap();
        assert_eq!(a.layout.max_width, 512);
        assert!(StatsArgs::try_parse_from(["stats", "m.json", "--dry-run"]).is_err());
        assert!(StatsArgs::try_parse_from(["stats", "m.json", "--with-uvs"]).is_err());
    }

    #[test]
    fn pack_writes_into_out_dir_only() {
        let dir = tempfile::tempdir().unwrap();
        let manifest_path = dir.path().join("m.json");
        fs::write(
            &manifest_path,
            r#"{"name": "../escape", "items": [{"key": "a", "uvs": [[0, 0], [1, 1]], "image_size": [8, 8]}]}"#,
        )
        .unwrap();
        let mut a = args(manifest_path);
        a.out_dir = dir.path().join("out");
        assert!(run_pack(&a).is_err());
        assert!(!dir.path().join("escape.json").exists());

        a.name = Some("safe".into());
        run_pack(&a).unwrap();
        assert!(dir.path().join("out").join("safe.json").exists());
    }

    #[test]
    fn rewritten_uvs_are_attached_per_item() {
        let sources = vec![
            TexturedMesh::full_image("a".to_string(), 30, 30),
            TexturedMesh::full_image("b".to_string(), 20, 40),
        ];
        let atlas = pack(&sources, &AtlasConfig::default()).unwrap();
        let mut doc = to_layout_json(&atlas);
        attach_rewritten_uvs(&mut doc, &atlas, &sources);
        for item in doc["items"].as_array().unwrap() {
            assert_eq!(item["atlasUvs"].as_array().unwrap().len(), 4);
        }
    }
}
