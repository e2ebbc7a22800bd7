use clap::{Parser, Subcommand};
use psdvec::document::Document;
use psdvec::layer_info::ExtraInfo;
use psdvec::path::{construct_path, IdGen};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "psdvec", about = "Inspect the structure of layered PSD documents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the document header and a per-layer summary
    Info { input: PathBuf },
    /// Show per-layer detail, including extra-info and unknown keys
    Layers { input: PathBuf },
    /// Reconstruct and print a layer's vector-mask fill path
    Paths {
        input: PathBuf,
        /// Layer index (document order, back to front)
        #[arg(short, long)]
        layer: usize,
    },
    /// Dump the full decoded document tree as JSON
    Dump { input: PathBuf },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    match Cli::parse().command {

        // ── Info ─────────────────────────────────────────────────────────
        Commands::Info { input } => {
            let doc = open_document(&input)?;
            println!("── PSD document ─────────────────────────────────────────");
            println!("  Path        {}", input.display());
            println!("  Size        {} x {}", doc.width, doc.height);
            println!("  Channels    {}", doc.channel_count);
            println!("  Depth       {} bit", doc.depth);
            println!("  Color mode  {}", doc.color_mode);
            println!("  Layers      {}", doc.layers.len());
            println!();
            println!("{:<4} {:<26} {:<5} {:>7}  Bounds", "#", "Name", "Blend", "Opacity");
            for (i, layer) in doc.layers.iter().enumerate() {
                println!(
                    "{:<4} {:<26} {:<5} {:>7}  {},{} {}x{}",
                    i,
                    layer.name,
                    layer.blend_mode.to_string(),
                    layer.opacity,
                    layer.bounds.left,
                    layer.bounds.top,
                    layer.bounds.width(),
                    layer.bounds.height(),
                );
            }
            if !doc.extra.unknown_keys().is_empty() {
                let keys: Vec<String> = doc
                    .extra
                    .unknown_keys()
                    .iter()
                    .map(|k| k.to_string())
                    .collect();
                println!("  Unknown document keys: {}", keys.join(" "));
            }
        }

        // ── Layers ───────────────────────────────────────────────────────
        Commands::Layers { input } => {
            let doc = open_document(&input)?;
            for (i, layer) in doc.layers.iter().enumerate() {
                println!(
                    "[{i}] {:?}  blend={} opacity={} clipping={} flags={:#04x}",
                    layer.name, layer.blend_mode, layer.opacity, layer.clipping, layer.flags,
                );
                for channel in &layer.channels {
                    println!("    channel id={} length={}", channel.id, channel.length);
                }
                for key in layer.extra.keys() {
                    let detail = match layer.extra.get(key.as_bytes()) {
                        Some(ExtraInfo::UnicodeName(name)) => format!("name {name:?}"),
                        Some(ExtraInfo::SectionDivider(kind)) => format!("divider type {kind}"),
                        Some(ExtraInfo::VectorMask(mask)) => {
                            format!("vector mask, {} record(s)", mask.records.len())
                        }
                        Some(ExtraInfo::Descriptor(desc)) => {
                            format!("descriptor, {} item(s)", desc.items.len())
                        }
                        Some(ExtraInfo::KeyedDescriptor { key: inner, .. }) => {
                            format!("descriptor keyed '{inner}'")
                        }
                        None => String::new(),
                    };
                    println!("    {key}  {detail}");
                }
                for key in layer.extra.unknown_keys() {
                    println!("    {key}  (unknown, skipped)");
                }
            }
        }

        // ── Paths ────────────────────────────────────────────────────────
        Commands::Paths { input, layer } => {
            let doc = open_document(&input)?;
            let record = doc
                .layers
                .get(layer)
                .ok_or_else(|| format!("no layer {layer} (document has {})", doc.layers.len()))?;
            let mask = record
                .extra
                .vector_mask()
                .ok_or("layer has no vector mask")?;

            let mut ids = IdGen::new();
            let fill = construct_path(mask, &doc.bounds, &mut ids)?;
            println!("d: {}", fill.data);
            if let Some(rule) = fill.rule {
                println!("fill-rule: {}", rule.as_str());
            }
            if let Some(mask) = fill.mask {
                println!("mask {} ({}): {}", mask.id, mask.rule.as_str(), mask.path_data);
            }
        }

        // ── Dump ─────────────────────────────────────────────────────────
        Commands::Dump { input } => {
            let doc = open_document(&input)?;
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
    }

    Ok(())
}

fn open_document(path: &PathBuf) -> Result<Document, Box<dyn std::error::Error>> {
    Ok(Document::read(BufReader::new(File::open(path)?))?)
}
