use descale::image::io::{load_grayscale_f32, save_grayscale_f32};
use descale::{Descaler, FilterParams};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = load_config(Path::new(&config_path))?;

    let src = load_grayscale_f32(&config.input)?;

    let descaler = Descaler::new(src.w, src.h, config.descale.clone())
        .map_err(|e| format!("Invalid parameters: {e}"))?;

    let start = Instant::now();
    let out = descaler.process_plane(&src);
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    save_grayscale_f32(&out, &config.output.image)?;

    let summary = RunSummary {
        input_width: src.w,
        input_height: src.h,
        output_width: out.w,
        output_height: out.h,
        upscale: config.descale.upscale,
        elapsed_ms,
    };
    if let Some(path) = &config.output.summary {
        write_summary(&summary, path)?;
    }

    println!(
        "{} {}x{} -> {}x{} in {:.3} ms, saved to {}",
        if config.descale.upscale {
            "Upscaled"
        } else {
            "Descaled"
        },
        src.w,
        src.h,
        out.w,
        out.h,
        elapsed_ms,
        config.output.image.display()
    );

    Ok(())
}

fn load_config(path: &Path) -> Result<ToolConfig, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    serde_json::from_str(&data)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
}

fn write_summary(summary: &RunSummary, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }
    }
    let json = serde_json::to_string_pretty(summary)
        .map_err(|e| format!("Failed to serialize summary: {e}"))?;
    fs::write(path, json).map_err(|e| format!("Failed to write {}: {e}", path.display()))
}

fn usage() -> String {
    "Usage: descale_image <config.json>".to_string()
}

#[derive(Debug, Deserialize)]
struct ToolConfig {
    #[serde(rename = "input")]
    input: PathBuf,
    descale: FilterParams,
    output: OutputConfig,
}

#[derive(Debug, Deserialize)]
struct OutputConfig {
    image: PathBuf,
    #[serde(default)]
    summary: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunSummary {
    input_width: usize,
    input_height: usize,
    output_width: usize,
    output_height: usize,
    upscale: bool,
    elapsed_ms: f64,
}
