//! Crop CLI for region-snip.
//!
//! Runs the capture pipeline on a screenshot file, the same way the
//! orchestrator runs it on a visible-tab capture.
//!
//! Usage:
//!   region-snip <capture.png> <x> <y> <w> <h> [dpr] [-o out.png]
//!
//! Coordinates are CSS pixels; `dpr` defaults to 1.

use region_snip_lib::capture::{self, CaptureFrame};
use region_snip_lib::{SelectionRect, SnipConfig};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    region_snip_lib::init_logging();

    match run(std::env::args().skip(1).collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Vec<String>) -> Result<(), String> {
    let (positional, output) = split_output_flag(args)?;

    if positional.len() < 5 || positional.len() > 6 {
        return Err(usage());
    }

    let input = PathBuf::from(&positional[0]);
    let number = |i: usize, name: &str| -> Result<f64, String> {
        positional[i]
            .parse::<f64>()
            .map_err(|_| format!("{} must be a number, got '{}'", name, positional[i]))
    };

    let rect = SelectionRect {
        x: number(1, "x")?,
        y: number(2, "y")?,
        w: number(3, "w")?,
        h: number(4, "h")?,
        scroll_x: 0.0,
        scroll_y: 0.0,
        dpr: if positional.len() == 6 {
            number(5, "dpr")?
        } else {
            1.0
        },
    };

    let config = SnipConfig::from_env();
    let start = std::time::Instant::now();

    let image = image::open(&input).map_err(|e| format!("Failed to read {}: {}", input.display(), e))?;
    let frame = CaptureFrame::from_image(image);
    let (png_bytes, plan) = capture::crop_to_png_bytes(&frame, &rect, config.envelope)
        .map_err(|e| e.to_string())?;

    let output = output.unwrap_or_else(|| default_output(&input));
    std::fs::write(&output, &png_bytes)
        .map_err(|e| format!("Failed to write {}: {}", output.display(), e))?;

    println!(
        "{} -> {}x{} ({} bytes, {}ms)",
        output.display(),
        plan.dw,
        plan.dh,
        png_bytes.len(),
        start.elapsed().as_millis()
    );
    Ok(())
}

fn split_output_flag(args: Vec<String>) -> Result<(Vec<String>, Option<PathBuf>), String> {
    let mut positional = Vec::new();
    let mut output = None;
    let mut iter = args.into_iter();

    while let Some(arg) = iter.next() {
        if arg == "-o" || arg == "--output" {
            let path = iter.next().ok_or("-o requires a path")?;
            output = Some(PathBuf::from(path));
        } else {
            positional.push(arg);
        }
    }

    Ok((positional, output))
}

fn default_output(input: &std::path::Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "capture".to_string());
    input.with_file_name(format!("{}-snip.png", stem))
}

fn usage() -> String {
    "Usage: region-snip <capture.png> <x> <y> <w> <h> [dpr] [-o out.png]".to_string()
}
