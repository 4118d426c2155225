//! Swellfft - renders a tileable FFT ocean to height, normal and foam maps
//!
//! Frames run on the pipeline worker a few at a time and are exported in
//! submission order.

mod cli;

use std::sync::Arc;
use std::time::Instant;

use clap::Parser;

use cli::Args;
use swellfft::clock::SimulationClock;
use swellfft::dispatch::{DefaultDispatcher, Dispatcher, SerialDispatcher};
use swellfft::present::{PngExporter, PresentationTarget};
use swellfft::{OceanPipeline, PipelineWorker, SpectrumCache};

/// Requests kept queued on the worker while earlier frames export
const FRAMES_IN_FLIGHT: usize = 3;

fn render<D: Dispatcher + 'static>(args: &Args, dispatcher: D) -> swellfft::Result<()> {
    let params = args.spectrum_parameters();
    let config = args.export_config();

    let cache = Arc::new(SpectrumCache::new(dispatcher));
    let pipeline = OceanPipeline::new(Arc::clone(&cache)).with_foam(args.foam_parameters());
    let worker = PipelineWorker::spawn(pipeline)?;
    let mut exporter = PngExporter::new(config.clone())?;

    let mut clock = SimulationClock::new(config.time_step_s);
    worker.run_frames(&params, &mut clock, config.frames, FRAMES_IN_FLIGHT, |frame, field| {
        let (low, high) = field.y.range();
        println!(
            "  Frame {:>4}: t={:.3}s height [{:.3}, {:.3}]m",
            frame, field.time_s, low, high
        );
        exporter.present(&field)
    })?;

    println!(
        "  Cache builds: {} butterfly, {} spectrum",
        cache.butterfly_builds(),
        cache.spectrum_builds()
    );
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    println!("Swellfft ocean renderer");
    println!("  Resolution: {}x{}", args.resolution, args.resolution);
    println!("  Patch: {}m, wind {}m/s", args.patch_length, args.wind_speed);
    println!("  Frames: {}", args.frames);

    let start = Instant::now();

    if args.serial {
        render(&args, SerialDispatcher)?;
    } else {
        render(&args, DefaultDispatcher::default())?;
    }

    let elapsed = start.elapsed();
    println!("  Output: {}", args.output.display());
    println!("  Time: {:.2}ms", elapsed.as_secs_f64() * 1000.0);

    Ok(())
}
