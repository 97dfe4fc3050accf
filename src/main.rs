//! Chitra CLI - Per-pixel Video Filters
//!
//! This is a demonstration CLI for the chitra library. It replays a still
//! image as a video feed, runs the frame loop against it and reports the
//! frames-per-second telemetry.

use anyhow::{bail, Context, Result};
use chitra::prelude::*;

fn main() {
    env_logger::init();

    println!("Chitra - Per-pixel Video Filters v{}", chitra::VERSION);
    println!();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage(&args[0]);
        return;
    }

    match args[1].as_str() {
        "list" => list_filters(),
        "info" => {
            if args.len() < 3 {
                eprintln!("Error: Please specify a filter ID");
                return;
            }
            filter_info(&args[2]);
        }
        "run" => {
            if args.len() < 3 {
                eprintln!("Error: Please specify an input image");
                eprintln!(
                    "Usage: {} run <input> [--filter <id>] [--backend cpu|gpu] [--frames <n>]",
                    args[0]
                );
                return;
            }
            if let Err(e) = run_stream(&args[2..]) {
                eprintln!("Error: {e:#}");
                std::process::exit(1);
            }
        }
        "help" | "--help" | "-h" => print_usage(&args[0]),
        _ => {
            eprintln!("Unknown command: {}", args[1]);
            print_usage(&args[0]);
        }
    }
}

fn print_usage(program: &str) {
    println!("Usage: {} <command> [options]", program);
    println!();
    println!("Commands:");
    println!("  list              List all available filters");
    println!("  info <filter>     Show a filter's default configuration");
    println!("  run <input> [options]  Replay an image as a feed and filter it");
    println!("  help              Show this help message");
    println!();
    println!("Run options:");
    println!("  --filter <id>       Filter to apply (default: blue_cast)");
    println!("  --backend cpu|gpu   Execution backend (default: cpu)");
    println!("  --frames <n>        Number of frames to render (default: 30)");
    println!("  --radius <r>        Light-tunnel radius");
    println!("  --sigma <s>         Gaussian sigma (derives the 5x5 weights)");
    println!("  --mirror            Treat the feed as mirrored");
    println!("  --disabled          Run with the filter toggled off");
    println!("  --config <path>     Load a JSON FilterConfig (overrides flags)");
    println!("  --output <path>     Where to save the last frame (default: out.png)");
}

fn list_filters() {
    println!("Available filters ({} total):", CATALOG.len());
    println!();
    for info in CATALOG {
        println!("  {} - {}", info.id, info.description);
    }
}

fn filter_info(filter_id: &str) {
    match FilterKind::from_id(filter_id) {
        Some(kind) => {
            let config = FilterConfig::new(kind);
            let description = CATALOG
                .iter()
                .find(|info| info.id == filter_id)
                .map(|info| info.description)
                .unwrap_or_default();
            println!("Filter: {}", filter_id);
            println!("  {}", description);
            println!();
            println!("Default configuration (JSON):");
            match serde_json::to_string_pretty(&config) {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("  <serialization failed: {e}>"),
            }
        }
        None => {
            eprintln!("Filter not found: {}", filter_id);
            eprintln!("Use 'list' to see available filters.");
        }
    }
}

struct RunOptions {
    input: String,
    filter_id: String,
    backend: ExecutionMode,
    frames: u64,
    radius: Option<f32>,
    sigma: Option<f32>,
    mirror: bool,
    disabled: bool,
    config_path: Option<String>,
    output: String,
}

fn parse_run_options(args: &[String]) -> Result<RunOptions> {
    let mut options = RunOptions {
        input: args[0].clone(),
        filter_id: "blue_cast".to_string(),
        backend: ExecutionMode::Cpu,
        frames: 30,
        radius: None,
        sigma: None,
        mirror: false,
        disabled: false,
        config_path: None,
        output: "out.png".to_string(),
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--filter" if i + 1 < args.len() => {
                options.filter_id = args[i + 1].clone();
                i += 2;
            }
            "--backend" if i + 1 < args.len() => {
                options.backend = match args[i + 1].as_str() {
                    "cpu" => ExecutionMode::Cpu,
                    "gpu" => ExecutionMode::Gpu,
                    other => bail!("unknown backend '{other}', expected cpu or gpu"),
                };
                i += 2;
            }
            "--frames" if i + 1 < args.len() => {
                options.frames = args[i + 1]
                    .parse()
                    .with_context(|| format!("invalid frame count '{}'", args[i + 1]))?;
                i += 2;
            }
            "--radius" if i + 1 < args.len() => {
                options.radius = Some(
                    args[i + 1]
                        .parse()
                        .with_context(|| format!("invalid radius '{}'", args[i + 1]))?,
                );
                i += 2;
            }
            "--sigma" if i + 1 < args.len() => {
                options.sigma = Some(
                    args[i + 1]
                        .parse()
                        .with_context(|| format!("invalid sigma '{}'", args[i + 1]))?,
                );
                i += 2;
            }
            "--mirror" => {
                options.mirror = true;
                i += 1;
            }
            "--disabled" => {
                options.disabled = true;
                i += 1;
            }
            "--config" if i + 1 < args.len() => {
                options.config_path = Some(args[i + 1].clone());
                i += 2;
            }
            "--output" if i + 1 < args.len() => {
                options.output = args[i + 1].clone();
                i += 2;
            }
            other => bail!("unknown option '{other}'"),
        }
    }
    Ok(options)
}

fn build_config(options: &RunOptions) -> Result<FilterConfig> {
    if let Some(path) = &options.config_path {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {path}"))?;
        let config: FilterConfig =
            serde_json::from_str(&json).with_context(|| format!("parsing config file {path}"))?;
        return Ok(config);
    }

    let mut kind = FilterKind::from_id(&options.filter_id)
        .with_context(|| format!("unknown filter '{}'", options.filter_id))?;
    if let (Some(r), FilterKind::LightTunnel { radius }) = (options.radius, &mut kind) {
        *radius = r;
    }
    if let (Some(s), FilterKind::Gaussian { weights }) = (options.sigma, &mut kind) {
        *weights = GaussianWeights::from_sigma(s);
    }
    Ok(FilterConfig::new(kind)
        .with_backend(options.backend)
        .with_enabled(!options.disabled))
}

fn run_stream(args: &[String]) -> Result<()> {
    let options = parse_run_options(args)?;
    let config = build_config(&options)?;

    let source = ImageSource::from_path(&options.input, options.mirror)
        .with_context(|| format!("loading {}", options.input))?;
    let (width, height) = source.dimensions();

    config
        .validate(height, width)
        .with_context(|| format!("configuration invalid for a {width}x{height} feed"))?;

    println!(
        "Streaming {} ({}x{}) through '{}' on the {} backend...",
        options.input,
        width,
        height,
        config.kind.id(),
        config.backend,
    );

    let mut frame_loop = FrameLoop::new(source, LastFramePresenter::new(), config)
        .with_observer(Box::new(|update: FrameUpdate| {
            if update.skipped.is_none() && update.frame % 10 == 0 {
                println!("  frame {}: {:.0} fps", update.frame, update.fps);
            }
        }));

    let stats = frame_loop.run(options.frames)?;
    println!(
        "Rendered {} frames in {:.1?} ({:.0} fps at the last frame)",
        stats.frames_rendered, stats.total_duration, stats.last_fps,
    );

    if let Some(last) = frame_loop.presenter_mut().take_last() {
        last.save(&options.output)
            .with_context(|| format!("saving {}", options.output))?;
        println!("Last frame saved to: {}", options.output);
    }
    Ok(())
}
