use anyhow::Result;
use clap::Parser;
use noiseplane::context::AppContext;
use noiseplane::metrics::FrameMetrics;
use noiseplane::noise::SimplexSampler;
use noiseplane::params::Params;
use noiseplane::scene::HeadlessScene;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "noiseplane", about = "Noise-displaced wireframe plane, animated in real time")]
struct Cli {
    /// Plane extent and segment count per axis (1..=25).
    #[arg(long, default_value_t = 15)]
    plane_size: u32,

    /// Displacement amplitude (-2..=2).
    #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
    amplitude: f32,

    /// Animation speed multiplier (-2..=2).
    #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
    time_scale: f32,

    /// Noise sampling resolution (0..=0.2).
    #[arg(long, default_value_t = 0.1)]
    resolution: f32,

    /// Noise seed. Random if omitted.
    #[arg(long)]
    seed: Option<u32>,

    /// Frames to run in headless mode.
    #[arg(long, default_value_t = 600)]
    frames: u64,

    /// Initial viewport width.
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Initial viewport height.
    #[arg(long, default_value_t = 800)]
    height: u32,

    /// Run in benchmark mode: suppress CSV, print throughput stats.
    #[arg(long)]
    benchmark: bool,

    /// Launch live visualization window (requires --features viz).
    #[cfg(feature = "viz")]
    #[arg(long)]
    live: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let params = Params {
        plane_size: cli.plane_size,
        amplitude: cli.amplitude,
        time_scale: cli.time_scale,
        resolution: cli.resolution,
    }
    .clamped();
    let sampler = match cli.seed {
        Some(seed) => SimplexSampler::new(seed),
        None => SimplexSampler::random(),
    };
    info!(seed = sampler.seed(), ?params, "starting");

    #[cfg(feature = "viz")]
    if cli.live {
        noiseplane::viz::run_viz(params, sampler, cli.width, cli.height);
        return Ok(());
    }

    if cli.benchmark {
        run_benchmark(params, sampler, &cli)
    } else {
        run_headless(params, sampler, &cli)
    }
}

fn run_headless(params: Params, sampler: SimplexSampler, cli: &Cli) -> Result<()> {
    let scene = HeadlessScene::new(cli.width, cli.height);
    let mut ctx = AppContext::new(params, scene, sampler, cli.width, cli.height);

    println!("{}", FrameMetrics::CSV_HEADER);
    ctx.run(cli.frames, |m, scene| {
        println!("{}", m.csv_row(scene.live_buffers()));
    })?;
    ctx.stop();
    Ok(())
}

fn run_benchmark(params: Params, sampler: SimplexSampler, cli: &Cli) -> Result<()> {
    let scene = HeadlessScene::new(cli.width, cli.height);
    let mut ctx = AppContext::new(params, scene, sampler, cli.width, cli.height);

    let start = std::time::Instant::now();
    let mut vertices = 0u64;
    let frames = ctx.run(cli.frames, |m, _| vertices += m.vertex_count as u64)?;
    let elapsed = start.elapsed();

    let frames_per_sec = frames as f64 / elapsed.as_secs_f64();
    let vertices_per_sec = vertices as f64 / elapsed.as_secs_f64();
    info!(
        frames,
        plane_size = params.plane_size,
        elapsed = ?elapsed,
        frames_per_sec = %format!("{frames_per_sec:.1}"),
        vertices_per_sec = %format!("{vertices_per_sec:.0}"),
        live_buffers = ctx.scene().live_buffers(),
        live_bytes = ctx.scene().live_bytes(),
        "benchmark results"
    );
    ctx.stop();
    Ok(())
}
