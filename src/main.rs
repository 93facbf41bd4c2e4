// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use exposure_kernels::BackendKind;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "exposure-kernels")]
#[command(about = "Luminance adaptation and filter position kernels")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    /// Config file (default: <config dir>/exposure-kernels/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run auto exposure over images as consecutive frames
    Analyze {
        /// HDR frames in playback order
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// auto, cpu or gpu (default: from config)
        #[arg(short, long)]
        backend: Option<BackendKind>,

        /// Seconds between frames (default: from config)
        #[arg(short, long)]
        frame_time: Option<f32>,
    },

    /// Print the 256-bin log-luminance histogram of an image
    Histogram {
        image: PathBuf,

        #[arg(short, long)]
        backend: Option<BackendKind>,

        /// Write the average, exposure and over-bright pixels as text
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Animate an identity filter position field toward a zoomed one
    Warp {
        #[arg(long, default_value = "64")]
        width: u32,

        #[arg(long, default_value = "48")]
        height: u32,

        /// Number of interpolation steps
        #[arg(short, long, default_value = "10")]
        steps: u32,

        /// Interpolation factor per step
        #[arg(short, long, default_value = "0.1")]
        lerp: f32,

        /// Scale of the destination field
        #[arg(short, long, default_value = "0.5")]
        zoom: f32,

        #[arg(short, long)]
        backend: Option<BackendKind>,

        /// Write the final positions as text
        #[arg(long)]
        dump: Option<PathBuf>,
    },

    /// Show the GPU adapter the GPU backend would use
    Info,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=exposure_kernels=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Analyze {
            images,
            backend,
            frame_time,
        } => cli::analyze(config, &images, backend, frame_time)?,
        Commands::Histogram {
            image,
            backend,
            report,
        } => cli::histogram(config, &image, backend, report.as_deref())?,
        Commands::Warp {
            width,
            height,
            steps,
            lerp,
            zoom,
            backend,
            dump,
        } => cli::warp(
            config,
            cli::WarpOptions {
                width,
                height,
                steps,
                lerp,
                zoom,
                backend,
                dump,
            },
        )?,
        Commands::Info => cli::info()?,
    }

    Ok(())
}
