// cli.rs - Command-line interface configuration
use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "particle-backdrop")]
#[command(about = "Animated particle and wireframe background", long_about = None)]
pub struct Cli {
    /// JSON file overriding the default scene parameters
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Seed for scene generation; random when omitted
    #[arg(long)]
    pub seed: Option<u64>,

    /// Run without a window and print the final scene state as JSON
    #[arg(long, default_value = "false")]
    pub headless: bool,

    /// Frames to simulate in headless mode
    #[arg(long, default_value = "60")]
    pub frames: u64,

    /// Simulated time between headless frames, in milliseconds
    #[arg(long = "frame-ms", default_value = "16")]
    pub frame_ms: u64,

    /// Initial viewport width
    #[arg(long, default_value = "800")]
    pub width: u32,

    /// Initial viewport height
    #[arg(long, default_value = "600")]
    pub height: u32,
}
