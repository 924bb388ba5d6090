pub mod backdrop;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod math;
pub mod render;
pub mod scene;
pub mod simulation;
pub mod window;

pub use backdrop::{Backdrop, Lifecycle};
pub use config::BackdropConfig;
pub use error::{BackdropError, Result};
pub use simulation::Simulation;
