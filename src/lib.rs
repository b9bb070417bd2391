//! Phone wallpapers built from a track or album's cover art.

pub mod app;
pub mod cli;
pub mod color;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod loader;
pub mod metadata;
pub mod quantize;
pub mod renderer;
