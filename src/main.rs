//! # Voxel Terrain Demo Entry Point
//!
//! Runs the headless streaming demo from the library's `run()` function.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release -- [config.json] [ticks]
//! ```

fn main() {
    if let Err(err) = voxel_terrain::run() {
        log::error!("{err}");
        eprintln!("voxel-terrain: {err}");
        std::process::exit(1);
    }
}
