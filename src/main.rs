// main.rs
//
// Export a batch of tiles as binary STL files.
//
//     pathtiles [config.json]
//
// Without a config file the defaults are used: 36 tiles sampled with seed 0,
// written to ./output. Set RUST_LOG=debug for per-stage progress.

use pathtiles::{sample_indices, BatchConfig, TilePipeline, TileResult};
use std::fs;
use std::process::ExitCode;

fn run() -> TileResult<bool> {
    let config = match std::env::args().nth(1) {
        Some(path) => BatchConfig::from_json_file(path)?,
        None => BatchConfig::default(),
    };

    let pipeline = TilePipeline::new(config.tile.clone())?;
    let indices = sample_indices(pipeline.matchings().len(), config.sample_count, config.seed)?;
    fs::create_dir_all(&config.output_dir)?;

    let summary = pipeline.run(&indices, |tile| {
        let path = config.output_dir.join(format!("tile_{:03}.stl", tile.ordinal));
        fs::write(&path, tile.solid.to_stl_binary()?)?;
        log::info!("wrote {} for {}", path.display(), tile.matching);
        Ok(())
    });

    println!("{summary}");
    Ok(summary.is_clean())
}

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(err) => {
            eprintln!("pathtiles: {err}");
            ExitCode::FAILURE
        }
    }
}
