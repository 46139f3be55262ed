//! QRLME batch benchmark: generate a dataset or time encrypt/decrypt over it.

use chrono::Local;
use qrlme_core::{pipeline, BatchPipeline, Config, DatasetSpec};
use rand::thread_rng;
use std::error::Error;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cfg = Config::from_env()?;
    let mut args = std::env::args().skip(1);
    let command = args.next().unwrap_or_else(|| "run".into());
    let dir = args
        .next()
        .map_or_else(|| cfg.dataset_dir.clone(), PathBuf::from);
    let mut rng = thread_rng();

    match command.as_str() {
        "generate" => {
            let spec = DatasetSpec {
                folder: dir,
                ..DatasetSpec::default()
            };
            let files = spec.generate(&mut rng)?;
            for path in &files {
                println!("File '{}' created.", path.display());
            }
        }
        "run" => {
            let codec = cfg.codec()?;
            info!(
                moduli = ?codec.moduli(),
                key = codec.key(),
                strategy = ?codec.strategy(),
                "codec ready"
            );
            let batch = BatchPipeline::new(codec, cfg.pipeline_options());
            let results = batch.process_directory(&dir, &mut rng)?;

            for r in &results {
                println!(
                    "File: {}, Size: {} bytes, Encryption Time: {:.5} seconds, Decryption Time: {:.5} seconds",
                    r.file_name, r.file_size, r.encryption_time, r.decryption_time
                );
            }

            let path = pipeline::save_results_csv(&results, &cfg.output_dir, &Local::now())?;
            println!("\nResults saved to {}", path.display());
        }
        other => {
            eprintln!("usage: qrlme [run|generate] [DIR]");
            return Err(format!("unknown command {other:?}").into());
        }
    }
    Ok(())
}
