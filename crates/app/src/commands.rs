use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use panscan_core::{AppConfig, ExtractConfig};
use panscan_ocr::recognizer::default_backend;
use panscan_ocr::{initialize_backend, ExtractionPipeline, RunSummary};
use panscan_seed::{write_seed_sql, RemoteSeeder};

#[derive(Args, Debug, Default)]
pub struct ExtractArgs {
    /// Directory containing card images
    #[arg(long)]
    pub images: Option<PathBuf>,

    /// Directory containing one annotation file per image
    #[arg(long)]
    pub labels: Option<PathBuf>,

    /// CSV file to write
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Directory for the processed regions that yielded a value
    #[arg(long)]
    pub debug_dir: Option<PathBuf>,

    /// Number of images processed concurrently
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub workers: Option<u16>,
}

impl ExtractArgs {
    fn apply(self, config: &mut ExtractConfig) {
        if let Some(dir) = self.images {
            config.images_dir = dir;
        }
        if let Some(dir) = self.labels {
            config.labels_dir = dir;
        }
        if let Some(path) = self.output {
            config.output_csv = path;
        }
        if let Some(dir) = self.debug_dir {
            config.debug_dir = dir;
        }
        if let Some(n) = self.workers {
            config.workers = usize::from(n);
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct SeedSqlArgs {
    /// Extracted CSV to read (defaults to the extract output)
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// SQL file to write
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Target table, schema-qualified if needed
    #[arg(long)]
    pub table: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct SeedRemoteArgs {
    /// Extracted CSV to read (defaults to the extract output)
    #[arg(long)]
    pub input: Option<PathBuf>,
}

pub async fn extract(mut config: AppConfig, args: ExtractArgs) -> Result<()> {
    args.apply(&mut config.extract);
    let cfg = config.extract;

    // One engine per run, shared by every worker.
    let (backend, init) = initialize_backend(default_backend).context("OCR engine unavailable")?;
    tracing::info!("OCR engine ready ({init})");

    let pipeline = Arc::new(ExtractionPipeline::new(backend, cfg.debug_dir.clone()));
    let summary = pipeline
        .run(&cfg.images_dir, &cfg.labels_dir, &cfg.output_csv, cfg.workers)
        .await?;

    print_summary(&summary);
    Ok(())
}

pub fn seed_sql(config: AppConfig, args: SeedSqlArgs) -> Result<()> {
    let input = args.input.unwrap_or(config.extract.output_csv);
    let output = args.output.unwrap_or(config.seed.sql_output);
    let table = args.table.unwrap_or(config.seed.table);

    let dataset = panscan_import::read_dataset(&input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    println!("Found {} records.", dataset.len());

    write_seed_sql(&dataset, &table, &output)?;
    println!("SQL file generated at {}", output.display());
    Ok(())
}

pub async fn seed_remote(config: AppConfig, args: SeedRemoteArgs) -> Result<()> {
    let input = args.input.unwrap_or_else(|| config.extract.output_csv.clone());
    let seeder = RemoteSeeder::from_config(&config.seed)?;

    let dataset = panscan_import::read_dataset(&input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    println!("Found {} records in {}.", dataset.len(), input.display());

    let sent = seeder.upsert(&dataset).await?;
    println!("Inserted/updated {sent} records.");
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("Pairs found:      {}", summary.pairs_found);
    println!("Records exported: {}", summary.exported);
    println!("Skipped:          {}", summary.skipped);
    println!("Failed:           {}", summary.failed);
    if let (Some(path), Some(digest)) = (&summary.output_path, &summary.output_digest) {
        println!("Output:           {}", path.display());
        println!("SHA-256:          {digest}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_flags_override_config() {
        let mut cfg = ExtractConfig::default();
        ExtractArgs {
            images: Some("cards".into()),
            workers: Some(4),
            ..ExtractArgs::default()
        }
        .apply(&mut cfg);

        assert_eq!(cfg.images_dir, PathBuf::from("cards"));
        assert_eq!(cfg.workers, 4);
        assert_eq!(cfg.labels_dir, ExtractConfig::default().labels_dir);
    }
}
