use std::fmt::Write as _;
use std::path::Path;

use panscan_core::Dataset;

use crate::SeedError;

/// Render `dataset` as one idempotent bulk insert into `table`.
///
/// Existing identifiers are left untouched (`ON CONFLICT DO NOTHING`). An
/// empty dataset yields only the header comment.
pub fn generate_seed_sql(dataset: &Dataset, table: &str) -> String {
    let mut sql = format!("-- Seed data for {table}\n");
    if dataset.is_empty() {
        return sql;
    }

    let _ = writeln!(sql, "INSERT INTO {table} (pan_number, full_name) VALUES");
    let values: Vec<String> = dataset
        .iter()
        .map(|r| format!("('{}', '{}')", quote(r.identifier()), quote(r.name())))
        .collect();
    sql.push_str(&values.join(",\n"));
    sql.push_str("\nON CONFLICT (pan_number) DO NOTHING;\n");
    sql
}

/// Write the seed script for `dataset` to `path`, creating parent directories.
pub fn write_seed_sql(dataset: &Dataset, table: &str, path: &Path) -> Result<(), SeedError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, generate_seed_sql(dataset, table))?;
    tracing::info!("SQL file generated at {} ({} records)", path.display(), dataset.len());
    Ok(())
}

fn quote(value: &str) -> String {
    value.replace('\'', "''")
}
