pub mod remote;
pub mod sql;

pub use remote::RemoteSeeder;
pub use sql::{generate_seed_sql, write_seed_sql};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("No remote URL configured")]
    MissingUrl,
    #[error("API key not set; export it as {0}")]
    MissingApiKey(String),
    #[error("Remote rejected seed data with status {status}: {body}")]
    Rejected { status: u16, body: String },
}
