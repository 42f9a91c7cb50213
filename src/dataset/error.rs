use std::path::PathBuf;

use thiserror::Error;

use crate::domain::{summary::AggregateError, track::TrackId};

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed dataset: {0}")]
    Csv(#[from] csv::Error),

    #[error("download failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("dataset file {} not found", .0.to_string_lossy())]
    Missing(PathBuf),

    #[error("dataset has no tracks")]
    Empty,

    #[error("track {0} not found")]
    TrackNotFound(TrackId),

    #[error("aggregation failed: {0}")]
    Aggregate(#[from] AggregateError),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
