use serde::Serialize;
use thiserror::Error;

use super::{
    genre::UNCATEGORIZED,
    track::{TrackFeatures, TrackId, TrackRecord},
};

/// Separator used when joining several genre labels into one cell
pub const GENRE_SEPARATOR: &str = ", ";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AggregateError {
    #[error("no records for track")]
    NoRecords,

    #[error("records belong to different tracks: {first} and {other}")]
    MixedTracks { first: TrackId, other: TrackId },
}

/// All records of one track folded into a single row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackSummary {
    pub track_id: TrackId,
    /// Distinct fine genres, joined with [`GENRE_SEPARATOR`]
    pub track_genres: String,
    /// Distinct coarse categories, joined with [`GENRE_SEPARATOR`]
    pub coarse_track_genres: String,
    #[serde(flatten)]
    pub features: TrackFeatures,
}

impl TrackSummary {
    /// The summary as a single record, with the joined labels as its genre cells
    pub fn as_record(&self) -> TrackRecord {
        TrackRecord {
            track_id: self.track_id.clone(),
            track_genre: self.track_genres.clone(),
            track_genre_coarse: self.coarse_track_genres.clone(),
            features: self.features.clone(),
        }
    }
}

/// Folds all records of a single track into one [`TrackSummary`].
///
/// Labels are joined in the order they are first seen, each once.
/// Uncategorized records add nothing to the coarse column.
/// Feature columns come from the first record; later records are not compared against it.
pub fn aggregate(rows: &[TrackRecord]) -> Result<TrackSummary, AggregateError> {
    let first = rows.first().ok_or(AggregateError::NoRecords)?;

    if let Some(other) = rows.iter().find(|r| r.track_id != first.track_id) {
        return Err(AggregateError::MixedTracks {
            first: first.track_id.clone(),
            other: other.track_id.clone(),
        });
    }

    let genres = distinct(rows.iter().map(|r| r.track_genre.as_str()));
    let coarse = distinct(
        rows.iter()
            .map(|r| r.track_genre_coarse.as_str())
            .filter(|c| *c != UNCATEGORIZED),
    );

    Ok(TrackSummary {
        track_id: first.track_id.clone(),
        track_genres: genres.join(GENRE_SEPARATOR),
        coarse_track_genres: coarse.join(GENRE_SEPARATOR),
        features: first.features.clone(),
    })
}

fn distinct<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen: Vec<&str> = Vec::new();
    for label in labels {
        if !seen.contains(&label) {
            seen.push(label);
        }
    }
    seen
}
