use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

/// Spotify track id, e.g. `5SuOikwiRyPMVoIQDJUgSV`
pub type TrackId = String;

/// One row of the dataset: a track tagged with a single fine-grained genre.
///
/// A track tagged with several genres appears in several records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackRecord {
    pub track_id: TrackId,
    pub track_genre: String,
    /// Derived from `track_genre`, empty when uncategorized
    pub track_genre_coarse: String,
    #[serde(flatten)]
    pub features: TrackFeatures,
}

/// Everything about a track except its genre columns
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrackFeatures {
    pub artists: String,
    pub album_name: String,
    pub track_name: String,
    pub popularity: u32,
    pub duration_ms: u64,
    pub explicit: bool,
    pub danceability: f64,
    pub energy: f64,
    pub key: i32,
    pub loudness: f64,
    pub mode: i32,
    pub speechiness: f64,
    pub acousticness: f64,
    pub instrumentalness: f64,
    pub liveness: f64,
    pub valence: f64,
    pub tempo: f64,
    pub time_signature: i32,
}

/// Numeric track attribute that can be put on a chart axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Popularity,
    DurationMs,
    Explicit,
    Danceability,
    Energy,
    Key,
    Loudness,
    Mode,
    Speechiness,
    Acousticness,
    Instrumentalness,
    Liveness,
    Valence,
    Tempo,
    TimeSignature,
}

impl Feature {
    /// In dataset column order
    pub const ALL: [Feature; 15] = [
        Feature::Popularity,
        Feature::DurationMs,
        Feature::Explicit,
        Feature::Danceability,
        Feature::Energy,
        Feature::Key,
        Feature::Loudness,
        Feature::Mode,
        Feature::Speechiness,
        Feature::Acousticness,
        Feature::Instrumentalness,
        Feature::Liveness,
        Feature::Valence,
        Feature::Tempo,
        Feature::TimeSignature,
    ];

    /// Column name in the dataset
    pub fn name(self) -> &'static str {
        match self {
            Feature::Popularity => "popularity",
            Feature::DurationMs => "duration_ms",
            Feature::Explicit => "explicit",
            Feature::Danceability => "danceability",
            Feature::Energy => "energy",
            Feature::Key => "key",
            Feature::Loudness => "loudness",
            Feature::Mode => "mode",
            Feature::Speechiness => "speechiness",
            Feature::Acousticness => "acousticness",
            Feature::Instrumentalness => "instrumentalness",
            Feature::Liveness => "liveness",
            Feature::Valence => "valence",
            Feature::Tempo => "tempo",
            Feature::TimeSignature => "time_signature",
        }
    }

    pub fn value(self, features: &TrackFeatures) -> f64 {
        match self {
            Feature::Popularity => features.popularity as f64,
            Feature::DurationMs => features.duration_ms as f64,
            Feature::Explicit => {
                if features.explicit {
                    1.0
                } else {
                    0.0
                }
            }
            Feature::Danceability => features.danceability,
            Feature::Energy => features.energy,
            Feature::Key => features.key as f64,
            Feature::Loudness => features.loudness,
            Feature::Mode => features.mode as f64,
            Feature::Speechiness => features.speechiness,
            Feature::Acousticness => features.acousticness,
            Feature::Instrumentalness => features.instrumentalness,
            Feature::Liveness => features.liveness,
            Feature::Valence => features.valence,
            Feature::Tempo => features.tempo,
            Feature::TimeSignature => features.time_signature as f64,
        }
    }
}

impl Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown feature '{0}'")]
pub struct UnknownFeature(pub String);

impl FromStr for Feature {
    type Err = UnknownFeature;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Feature::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| UnknownFeature(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_names_round_trip() {
        for feature in Feature::ALL {
            assert_eq!(feature.name().parse::<Feature>(), Ok(feature));
        }
    }

    #[test]
    fn test_unknown_feature() {
        assert_eq!(
            "track_genre".parse::<Feature>(),
            Err(UnknownFeature("track_genre".to_string()))
        );
    }

    #[test]
    fn test_feature_values() {
        let features = TrackFeatures {
            popularity: 73,
            explicit: true,
            tempo: 87.9,
            key: 1,
            ..Default::default()
        };

        assert_eq!(Feature::Popularity.value(&features), 73.0);
        assert_eq!(Feature::Explicit.value(&features), 1.0);
        assert_eq!(Feature::Tempo.value(&features), 87.9);
        assert_eq!(Feature::Key.value(&features), 1.0);
        assert_eq!(Feature::Energy.value(&features), 0.0);
    }
}
