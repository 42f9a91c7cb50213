use std::{
    collections::HashMap,
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use log::{info, warn};
use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Deserializer, de::Error as _};

use crate::{
    config::DatasetConfig,
    dataset::error::DatasetError,
    domain::{
        genre::{GenreMapping, UNCATEGORIZED},
        summary::{TrackSummary, aggregate},
        track::{TrackFeatures, TrackId, TrackRecord},
    },
};

pub mod error;
pub mod fetch;

/// The classified tracks table, loaded once and read-only afterwards
#[derive(Debug, Default)]
pub struct Dataset {
    records: Vec<TrackRecord>,
    /// track id -> indices into `records`, in file order
    by_track: HashMap<TrackId, Vec<usize>>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct DatasetStats {
    pub rows: usize,
    pub tracks: usize,
    /// Row count per coarse category, in genre table order
    pub categories: Vec<(String, usize)>,
    pub uncategorized: usize,
}

impl Dataset {
    pub fn from_records(records: Vec<TrackRecord>) -> Self {
        let mut by_track: HashMap<TrackId, Vec<usize>> = HashMap::new();
        for (i, record) in records.iter().enumerate() {
            by_track.entry(record.track_id.clone()).or_default().push(i);
        }
        Self { records, by_track }
    }

    /// Parses CSV rows and tags each of them with its coarse genre
    pub fn from_reader<R: Read>(reader: R, mapping: &GenreMapping) -> Result<Self, DatasetError> {
        let mut csv = csv::Reader::from_reader(reader);
        let records = csv
            .deserialize::<CsvRow>()
            .map(|row| Ok(row?.into_record(mapping)))
            .collect::<Result<Vec<_>, DatasetError>>()?;
        Ok(Self::from_records(records))
    }

    pub fn open(path: &Path, mapping: &GenreMapping) -> Result<Self, DatasetError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file), mapping)
    }

    /// Fetches the dataset if it is not on disk yet, then reads and classifies it
    pub fn load(config: &DatasetConfig, mapping: &GenreMapping) -> Result<Self, DatasetError> {
        let path = fetch::ensure_present(config, false)?;
        let dataset = Self::open(&path, mapping)?;
        info!(
            "loaded {} rows ({} tracks) from {}",
            dataset.len(),
            dataset.track_count(),
            path.to_string_lossy()
        );
        if dataset.is_empty() {
            warn!("dataset {} has no rows", path.to_string_lossy());
        }
        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn track_count(&self) -> usize {
        self.by_track.len()
    }

    pub fn records(&self) -> &[TrackRecord] {
        &self.records
    }

    pub fn contains(&self, track_id: &str) -> bool {
        self.by_track.contains_key(track_id)
    }

    /// Every row tagged with `track_id`, in file order
    pub fn rows_for(&self, track_id: &str) -> Vec<TrackRecord> {
        self.by_track
            .get(track_id)
            .map(|indices| indices.iter().map(|&i| self.records[i].clone()).collect())
            .unwrap_or_default()
    }

    pub fn summarize(&self, track_id: &str) -> Result<TrackSummary, DatasetError> {
        let rows = self.rows_for(track_id);
        if rows.is_empty() {
            return Err(DatasetError::TrackNotFound(track_id.to_string()));
        }
        Ok(aggregate(&rows)?)
    }

    /// Picks a random row and returns its track id.
    ///
    /// Tracks tagged with several genres are proportionally more likely.
    pub fn random_track_id<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<TrackId, DatasetError> {
        self.records
            .choose(rng)
            .map(|r| r.track_id.clone())
            .ok_or(DatasetError::Empty)
    }

    pub fn stats(&self, mapping: &GenreMapping) -> DatasetStats {
        let mut categories: Vec<(String, usize)> =
            mapping.categories().map(|c| (c.to_string(), 0)).collect();
        let mut uncategorized = 0;

        for record in &self.records {
            if record.track_genre_coarse == UNCATEGORIZED {
                uncategorized += 1;
                continue;
            }
            if let Some((_, count)) = categories
                .iter_mut()
                .find(|(name, _)| *name == record.track_genre_coarse)
            {
                *count += 1;
            }
        }

        DatasetStats {
            rows: self.len(),
            tracks: self.track_count(),
            categories,
            uncategorized,
        }
    }
}

/// One line of the Spotify tracks CSV.
///
/// The leading unnamed index column is ignored.
#[derive(Debug, Deserialize)]
struct CsvRow {
    track_id: String,
    artists: String,
    album_name: String,
    track_name: String,
    popularity: u32,
    duration_ms: u64,
    #[serde(deserialize_with = "loose_bool")]
    explicit: bool,
    danceability: f64,
    energy: f64,
    key: i32,
    loudness: f64,
    mode: i32,
    speechiness: f64,
    acousticness: f64,
    instrumentalness: f64,
    liveness: f64,
    valence: f64,
    tempo: f64,
    time_signature: i32,
    track_genre: String,
}

impl CsvRow {
    fn into_record(self, mapping: &GenreMapping) -> TrackRecord {
        let track_genre_coarse = mapping.classify(&self.track_genre).to_string();
        TrackRecord {
            track_id: self.track_id,
            track_genre: self.track_genre,
            track_genre_coarse,
            features: TrackFeatures {
                artists: self.artists,
                album_name: self.album_name,
                track_name: self.track_name,
                popularity: self.popularity,
                duration_ms: self.duration_ms,
                explicit: self.explicit,
                danceability: self.danceability,
                energy: self.energy,
                key: self.key,
                loudness: self.loudness,
                mode: self.mode,
                speechiness: self.speechiness,
                acousticness: self.acousticness,
                instrumentalness: self.instrumentalness,
                liveness: self.liveness,
                valence: self.valence,
                tempo: self.tempo,
                time_signature: self.time_signature,
            },
        }
    }
}

/// The dataset writes booleans as `True`/`False`
fn loose_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let s = String::deserialize(deserializer)?;
    match s.as_str() {
        "True" | "true" | "1" => Ok(true),
        "False" | "false" | "0" => Ok(false),
        other => Err(D::Error::custom(format!("invalid boolean '{other}'"))),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};
    use std::{collections::HashSet, fs};
    use tempfile::tempdir;

    pub const HEADER: &str = ",track_id,artists,album_name,track_name,popularity,duration_ms,explicit,danceability,energy,key,loudness,mode,speechiness,acousticness,instrumentalness,liveness,valence,tempo,time_signature,track_genre";

    pub fn sample_csv() -> String {
        [
            HEADER,
            "0,T1,Artist A,Album A,Song A,73,230666,False,0.676,0.461,1,-6.746,0,0.143,0.0322,1.01e-06,0.358,0.715,87.917,4,k-pop",
            "1,T1,Artist A,Album A,Song A,73,230666,False,0.676,0.461,1,-6.746,0,0.143,0.0322,1.01e-06,0.358,0.715,87.917,4,j-pop",
            "2,T2,Artist B,Album B,1999,55,149610,True,0.42,0.166,1,-17.235,1,0.0763,0.924,5.56e-06,0.101,0.267,77.489,4,punk",
            "3,T3,\"Artist C;Artist D\",Album C,\"Song, With Comma\",57,210826,False,0.438,0.359,0,-9.734,1,0.0557,0.21,0,0.117,0.12,76.332,4,polka",
        ]
        .join("\n")
    }

    pub fn sample_dataset() -> Dataset {
        Dataset::from_reader(sample_csv().as_bytes(), &GenreMapping::default()).unwrap()
    }

    #[test]
    fn test_from_reader_parses_and_classifies() -> anyhow::Result<()> {
        let dataset = Dataset::from_reader(sample_csv().as_bytes(), &GenreMapping::default())?;

        assert_eq!(dataset.len(), 4);
        assert_eq!(dataset.track_count(), 3);

        let coarse: Vec<_> = dataset
            .records()
            .iter()
            .map(|r| r.track_genre_coarse.as_str())
            .collect();
        assert_eq!(coarse, vec!["asian", "asian", "rock", ""]);

        let t2 = &dataset.records()[2];
        assert!(t2.features.explicit);
        assert_eq!(t2.features.track_name, "1999");
        assert_eq!(t2.features.popularity, 55);

        let t3 = &dataset.records()[3];
        assert_eq!(t3.features.track_name, "Song, With Comma");
        assert_eq!(t3.features.instrumentalness, 0.0);

        Ok(())
    }

    #[test]
    fn test_from_reader_without_index_column() -> anyhow::Result<()> {
        let csv = "track_id,artists,album_name,track_name,popularity,duration_ms,explicit,danceability,energy,key,loudness,mode,speechiness,acousticness,instrumentalness,liveness,valence,tempo,time_signature,track_genre\n\
                   T9,A,B,C,1,2,false,0.1,0.2,3,-4.0,1,0.5,0.6,0.7,0.8,0.9,100.0,4,techno";
        let dataset = Dataset::from_reader(csv.as_bytes(), &GenreMapping::default())?;

        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.records()[0].track_genre_coarse, "techno");

        Ok(())
    }

    #[test]
    fn test_from_reader_malformed_row_fails() {
        let csv = format!("{HEADER}\n0,T1,A,B,C,not-a-number,1,False,0,0,0,0,0,0,0,0,0,0,0,4,rock");
        let result = Dataset::from_reader(csv.as_bytes(), &GenreMapping::default());
        assert!(matches!(result, Err(DatasetError::Csv(_))));
    }

    #[test]
    fn test_from_reader_invalid_bool_fails() {
        let csv = format!("{HEADER}\n0,T1,A,B,C,1,1,maybe,0,0,0,0,0,0,0,0,0,0,0,4,rock");
        let result = Dataset::from_reader(csv.as_bytes(), &GenreMapping::default());
        assert!(matches!(result, Err(DatasetError::Csv(_))));
    }

    #[test]
    fn test_open_from_file() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("spotify-dataset.csv");
        fs::write(&path, sample_csv())?;

        let dataset = Dataset::open(&path, &GenreMapping::default())?;
        assert_eq!(dataset.len(), 4);

        Ok(())
    }

    #[test]
    fn test_load_local_missing_file() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let cfg = DatasetConfig {
            path: dir.path().join("missing.csv"),
            source: Default::default(),
            refresh: false,
        };

        let result = Dataset::load(&cfg, &GenreMapping::default());
        assert!(matches!(result, Err(DatasetError::Missing(_))));

        Ok(())
    }

    #[test]
    fn test_rows_for_and_contains() {
        let dataset = sample_dataset();

        assert!(dataset.contains("T1"));
        assert!(!dataset.contains("T404"));

        let rows = dataset.rows_for("T1");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].track_genre, "k-pop");
        assert_eq!(rows[1].track_genre, "j-pop");

        assert!(dataset.rows_for("T404").is_empty());
    }

    #[test]
    fn test_summarize_multi_genre_track() -> anyhow::Result<()> {
        let summary = sample_dataset().summarize("T1")?;

        let genres: HashSet<_> = summary.track_genres.split(", ").collect();
        assert_eq!(genres, HashSet::from(["k-pop", "j-pop"]));
        assert_eq!(summary.coarse_track_genres, "asian");
        assert_eq!(summary.features.track_name, "Song A");

        Ok(())
    }

    #[test]
    fn test_summarize_unknown_track() {
        let result = sample_dataset().summarize("T404");
        assert!(matches!(result, Err(DatasetError::TrackNotFound(id)) if id == "T404"));
    }

    #[test]
    fn test_random_track_id_is_from_dataset() -> anyhow::Result<()> {
        let dataset = sample_dataset();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..50 {
            let id = dataset.random_track_id(&mut rng)?;
            assert!(dataset.contains(&id));
        }

        Ok(())
    }

    #[test]
    fn test_random_track_id_empty_dataset() {
        let dataset = Dataset::default();
        let mut rng = StdRng::seed_from_u64(7);
        assert!(matches!(
            dataset.random_track_id(&mut rng),
            Err(DatasetError::Empty)
        ));
    }

    #[test]
    fn test_stats() {
        let stats = sample_dataset().stats(&GenreMapping::default());

        assert_eq!(stats.rows, 4);
        assert_eq!(stats.tracks, 3);
        assert_eq!(stats.uncategorized, 1);
        assert_eq!(stats.categories.len(), 11);
        assert_eq!(stats.categories[0], ("rock".to_string(), 1));
        assert!(stats.categories.contains(&("asian".to_string(), 2)));
        assert!(stats.categories.contains(&("metal".to_string(), 0)));
    }
}
