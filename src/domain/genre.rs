use serde::Deserialize;

/// Fine-grained Spotify genre labels grouped into eleven coarse categories.
///
/// Order matters: classification scans categories top to bottom.
const SPOTIFY_GENRES: &[(&str, &[&str])] = &[
    (
        "rock",
        &[
            "alt-rock",
            "alternative",
            "emo",
            "grunge",
            "hard-rock",
            "indie",
            "psych-rock",
            "punk-rock",
            "punk",
            "rock-n-roll",
            "rock",
            "rockabilly",
        ],
    ),
    (
        "jazz-blues",
        &[
            "bluegrass",
            "blues",
            "country",
            "folk",
            "gospel",
            "honky-tonk",
            "guitar",
            "reggae",
            "reggaeton",
            "soul",
            "jazz",
        ],
    ),
    (
        "groovy",
        &[
            "dance", "dancehall", "disco", "funk", "groove", "party", "r-n-b", "hip-hop",
            "trip-hop",
        ],
    ),
    (
        "pop",
        &[
            "british",
            "french",
            "german",
            "happy",
            "indie-pop",
            "pop-film",
            "pop",
            "power-pop",
            "show-tunes",
            "singer-songwriter",
            "songwriter",
            "spanish",
            "swedish",
            "synth-pop",
        ],
    ),
    (
        "asian",
        &[
            "anime", "cantopop", "j-dance", "j-idol", "j-pop", "j-rock", "k-pop", "malay",
            "mandopop",
        ],
    ),
    (
        "latin",
        &[
            "brazil",
            "forro",
            "latin",
            "latino",
            "mpb",
            "pagode",
            "salsa",
            "samba",
            "sertanejo",
            "ska",
            "tango",
        ],
    ),
    (
        "metal",
        &[
            "black-metal",
            "death-metal",
            "goth",
            "grindcore",
            "hardcore",
            "hardstyle",
            "heavy-metal",
            "metal",
            "metalcore",
        ],
    ),
    (
        "electronic",
        &[
            "club",
            "deep-house",
            "drum-and-bass",
            "dub",
            "dubstep",
            "edm",
            "electro",
            "electronic",
            "garage",
            "house",
            "trance",
        ],
    ),
    (
        "techno",
        &[
            "breakbeat",
            "chicago-house",
            "detroit-techno",
            "idm",
            "industrial",
            "minimal-techno",
            "progressive-house",
            "techno",
        ],
    ),
    (
        "ambient-classical",
        &[
            "ambient",
            "chill",
            "new-age",
            "sleep",
            "study",
            "acoustic",
            "classical",
            "opera",
            "piano",
        ],
    ),
    (
        "misc",
        &[
            "afrobeat",
            "indian",
            "iranian",
            "turkish",
            "world-music",
            "children",
            "comedy",
            "disney",
            "kids",
            "romance",
            "sad",
        ],
    ),
];

/// Returned by [`GenreMapping::classify`] for labels no category lists.
pub const UNCATEGORIZED: &str = "";

/// A coarse category together with the fine labels that fall into it
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GenreCategory {
    pub name: String,
    pub labels: Vec<String>,
}

/// Ordered lookup table from fine-grained genre labels to coarse categories.
///
/// Built once at startup and handed to whoever needs to classify.
/// `Default` gives the built-in Spotify table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenreMapping {
    categories: Vec<GenreCategory>,
}

impl GenreMapping {
    pub fn new<C, L, I>(entries: impl IntoIterator<Item = (C, I)>) -> Self
    where
        C: Into<String>,
        L: Into<String>,
        I: IntoIterator<Item = L>,
    {
        let categories = entries
            .into_iter()
            .map(|(name, labels)| GenreCategory {
                name: name.into(),
                labels: labels.into_iter().map(Into::into).collect(),
            })
            .collect();
        Self { categories }
    }

    pub fn from_categories(categories: Vec<GenreCategory>) -> Self {
        Self { categories }
    }

    /// Coarse category of `label`, or [`UNCATEGORIZED`] if no category lists it.
    ///
    /// If a label is listed under several categories the first one in table order wins.
    pub fn classify(&self, label: &str) -> &str {
        self.categories
            .iter()
            .find(|category| category.labels.iter().any(|l| l == label))
            .map(|category| category.name.as_str())
            .unwrap_or(UNCATEGORIZED)
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Labels listed under more than one category, with every category listing them.
    pub fn ambiguous_labels(&self) -> Vec<(&str, Vec<&str>)> {
        let mut result: Vec<(&str, Vec<&str>)> = Vec::new();
        for category in &self.categories {
            for label in &category.labels {
                let name = category.name.as_str();
                match result.iter().position(|(l, _)| *l == label.as_str()) {
                    Some(i) => {
                        let owners = &mut result[i].1;
                        if !owners.contains(&name) {
                            owners.push(name)
                        }
                    }
                    None => result.push((label.as_str(), vec![name])),
                }
            }
        }
        result.retain(|(_, owners)| owners.len() > 1);
        result
    }
}

impl Default for GenreMapping {
    fn default() -> Self {
        Self::new(
            SPOTIFY_GENRES
                .iter()
                .map(|(name, labels)| (*name, labels.iter().copied())),
        )
    }
}
