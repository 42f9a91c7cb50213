use crate::domain::{summary::TrackSummary, track::Feature};

const JUKEBOX_TEMPLATE: &str = include_str!("../../html/jukebox.html");

/// What the jukebox page shows for one render
pub struct JukeboxPage<'a> {
    pub player: String,
    pub summary: &'a TrackSummary,
    /// Set when the track was chosen through `?track_id=`
    pub pinned: Option<&'a str>,
    pub x: Feature,
    pub y: Feature,
    /// Inline SVG, when a plot was requested
    pub chart: Option<String>,
}

impl JukeboxPage<'_> {
    pub fn render(&self) -> String {
        let pinned = self
            .pinned
            .map(|id| format!(r#"<input type="hidden" name="track_id" value="{}">"#, escape(id)))
            .unwrap_or_default();

        let attributes = attributes_table(self.summary);
        let x_options = feature_options(self.x);
        let y_options = feature_options(self.y);

        fill_template(JUKEBOX_TEMPLATE, |key| match key {
            "PLAYER" => Some(self.player.as_str()),
            "ATTRIBUTES" => Some(attributes.as_str()),
            "PINNED" => Some(pinned.as_str()),
            "X_OPTIONS" => Some(x_options.as_str()),
            "Y_OPTIONS" => Some(y_options.as_str()),
            "CHART" => Some(self.chart.as_deref().unwrap_or_default()),
            _ => None,
        })
    }
}

/// Substitutes `{{KEY}}` placeholders in a single pass.
///
/// Inserted values are never scanned again; unknown keys are left as they are.
fn fill_template<'a>(template: &str, lookup: impl Fn(&str) -> Option<&'a str>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}").and_then(|end| lookup(&after[..end]).map(|v| (end, v))) {
            Some((end, value)) => {
                out.push_str(value);
                rest = &after[end + 2..];
            }
            None => {
                out.push_str("{{");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Summary columns in display order; the track id is shown by the player instead
pub fn summary_cells(summary: &TrackSummary) -> Vec<(&'static str, String)> {
    let f = &summary.features;
    vec![
        ("track_genres", summary.track_genres.clone()),
        ("coarse_track_genres", summary.coarse_track_genres.clone()),
        ("artists", f.artists.clone()),
        ("album_name", f.album_name.clone()),
        ("track_name", f.track_name.clone()),
        ("popularity", f.popularity.to_string()),
        ("duration_ms", f.duration_ms.to_string()),
        ("explicit", f.explicit.to_string()),
        ("danceability", f.danceability.to_string()),
        ("energy", f.energy.to_string()),
        ("key", f.key.to_string()),
        ("loudness", f.loudness.to_string()),
        ("mode", f.mode.to_string()),
        ("speechiness", f.speechiness.to_string()),
        ("acousticness", f.acousticness.to_string()),
        ("instrumentalness", f.instrumentalness.to_string()),
        ("liveness", f.liveness.to_string()),
        ("valence", f.valence.to_string()),
        ("tempo", f.tempo.to_string()),
        ("time_signature", f.time_signature.to_string()),
    ]
}

fn attributes_table(summary: &TrackSummary) -> String {
    let cells = summary_cells(summary);
    let header: String = cells
        .iter()
        .map(|(name, _)| format!("<th>{name}</th>"))
        .collect();
    let values: String = cells
        .iter()
        .map(|(_, value)| format!("<td>{}</td>", escape(value)))
        .collect();
    format!("<table><tr>{header}</tr><tr>{values}</tr></table>")
}

fn feature_options(selected: Feature) -> String {
    Feature::ALL
        .iter()
        .map(|f| {
            let attr = if *f == selected { " selected" } else { "" };
            format!(r#"<option value="{f}"{attr}>{f}</option>"#)
        })
        .collect()
}

/// Escapes text for use inside HTML elements and quoted attributes
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::track::TrackFeatures;

    fn summary() -> TrackSummary {
        TrackSummary {
            track_id: "T1".to_string(),
            track_genres: "k-pop, j-pop".to_string(),
            coarse_track_genres: "asian".to_string(),
            features: TrackFeatures {
                artists: "Tom & Jerry".to_string(),
                track_name: "<Intro>".to_string(),
                popularity: 12,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape(r#"<a href="x">Tom & 'Jerry'</a>"#), "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_fill_template_single_pass() {
        let filled = fill_template("a {{X}} b {{Y}} {{Z}} {{", |key| match key {
            "X" => Some("{{Y}}"),
            "Y" => Some("y"),
            _ => None,
        });
        assert_eq!(filled, "a {{Y}} b y {{Z}} {{");
    }

    #[test]
    fn test_render_page_keeps_placeholder_like_track_text() {
        let mut summary = summary();
        summary.features.track_name = "{{X_OPTIONS}}".to_string();
        summary.features.album_name = "{{CHART}}".to_string();

        let page = JukeboxPage {
            player: String::new(),
            summary: &summary,
            pinned: None,
            x: Feature::Energy,
            y: Feature::Tempo,
            chart: Some("<svg></svg>".to_string()),
        }
        .render();

        assert!(page.contains("<td>{{X_OPTIONS}}</td>"));
        assert!(page.contains("<td>{{CHART}}</td>"));
        assert_eq!(page.matches("<svg></svg>").count(), 1);
    }

    #[test]
    fn test_summary_cells_order() {
        let cells = summary_cells(&summary());
        assert_eq!(cells.len(), 20);
        assert_eq!(cells[0], ("track_genres", "k-pop, j-pop".to_string()));
        assert_eq!(cells[1], ("coarse_track_genres", "asian".to_string()));
        assert!(cells.iter().all(|(name, _)| *name != "track_id"));
    }

    #[test]
    fn test_render_page_without_chart() {
        let summary = summary();
        let page = JukeboxPage {
            player: "<iframe></iframe>".to_string(),
            summary: &summary,
            pinned: None,
            x: Feature::Energy,
            y: Feature::Tempo,
            chart: None,
        }
        .render();

        assert!(page.contains("<iframe></iframe>"));
        assert!(page.contains("<td>k-pop, j-pop</td>"));
        assert!(page.contains("<td>Tom &amp; Jerry</td>"));
        assert!(page.contains("&lt;Intro&gt;"));
        assert!(page.contains(r#"<option value="energy" selected>energy</option>"#));
        assert!(page.contains(r#"<option value="tempo" selected>tempo</option>"#));
        assert!(!page.contains("{{"));
        assert!(!page.contains("name=\"track_id\""));
    }

    #[test]
    fn test_render_page_pinned_with_chart() {
        let summary = summary();
        let page = JukeboxPage {
            player: String::new(),
            summary: &summary,
            pinned: Some("T1"),
            x: Feature::Popularity,
            y: Feature::Popularity,
            chart: Some("<svg></svg>".to_string()),
        }
        .render();

        assert!(page.contains(r#"<input type="hidden" name="track_id" value="T1">"#));
        assert!(page.contains("<svg></svg>"));
    }
}
