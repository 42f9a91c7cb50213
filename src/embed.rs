use crate::{config::EmbedConfig, http::page::escape};

/// returns url of the embedded player for a track
pub fn embed_url(conf: &EmbedConfig, track_id: &str) -> String {
    let url = conf.base_url.trim_end_matches('/');
    format!("{url}/{track_id}?utm_source=generator")
}

/// returns the iframe element playing the track inline
pub fn embed_iframe(conf: &EmbedConfig, track_id: &str) -> String {
    format!(
        r#"<iframe allowTransparency="true" style="background: #FFFFFF; border-radius:12px;" src="{src}" width="{width}" height="{height}" frameBorder="0" allowfullscreen="" allow="autoplay; clipboard-write; encrypted-media; fullscreen; picture-in-picture" loading="lazy"></iframe>"#,
        src = escape(&embed_url(conf, track_id)),
        width = conf.width,
        height = conf.height,
    )
}
