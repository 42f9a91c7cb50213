use anyhow::anyhow;
use log::info;
use rand::rngs::StdRng;
use rouille::{Request, Response};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

use crate::{
    config::{Config, EmbedConfig, HttpConfig, PlotConfig},
    dataset::{Dataset, error::DatasetError},
    domain::{genre::GenreMapping, summary::TrackSummary, track::Feature, track::TrackId},
    embed::embed_iframe,
    http::{error::ApiError, page::JukeboxPage},
    plot::render_scatter,
};

/// The track currently on the jukebox, held until someone re-rolls
pub struct Jukebox {
    current: TrackId,
    rng: StdRng,
}

impl Jukebox {
    /// Starts with a random track
    pub fn new(dataset: &Dataset, mut rng: StdRng) -> Result<Self, DatasetError> {
        let current = dataset.random_track_id(&mut rng)?;
        Ok(Self { current, rng })
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn reroll(&mut self, dataset: &Dataset) -> Result<&str, DatasetError> {
        self.current = dataset.random_track_id(&mut self.rng)?;
        Ok(&self.current)
    }
}

pub struct HttpServer {
    dataset: Arc<Dataset>,
    mapping: GenreMapping,
    jukebox: Mutex<Jukebox>,
    embed: EmbedConfig,
    plot: PlotConfig,
    pub config: HttpConfig,
}

impl HttpServer {
    pub fn new(dataset: Arc<Dataset>, mapping: GenreMapping, jukebox: Jukebox, config: &Config) -> Self {
        Self {
            dataset,
            mapping,
            jukebox: Mutex::new(jukebox),
            embed: config.embed.clone(),
            plot: config.plot,
            config: config.http.clone(),
        }
    }

    pub fn run(self) {
        let addr = format!("{}:{}", self.config.bind_addr, self.config.port);
        rouille::start_server(addr, move |request| self.handle_request(request));
    }

    fn handle_request(&self, request: &Request) -> Response {
        Self::log_request(request);

        let result = rouille::router!(request,
            (GET) (/) => {
                self.handle_index(request)
            },
            (POST) (/reroll) => {
                self.handle_reroll()
            },
            (GET) (/plot) => {
                self.handle_plot(request)
            },
            (GET) (/api/track) => {
                self.handle_current_track()
            },
            (GET) (/api/tracks/{id: String}) => {
                self.handle_get_track(&id)
            },
            (GET) (/api/classify/{genre: String}) => {
                Ok(self.handle_classify(genre))
            },
            (GET) (/api/features) => {
                Ok(Self::handle_features())
            },
            _ => Ok(Response::empty_404())
        );

        let response = result.unwrap_or_else(ApiError::into_response);
        info!("Response: {} {}", request.method(), response.status_code);
        response
    }

    fn log_request(request: &Request) {
        info!("{} {}", request.method(), request.url());
    }

    fn current_track(&self) -> Result<TrackId, ApiError> {
        let jukebox = self.jukebox.lock().map_err(|e| {
            DatasetError::Internal(anyhow!("Could not access jukebox state under lock: {e}"))
        })?;
        Ok(jukebox.current().to_string())
    }

    /// `?track_id=` when given and known, the jukebox track otherwise
    fn requested_track(&self, request: &Request) -> Result<(TrackId, bool), ApiError> {
        match request.get_param("track_id") {
            Some(id) if self.dataset.contains(&id) => Ok((id, true)),
            Some(id) => Err(DatasetError::TrackNotFound(id).into()),
            None => Ok((self.current_track()?, false)),
        }
    }

    fn feature_param(request: &Request, name: &str) -> Result<Feature, ApiError> {
        match request.get_param(name) {
            Some(value) => Ok(value.parse::<Feature>()?),
            None => Ok(Feature::ALL[0]),
        }
    }

    fn scatter(&self, x: Feature, y: Feature, highlight: &TrackSummary) -> Result<String, ApiError> {
        Ok(render_scatter(
            &self.dataset,
            &self.mapping,
            x,
            y,
            Some(highlight),
            (self.plot.width, self.plot.height),
        )?)
    }

    fn handle_index(&self, request: &Request) -> Result<Response, ApiError> {
        let (track_id, pinned) = self.requested_track(request)?;
        let x = Self::feature_param(request, "x")?;
        let y = Self::feature_param(request, "y")?;

        // recomputed on every render
        let summary = self.dataset.summarize(&track_id)?;

        let chart = if request.get_param("plot").as_deref() == Some("1") {
            Some(self.scatter(x, y, &summary)?)
        } else {
            None
        };

        let page = JukeboxPage {
            player: embed_iframe(&self.embed, &track_id),
            summary: &summary,
            pinned: pinned.then_some(track_id.as_str()),
            x,
            y,
            chart,
        };
        Ok(Response::html(page.render()))
    }

    fn handle_reroll(&self) -> Result<Response, ApiError> {
        let mut jukebox = self.jukebox.lock().map_err(|e| {
            DatasetError::Internal(anyhow!("Could not access jukebox state under lock: {e}"))
        })?;
        let track_id = jukebox.reroll(&self.dataset)?;
        info!("rolled new track {track_id}");
        Ok(Response::redirect_303("/"))
    }

    fn handle_plot(&self, request: &Request) -> Result<Response, ApiError> {
        let (track_id, _) = self.requested_track(request)?;
        let x = Self::feature_param(request, "x")?;
        let y = Self::feature_param(request, "y")?;
        let summary = self.dataset.summarize(&track_id)?;

        Ok(Response::svg(self.scatter(x, y, &summary)?))
    }

    fn handle_current_track(&self) -> Result<Response, ApiError> {
        let track_id = self.current_track()?;
        self.handle_get_track(&track_id)
    }

    fn handle_get_track(&self, id: &str) -> Result<Response, ApiError> {
        let summary = self.dataset.summarize(id)?;
        Ok(Response::json(&summary))
    }

    fn handle_classify(&self, genre: String) -> Response {
        let coarse = self.mapping.classify(&genre).to_string();
        Response::json(&ClassifyResponse { genre, coarse })
    }

    fn handle_features() -> Response {
        let names: Vec<&str> = Feature::ALL.iter().map(|f| f.name()).collect();
        Response::json(&names)
    }
}

#[derive(Serialize, Deserialize)]
struct ClassifyResponse {
    genre: String,
    /// Empty when the genre is not in any category
    coarse: String,
}

#[cfg(test)]
pub fn parse_json_response<T: serde::de::DeserializeOwned>(
    response: rouille::Response,
) -> anyhow::Result<T> {
    Ok(serde_json::from_reader(
        response.data.into_reader_and_size().0,
    )?)
}
