use rouille::Response;

use crate::{
    dataset::error::DatasetError, domain::summary::AggregateError, domain::track::UnknownFeature,
    plot::PlotError,
};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
}

impl From<DatasetError> for ApiError {
    fn from(err: DatasetError) -> Self {
        match err {
            DatasetError::TrackNotFound(id) => ApiError::NotFound(format!("track {} not found", id)),

            DatasetError::Aggregate(AggregateError::NoRecords) => {
                ApiError::NotFound("no records for track".into())
            }

            DatasetError::Empty => ApiError::Internal("dataset has no tracks".into()),

            DatasetError::Aggregate(AggregateError::MixedTracks { .. })
            | DatasetError::Io(_)
            | DatasetError::Csv(_)
            | DatasetError::Fetch(_)
            | DatasetError::Missing(_)
            | DatasetError::Internal(_) => {
                log::error!("{err}");
                ApiError::Internal("internal server error".into())
            }
        }
    }
}

impl From<UnknownFeature> for ApiError {
    fn from(err: UnknownFeature) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<PlotError> for ApiError {
    fn from(err: PlotError) -> Self {
        log::error!("{err}");
        ApiError::Internal("failed to render plot".into())
    }
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::NotFound(_) => 404,
            ApiError::BadRequest(_) => 400,
            ApiError::Internal(_) => 500,
        }
    }

    pub fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            ApiError::NotFound(msg) | ApiError::BadRequest(msg) | ApiError::Internal(msg) => {
                Response::text(msg).with_status_code(status)
            }
        }
    }
}
