//! Scatter chart of two track features, colored by coarse genre.

use std::ops::Range;

use plotters::prelude::*;
use thiserror::Error;

use crate::{
    dataset::Dataset,
    domain::{
        genre::{GenreMapping, UNCATEGORIZED},
        summary::TrackSummary,
        track::Feature,
    },
};

pub const HIGHLIGHT_LABEL: &str = "Your Track!";
pub const UNCATEGORIZED_LABEL: &str = "uncategorized";

const POINT_RADIUS: i32 = 2;
const STAR_RADIUS: i32 = 12;

#[derive(Debug, Error)]
#[error("failed to render chart: {0}")]
pub struct PlotError(String);

fn render_error<E: std::fmt::Display>(e: E) -> PlotError {
    PlotError(e.to_string())
}

/// Points of one legend entry
struct Series {
    name: String,
    points: Vec<(f64, f64)>,
}

/// Splits the dataset into one series per coarse category, in genre table order.
///
/// Uncategorized rows come last; categories without rows are left out.
fn series_by_category(dataset: &Dataset, mapping: &GenreMapping, x: Feature, y: Feature) -> Vec<Series> {
    let mut series: Vec<Series> = mapping
        .categories()
        .chain(std::iter::once(UNCATEGORIZED))
        .map(|name| Series {
            name: name.to_string(),
            points: Vec::new(),
        })
        .collect();

    for record in dataset.records() {
        let point = (x.value(&record.features), y.value(&record.features));
        if let Some(s) = series.iter_mut().find(|s| s.name == record.track_genre_coarse) {
            s.points.push(point);
        }
    }

    for s in series.iter_mut() {
        if s.name == UNCATEGORIZED {
            s.name = UNCATEGORIZED_LABEL.to_string();
        }
    }
    series.retain(|s| !s.points.is_empty());
    series
}

/// Range covering all values, padded so points do not sit on the border
fn axis_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

    if min > max {
        return 0.0..1.0;
    }
    if min == max {
        return (min - 0.5)..(max + 0.5);
    }
    let pad = (max - min) * 0.05;
    (min - pad)..(max + pad)
}

/// Five-pointed star around the origin, in pixels
fn star_points(radius: i32) -> Vec<(i32, i32)> {
    let inner = radius as f64 * 0.45;
    (0..10)
        .map(|i| {
            let r = if i % 2 == 0 { radius as f64 } else { inner };
            let angle = std::f64::consts::PI / 5.0 * i as f64 - std::f64::consts::FRAC_PI_2;
            ((r * angle.cos()).round() as i32, (r * angle.sin()).round() as i32)
        })
        .collect()
}

/// Renders the whole dataset as an SVG scatter chart of `y` against `x`.
///
/// When `highlight` is given that track is drawn on top as a red star
/// and leads the legend.
pub fn render_scatter(
    dataset: &Dataset,
    mapping: &GenreMapping,
    x: Feature,
    y: Feature,
    highlight: Option<&TrackSummary>,
    size: (u32, u32),
) -> Result<String, PlotError> {
    let series = series_by_category(dataset, mapping, x, y);
    let marker = highlight.map(|t| (x.value(&t.features), y.value(&t.features)));

    let all_points = || series.iter().flat_map(|s| s.points.iter().copied()).chain(marker);
    let x_range = axis_range(all_points().map(|(px, _)| px));
    let y_range = axis_range(all_points().map(|(_, py)| py));

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        root.fill(&WHITE).map_err(render_error)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(format!("{y} vs {x}"), ("sans-serif", 20))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_range, y_range)
            .map_err(render_error)?;

        chart
            .configure_mesh()
            .x_desc(x.name())
            .y_desc(y.name())
            .draw()
            .map_err(render_error)?;

        // drawn once up front for the legend slot, again at the end to stay on top
        if let Some(at) = marker {
            chart
                .draw_series(std::iter::once(
                    EmptyElement::at(at) + Polygon::new(star_points(STAR_RADIUS), RED.filled()),
                ))
                .map_err(render_error)?
                .label(HIGHLIGHT_LABEL)
                .legend(|(lx, ly)| Circle::new((lx, ly), 5, RED.filled()));
        }

        for (i, s) in series.iter().enumerate() {
            let color = Palette99::pick(i).to_rgba();
            chart
                .draw_series(
                    s.points
                        .iter()
                        .map(|&p| Circle::new(p, POINT_RADIUS, color.mix(0.6).filled())),
                )
                .map_err(render_error)?
                .label(s.name.as_str())
                .legend(move |(lx, ly)| Circle::new((lx, ly), 4, color.filled()));
        }

        if let Some(at) = marker {
            chart
                .draw_series(std::iter::once(
                    EmptyElement::at(at) + Polygon::new(star_points(STAR_RADIUS), RED.filled()),
                ))
                .map_err(render_error)?;
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(render_error)?;

        root.present().map_err(render_error)?;
    }
    Ok(svg)
}
