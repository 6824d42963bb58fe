//! Time-series view: releases per year for each selected genre.

use super::filter::YearRange;
use super::palette::genre_color;
use super::tally_events;
use crate::dataset::{Dataset, Genre};
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScatterPoint {
    pub year: i32,
    pub genre: Genre,
    pub count: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct YearCount {
    pub year: i32,
    pub count: u64,
}

/// Least-squares fit of count against year.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Trendline {
    pub slope: f64,
    pub intercept: f64,
}

impl Trendline {
    pub fn at(&self, year: i32) -> f64 {
        self.slope * f64::from(year) + self.intercept
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScatterSeries {
    pub genre: Genre,
    pub color: &'static str,
    pub points: Vec<YearCount>,
    pub trendline: Option<Trendline>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ScatterView {
    pub series: Vec<ScatterSeries>,
}

impl ScatterView {
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Every (year, genre, count) triple, series by series.
    pub fn points(&self) -> impl Iterator<Item = ScatterPoint> + '_ {
        self.series.iter().flat_map(|series| {
            series.points.iter().map(move |point| ScatterPoint {
                year: point.year,
                genre: series.genre,
                count: point.count,
            })
        })
    }
}

fn fit_trendline(points: &[YearCount]) -> Option<Trendline> {
    let n = points.len() as f64;
    if points.len() < 2 {
        return None;
    }
    let mean_x = points.iter().map(|p| f64::from(p.year)).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.count as f64).sum::<f64>() / n;

    let (mut sxx, mut sxy) = (0.0, 0.0);
    for point in points {
        let dx = f64::from(point.year) - mean_x;
        sxx += dx * dx;
        sxy += dx * (point.count as f64 - mean_y);
    }
    if sxx == 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    Some(Trendline {
        slope,
        intercept: mean_y - slope * mean_x,
    })
}

/// Counts releases per (year, genre) within the selection. Pairs without a
/// matching release are omitted rather than reported as zero.
pub fn scatter_view(
    dataset: &Dataset,
    selected_genres: &BTreeSet<Genre>,
    year_range: YearRange,
) -> ScatterView {
    let tally = tally_events(dataset, selected_genres, year_range);

    let mut series: Vec<ScatterSeries> = Vec::new();
    for ((genre, year), count) in tally {
        let point = YearCount { year, count };
        match series.last_mut() {
            Some(current) if current.genre == genre => current.points.push(point),
            _ => series.push(ScatterSeries {
                genre,
                color: genre_color(genre),
                points: vec![point],
                trendline: None,
            }),
        }
    }
    for current in series.iter_mut() {
        current.trendline = fit_trendline(&current.points);
    }

    ScatterView { series }
}
