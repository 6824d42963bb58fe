//! Density matrix view: a dense year × genre grid of release counts.

use super::filter::YearRange;
use super::palette::HEATMAP_COLOR_SCALE;
use super::tally_events;
use crate::dataset::{Dataset, Genre};
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HeatmapView {
    /// Row labels, every year of the requested range.
    pub years: Vec<i32>,
    /// Column labels.
    pub genres: Vec<Genre>,
    /// Row-major cells, `values[row][column]`.
    pub values: Vec<Vec<u64>>,
    pub value_range: (u64, u64),
    pub color_scale: &'static str,
}

impl HeatmapView {
    pub fn cell(&self, year: i32, genre: Genre) -> Option<u64> {
        let row = self.years.iter().position(|y| *y == year)?;
        let column = self.genres.iter().position(|g| *g == genre)?;
        Some(self.values[row][column])
    }
}

/// Builds the matrix. Unlike the scatter view, years without a matching
/// release are kept and zero-filled.
pub fn heatmap_view(
    dataset: &Dataset,
    selected_genres: &BTreeSet<Genre>,
    year_range: YearRange,
) -> HeatmapView {
    let tally = tally_events(dataset, selected_genres, year_range);
    let genres: Vec<Genre> = selected_genres.iter().copied().collect();
    let years: Vec<i32> = year_range.years().collect();

    let values: Vec<Vec<u64>> = years
        .iter()
        .map(|year| {
            genres
                .iter()
                .map(|genre| tally.get(&(*genre, *year)).copied().unwrap_or(0))
                .collect()
        })
        .collect();

    let value_range = values
        .iter()
        .flatten()
        .fold(None, |range, value| match range {
            None => Some((*value, *value)),
            Some((min, max)) => Some((min.min(*value), max.max(*value))),
        })
        .unwrap_or((0, 0));

    HeatmapView {
        years,
        genres,
        values,
        value_range,
        color_scale: HEATMAP_COLOR_SCALE,
    }
}
