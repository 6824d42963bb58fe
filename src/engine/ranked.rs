//! Ranked bar view: the best or worst rated titles within the selection.
//!
//! Titles are ranked by their mean rating across every matching rating
//! record, whatever the genre or release date of the record. The cut at N is
//! value-based: every title tied with the N-th mean is kept, so the view may
//! hold more than N titles. The same rule applies to both rank modes.

use super::filter::{RankMode, YearRange};
use super::palette::series_color;
use crate::dataset::{Dataset, Genre};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

pub const DEFAULT_TOP_N: usize = 10;

/// Padding below the lowest mean on the value axis, so the shortest bar
/// stays visible.
const VALUE_AXIS_PADDING: f64 = 0.3;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RankedTitle {
    pub title: String,
    pub mean_rating: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RankedSeries {
    pub genre: Genre,
    pub color: &'static str,
    pub bars: Vec<RankedTitle>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RankedBarView {
    pub rank_mode: RankMode,
    /// The whole ranked selection, best first for `Top`, worst first for `Bottom`.
    pub titles: Vec<RankedTitle>,
    pub series: Vec<RankedSeries>,
    pub value_axis: Option<(f64, f64)>,
}

impl RankedBarView {
    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}

struct TitleTally<'a> {
    title: &'a str,
    sum: f64,
    count: u64,
    genres: BTreeSet<Genre>,
}

struct RankedEntry<'a> {
    title: &'a str,
    mean: f64,
    genres: BTreeSet<Genre>,
}

fn rank_order(rank_mode: RankMode, a: &RankedEntry, b: &RankedEntry) -> Ordering {
    let by_mean = match rank_mode {
        RankMode::Top => b.mean.total_cmp(&a.mean),
        RankMode::Bottom => a.mean.total_cmp(&b.mean),
    };
    by_mean.then_with(|| a.title.cmp(b.title))
}

pub fn ranked_view(
    dataset: &Dataset,
    bar_genres: &BTreeSet<Genre>,
    year_range: YearRange,
    rank_mode: RankMode,
) -> RankedBarView {
    ranked_view_with_limit(dataset, bar_genres, year_range, rank_mode, DEFAULT_TOP_N)
}

pub fn ranked_view_with_limit(
    dataset: &Dataset,
    bar_genres: &BTreeSet<Genre>,
    year_range: YearRange,
    rank_mode: RankMode,
    limit: usize,
) -> RankedBarView {
    let mut tallies: BTreeMap<&str, TitleTally> = BTreeMap::new();
    for record in dataset.ratings().iter().filter(|record| {
        bar_genres.contains(&record.genre) && year_range.contains(record.release_year())
    }) {
        let tally = tallies
            .entry(record.title.as_str())
            .or_insert_with(|| TitleTally {
                title: record.title.as_str(),
                sum: 0.0,
                count: 0,
                genres: BTreeSet::new(),
            });
        tally.sum += record.rating;
        tally.count += 1;
        tally.genres.insert(record.genre);
    }

    let mut ranked: Vec<RankedEntry> = tallies
        .into_values()
        .map(|tally| RankedEntry {
            title: tally.title,
            mean: tally.sum / tally.count as f64,
            genres: tally.genres,
        })
        .collect();
    ranked.sort_by(|a, b| rank_order(rank_mode, a, b));

    if limit == 0 {
        ranked.clear();
    } else if ranked.len() > limit {
        let boundary = ranked[limit - 1].mean;
        let ties = ranked[limit..]
            .iter()
            .take_while(|entry| entry.mean == boundary)
            .count();
        ranked.truncate(limit + ties);
    }

    let titles: Vec<RankedTitle> = ranked
        .iter()
        .map(|entry| RankedTitle {
            title: entry.title.to_owned(),
            mean_rating: entry.mean,
        })
        .collect();

    let mut series = Vec::new();
    for genre in bar_genres {
        let bars: Vec<RankedTitle> = ranked
            .iter()
            .zip(titles.iter())
            .filter(|(entry, _)| entry.genres.contains(genre))
            .map(|(_, title)| title.clone())
            .collect();
        if bars.is_empty() {
            continue;
        }
        series.push(RankedSeries {
            genre: *genre,
            color: series_color(series.len()),
            bars,
        });
    }

    let value_axis = titles
        .iter()
        .map(|title| title.mean_rating)
        .fold(None, |range: Option<(f64, f64)>, mean| match range {
            None => Some((mean, mean)),
            Some((min, max)) => Some((min.min(mean), max.max(mean))),
        })
        .map(|(min, max)| (min - VALUE_AXIS_PADDING, max));

    RankedBarView {
        rank_mode,
        titles,
        series,
        value_axis,
    }
}
