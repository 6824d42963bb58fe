use crate::dataset::{deserialize_genre_set, Genre};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ops::RangeInclusive;

/// Inclusive release year range. Serialized as `[min, max]`; a reversed
/// pair is normalized on construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(i32, i32)", into = "(i32, i32)")]
pub struct YearRange {
    min: i32,
    max: i32,
}

impl YearRange {
    pub fn new(a: i32, b: i32) -> YearRange {
        YearRange {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn min(&self) -> i32 {
        self.min
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn contains(&self, year: i32) -> bool {
        self.min <= year && year <= self.max
    }

    pub fn years(&self) -> RangeInclusive<i32> {
        self.min..=self.max
    }

    /// Number of years in the range, both ends included.
    pub fn year_count(&self) -> usize {
        (i64::from(self.max) - i64::from(self.min) + 1) as usize
    }
}

impl From<(i32, i32)> for YearRange {
    fn from((a, b): (i32, i32)) -> Self {
        YearRange::new(a, b)
    }
}

impl From<YearRange> for (i32, i32) {
    fn from(range: YearRange) -> Self {
        (range.min, range.max)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RankMode {
    #[default]
    Top,
    Bottom,
}

/// Controls read by the scatter and heatmap views.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesControls {
    #[serde(default, deserialize_with = "deserialize_genre_set")]
    pub selected_genres: BTreeSet<Genre>,
    pub year_range: YearRange,
}

/// Controls read by the ranked bar view.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedControls {
    #[serde(default, deserialize_with = "deserialize_genre_set")]
    pub bar_genres: BTreeSet<Genre>,
    pub year_range: YearRange,
    #[serde(default)]
    pub rank_mode: RankMode,
}

/// The complete set of control values. Replaced wholesale on every control
/// event and never retained by the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    #[serde(default, deserialize_with = "deserialize_genre_set")]
    pub selected_genres: BTreeSet<Genre>,
    pub year_range: YearRange,
    #[serde(default)]
    pub rank_mode: RankMode,
    #[serde(default, deserialize_with = "deserialize_genre_set")]
    pub bar_genres: BTreeSet<Genre>,
    /// The ranked view's own year slider; falls back to `year_range`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bar_year_range: Option<YearRange>,
}

impl FilterState {
    /// The control values a fresh console starts with.
    pub fn initial(year_range: YearRange) -> FilterState {
        FilterState {
            selected_genres: BTreeSet::from([Genre::Action]),
            year_range,
            rank_mode: RankMode::Top,
            bar_genres: BTreeSet::from([Genre::Action]),
            bar_year_range: None,
        }
    }

    pub fn effective_bar_year_range(&self) -> YearRange {
        self.bar_year_range.unwrap_or(self.year_range)
    }

    pub fn series_controls(&self) -> SeriesControls {
        SeriesControls {
            selected_genres: self.selected_genres.clone(),
            year_range: self.year_range,
        }
    }

    pub fn ranked_controls(&self) -> RankedControls {
        RankedControls {
            bar_genres: self.bar_genres.clone(),
            year_range: self.effective_bar_year_range(),
            rank_mode: self.rank_mode,
        }
    }
}
