use super::Genre;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

/// One row of the time-series source, attributed to a single genre.
///
/// `count` is the row's weight: 1 for a raw per-release row, or the
/// pre-aggregated number of releases it stands for. Never zero.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MovieEvent {
    pub release_year: i32,
    pub genre: Genre,
    pub count: u64,
}

/// A single user rating of a title.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RatingRecord {
    pub title: String,
    pub release_date: NaiveDate,
    pub genre: Genre,
    pub rating: f64,
}

impl RatingRecord {
    pub fn release_year(&self) -> i32 {
        self.release_date.year()
    }
}

/// Per (title, release date, genre) rating statistics, as shown in the
/// summary table. Field names serialize as the table's column ids.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SummaryRow {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Release Date")]
    pub release_date: NaiveDate,
    #[serde(rename = "Genre")]
    pub genre: Genre,
    #[serde(rename = "Average Rating")]
    pub average_rating: f64,
    #[serde(rename = "Number of Ratings")]
    pub rating_count: u64,
}

/// The frozen, in-memory snapshot every view is computed from.
#[derive(Debug, Default)]
pub struct Dataset {
    events: Vec<MovieEvent>,
    ratings: Vec<RatingRecord>,
    summary_rows: Vec<SummaryRow>,
    year_bounds: Option<(i32, i32)>,
}

impl Dataset {
    pub fn new(events: Vec<MovieEvent>, ratings: Vec<RatingRecord>) -> Dataset {
        let year_bounds = events.iter().fold(None, |bounds, event| match bounds {
            None => Some((event.release_year, event.release_year)),
            Some((min, max)) => Some((min.min(event.release_year), max.max(event.release_year))),
        });
        let summary_rows = summarize_ratings(&ratings);
        Dataset {
            events,
            ratings,
            summary_rows,
            year_bounds,
        }
    }

    pub fn events(&self) -> &[MovieEvent] {
        &self.events
    }

    pub fn ratings(&self) -> &[RatingRecord] {
        &self.ratings
    }

    pub fn summary_rows(&self) -> &[SummaryRow] {
        &self.summary_rows
    }

    /// Observed (min, max) release year of the events source.
    pub fn year_bounds(&self) -> Option<(i32, i32)> {
        self.year_bounds
    }

    pub fn get_events_count(&self) -> usize {
        self.events.len()
    }

    pub fn get_ratings_count(&self) -> usize {
        self.ratings.len()
    }

    pub fn get_summary_rows_count(&self) -> usize {
        self.summary_rows.len()
    }
}

fn summarize_ratings(ratings: &[RatingRecord]) -> Vec<SummaryRow> {
    let mut groups: BTreeMap<(&str, NaiveDate, Genre), (f64, u64)> = BTreeMap::new();
    for record in ratings {
        let entry = groups
            .entry((record.title.as_str(), record.release_date, record.genre))
            .or_insert((0.0, 0));
        entry.0 += record.rating;
        entry.1 += 1;
    }

    groups
        .into_iter()
        .map(|((title, release_date, genre), (sum, count))| SummaryRow {
            title: title.to_owned(),
            release_date,
            genre,
            average_rating: sum / count as f64,
            rating_count: count,
        })
        .collect()
}
