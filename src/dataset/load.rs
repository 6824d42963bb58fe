//! Dataset loading functionality

use super::error::SourceKind;
use super::{DataLoadError, Dataset, Genre, LoadProblem, MovieEvent, RatingRecord};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

/// Date format of the `release_date` column of the ratings source.
pub const RELEASE_DATE_FORMAT: &str = "%d-%b-%Y";

pub const MIN_RATING: f64 = 0.0;
pub const MAX_RATING: f64 = 10.0;

const RELEASE_YEAR: &str = "release_year";
const GENRE: &str = "genre";
const COUNT: &str = "count";
const TITLE: &str = "title";
const RELEASE_DATE: &str = "release_date";
const RATING: &str = "rating";

/// Locations of the two tabular sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSources {
    pub events_csv: PathBuf,
    pub ratings_csv: PathBuf,
}

#[derive(Debug)]
pub struct DatasetBuildResult {
    pub dataset: Dataset,
    pub problems: Vec<LoadProblem>,
}

enum GenreLayout {
    /// A single `genre` column, with an optional `count` weight column.
    Categorical {
        genre: usize,
        count: Option<usize>,
    },
    /// One column per genre label, each cell holding the membership weight.
    OneHot(Vec<(usize, Genre)>),
}

fn column_index(
    headers: &StringRecord,
    kind: SourceKind,
    column: &'static str,
) -> Result<usize, DataLoadError> {
    headers
        .iter()
        .position(|header| header == column)
        .ok_or(DataLoadError::MissingColumn { kind, column })
}

fn cell<'r>(record: &'r StringRecord, index: usize) -> &'r str {
    record.get(index).unwrap_or("")
}

fn parse_number<T: FromStr>(
    record: &StringRecord,
    index: usize,
    kind: SourceKind,
    row: usize,
    column: &str,
) -> Result<T, DataLoadError> {
    let value = cell(record, index);
    value.parse::<T>().map_err(|_| DataLoadError::InvalidNumber {
        kind,
        row,
        column: column.to_owned(),
        value: value.to_owned(),
    })
}

/// Parses a weight cell. Empty cells count as zero, like missing one-hot flags.
fn parse_weight(
    record: &StringRecord,
    index: usize,
    row: usize,
    column: &str,
) -> Result<u64, DataLoadError> {
    if cell(record, index).is_empty() {
        return Ok(0);
    }
    let weight: f64 = parse_number(record, index, SourceKind::Events, row, column)?;
    if !weight.is_finite() || weight < 0.0 {
        return Err(DataLoadError::InvalidNumber {
            kind: SourceKind::Events,
            row,
            column: column.to_owned(),
            value: cell(record, index).to_owned(),
        });
    }
    Ok(weight.round() as u64)
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new().trim(Trim::All).from_reader(reader)
}

/// Parses the time-series source. Rows are numbered from 1, header excluded.
pub fn parse_events<R: Read>(
    reader: R,
) -> Result<(Vec<MovieEvent>, Vec<LoadProblem>), DataLoadError> {
    let kind = SourceKind::Events;
    let mut reader = csv_reader(reader);
    let headers = reader
        .headers()
        .map_err(|err| DataLoadError::Csv { kind, err })?
        .clone();

    let year_column = column_index(&headers, kind, RELEASE_YEAR)?;
    let layout = match headers.iter().position(|header| header == GENRE) {
        Some(genre) => GenreLayout::Categorical {
            genre,
            count: headers.iter().position(|header| header == COUNT),
        },
        None => {
            let columns: Vec<(usize, Genre)> = headers
                .iter()
                .enumerate()
                .filter_map(|(index, header)| header.parse::<Genre>().ok().map(|g| (index, g)))
                .collect();
            if columns.is_empty() {
                return Err(DataLoadError::MissingGenreColumns);
            }
            GenreLayout::OneHot(columns)
        }
    };

    let mut events = Vec::new();
    let mut problems = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|err| DataLoadError::Csv { kind, err })?;
        let row = index + 1;
        let release_year: i32 = parse_number(&record, year_column, kind, row, RELEASE_YEAR)?;

        match &layout {
            GenreLayout::Categorical { genre, count } => {
                let label = cell(&record, *genre);
                let count = match count {
                    Some(count_column) => parse_weight(&record, *count_column, row, COUNT)?,
                    None => 1,
                };
                match label.parse::<Genre>() {
                    Ok(genre) if count > 0 => events.push(MovieEvent {
                        release_year,
                        genre,
                        count,
                    }),
                    Ok(_) => {}
                    Err(_) => problems.push(LoadProblem::UnknownGenre {
                        kind,
                        row,
                        label: label.to_owned(),
                    }),
                }
            }
            GenreLayout::OneHot(columns) => {
                for (column, genre) in columns {
                    let count = parse_weight(&record, *column, row, genre.label())?;
                    if count > 0 {
                        events.push(MovieEvent {
                            release_year,
                            genre: *genre,
                            count,
                        });
                    }
                }
            }
        }
    }

    Ok((events, problems))
}

/// Parses the ratings source, normalizing release dates to calendar dates.
pub fn parse_ratings<R: Read>(
    reader: R,
) -> Result<(Vec<RatingRecord>, Vec<LoadProblem>), DataLoadError> {
    let kind = SourceKind::Ratings;
    let mut reader = csv_reader(reader);
    let headers = reader
        .headers()
        .map_err(|err| DataLoadError::Csv { kind, err })?
        .clone();

    let title_column = column_index(&headers, kind, TITLE)?;
    let date_column = column_index(&headers, kind, RELEASE_DATE)?;
    let genre_column = column_index(&headers, kind, GENRE)?;
    let rating_column = column_index(&headers, kind, RATING)?;

    let mut ratings = Vec::new();
    let mut problems = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|err| DataLoadError::Csv { kind, err })?;
        let row = index + 1;

        let raw_date = cell(&record, date_column);
        let release_date = NaiveDate::parse_from_str(raw_date, RELEASE_DATE_FORMAT).map_err(
            |_| DataLoadError::InvalidDate {
                row,
                value: raw_date.to_owned(),
                format: RELEASE_DATE_FORMAT,
            },
        )?;
        let rating: f64 = parse_number(&record, rating_column, kind, row, RATING)?;

        let label = cell(&record, genre_column);
        let genre = match label.parse::<Genre>() {
            Ok(genre) => genre,
            Err(_) => {
                problems.push(LoadProblem::UnknownGenre {
                    kind,
                    row,
                    label: label.to_owned(),
                });
                continue;
            }
        };
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            problems.push(LoadProblem::RatingOutOfBounds { row, rating });
            continue;
        }

        ratings.push(RatingRecord {
            title: cell(&record, title_column).to_owned(),
            release_date,
            genre,
            rating,
        });
    }

    Ok((ratings, problems))
}

fn open_source(path: &Path, kind: SourceKind) -> Result<File, DataLoadError> {
    File::open(path).map_err(|err| DataLoadError::Io {
        kind,
        path: path.to_owned(),
        err,
    })
}

impl Dataset {
    /// Builds a dataset from two CSV readers, collecting non-fatal problems.
    pub fn from_readers<E: Read, R: Read>(
        events: E,
        ratings: R,
    ) -> Result<DatasetBuildResult, DataLoadError> {
        let (events, mut problems) = parse_events(events)?;
        let (ratings, mut rating_problems) = parse_ratings(ratings)?;
        problems.append(&mut rating_problems);
        Ok(DatasetBuildResult {
            dataset: Dataset::new(events, ratings),
            problems,
        })
    }

    pub fn build(sources: &DatasetSources) -> Result<DatasetBuildResult, DataLoadError> {
        let events = open_source(&sources.events_csv, SourceKind::Events)?;
        let ratings = open_source(&sources.ratings_csv, SourceKind::Ratings)?;
        Dataset::from_readers(events, ratings)
    }
}

/// Loads the dataset once, logging every non-fatal problem found.
pub fn load_dataset(sources: &DatasetSources) -> Result<Dataset, DataLoadError> {
    info!(
        "Loading events from {:?} and ratings from {:?}...",
        sources.events_csv, sources.ratings_csv
    );
    let build_result = Dataset::build(sources)?;
    let problems = build_result.problems;
    let dataset = build_result.dataset;

    if problems.is_empty() {
        info!("Dataset checked, no issues found.");
    } else {
        warn!("Found {} problems, the affected rows were skipped:", problems.len());
        for problem in problems.iter() {
            warn!("- {:?}", problem);
        }
    }

    info!(
        "Dataset has:\n{} movie events\n{} ratings\n{} summary rows",
        dataset.get_events_count(),
        dataset.get_ratings_count(),
        dataset.get_summary_rows_count()
    );
    if let Some((min_year, max_year)) = dataset.year_bounds() {
        info!("Release years span {}-{}", min_year, max_year);
    }
    Ok(dataset)
}
