//! The immutable movie-ratings snapshot: loading, normalization and the
//! derived per-title summary rows.

mod error;
mod genre;
mod load;
mod models;

pub use error::{DataLoadError, LoadProblem, SourceKind};
pub use genre::{deserialize_genre_set, Genre, UnknownGenre};
pub use load::{
    load_dataset, parse_events, parse_ratings, DatasetBuildResult, DatasetSources, MAX_RATING,
    MIN_RATING, RELEASE_DATE_FORMAT,
};
pub use models::{Dataset, MovieEvent, RatingRecord, SummaryRow};
