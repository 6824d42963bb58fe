//! Pure transforms from the loaded dataset and the current control values
//! to the data of each console view.

pub mod dispatch;
pub mod filter;
pub mod heatmap;
pub mod palette;
pub mod ranked;
pub mod reset;
pub mod scatter;
pub mod table;

pub use dispatch::{changed_views, dispatch, ConsoleUpdate, ViewKind};
pub use filter::{FilterState, RankMode, RankedControls, SeriesControls, YearRange};
pub use heatmap::{heatmap_view, HeatmapView};
pub use ranked::{ranked_view, ranked_view_with_limit, RankedBarView, RankedSeries, RankedTitle, DEFAULT_TOP_N};
pub use reset::{reset_filters, ResetOutcome};
pub use scatter::{scatter_view, ScatterPoint, ScatterSeries, ScatterView, Trendline, YearCount};
pub use table::{
    query_table, summary_table, FilterParseError, FilterQuery, SortDirection, SortKey, TableColumn,
    TablePage, TableQuery,
};

use crate::dataset::{Dataset, Genre};
use std::collections::{BTreeMap, BTreeSet};

/// Summed event weights per (genre, year) within the selection, keyed in
/// vocabulary order then year order.
pub(crate) fn tally_events(
    dataset: &Dataset,
    genres: &BTreeSet<Genre>,
    year_range: YearRange,
) -> BTreeMap<(Genre, i32), u64> {
    let mut tally = BTreeMap::new();
    if genres.is_empty() {
        return tally;
    }
    for event in dataset
        .events()
        .iter()
        .filter(|event| genres.contains(&event.genre) && year_range.contains(event.release_year))
    {
        *tally.entry((event.genre, event.release_year)).or_insert(0) += event.count;
    }
    tally.retain(|_, count| *count > 0);
    tally
}
