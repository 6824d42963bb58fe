//! Decides which views a control event invalidates and recomputes only
//! those.

use super::filter::{FilterState, RankedControls, SeriesControls};
use super::heatmap::{heatmap_view, HeatmapView};
use super::ranked::{ranked_view_with_limit, RankedBarView};
use super::scatter::{scatter_view, ScatterView};
use crate::dataset::Dataset;
use serde::Serialize;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    Scatter,
    Heatmap,
    Ranked,
}

impl ViewKind {
    pub const ALL: [ViewKind; 3] = [ViewKind::Scatter, ViewKind::Heatmap, ViewKind::Ranked];

    pub fn name(&self) -> &'static str {
        match self {
            ViewKind::Scatter => "scatter",
            ViewKind::Heatmap => "heatmap",
            ViewKind::Ranked => "ranked",
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Views recomputed for one control event. Views whose inputs did not
/// change are `None`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ConsoleUpdate {
    pub updated: Vec<ViewKind>,
    pub scatter: Option<ScatterView>,
    pub heatmap: Option<HeatmapView>,
    pub ranked: Option<RankedBarView>,
}

pub fn changed_views(previous: Option<&FilterState>, next: &FilterState) -> Vec<ViewKind> {
    let Some(previous) = previous else {
        return ViewKind::ALL.to_vec();
    };

    let series_changed = previous.series_controls() != next.series_controls();
    let ranked_changed = previous.ranked_controls() != next.ranked_controls();

    let mut changed = Vec::new();
    if series_changed {
        changed.push(ViewKind::Scatter);
        changed.push(ViewKind::Heatmap);
    }
    if ranked_changed {
        changed.push(ViewKind::Ranked);
    }
    changed
}

fn series_views(
    dataset: &Dataset,
    controls: &SeriesControls,
    scatter: bool,
    heatmap: bool,
) -> (Option<ScatterView>, Option<HeatmapView>) {
    rayon::join(
        || scatter.then(|| scatter_view(dataset, &controls.selected_genres, controls.year_range)),
        || heatmap.then(|| heatmap_view(dataset, &controls.selected_genres, controls.year_range)),
    )
}

fn ranked_bars(dataset: &Dataset, controls: &RankedControls, top_n: usize) -> RankedBarView {
    ranked_view_with_limit(
        dataset,
        &controls.bar_genres,
        controls.year_range,
        controls.rank_mode,
        top_n,
    )
}

pub fn dispatch(
    dataset: &Dataset,
    previous: Option<&FilterState>,
    next: &FilterState,
    top_n: usize,
) -> ConsoleUpdate {
    let updated = changed_views(previous, next);
    let wants = |kind: ViewKind| updated.contains(&kind);

    let series = next.series_controls();
    let ranked_controls = next.ranked_controls();
    let ((scatter, heatmap), ranked) = rayon::join(
        || series_views(dataset, &series, wants(ViewKind::Scatter), wants(ViewKind::Heatmap)),
        || wants(ViewKind::Ranked).then(|| ranked_bars(dataset, &ranked_controls, top_n)),
    );

    ConsoleUpdate {
        updated,
        scatter,
        heatmap,
        ranked,
    }
}
