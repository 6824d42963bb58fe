use crate::dataset::Genre;

/// Qualitative palette shared by every multi-series view.
pub const PALETTE: [&str; 10] = [
    "#636EFA", "#EF553B", "#00CC96", "#AB63FA", "#FFA15A", "#19D3F3", "#FF6692", "#B6E880",
    "#FF97FF", "#FECB52",
];

/// One color per genre of the vocabulary, indexed by `Genre::index`.
/// Starts with `PALETTE` and continues with distinct hues, so any
/// combination of genres renders with distinct colors.
pub const GENRE_PALETTE: [&str; Genre::ALL.len()] = [
    "#636EFA", "#EF553B", "#00CC96", "#AB63FA", "#FFA15A", "#19D3F3", "#FF6692", "#B6E880",
    "#FF97FF", "#FECB52", "#1F77B4", "#8C564B", "#2CA02C", "#7F7F7F", "#BCBD22", "#17BECF",
    "#D62728", "#9467BD", "#E377C2",
];

/// Continuous color scale name for the density matrix.
pub const HEATMAP_COLOR_SCALE: &str = "blues";

/// Color keyed by genre identity: a genre keeps its color no matter which
/// other genres are selected alongside it.
pub fn genre_color(genre: Genre) -> &'static str {
    GENRE_PALETTE[genre.index()]
}

/// Color keyed by a series' position in display order.
pub fn series_color(display_index: usize) -> &'static str {
    PALETTE[display_index % PALETTE.len()]
}
