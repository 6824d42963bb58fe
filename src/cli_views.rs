//! View Inspection Tool
//!
//! This binary loads the dataset and prints a single view as pretty JSON,
//! so the transforms can be checked without a front end.

use anyhow::Result;
use clap::{Parser, Subcommand};
use ratings_console_server::dataset::{load_dataset, Dataset, DatasetSources, Genre};
use ratings_console_server::engine::{
    heatmap_view, query_table, ranked_view_with_limit, scatter_view, RankMode, SortDirection,
    SortKey, TableColumn, TableQuery, YearRange, DEFAULT_TOP_N,
};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cli-views")]
#[command(about = "Print one console view computed from the dataset")]
struct Args {
    /// Path to the CSV file of release events
    #[arg(long)]
    events_csv: PathBuf,

    /// Path to the CSV file of individual ratings
    #[arg(long)]
    ratings_csv: PathBuf,

    #[command(subcommand)]
    view: ViewCommand,
}

#[derive(clap::Args, Debug)]
struct Selection {
    /// Genre labels, comma separated (e.g. "Action,Sci-Fi")
    #[arg(long, value_delimiter = ',', default_value = "Action")]
    genres: Vec<String>,

    /// First release year; defaults to the earliest year in the dataset
    #[arg(long)]
    from: Option<i32>,

    /// Last release year; defaults to the latest year in the dataset
    #[arg(long)]
    to: Option<i32>,
}

#[derive(Subcommand, Debug)]
enum ViewCommand {
    /// Releases per genre and year, with trendlines
    Scatter(Selection),
    /// Zero-filled genre by year matrix
    Heatmap(Selection),
    /// Best or worst rated titles
    Ranked {
        #[command(flatten)]
        selection: Selection,

        #[arg(long, value_enum, default_value_t = RankMode::Top)]
        rank_mode: RankMode,

        #[arg(long, default_value_t = DEFAULT_TOP_N)]
        top_n: usize,
    },
    /// One page of the summary table
    Table {
        #[arg(long, default_value = "")]
        filter_query: String,

        /// Column to sort by, e.g. "Average Rating"
        #[arg(long)]
        sort_by: Option<TableColumn>,

        #[arg(long)]
        descending: bool,

        #[arg(long, default_value_t = 0)]
        page: usize,
    },
}

impl Selection {
    fn genres(&self) -> BTreeSet<Genre> {
        self.genres
            .iter()
            .filter_map(|label| label.trim().parse::<Genre>().ok())
            .collect()
    }

    fn year_range(&self, dataset: &Dataset) -> YearRange {
        let (min, max) = dataset.year_bounds().unwrap_or((0, 0));
        YearRange::new(self.from.unwrap_or(min), self.to.unwrap_or(max))
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let dataset = load_dataset(&DatasetSources {
        events_csv: args.events_csv,
        ratings_csv: args.ratings_csv,
    })?;

    match args.view {
        ViewCommand::Scatter(selection) => print_json(&scatter_view(
            &dataset,
            &selection.genres(),
            selection.year_range(&dataset),
        )),
        ViewCommand::Heatmap(selection) => print_json(&heatmap_view(
            &dataset,
            &selection.genres(),
            selection.year_range(&dataset),
        )),
        ViewCommand::Ranked {
            selection,
            rank_mode,
            top_n,
        } => print_json(&ranked_view_with_limit(
            &dataset,
            &selection.genres(),
            selection.year_range(&dataset),
            rank_mode,
            top_n,
        )),
        ViewCommand::Table {
            filter_query,
            sort_by,
            descending,
            page,
        } => {
            let direction = if descending {
                SortDirection::Desc
            } else {
                SortDirection::Asc
            };
            let query = TableQuery {
                filter_query,
                sort_by: sort_by
                    .map(|column_id| SortKey {
                        column_id,
                        direction,
                    })
                    .into_iter()
                    .collect(),
                page_current: page,
                ..TableQuery::default()
            };
            print_json(&query_table(&dataset, &query)?)
        }
    }
}
