//! Summary table: the precomputed per-title rating rows, plus the filter,
//! sort and paging operations a data table front end applies to them.
//!
//! Filter queries use the data table syntax: `{Column} op value` clauses
//! joined by `&&` or `and`, e.g. `{Genre} = Drama && {Average Rating} >= 4`.

use crate::dataset::{Dataset, SummaryRow};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableColumn {
    #[serde(rename = "Title")]
    Title,
    #[serde(rename = "Release Date")]
    ReleaseDate,
    #[serde(rename = "Genre")]
    Genre,
    #[serde(rename = "Average Rating")]
    AverageRating,
    #[serde(rename = "Number of Ratings")]
    NumberOfRatings,
}

impl TableColumn {
    pub const ALL: [TableColumn; 5] = [
        TableColumn::Title,
        TableColumn::ReleaseDate,
        TableColumn::Genre,
        TableColumn::AverageRating,
        TableColumn::NumberOfRatings,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            TableColumn::Title => "Title",
            TableColumn::ReleaseDate => "Release Date",
            TableColumn::Genre => "Genre",
            TableColumn::AverageRating => "Average Rating",
            TableColumn::NumberOfRatings => "Number of Ratings",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, TableColumn::AverageRating | TableColumn::NumberOfRatings)
    }

    fn cell(&self, row: &SummaryRow) -> Cell {
        match self {
            TableColumn::Title => Cell::Text(row.title.clone()),
            TableColumn::ReleaseDate => Cell::Text(row.release_date.format("%Y-%m-%d").to_string()),
            TableColumn::Genre => Cell::Text(row.genre.label().to_owned()),
            TableColumn::AverageRating => Cell::Number(row.average_rating),
            TableColumn::NumberOfRatings => Cell::Number(row.rating_count as f64),
        }
    }

    fn compare(&self, a: &SummaryRow, b: &SummaryRow) -> Ordering {
        match self {
            TableColumn::Title => a.title.cmp(&b.title),
            TableColumn::ReleaseDate => a.release_date.cmp(&b.release_date),
            TableColumn::Genre => a.genre.label().cmp(b.genre.label()),
            TableColumn::AverageRating => a.average_rating.total_cmp(&b.average_rating),
            TableColumn::NumberOfRatings => a.rating_count.cmp(&b.rating_count),
        }
    }
}

impl FromStr for TableColumn {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TableColumn::ALL
            .into_iter()
            .find(|column| column.id() == s)
            .ok_or_else(|| FilterParseError::UnknownColumn(s.to_owned()))
    }
}

impl fmt::Display for TableColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

enum Cell {
    Text(String),
    Number(f64),
}

impl Cell {
    fn as_text(&self) -> String {
        match self {
            Cell::Text(text) => text.clone(),
            Cell::Number(number) => number.to_string(),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum FilterParseError {
    #[error("Invalid filter clause '{0}'")]
    InvalidClause(String),

    #[error("Empty clause in filter query")]
    EmptyClause,

    #[error("Unknown column '{0}'")]
    UnknownColumn(String),

    #[error("Missing value for column '{0}'")]
    MissingValue(TableColumn),

    #[error("Column '{column}' expects a number, got '{value}'")]
    InvalidNumber { column: TableColumn, value: String },

    #[error("Unterminated quote in filter query")]
    UnterminatedQuote,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterOperator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Contains,
    DateStartsWith,
}

impl FilterOperator {
    fn from_token(token: &str) -> Option<FilterOperator> {
        let operator = match token {
            "=" | "eq" => FilterOperator::Eq,
            "!=" | "ne" => FilterOperator::Ne,
            "<" | "lt" => FilterOperator::Lt,
            "<=" | "le" => FilterOperator::Le,
            ">" | "gt" => FilterOperator::Gt,
            ">=" | "ge" => FilterOperator::Ge,
            "contains" => FilterOperator::Contains,
            "datestartswith" => FilterOperator::DateStartsWith,
            _ => return None,
        };
        Some(operator)
    }

    fn holds(&self, ordering: Ordering) -> bool {
        match self {
            FilterOperator::Eq => ordering == Ordering::Equal,
            FilterOperator::Ne => ordering != Ordering::Equal,
            FilterOperator::Lt => ordering == Ordering::Less,
            FilterOperator::Le => ordering != Ordering::Greater,
            FilterOperator::Gt => ordering == Ordering::Greater,
            FilterOperator::Ge => ordering != Ordering::Less,
            FilterOperator::Contains | FilterOperator::DateStartsWith => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
enum FilterValue {
    Text(String),
    Number(f64),
}

#[derive(Clone, Debug, PartialEq)]
pub struct FilterClause {
    pub column: TableColumn,
    pub operator: FilterOperator,
    value: FilterValue,
}

lazy_static! {
    static ref CLAUSE_REGEX: Regex = Regex::new(
        r"^\{(?P<column>[^{}]+)\}\s*(?:(?P<symbol>!=|<=|>=|=|<|>)\s*|(?P<word>eq|ne|lt|le|gt|ge|contains|datestartswith)\b\s*)?(?P<value>.*)$"
    )
    .expect("Failed to compile filter clause regex");
}

fn unquote(raw: &str) -> Result<&str, FilterParseError> {
    let raw = raw.trim();
    for quote in ['"', '\''] {
        if let Some(rest) = raw.strip_prefix(quote) {
            return rest
                .strip_suffix(quote)
                .ok_or(FilterParseError::UnterminatedQuote);
        }
    }
    Ok(raw)
}

impl FilterClause {
    fn parse(clause: &str) -> Result<FilterClause, FilterParseError> {
        let captures = CLAUSE_REGEX
            .captures(clause)
            .ok_or_else(|| FilterParseError::InvalidClause(clause.to_owned()))?;
        let column: TableColumn = captures["column"].trim().parse()?;

        let operator = captures
            .name("symbol")
            .or_else(|| captures.name("word"))
            .and_then(|token| FilterOperator::from_token(token.as_str()));
        let operator = match operator {
            Some(operator) => operator,
            None if column.is_numeric() => FilterOperator::Eq,
            None => FilterOperator::Contains,
        };

        let raw_value = unquote(&captures["value"])?;
        if raw_value.is_empty() {
            return Err(FilterParseError::MissingValue(column));
        }

        let numeric_comparison = column.is_numeric()
            && !matches!(
                operator,
                FilterOperator::Contains | FilterOperator::DateStartsWith
            );
        let value = if numeric_comparison {
            let number = raw_value
                .parse::<f64>()
                .map_err(|_| FilterParseError::InvalidNumber {
                    column,
                    value: raw_value.to_owned(),
                })?;
            FilterValue::Number(number)
        } else {
            FilterValue::Text(raw_value.to_owned())
        };

        Ok(FilterClause {
            column,
            operator,
            value,
        })
    }

    pub fn matches(&self, row: &SummaryRow) -> bool {
        let cell = self.column.cell(row);
        match (&self.operator, &self.value) {
            (FilterOperator::Contains, FilterValue::Text(needle)) => {
                cell.as_text().contains(needle.as_str())
            }
            (FilterOperator::DateStartsWith, FilterValue::Text(prefix)) => {
                cell.as_text().starts_with(prefix.as_str())
            }
            (operator, FilterValue::Number(expected)) => match cell {
                Cell::Number(actual) => operator.holds(actual.total_cmp(expected)),
                Cell::Text(_) => false,
            },
            (operator, FilterValue::Text(expected)) => {
                operator.holds(cell.as_text().as_str().cmp(expected.as_str()))
            }
        }
    }
}

/// Splits a query on `&&` and `and` outside quotes and column braces.
fn split_clauses(query: &str) -> Result<Vec<&str>, FilterParseError> {
    let mut clauses = Vec::new();
    let mut quote: Option<char> = None;
    let mut in_braces = false;
    let mut start = 0;
    let mut i = 0;
    let mut previous = ' ';

    while let Some(c) = query[i..].chars().next() {
        let rest = &query[i..];
        match quote {
            Some(open) => {
                if c == open {
                    quote = None;
                }
            }
            None if in_braces => {
                if c == '}' {
                    in_braces = false;
                }
            }
            None => {
                // A quote only opens at the start of a value, so apostrophes
                // inside bare words are kept as text.
                if (c == '"' || c == '\'') && (previous.is_whitespace() || "=<>".contains(previous)) {
                    quote = Some(c);
                } else if c == '{' {
                    in_braces = true;
                } else if rest.starts_with("&&") {
                    clauses.push(&query[start..i]);
                    i += 2;
                    start = i;
                    previous = ' ';
                    continue;
                } else if c.is_whitespace() && is_and_keyword(&rest[c.len_utf8()..]) {
                    clauses.push(&query[start..i]);
                    i += c.len_utf8() + 3;
                    start = i;
                    previous = ' ';
                    continue;
                }
            }
        }
        previous = c;
        i += c.len_utf8();
    }

    if quote.is_some() {
        return Err(FilterParseError::UnterminatedQuote);
    }
    clauses.push(&query[start..]);
    Ok(clauses)
}

fn is_and_keyword(rest: &str) -> bool {
    match (rest.get(..3), rest.get(3..)) {
        (Some(word), Some(after)) => {
            word.eq_ignore_ascii_case("and") && after.starts_with(char::is_whitespace)
        }
        _ => false,
    }
}

/// A parsed filter query. Every clause must hold for a row to match.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterQuery {
    clauses: Vec<FilterClause>,
}

impl FilterQuery {
    pub fn parse(query: &str) -> Result<FilterQuery, FilterParseError> {
        if query.trim().is_empty() {
            return Ok(FilterQuery::default());
        }
        let clauses = split_clauses(query)?
            .into_iter()
            .map(|clause| match clause.trim() {
                "" => Err(FilterParseError::EmptyClause),
                clause => FilterClause::parse(clause),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FilterQuery { clauses })
    }

    pub fn clauses(&self) -> &[FilterClause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn matches(&self, row: &SummaryRow) -> bool {
        self.clauses.iter().all(|clause| clause.matches(row))
    }
}

impl FromStr for FilterQuery {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterQuery::parse(s)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub column_id: TableColumn,
    #[serde(default)]
    pub direction: SortDirection,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

/// Table controls as sent by the front end. A `page_size` of 0 returns
/// every matching row on a single page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableQuery {
    #[serde(default)]
    pub filter_query: String,
    #[serde(default)]
    pub sort_by: Vec<SortKey>,
    #[serde(default)]
    pub page_current: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for TableQuery {
    fn default() -> Self {
        TableQuery {
            filter_query: String::new(),
            sort_by: Vec::new(),
            page_current: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TablePage {
    pub columns: Vec<TableColumn>,
    pub rows: Vec<SummaryRow>,
    pub page_current: usize,
    pub page_size: usize,
    pub page_count: usize,
    pub total_rows: usize,
}

/// The full summary row set in base order. Independent of the console
/// controls.
pub fn summary_table(dataset: &Dataset) -> &[SummaryRow] {
    dataset.summary_rows()
}

pub fn query_table(dataset: &Dataset, query: &TableQuery) -> Result<TablePage, FilterParseError> {
    let filter = FilterQuery::parse(&query.filter_query)?;

    let mut rows: Vec<&SummaryRow> = summary_table(dataset)
        .iter()
        .filter(|row| filter.matches(row))
        .collect();
    if !query.sort_by.is_empty() {
        rows.sort_by(|a, b| {
            query
                .sort_by
                .iter()
                .map(|key| {
                    let ordering = key.column_id.compare(a, b);
                    match key.direction {
                        SortDirection::Asc => ordering,
                        SortDirection::Desc => ordering.reverse(),
                    }
                })
                .find(|ordering| *ordering != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
    }

    let total_rows = rows.len();
    let (page_rows, page_count): (Vec<SummaryRow>, usize) = if query.page_size == 0 {
        (
            rows.into_iter().cloned().collect(),
            usize::from(total_rows > 0),
        )
    } else {
        (
            rows.into_iter()
                .skip(query.page_current.saturating_mul(query.page_size))
                .take(query.page_size)
                .cloned()
                .collect(),
            total_rows.div_ceil(query.page_size),
        )
    };

    Ok(TablePage {
        columns: TableColumn::ALL.to_vec(),
        rows: page_rows,
        page_current: query.page_current,
        page_size: query.page_size,
        page_count,
        total_rows,
    })
}
