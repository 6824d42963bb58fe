//! Shared constants for end-to-end tests
//!
//! This module contains all constants used across the test suite.
//! When the fixture dataset changes, update only this file and fixtures.rs.

// ============================================================================
// Fixture Dataset Shape
// ============================================================================

/// Earliest release year in the events fixture
pub const MIN_YEAR: i32 = 1990;

/// Latest release year in the events fixture
pub const MAX_YEAR: i32 = 2000;

/// Action releases in 1995
pub const ACTION_1995_COUNT: u64 = 3;

/// Comedy releases in 1996
pub const COMEDY_1996_COUNT: u64 = 2;

/// Distinct (title, release date, genre) groups among the valid ratings
pub const SUMMARY_ROW_COUNT: usize = 14;

/// Titles rated 10.0 in Action, ranked above the tie
pub const PERFECT_ACTION_TITLES: [&str; 9] = [
    "Alpha", "Bravo", "Charlie", "Delta", "Echo", "Foxtrot", "Golf", "Hotel", "India",
];

/// Action title tied with `TIED_COMEDY_TITLE` at rank 10
pub const TIED_ACTION_TITLE: &str = "X";

/// Comedy title tied with `TIED_ACTION_TITLE` at rank 10
pub const TIED_COMEDY_TITLE: &str = "Y";

/// Worst rated title of the fixture
pub const WORST_TITLE: &str = "Z";

/// Title rated in both Action and Thriller
pub const MULTI_GENRE_TITLE: &str = "Heat";

// ============================================================================
// Test Timeouts and Configuration
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;
