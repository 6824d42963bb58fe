//! Test fixture creation for the two CSV sources

use anyhow::Result;
use ratings_console_server::dataset::DatasetSources;
use std::fs;
use tempfile::TempDir;

/// One-hot events: Action 1995 ×3, Comedy 1996 ×2, plus a few other genres
/// so that the year bounds are 1990-2000.
const EVENTS_CSV: &str = "\
release_year,Action,Comedy,Drama,Sci-Fi
1990,0,0,1,0
1995,1,0,0,0
1995,1,0,0,0
1995,1,0,1,0
1996,0,1,0,0
1996,0,1,0,1
2000,0,0,0,1
";

/// Nine perfect Action titles, an Action/Comedy tie at 9.0, a title rated in
/// two genres and two rows that are skipped at load (unknown genre, rating
/// out of bounds).
const RATINGS_CSV: &str = "\
title,release_date,genre,rating
Alpha,01-Jan-1995,Action,10
Bravo,01-Jan-1995,Action,10
Charlie,01-Jan-1995,Action,10
Delta,01-Jan-1995,Action,10
Echo,01-Jan-1995,Action,10
Foxtrot,01-Jan-1995,Action,10
Golf,01-Jan-1995,Action,10
Hotel,01-Jan-1995,Action,10
India,01-Jan-1995,Action,10
X,15-Mar-1996,Action,9
Y,20-Jul-1996,Comedy,9
Z,20-Jul-1996,Comedy,2
Heat,15-Dec-1995,Action,8
Heat,15-Dec-1995,Thriller,6
Ghost,01-Jan-1995,Space Opera,5
Broken,01-Jan-1995,Drama,11
";

/// Writes both sources into a temporary directory.
/// Returns (temp_dir, sources); the files live as long as the directory.
pub fn create_test_dataset() -> Result<(TempDir, DatasetSources)> {
    let dir = TempDir::new()?;
    let events_csv = dir.path().join("genre_counts.csv");
    let ratings_csv = dir.path().join("ratings.csv");

    fs::write(&events_csv, EVENTS_CSV)?;
    fs::write(&ratings_csv, RATINGS_CSV)?;

    Ok((
        dir,
        DatasetSources {
            events_csv,
            ratings_csv,
        },
    ))
}
