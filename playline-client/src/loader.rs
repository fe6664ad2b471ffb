//! CSV record loading
//!
//! Expected columns: `user_id,song_id,artist,duration,timestamp[,genre]`
//! with a header row. A duration that does not parse as a non-negative
//! integer is malformed input, never coerced to zero. A missing genre
//! column yields an empty genre.

use playline_common::model::StreamRecord;
use playline_common::{Error, Result};
use std::path::Path;

pub fn load_records(path: &Path) -> Result<Vec<StreamRecord>> {
    let contents = std::fs::read_to_string(path)?;
    let records = parse_csv(&contents)?;
    tracing::info!(path = %path.display(), records = records.len(), "loaded stream records");
    Ok(records)
}

pub fn parse_csv(contents: &str) -> Result<Vec<StreamRecord>> {
    let mut records = Vec::new();
    let mut lines = contents.lines().enumerate();

    // header row
    if lines.next().is_none() {
        return Ok(records);
    }

    for (index, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        let line_no = index + 1;
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() < 5 {
            return Err(Error::MalformedInput(format!(
                "line {}: expected at least 5 fields, got {}",
                line_no,
                fields.len()
            )));
        }

        let duration = fields[3].parse::<u64>().map_err(|_| {
            Error::MalformedInput(format!(
                "line {}: duration {:?} is not a non-negative integer",
                line_no, fields[3]
            ))
        })?;

        records.push(StreamRecord {
            user_id: fields[0].to_string(),
            song_id: fields[1].to_string(),
            artist: fields[2].to_string(),
            duration,
            timestamp: fields[4].to_string(),
            genre: fields.get(5).copied().unwrap_or("").to_string(),
        });
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "user_id,song_id,artist,duration,timestamp,genre";

    #[test]
    fn test_parse_well_formed_csv() {
        let csv = format!(
            "{}\nU1,S1,Artist A,100,2024-01-01T00:00:00Z,rock\nU2,S2,Artist B,30,2024-01-01T00:01:00Z,\n",
            HEADER
        );
        let records = parse_csv(&csv).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].artist, "Artist A");
        assert_eq!(records[0].duration, 100);
        assert_eq!(records[1].genre, "");
    }

    #[test]
    fn test_missing_genre_column_yields_empty_genre() {
        let csv = "user_id,song_id,artist,duration,timestamp\nU1,S1,A,10,2024-01-01T00:00:00Z\n";
        let records = parse_csv(csv).unwrap();
        assert_eq!(records[0].genre, "");
    }

    #[test]
    fn test_non_numeric_duration_is_malformed() {
        let csv = format!("{}\nU1,S1,A,abc,2024-01-01T00:00:00Z,rock\n", HEADER);
        match parse_csv(&csv) {
            Err(Error::MalformedInput(message)) => {
                assert!(message.contains("abc"), "message was: {}", message)
            }
            other => panic!("expected MalformedInput, got {:?}", other.map(|r| r.len())),
        }
    }

    #[test]
    fn test_negative_duration_is_malformed_not_coerced() {
        let csv = format!("{}\nU1,S1,A,-5,2024-01-01T00:00:00Z,rock\n", HEADER);
        assert!(matches!(parse_csv(&csv), Err(Error::MalformedInput(_))));
    }

    #[test]
    fn test_short_row_is_malformed() {
        let csv = format!("{}\nU1,S1,A\n", HEADER);
        assert!(matches!(parse_csv(&csv), Err(Error::MalformedInput(_))));
    }

    #[test]
    fn test_empty_and_header_only_inputs() {
        assert!(parse_csv("").unwrap().is_empty());
        assert!(parse_csv(HEADER).unwrap().is_empty());
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let csv = format!(
            "{}\nU1,S1,A,10,2024-01-01T00:00:00Z,rock\n\n\nU2,S2,B,20,2024-01-01T00:01:00Z,pop\n",
            HEADER
        );
        assert_eq!(parse_csv(&csv).unwrap().len(), 2);
    }
}
