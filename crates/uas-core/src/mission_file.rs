//! Mission definition files in the QGC WPL 110 text format.
//!
//! ```text
//! QGC WPL 110
//! 0	1	0	16	0	0	0	0	38.315	-76.549	40.0	1
//! 1	0	3	22	15	0	0	0	38.316	-76.550	30.0	1
//! ```
//!
//! Columns: seq, current, frame, command, param1..param4, lat, lon, alt,
//! autocontinue. Items are taken in file order; the `seq` column is
//! informational and replaced when a [`MissionSlice`] renumbers them.

use crate::coordinate::Coordinate;
use crate::models::{MissionFrame, MissionItem};
use std::path::{Path, PathBuf};

const HEADER_PREFIX: &str = "QGC WPL";
const FIELD_COUNT: usize = 12;

#[derive(Debug, thiserror::Error)]
pub enum MissionFileError {
    #[error("failed to read mission file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("missing 'QGC WPL' header")]
    MissingHeader,
    #[error("line {line}: {reason}")]
    Malformed { line: usize, reason: String },
    #[error("line {line}: unknown frame {frame}")]
    UnknownFrame { line: usize, frame: u8 },
    #[error("range {start}..{end} out of bounds for mission of {len} items")]
    RangeOutOfBounds { start: usize, end: usize, len: usize },
    #[error("mission too long to number from {first_seq}")]
    SequenceOverflow { first_seq: u16 },
}

/// Selects a contiguous `[start, end)` window of a file mission and the
/// sequence number its first item receives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MissionSlice {
    pub start: usize,
    /// Exclusive end; `None` runs to the end of the file.
    pub end: Option<usize>,
    pub first_seq: u16,
}

impl MissionSlice {
    /// The whole file, numbered from 0.
    pub fn full() -> Self {
        Self::default()
    }

    /// Items `[0, end)`, numbered from 0.
    pub fn prefix(end: usize) -> Self {
        Self {
            start: 0,
            end: Some(end),
            first_seq: 0,
        }
    }

    /// Items from `start` to the end of the file, numbered from `first_seq`.
    pub fn suffix(start: usize, first_seq: u16) -> Self {
        Self {
            start,
            end: None,
            first_seq,
        }
    }

    /// Cut `items` down to this window and renumber it.
    pub fn apply(&self, items: Vec<MissionItem>) -> Result<Vec<MissionItem>, MissionFileError> {
        let len = items.len();
        let end = self.end.unwrap_or(len);
        if self.start > end || end > len {
            return Err(MissionFileError::RangeOutOfBounds {
                start: self.start,
                end,
                len,
            });
        }

        let count = end - self.start;
        if usize::from(self.first_seq) + count > usize::from(u16::MAX) + 1 {
            return Err(MissionFileError::SequenceOverflow {
                first_seq: self.first_seq,
            });
        }

        let mut window: Vec<MissionItem> = items.into_iter().skip(self.start).take(count).collect();
        for (offset, item) in window.iter_mut().enumerate() {
            // bounded by the overflow check above
            item.seq = self.first_seq + offset as u16;
        }
        Ok(window)
    }
}

/// Read and parse a mission file.
pub fn load_mission_file(path: impl AsRef<Path>) -> Result<Vec<MissionItem>, MissionFileError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| MissionFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_mission(&text)
}

/// Parse the text of a mission file.
pub fn parse_mission(text: &str) -> Result<Vec<MissionItem>, MissionFileError> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty());

    match lines.next() {
        Some((_, header)) if header.starts_with(HEADER_PREFIX) => {}
        _ => return Err(MissionFileError::MissingHeader),
    }

    lines.map(|(line, text)| parse_item(line, text)).collect()
}

fn parse_item(line: usize, text: &str) -> Result<MissionItem, MissionFileError> {
    let fields: Vec<&str> = text.split_whitespace().collect();
    if fields.len() != FIELD_COUNT {
        return Err(MissionFileError::Malformed {
            line,
            reason: format!("expected {FIELD_COUNT} fields, found {}", fields.len()),
        });
    }

    let frame_code: u8 = field(line, &fields, 2, "frame")?;
    let frame = MissionFrame::from_code(frame_code).ok_or(MissionFileError::UnknownFrame {
        line,
        frame: frame_code,
    })?;

    Ok(MissionItem {
        seq: field(line, &fields, 0, "seq")?,
        current: flag(line, &fields, 1, "current")?,
        frame,
        command: field(line, &fields, 3, "command")?,
        param1: field(line, &fields, 4, "param1")?,
        param2: field(line, &fields, 5, "param2")?,
        param3: field(line, &fields, 6, "param3")?,
        param4: field(line, &fields, 7, "param4")?,
        coordinate: Coordinate::new(
            field(line, &fields, 8, "latitude")?,
            field(line, &fields, 9, "longitude")?,
            field(line, &fields, 10, "altitude")?,
        ),
        auto_continue: flag(line, &fields, 11, "autocontinue")?,
    })
}

fn field<T: std::str::FromStr>(
    line: usize,
    fields: &[&str],
    idx: usize,
    name: &str,
) -> Result<T, MissionFileError> {
    fields[idx]
        .parse()
        .map_err(|_| MissionFileError::Malformed {
            line,
            reason: format!("invalid {name} '{}'", fields[idx]),
        })
}

fn flag(line: usize, fields: &[&str], idx: usize, name: &str) -> Result<bool, MissionFileError> {
    let value: u8 = field(line, fields, idx, name)?;
    Ok(value != 0)
}
