//! JSON-lines event log reader.
//!
//! One [`ProjectionEvent`] per line. Blank lines and lines starting with
//! `#` are skipped.

use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use courier_projection::ProjectionEvent;

use crate::error::{ReplayError, Result};

pub async fn read_event_log(path: &Path) -> Result<Vec<ProjectionEvent>> {
    let file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ReplayError::LogNotFound(path.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };

    let mut lines = BufReader::new(file).lines();
    let mut events = Vec::new();
    let mut line_no = 0;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if let Some(event) = parse_line(line_no, &line)? {
            events.push(event);
        }
    }

    debug!(path = %path.display(), lines = line_no, events = events.len(), "Read event log");
    Ok(events)
}

pub fn parse_line(line_no: usize, line: &str) -> Result<Option<ProjectionEvent>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(line)
        .map(Some)
        .map_err(|source| ReplayError::Parse {
            line: line_no,
            source,
        })
}
