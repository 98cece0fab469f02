use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::info;

use super::{RoundDetail, WireRoundDetail};
use crate::errors::RoundwatchError;

/// Loads a single round detail document, as returned by `GET /rounds/{id}`
pub fn load_round_detail(source_file: &Path) -> Result<RoundDetail, RoundwatchError> {
    if !source_file.exists() {
        return Err(RoundwatchError::InvalidRoundFile {
            path: format!("{:?}", source_file),
        });
    }

    let file =
        File::open(source_file).map_err(|e| RoundwatchError::RoundLoaderError { source: e })?;
    let wire: WireRoundDetail = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| RoundwatchError::RoundParseError { source: e })?;
    let detail = RoundDetail::try_from(wire)?;

    info!(
        "Loaded {:?}, round {} with {} timeline events",
        source_file,
        detail.round.id,
        detail.timeline.len()
    );
    Ok(detail)
}

/// Loads a JSON Lines export with one round detail per line
pub fn load_round_details_jsonl(source_file: &Path) -> Result<Vec<RoundDetail>, RoundwatchError> {
    if !source_file.exists() {
        return Err(RoundwatchError::InvalidRoundFile {
            path: format!("{:?}", source_file),
        });
    }

    let wire_lines = serde_jsonlines::json_lines(source_file)
        .map_err(|e| RoundwatchError::RoundLoaderError { source: e })?
        .collect::<Result<Vec<WireRoundDetail>, std::io::Error>>()
        .map_err(|e| RoundwatchError::RoundLoaderError { source: e })?;

    let details = wire_lines
        .into_iter()
        .map(RoundDetail::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    info!(
        "Loaded {:?}, found {} rounds with a total of {} timeline events",
        source_file,
        details.len(),
        details.iter().map(|d| d.timeline.len()).sum::<usize>()
    );
    Ok(details)
}
