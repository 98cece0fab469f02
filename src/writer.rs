use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use log::info;

use crate::{RoundwatchError, metrics::RoundMetrics};

/// Writes one JSON document per round
pub fn write_metrics(file: &Path, metrics: &[RoundMetrics]) -> Result<(), RoundwatchError> {
    let metrics_file = File::create(file).map_err(|e| RoundwatchError::WriterError { source: e })?;
    let mut metrics_file_writer = BufWriter::new(metrics_file);
    for round_metrics in metrics {
        let line = serde_json::to_string(round_metrics)
            .map_err(|e| RoundwatchError::MetricsSerializeError { source: e })?;
        writeln!(metrics_file_writer, "{}", line)
            .map_err(|e| RoundwatchError::WriterError { source: e })?;
    }
    metrics_file_writer
        .flush()
        .map_err(|e| RoundwatchError::WriterError { source: e })?;
    info!("Wrote metrics for {} rounds to {:?}", metrics.len(), file);
    Ok(())
}
