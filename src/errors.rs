// Error types for roundwatch

use snafu::Snafu;
use std::io;

#[derive(Debug, Snafu)]
pub enum RoundwatchError {
    // Errors while loading round exports
    #[snafu(display("Invalid round file: {path}"))]
    InvalidRoundFile { path: String },
    #[snafu(display("Error loading round file"))]
    RoundLoaderError { source: io::Error },
    #[snafu(display("Error parsing round file"))]
    RoundParseError { source: serde_json::Error },
    #[snafu(display("Invalid round: {reason}"))]
    InvalidRound { reason: String },

    // Errors for the metrics writer
    #[snafu(display("Error writing metrics file"))]
    WriterError { source: io::Error },
    #[snafu(display("Error serializing round metrics"))]
    MetricsSerializeError { source: serde_json::Error },

    // Config management errors
    #[snafu(display("Could not find application data directory to save config file"))]
    NoConfigDir,
    #[snafu(display("Error reading or writing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error serializing config file"))]
    ConfigSerializeError { source: serde_json::Error },

    // User input validation errors
    #[snafu(display("Invalid user input: {field} - {reason}"))]
    InvalidUserInput { field: String, reason: String },
}
