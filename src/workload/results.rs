//! Parsing of the per-thread timing CSV a workload leaves behind

use std::path::Path;

use lockbench_core::{BenchError, BenchResult, Level, Observation};
use serde::Deserialize;

/// One line of `Threads,Time,...`; other columns are ignored
#[derive(Debug, Deserialize)]
struct TimingRecord {
    #[serde(rename = "Threads")]
    threads: Level,
    #[serde(rename = "Time")]
    time: f64,
}

/// Read a workload result file into seconds per thread count
pub fn read_results(path: &Path) -> BenchResult<Observation> {
    let parse_error = |message: String| BenchError::ResultParse {
        path: path.to_path_buf(),
        message,
    };

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| parse_error(e.to_string()))?;

    let mut observation = Observation::new();
    for record in rdr.deserialize::<TimingRecord>() {
        let record = record.map_err(|e| parse_error(e.to_string()))?;
        if observation.insert(record.threads, record.time).is_some() {
            return Err(parse_error(format!(
                "duplicate row for {} threads",
                record.threads
            )));
        }
    }

    if observation.is_empty() {
        return Err(parse_error("no timing rows".into()));
    }

    Ok(observation)
}
