use serde::Serialize;
use std::path::Path;

use crate::error::OutputError;
use crate::inference::forecast::ForecastPoint;

/// Writes a model or scaler in the bincode layout that
/// [`Artifacts::load`](crate::model::artifacts::Artifacts::load) reads.
pub fn save_artifact<T: Serialize>(path: &Path, artifact: &T) -> Result<(), OutputError> {
    let data = bincode::serialize(artifact)?;
    std::fs::write(path, data)?;
    Ok(())
}

#[derive(Serialize)]
struct ForecastRow {
    date: String,
    pm25: String,
}

/// Writes `date,pm25` rows, values with two decimals.
pub fn write_forecast_csv(path: &Path, points: &[ForecastPoint]) -> Result<(), OutputError> {
    let mut writer = csv::Writer::from_path(path)?;
    for point in points {
        writer.serialize(ForecastRow {
            date: point.date.format("%Y-%m-%d").to_string(),
            pm25: format!("{:.2}", point.value),
        })?;
    }
    writer.flush()?;
    Ok(())
}
