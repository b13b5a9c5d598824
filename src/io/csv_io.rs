use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

use crate::error::GrowthError;
use crate::models::GrowthSeries;

/// CSV row structure for growth measurements.
#[derive(Debug, serde::Deserialize, serde::Serialize)]
struct MeasurementRow {
    elapsed_seconds: f64,
    measurement: f64,
}

fn parse_csv_records<R: Read>(rdr: &mut csv::Reader<R>) -> Result<GrowthSeries, GrowthError> {
    let mut series = GrowthSeries::new();

    for (index, result) in rdr.deserialize().enumerate() {
        let row: MeasurementRow = result?;
        let line = index + 2;

        let elapsed = Duration::try_from_secs_f64(row.elapsed_seconds).map_err(|_| {
            GrowthError::ValidationError(format!(
                "Row {line}: elapsed_seconds must be finite and non-negative, got {}",
                row.elapsed_seconds
            ))
        })?;
        if !row.measurement.is_finite() {
            return Err(GrowthError::ValidationError(format!(
                "Row {line}: measurement must be finite, got {}",
                row.measurement
            )));
        }

        if series.insert(elapsed, row.measurement).is_some() {
            tracing::warn!(
                line,
                elapsed_seconds = row.elapsed_seconds,
                "duplicate timestamp, keeping the later measurement"
            );
        }
    }

    Ok(series)
}

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(true).flexible(true).trim(csv::Trim::All);
    builder
}

/// Read a growth series from a CSV file with `elapsed_seconds` and `measurement` columns.
pub fn read_csv(path: impl AsRef<Path>) -> Result<GrowthSeries, GrowthError> {
    let mut rdr = reader_builder().from_path(path.as_ref())?;
    parse_csv_records(&mut rdr)
}

/// Read a growth series from CSV bytes.
pub fn read_csv_from_bytes(data: &[u8]) -> Result<GrowthSeries, GrowthError> {
    let mut rdr = reader_builder().from_reader(data);
    parse_csv_records(&mut rdr)
}

/// Write a growth series to a CSV file.
pub fn write_csv(series: &GrowthSeries, path: impl AsRef<Path>) -> Result<(), GrowthError> {
    let file = std::fs::File::create(path.as_ref())?;
    write_csv_to(series, file)
}

/// Write a growth series as CSV to any writer.
pub fn write_csv_to<W: Write>(series: &GrowthSeries, writer: W) -> Result<(), GrowthError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for (elapsed, measurement) in series.iter() {
        wtr.serialize(MeasurementRow {
            elapsed_seconds: elapsed.as_secs_f64(),
            measurement,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_from_bytes() {
        let data = b"elapsed_seconds,measurement\n1200,2.5\n0, 1.0\n600,1.5\n";
        let series = read_csv_from_bytes(data).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.timestamps(), vec![0.0, 600.0, 1200.0]);
        assert_eq!(series.measurements(), vec![1.0, 1.5, 2.5]);
    }

    #[test]
    fn test_negative_time_rejected() {
        let data = b"elapsed_seconds,measurement\n-5,1.0\n";
        let err = read_csv_from_bytes(data).unwrap_err();
        assert!(matches!(err, GrowthError::ValidationError(_)));
        assert!(err.to_string().contains("Row 2"));
    }

    #[test]
    fn test_non_finite_measurement_rejected() {
        let data = b"elapsed_seconds,measurement\n0,NaN\n";
        let err = read_csv_from_bytes(data).unwrap_err();
        assert!(err.to_string().contains("measurement must be finite"));
    }

    #[test]
    fn test_malformed_row_is_csv_error() {
        let data = b"elapsed_seconds,measurement\nabc,1.0\n";
        let err = read_csv_from_bytes(data).unwrap_err();
        assert!(matches!(err, GrowthError::Csv(_)));
    }

    #[test]
    fn test_duplicate_time_keeps_last() {
        let data = b"elapsed_seconds,measurement\n60,1.0\n60,2.0\n";
        let series = read_csv_from_bytes(data).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.measurements(), vec![2.0]);
    }

    #[test]
    fn test_file_roundtrip() {
        let series = GrowthSeries::from_seconds(&[(0.0, 1.0), (900.0, 1.25), (1800.0, 2.0)]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("series.csv");
        write_csv(&series, &path).unwrap();
        let loaded = read_csv(&path).unwrap();
        assert_eq!(loaded, series);
    }

    #[test]
    fn test_write_to_buffer() {
        let series = GrowthSeries::from_seconds(&[(0.0, 1.0), (60.0, 1.5)]);
        let mut buffer = Vec::new();
        write_csv_to(&series, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.starts_with("elapsed_seconds,measurement\n"));
        assert!(text.contains("60.0,1.5"));
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_csv(dir.path().join("missing.csv")).is_err());
    }
}
