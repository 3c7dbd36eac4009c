use std::fs;
use std::path::{Path, PathBuf};

use csv::Writer;

use crate::errors::{NucleiFeatureError, Result};
use crate::pipeline::FeatureVector;

/// Summary file collecting one row per processed image
pub const FEATURE_CSV_NAME: &str = "features.csv";

/// Append one image's features to `<output_dir>/features.csv`.
/// The `ID` + label header is written when the file is created.
pub fn write_feature_csv<P: AsRef<Path>>(
    output_dir: P,
    filename: &str,
    features: &FeatureVector,
) -> Result<PathBuf> {
    let output_dir = output_dir.as_ref();
    fs::create_dir_all(output_dir)?;

    let summary_path = output_dir.join(FEATURE_CSV_NAME);
    let file_exists = summary_path.exists();

    // Open file in append mode if it exists, otherwise create new
    let mut writer = if file_exists {
        Writer::from_writer(fs::OpenOptions::new().append(true).open(&summary_path)?)
    } else {
        let mut writer = Writer::from_path(&summary_path)?;
        let mut header = Vec::with_capacity(features.len() + 1);
        header.push("ID");
        header.extend(features.labels.iter().map(String::as_str));
        writer.write_record(&header)?;
        writer
    };

    let mut row = Vec::with_capacity(features.len() + 1);
    row.push(filename.to_string());
    row.extend(features.values.iter().map(|v| format!("{:.6}", v)));
    writer.write_record(&row)?;

    writer
        .flush()
        .map_err(|e| NucleiFeatureError::CsvOutput(csv::Error::from(e)))?;

    Ok(summary_path)
}

/// Write one image's features as `<output_dir>/<filename>.json`; NaN becomes null
pub fn write_feature_json<P: AsRef<Path>>(
    output_dir: P,
    filename: &str,
    features: &FeatureVector,
) -> Result<PathBuf> {
    let output_dir = output_dir.as_ref();
    fs::create_dir_all(output_dir)?;

    let path = output_dir.join(format!("{}.json", filename));
    let content = serde_json::to_string_pretty(features)
        .map_err(|e| NucleiFeatureError::Config(format!("Failed to serialize features: {}", e)))?;
    fs::write(&path, content)?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FeatureVector {
        FeatureVector {
            values: vec![1.5, f64::NAN],
            labels: vec!["Area_Mean".to_string(), "Area_Std".to_string()],
        }
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir =
            std::env::temp_dir().join(format!("nuclear_output_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn csv_header_written_once() {
        let dir = scratch_dir("csv");
        write_feature_csv(&dir, "tile_a", &sample()).unwrap();
        let path = write_feature_csv(&dir, "tile_b", &sample()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "ID,Area_Mean,Area_Std");
        assert_eq!(lines[1], "tile_a,1.500000,NaN");
        assert!(lines[2].starts_with("tile_b,"));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn json_maps_nan_to_null() {
        let dir = scratch_dir("json");
        let path = write_feature_json(&dir, "tile", &sample()).unwrap();
        let parsed: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed["labels"][1], "Area_Std");
        assert_eq!(parsed["values"][0], 1.5);
        assert!(parsed["values"][1].is_null());
        let _ = fs::remove_dir_all(&dir);
    }
}
