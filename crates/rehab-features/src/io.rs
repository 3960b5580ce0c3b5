//! Reading input tables and writing pipeline artifacts.

use crate::assembler::{AssembledFeatures, AssemblerState};
use crate::config::PipelineConfig;
use crate::error::{FeatureError, Result, ResultExt};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const INFER_SCHEMA_ROWS: usize = 100;

/// Load a CSV file, retrying with looser settings if the first read fails.
///
/// Strategies, in order: standard quoting, default parse options, and finally
/// the file contents with doubled quotes and blank lines removed.
pub fn load_csv(path: &Path) -> Result<DataFrame> {
    match CsvReadOptions::default()
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => debug!("Standard CSV loading failed: {}", e),
    }

    match CsvReadOptions::default()
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => debug!("CSV loading with default options failed: {}", e),
    }

    let content = fs::read_to_string(path).context(format!("Reading {}", path.display()))?;
    CsvReadOptions::default()
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .with_has_header(true)
        .into_reader_with_file_handle(Cursor::new(clean_csv_content(&content)))
        .finish()
        .context(format!("Parsing {}", path.display()))
}

fn clean_csv_content(content: &str) -> String {
    content
        .replace("\"\"\"", "\"")
        .replace("\"\"", "\"")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn load_parquet(path: &Path) -> Result<DataFrame> {
    let file = File::open(path).context(format!("Opening {}", path.display()))?;
    ParquetReader::new(file)
        .finish()
        .context(format!("Reading {}", path.display()))
}

/// Load a CSV or Parquet file, chosen by extension.
pub fn load_table(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(FeatureError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Input file not found: {}", path.display()),
        )));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let df = match extension.as_deref() {
        Some("parquet") => load_parquet(path)?,
        Some("csv") | Some("txt") | None => load_csv(path)?,
        Some(other) => {
            return Err(FeatureError::InvalidConfig(format!(
                "unsupported input format '.{}' (expected .csv or .parquet)",
                other
            )));
        }
    };

    info!("Loaded {}: {:?}", path.display(), df.shape());
    Ok(df)
}

pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path).context(format!("Creating {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .with_quote_char(b'"')
        .finish(df)
        .context(format!("Writing {}", path.display()))
}

pub fn write_parquet(df: &mut DataFrame, path: &Path) -> Result<()> {
    let file = File::create(path).context(format!("Creating {}", path.display()))?;
    ParquetWriter::new(file)
        .finish(df)
        .context(format!("Writing {}", path.display()))?;
    Ok(())
}

/// Write one column name per line.
pub fn write_feature_names(names: &[String], path: &Path) -> Result<()> {
    fs::write(path, names.join("\n")).context(format!("Writing {}", path.display()))
}

pub fn save_state(state: &AssemblerState, path: &Path) -> Result<()> {
    fs::write(path, state.to_json()?).context(format!("Writing {}", path.display()))
}

pub fn load_state(path: &Path) -> Result<AssemblerState> {
    let json = fs::read_to_string(path).context(format!("Reading {}", path.display()))?;
    AssemblerState::from_json(&json).context(format!("Parsing fitted state {}", path.display()))
}

/// Write any serializable value as pretty JSON.
pub fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).context(format!("Writing {}", path.display()))
}

/// Locations of the files written for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    pub parquet: PathBuf,
    pub csv: PathBuf,
    pub feature_names: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<PathBuf>,
}

/// Write the feature table, the column listing and (optionally) the state.
///
/// Either every artifact is written or, on the first failure, the files
/// already written for this run are removed again.
pub fn write_artifacts(
    features: &mut AssembledFeatures,
    state: Option<&AssemblerState>,
    config: &PipelineConfig,
) -> Result<ArtifactPaths> {
    fs::create_dir_all(&config.output_dir)
        .context(format!("Creating {}", config.output_dir.display()))?;

    let paths = ArtifactPaths {
        parquet: config.output_path("parquet"),
        csv: config.output_path("csv"),
        feature_names: config.feature_names_path(),
        state: state.map(|_| config.state_path()),
    };

    let mut touched = Vec::new();
    if let Err(e) = write_each(features, state, &paths, &mut touched) {
        for path in touched {
            match fs::remove_file(path) {
                Ok(()) => debug!("Removed partial artifact {}", path.display()),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => warn!("Could not remove {}: {}", path.display(), err),
            }
        }
        return Err(e);
    }

    info!("Saved: {} and {}", paths.parquet.display(), paths.csv.display());
    Ok(paths)
}

// Records each path before writing it, so a half-written file is cleaned up too.
fn write_each<'a>(
    features: &mut AssembledFeatures,
    state: Option<&AssemblerState>,
    paths: &'a ArtifactPaths,
    touched: &mut Vec<&'a Path>,
) -> Result<()> {
    touched.push(&paths.parquet);
    write_parquet(&mut features.frame, &paths.parquet)?;
    touched.push(&paths.csv);
    write_csv(&mut features.frame, &paths.csv)?;
    touched.push(&paths.feature_names);
    write_feature_names(&features.column_names(), &paths.feature_names)?;
    if let (Some(state), Some(path)) = (state, &paths.state) {
        touched.push(path);
        save_state(state, path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn csv_file(content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_csv() {
        let file = csv_file("HastaNo,Alerji\n1,\"Polen, Toz\"\n2,\n");
        let df = load_table(file.path()).unwrap();
        assert_eq!(df.shape(), (2, 2));
        let alerji = df.column("Alerji").unwrap().str().unwrap().get(0);
        assert_eq!(alerji, Some("Polen, Toz"));
    }

    #[test]
    fn test_clean_csv_content() {
        assert_eq!(clean_csv_content("a,b\n\n1,\"\"x\"\"\n"), "a,b\n1,\"x\"");
    }

    #[test]
    fn test_missing_file() {
        let err = load_table(Path::new("/nonexistent/input.csv")).unwrap_err();
        assert_eq!(err.error_code(), "IO_ERROR");
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        let err = load_table(file.path()).unwrap_err();
        assert!(matches!(err, FeatureError::InvalidConfig(_)));
    }

    #[test]
    fn test_parquet_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("table.parquet");
        let mut df = df!("HastaNo" => &[1i64, 2], "num__Yas" => &[-1.0, 1.0]).unwrap();

        write_parquet(&mut df, &path).unwrap();
        let loaded = load_table(&path).unwrap();
        assert!(loaded.equals_missing(&df));
    }

    fn assembled() -> AssembledFeatures {
        AssembledFeatures {
            frame: df!("HastaNo" => &[1i64, 2], "num__Yas" => &[-1.0, 1.0]).unwrap(),
            feature_names: vec!["num__Yas".to_string()],
            dedup: Default::default(),
        }
    }

    #[test]
    fn test_write_artifacts() {
        let dir = TempDir::new().unwrap();
        let config = PipelineConfig::builder().output_dir(dir.path()).build().unwrap();
        let mut features = assembled();

        let paths = write_artifacts(&mut features, None, &config).unwrap();
        assert!(paths.parquet.exists());
        assert!(paths.csv.exists());
        assert_eq!(fs::read_to_string(&paths.feature_names).unwrap(), "HastaNo\nnum__Yas");
        assert_eq!(paths.state, None);
    }

    #[test]
    fn test_failed_write_leaves_no_partial_artifacts() {
        let dir = TempDir::new().unwrap();
        let config = PipelineConfig::builder().output_dir(dir.path()).build().unwrap();
        // A directory where the CSV should go makes the second write fail.
        fs::create_dir_all(config.output_path("csv")).unwrap();
        let mut features = assembled();

        let err = write_artifacts(&mut features, None, &config).unwrap_err();
        assert_eq!(err.error_code(), "IO_ERROR");
        assert!(!config.output_path("parquet").exists());
        assert!(!config.feature_names_path().exists());
        assert!(config.output_path("csv").is_dir());
    }

    #[test]
    fn test_feature_names_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("feature_names.txt");
        let names = vec!["HastaNo".to_string(), "num__Yas".to_string()];

        write_feature_names(&names, &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "HastaNo\nnum__Yas");
    }
}
