//! Configuration loading and trace discovery for the CLI.
//!
//! Precedence: built-in defaults, then the JSON config file, then flags and
//! `OPTICAL_TALLY_*` environment variables.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use runner::{RunConfig, TraceSource};
use tally_core::StepMapper;

/// File name prefix and extension of per-worker trace files.
const TRACE_PREFIX: &str = "worker-";
const TRACE_EXTENSION: &str = "jsonl";

/// Command-line overrides applied on top of the file config.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    pub quantum_efficiency: Option<f64>,
    pub sequential: bool,
    pub kill_on_second_surface: bool,
}

/// Build the run configuration from an optional JSON file plus overrides.
pub fn load(path: Option<&Path>, overrides: Overrides) -> anyhow::Result<RunConfig> {
    let mut config = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config from {}", path.display()))?
        }
        None => RunConfig::default(),
    };

    if let Some(qe) = overrides.quantum_efficiency {
        config.quantum_efficiency = qe;
    }
    if overrides.sequential {
        config.parallelization.force_sequential = true;
    }
    if overrides.kill_on_second_surface {
        config.tally.kill_on_second_surface = true;
    }

    if !(config.quantum_efficiency > 0.0 && config.quantum_efficiency <= 1.0) {
        bail!(
            "quantum efficiency must be in (0, 1], got {}",
            config.quantum_efficiency
        );
    }
    Ok(config)
}

/// Per-worker trace files in `dir`, ordered by worker number.
///
/// The position of a file in the returned list is its worker id, so
/// `worker-2.jsonl` comes before `worker-10.jsonl`. Names without a number
/// sort last, by name.
pub fn trace_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read trace directory {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("Failed to list {}", dir.display()))?
            .path();
        let is_trace = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(TRACE_PREFIX))
            && path.extension().is_some_and(|e| e == TRACE_EXTENSION);
        if is_trace && path.is_file() {
            files.push(path);
        }
    }

    if files.is_empty() {
        bail!(
            "no {}*.{} files in {}",
            TRACE_PREFIX,
            TRACE_EXTENSION,
            dir.display()
        );
    }
    files.sort_by_cached_key(|path| {
        let index = worker_index(path);
        (index.is_none(), index, path.clone())
    });
    Ok(files)
}

fn worker_index(path: &Path) -> Option<u64> {
    path.file_stem()?
        .to_str()?
        .strip_prefix(TRACE_PREFIX)?
        .parse()
        .ok()
}

/// Open one trace source per file.
pub fn open_sources(
    files: &[PathBuf],
    config: &RunConfig,
) -> anyhow::Result<Vec<TraceSource<BufReader<File>>>> {
    let mapper = StepMapper::new(&config.tally);
    files
        .iter()
        .map(|path| {
            let file =
                File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
            Ok(TraceSource::new(BufReader::new(file), mapper.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_defaults_with_overrides() {
        let overrides = Overrides {
            quantum_efficiency: Some(0.5),
            sequential: true,
            kill_on_second_surface: false,
        };
        let config = load(None, overrides).unwrap();
        assert_eq!(config.quantum_efficiency, 0.5);
        assert!(config.parallelization.force_sequential);
    }

    #[test]
    fn test_load_rejects_bad_quantum_efficiency() {
        let overrides = Overrides {
            quantum_efficiency: Some(1.5),
            ..Overrides::default()
        };
        assert!(load(None, overrides).is_err());
    }

    #[test]
    fn test_load_file_then_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tally.json");
        std::fs::write(
            &path,
            r#"{"quantum_efficiency":0.8,"tally":{"target_volume":"Crystal"}}"#,
        )
        .unwrap();

        let config = load(
            Some(&path),
            Overrides {
                kill_on_second_surface: true,
                ..Overrides::default()
            },
        )
        .unwrap();
        assert_eq!(config.quantum_efficiency, 0.8);
        assert_eq!(config.tally.target_volume, "Crystal");
        assert!(config.tally.kill_on_second_surface);
    }

    #[test]
    fn test_trace_files_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["worker-1.jsonl", "worker-0.jsonl", "notes.txt", "worker-2.json"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }

        let files = trace_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["worker-0.jsonl", "worker-1.jsonl"]);
    }

    #[test]
    fn test_trace_files_numeric_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "worker-10.jsonl",
            "worker-2.jsonl",
            "worker-extra.jsonl",
            "worker-1.jsonl",
        ] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }

        let files = trace_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "worker-1.jsonl",
                "worker-2.jsonl",
                "worker-10.jsonl",
                "worker-extra.jsonl"
            ]
        );
    }

    #[test]
    fn test_trace_files_empty_dir_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(trace_files(dir.path()).is_err());
    }
}
