//! Comparison of metrics across generation/evaluation runs.
//!
//! A run directory holds `metrics.json` (written by evaluation) and
//! optionally `run.json` (written by generation). Runs are named after the
//! prompt file they used so prompt variants can be compared side by side.

use crate::files::{read_json, write_json};
use crate::report::render_table;
use crate::types::{EvaluationMetrics, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const METRICS_FILE: &str = "metrics.json";
pub const RUN_FILE: &str = "run.json";

/// Parameters a generation run was made with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub prompt_path: PathBuf,
    pub schema_path: PathBuf,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,

    /// Hash of the schema-filled prompt template
    pub prompt_fingerprint: String,

    /// Number of examples sent to the model
    pub examples: usize,

    pub generated_at: DateTime<Utc>,
}

impl RunMetadata {
    pub fn load(dir: &Path) -> Result<Self> {
        read_json(&dir.join(RUN_FILE))
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        write_json(&dir.join(RUN_FILE), self)
    }

    /// Prompt file stem, e.g. `zero_shot` for `prompts/zero_shot.txt`.
    pub fn prompt_name(&self) -> Option<String> {
        self.prompt_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
    }
}

/// Metrics of one run, ready for comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    pub name: String,
    pub ast_distance: f64,
    pub token_cosine: f64,

    #[serde(default)]
    pub count: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_fingerprint: Option<String>,
}

/// Load a run directory.
///
/// Returns `Ok(None)` when the directory has no `metrics.json` yet.
pub fn load_experiment(dir: &Path) -> Result<Option<Experiment>> {
    let metrics_path = dir.join(METRICS_FILE);
    if !metrics_path.is_file() {
        tracing::debug!(dir = %dir.display(), "no metrics, skipping run");
        return Ok(None);
    }
    let metrics: EvaluationMetrics = read_json(&metrics_path)?;

    let run = if dir.join(RUN_FILE).is_file() {
        Some(RunMetadata::load(dir)?)
    } else {
        None
    };

    let name = run
        .as_ref()
        .and_then(RunMetadata::prompt_name)
        .or_else(|| dir.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| dir.display().to_string());

    Ok(Some(Experiment {
        name,
        ast_distance: metrics.ast_distance_mean,
        token_cosine: metrics.token_cosine_mean,
        count: metrics.count,
        model: run.as_ref().map(|r| r.model.clone()),
        prompt_fingerprint: run.map(|r| r.prompt_fingerprint),
    }))
}

/// Load every run directory that has metrics, deduplicated and sorted by name.
pub fn collect_experiments<P: AsRef<Path>>(dirs: &[P]) -> Result<Vec<Experiment>> {
    let mut experiments: Vec<Experiment> = Vec::new();
    for dir in dirs {
        if let Some(experiment) = load_experiment(dir.as_ref())? {
            if !experiments.contains(&experiment) {
                experiments.push(experiment);
            }
        }
    }

    experiments.sort_by(|a, b| a.name.cmp(&b.name));
    tracing::info!(runs = dirs.len(), experiments = experiments.len(), "collected experiments");
    Ok(experiments)
}

/// Aligned text table with one row per experiment.
pub fn render_experiments(experiments: &[Experiment]) -> String {
    let rows: Vec<Vec<String>> = experiments
        .iter()
        .map(|e| {
            vec![
                e.name.clone(),
                format!("{:.4}", e.ast_distance),
                format!("{:.4}", e.token_cosine),
                e.count.to_string(),
                e.model.clone().unwrap_or_default(),
            ]
        })
        .collect();
    render_table(&["prompt", "ast_distance", "token_cosine", "count", "model"], &rows)
}

pub fn write_experiments_csv<W: Write>(experiments: &[Experiment], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["prompt", "ast_distance", "token_cosine", "count", "model"])?;
    for e in experiments {
        csv_writer.write_record([
            e.name.clone(),
            e.ast_distance.to_string(),
            e.token_cosine.to_string(),
            e.count.to_string(),
            e.model.clone().unwrap_or_default(),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_metrics(dir: &Path, ast: f64, cosine: f64) {
        let metrics = EvaluationMetrics {
            ast_distance_mean: ast,
            token_cosine_mean: cosine,
            count: 4,
        };
        write_json(&dir.join(METRICS_FILE), &metrics).unwrap();
    }

    fn run_metadata(prompt: &str) -> RunMetadata {
        RunMetadata {
            prompt_path: PathBuf::from(format!("prompts/{}.txt", prompt)),
            schema_path: PathBuf::from("prompts/context/db_schema_exact.txt"),
            model: "test-model".to_string(),
            temperature: 1.0,
            max_tokens: 300,
            prompt_fingerprint: "0123456789abcdef".to_string(),
            examples: 4,
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn test_name_from_prompt_stem() {
        let dir = tempdir().unwrap();
        write_metrics(dir.path(), 0.2, 0.8);
        run_metadata("few_shot").save(dir.path()).unwrap();

        let experiment = load_experiment(dir.path()).unwrap().unwrap();
        assert_eq!(experiment.name, "few_shot");
        assert_eq!(experiment.model.as_deref(), Some("test-model"));
        assert_eq!(experiment.count, 4);
    }

    #[test]
    fn test_name_falls_back_to_directory() {
        let root = tempdir().unwrap();
        let dir = root.path().join("baseline");
        std::fs::create_dir(&dir).unwrap();
        write_metrics(&dir, 0.5, 0.5);

        let experiment = load_experiment(&dir).unwrap().unwrap();
        assert_eq!(experiment.name, "baseline");
        assert!(experiment.model.is_none());
    }

    #[test]
    fn test_missing_metrics_is_none() {
        let dir = tempdir().unwrap();
        assert!(load_experiment(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_collect_sorts_and_dedupes() {
        let root = tempdir().unwrap();
        let dirs: Vec<PathBuf> = ["zeta", "alpha", "empty"]
            .iter()
            .map(|name| {
                let dir = root.path().join(name);
                std::fs::create_dir(&dir).unwrap();
                dir
            })
            .collect();
        write_metrics(&dirs[0], 0.3, 0.7);
        write_metrics(&dirs[1], 0.1, 0.9);

        let twice = vec![dirs[0].clone(), dirs[1].clone(), dirs[2].clone(), dirs[0].clone()];
        let experiments = collect_experiments(&twice).unwrap();

        let names: Vec<&str> = experiments.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_renderers() {
        let experiments = vec![Experiment {
            name: "zero_shot".to_string(),
            ast_distance: 0.25,
            token_cosine: 0.75,
            count: 2,
            model: None,
            prompt_fingerprint: None,
        }];

        let table = render_experiments(&experiments);
        assert!(table.lines().nth(2).unwrap().starts_with("zero_shot  0.2500"));

        let mut out = Vec::new();
        write_experiments_csv(&experiments, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "prompt,ast_distance,token_cosine,count,model\nzero_shot,0.25,0.75,2,\n"
        );
    }
}
