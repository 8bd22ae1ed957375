//! Generation and evaluation jobs end to end, with a scripted model.

use async_trait::async_trait;
use sqleval::config::{GenerateParams, LlmParams, Params, PromptParams};
use sqleval::experiments::{collect_experiments, RunMetadata};
use sqleval::files::{read_json, write_json};
use sqleval::llm::{Completion, CompletionModel};
use sqleval::pipeline::{EvaluationJob, GenerationJob, EVAL_FILE, GENERATED_FILE};
use sqleval::{EvalError, EvaluationMetrics, Example, GeneratedQuery, QueryEvaluation, Result, TokenUsage};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use tempfile::tempdir;

/// Answers from a fixed question -> response table; records every prompt.
struct ScriptedModel {
    answers: HashMap<String, String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    fn new(answers: &[(&str, &str)]) -> Self {
        Self {
            answers: answers
                .iter()
                .map(|(q, a)| (q.to_string(), a.to_string()))
                .collect(),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl CompletionModel for ScriptedModel {
    async fn complete(&self, prompt: &str) -> Result<Completion> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        // the question is the last line of the rendered prompt
        let question = prompt.lines().last().unwrap_or_default().trim();
        let text = self
            .answers
            .get(question)
            .cloned()
            .ok_or_else(|| EvalError::llm(format!("unscripted question {}", question)))?;

        Ok(Completion {
            text,
            usage: TokenUsage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            },
        })
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

fn examples() -> Vec<Example> {
    vec![
        Example::new("How many players?", "SELECT COUNT(*) FROM player"),
        Example::new("Names of players on team 1?", "SELECT name FROM player WHERE team_id = 1"),
        Example::new("Oldest team?", "SELECT name FROM team ORDER BY founded LIMIT 1"),
        Example::new("Unused question", "SELECT 1"),
    ]
}

fn scripted() -> ScriptedModel {
    ScriptedModel::new(&[
        (
            "How many players?",
            "<reasoning>count rows</reasoning>\n<sql>\nselect COUNT(*) from player;\n</sql>",
        ),
        (
            "Names of players on team 1?",
            "<sql>SELECT name FROM player WHERE team_id = 2</sql>",
        ),
        ("Oldest team?", "I cannot answer that."),
    ])
}

fn params(dir: &Path) -> Params {
    let prompt_path = dir.join("zero_shot.txt");
    let schema_path = dir.join("schema.txt");
    fs::write(&prompt_path, "Schema:\n{{schema}}\nQuestion:\n{{user_question}}").unwrap();
    fs::write(&schema_path, "CREATE TABLE player (player_id INTEGER, name TEXT, team_id INTEGER);").unwrap();

    Params {
        generate: GenerateParams {
            prompt: PromptParams {
                prompt_path,
                schema_path,
            },
            llm: LlmParams {
                model: "scripted".to_string(),
                temperature: 0.0,
                max_tokens: 300,
                retries: 1,
                retry_delay_secs: 0,
                timeout_secs: 5,
            },
        },
    }
}

#[tokio::test]
async fn test_generate_then_evaluate() {
    let dir = tempdir().unwrap();
    let examples_path = dir.path().join("examples.json");
    let output_dir = dir.path().join("results/zero_shot");
    write_json(&examples_path, &examples()).unwrap();

    let model = scripted();
    let job = GenerationJob {
        params: params(dir.path()),
        examples_path: examples_path.clone(),
        output_dir: output_dir.clone(),
        limit: Some(3),
        concurrency: 2,
    };
    let generated = job.run(&model).await.unwrap();

    // prompt carries the schema and the question
    let prompts = model.prompts.lock().unwrap().clone();
    assert_eq!(prompts.len(), 3);
    assert!(prompts.iter().all(|p| p.contains("CREATE TABLE player")));

    assert_eq!(generated.len(), 3);
    assert_eq!(generated[0].generated_query, "select COUNT(*) from player;");
    assert_eq!(generated[0].reasoning, "count rows");
    assert_eq!(generated[2].generated_query, "");

    let on_disk: Vec<GeneratedQuery> = read_json(&output_dir.join(GENERATED_FILE)).unwrap();
    assert_eq!(on_disk, generated);

    let raw: serde_json::Value = read_json(&output_dir.join(GENERATED_FILE)).unwrap();
    assert_eq!(raw[0]["total_tokens"], 15);

    let run = RunMetadata::load(&output_dir).unwrap();
    assert_eq!(run.model, "scripted");
    assert_eq!(run.examples, 3);
    assert_eq!(run.prompt_fingerprint.len(), 16);

    // evaluate the 3 generated answers against the 4 references
    let report = EvaluationJob {
        generated_path: output_dir.join(GENERATED_FILE),
        examples_path,
        output_dir: output_dir.clone(),
    }
    .run()
    .unwrap();

    assert_eq!(report.results.len(), 3);
    assert_eq!(report.results[0].ast_distance, 0.0);
    assert!((report.results[0].token_cosine - 1.0).abs() < 1e-9);
    assert!(report.results[1].ast_distance > 0.0);
    assert_eq!(report.results[2].ast_distance, 1.0);
    assert_eq!(report.results[2].token_cosine, 0.0);

    let results: Vec<QueryEvaluation> = read_json(&output_dir.join(EVAL_FILE)).unwrap();
    assert_eq!(results, report.results);

    let metrics: EvaluationMetrics = read_json(&output_dir.join("metrics.json")).unwrap();
    assert_eq!(metrics.count, 3);
    assert!(metrics.ast_distance_mean > 1.0 / 3.0 && metrics.ast_distance_mean < 2.0 / 3.0);

    // the run shows up in comparisons under the prompt's name
    let experiments = collect_experiments(&[output_dir]).unwrap();
    assert_eq!(experiments.len(), 1);
    assert_eq!(experiments[0].name, "zero_shot");
}

#[tokio::test]
async fn test_generation_failure_writes_nothing() {
    let dir = tempdir().unwrap();
    let examples_path = dir.path().join("examples.json");
    let output_dir = dir.path().join("out");
    write_json(&examples_path, &examples()).unwrap();

    let job = GenerationJob {
        params: params(dir.path()),
        examples_path,
        output_dir: output_dir.clone(),
        limit: None,
        concurrency: 1,
    };

    // "Unused question" has no scripted answer
    let err = job.run(scripted()).await.unwrap_err();
    assert!(matches!(err, EvalError::LlmError(_)));
    assert!(!output_dir.join(GENERATED_FILE).exists());
}

#[test]
fn test_evaluation_rejects_misaligned_files() {
    let dir = tempdir().unwrap();
    let generated_path = dir.path().join("generated.json");
    let examples_path = dir.path().join("examples.json");

    let generated = vec![GeneratedQuery {
        question: "Something else?".to_string(),
        generated_query: "SELECT 1".to_string(),
        ..Default::default()
    }];
    write_json(&generated_path, &generated).unwrap();
    write_json(&examples_path, &examples()).unwrap();

    let err = EvaluationJob {
        generated_path,
        examples_path,
        output_dir: dir.path().join("out"),
    }
    .run()
    .unwrap_err();

    assert!(matches!(err, EvalError::QuestionMismatch { .. }));
    assert!(!dir.path().join("out/metrics.json").exists());
}
