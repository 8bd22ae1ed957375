//! sqleval CLI
//!
//! Runs prompt experiments against an OpenAI-compatible completion endpoint
//! and scores the generated SQL.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use sqleval::config::{expand_path, LlmSettings, Params};
use sqleval::experiments::{collect_experiments, render_experiments, write_experiments_csv};
use sqleval::llm::OpenAiCompletionClient;
use sqleval::otel::{init_tracing, job_span, record_job_status, JobType, LogFormat};
use sqleval::pipeline::{EvaluationJob, GenerationJob};
use sqleval::schema::{combine_schema_files, render_rows, write_csv, DEFAULT_THRESHOLD};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sqleval")]
#[command(about = "Natural-language-to-SQL prompt runner and evaluator", long_about = None)]
#[command(version)]
struct Cli {
    /// Log output format
    #[arg(long, value_enum, global = true, default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate SQL for every example question
    Generate {
        /// Parameter file
        #[arg(long, default_value = "params.yaml")]
        params: PathBuf,

        /// Examples JSON (question/query pairs)
        #[arg(long, default_value = "data/examples_queries_test.json")]
        examples: PathBuf,

        /// Output directory for generated_queries.json and run.json
        #[arg(long, default_value = "results")]
        output: PathBuf,

        /// Only use the first N examples
        #[arg(long)]
        limit: Option<usize>,

        /// Maximum concurrent requests
        #[arg(long, default_value = "1")]
        concurrency: usize,

        /// Base URL of the completion API
        #[arg(long, env = "OPENAI_URL")]
        openai_url: String,

        /// API key (no auth header when unset)
        #[arg(long, env = "OPENAI_KEY", hide_env_values = true)]
        openai_key: Option<String>,
    },

    /// Score generated queries against the references
    Eval {
        /// generated_queries.json from a generation run
        #[arg(long, default_value = "results/generated_queries.json")]
        generated: PathBuf,

        /// Examples JSON with reference queries
        #[arg(long, default_value = "data/examples_queries_test.json")]
        examples: PathBuf,

        /// Output directory for eval.json and metrics.json
        #[arg(long, default_value = "results")]
        output: PathBuf,
    },

    /// Merge exact and descriptive schema files
    Schema {
        /// DDL dump with column types
        #[arg(long, default_value = "prompts/context/db_schema_exact.txt")]
        exact: PathBuf,

        /// Data dictionary with column descriptions
        #[arg(long, default_value = "prompts/context/db_schema_descriptive.txt")]
        descriptive: PathBuf,

        /// CSV output path
        #[arg(long, default_value = "combined_schema.csv")]
        output: PathBuf,

        /// Minimum fuzzy match score (0-100)
        #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: u8,

        /// Do not print the merged table
        #[arg(long)]
        quiet: bool,
    },

    /// Compare metrics across run directories
    Compare {
        /// Run directories containing metrics.json
        #[arg(required = true)]
        runs: Vec<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing("sqleval", cli.log_format).context("Failed to initialize logging")?;

    match cli.command {
        Commands::Generate {
            params,
            examples,
            output,
            limit,
            concurrency,
            openai_url,
            openai_key,
        } => {
            let params_path = expand_path(&params)?;
            let params = Params::load(&params_path)
                .with_context(|| format!("Failed to load {}", params_path.display()))?;
            let settings = LlmSettings::new(&params.generate.llm, &openai_url, openai_key)?;
            let client = OpenAiCompletionClient::new(settings)?;

            println!(
                "{} Generating with {} ({})",
                "→".cyan(),
                params.generate.llm.model.bright_white(),
                params.generate.prompt.prompt_path.display()
            );

            let job = GenerationJob {
                params,
                examples_path: expand_path(&examples)?,
                output_dir: expand_path(&output)?,
                limit,
                concurrency,
            };
            let generated = job.run(client).await.context("Generation failed")?;

            let missing = generated.iter().filter(|g| g.generated_query.is_empty()).count();
            println!(
                "{} Generated {} queries into {}",
                "✓".green(),
                generated.len(),
                job.output_dir.display()
            );
            if missing > 0 {
                println!("{}", format!("{} responses had no <sql> section", missing).yellow());
            }
        }

        Commands::Eval {
            generated,
            examples,
            output,
        } => {
            let job = EvaluationJob {
                generated_path: expand_path(&generated)?,
                examples_path: expand_path(&examples)?,
                output_dir: expand_path(&output)?,
            };
            let report = job.run().context("Evaluation failed")?;

            let failed = report.results.iter().filter(|r| r.error.is_some()).count();
            println!("{} Evaluated {} queries", "✓".green(), report.metrics.count);
            println!("   ast_distance_mean: {:.4}", report.metrics.ast_distance_mean);
            println!("   token_cosine_mean: {:.4}", report.metrics.token_cosine_mean);
            if failed > 0 {
                println!("{}", format!("{} generated queries did not parse", failed).yellow());
            }
        }

        Commands::Schema {
            exact,
            descriptive,
            output,
            threshold,
            quiet,
        } => {
            let span = job_span(JobType::SchemaMerge, 1);
            let _entered = span.enter();

            let exact = expand_path(&exact)?;
            let descriptive = expand_path(&descriptive)?;
            let rows = combine_schema_files(&exact, &descriptive, threshold)
                .with_context(|| format!("Failed to read {} / {}", exact.display(), descriptive.display()))?;

            if !quiet {
                print!("{}", render_rows(&rows));
            }

            let output = expand_path(&output)?;
            let file = File::create(&output)
                .with_context(|| format!("Failed to create {}", output.display()))?;
            write_csv(&rows, BufWriter::new(file))?;
            record_job_status("ok");

            println!("{} Wrote {} rows to {}", "✓".green(), rows.len(), output.display());
        }

        Commands::Compare { runs, format } => {
            let span = job_span(JobType::Compare, runs.len());
            let _entered = span.enter();

            let runs = runs
                .iter()
                .map(|r| expand_path(r))
                .collect::<sqleval::Result<Vec<_>>>()?;
            let experiments = collect_experiments(&runs)?;
            record_job_status("ok");

            if experiments.is_empty() {
                println!("{}", "No valid experiments found.".yellow());
                return Ok(());
            }

            match format {
                OutputFormat::Table => print!("{}", render_experiments(&experiments)),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&experiments)?),
                OutputFormat::Csv => write_experiments_csv(&experiments, io::stdout().lock())?,
            }
        }
    }

    Ok(())
}
