use regex::Regex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use translation_pipeline::artifact::FileArtifacts;
use translation_pipeline::qa::gate::{QaConfig, QaGate};
use translation_pipeline::queue::file::FileStore;
use translation_pipeline::queue::ops;
use translation_pipeline::queue::reclaim::Reclaimer;
use translation_pipeline::queue::store::{CommitPolicy, QueueStore};
use translation_pipeline::queue::types::JobStatus;
use translation_pipeline::translate::client::HttpTranslator;
use translation_pipeline::translate::source::{sources_dir, SourceStore};
use translation_pipeline::worker::batch::{BatchConfig, BatchWorker, WorkerContext};
use translation_pipeline::worker::orchestrator::{Orchestrator, OrchestratorConfig};
use uuid::Uuid;

fn usage(program: &str) -> ! {
    eprintln!("Usage: {} <command> --root <dir> [options]", program);
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  init           Create queue jobs for every source document under <root>/sources");
    eprintln!("  stats          Print job counts by status");
    eprintln!("  list-failed    List failed jobs with their last error");
    eprintln!("  list-flagged   List QA-flagged jobs with their reasons");
    eprintln!("  reset-stuck    Return in-progress jobs older than --timeout-secs to pending");
    eprintln!("  retry-failed   Return all failed jobs to pending");
    eprintln!("  retry-flagged  Return all QA-flagged jobs to pending");
    eprintln!("  work           Run one batch: claim, translate, gate, commit");
    eprintln!("  orchestrate    Run batches until the queue drains or a budget is reached");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --root <dir>                    Work root (queue.json, sources/, approved/, flagged/)");
    eprintln!("  --endpoint <url>                Translation engine base URL (work, orchestrate)");
    eprintln!("  --batch-size <n>                Jobs claimed per batch (default 10)");
    eprintln!("  --concurrency <n>               Translator pool size (default 4)");
    eprintln!("  --worker-id <s>                 Claim identity for `work` (default: random)");
    eprintln!("  --batches <n>                   Batch budget for `orchestrate`, 0 = until empty (default 0)");
    eprintln!("  --delay-secs <n>                Pause between orchestrated batches (default 2)");
    eprintln!("  --timeout-secs <n>              Claim age for `reset-stuck` (default 900)");
    eprintln!("  --translate-timeout-secs <n>    Per-job translator deadline (default 120)");
    eprintln!("  --qa-max-source-ratio <f>       QA ceiling on source-script characters (default 0.05)");
    eprintln!("  --qa-max-punct-ratio <f>        QA ceiling on source-script punctuation (default 0.02)");
    eprintln!("  --qa-min-abstract-chars <n>     QA minimum abstract length (default 80)");
    eprintln!("  --qa-source-script <regex>      Character class for the source script (default \\p{{Han}})");
    eprintln!();
    eprintln!("Example: {} init --root ./work", program);
    eprintln!(
        "Example: {} orchestrate --root ./work --endpoint http://localhost:7011 --batch-size 25 --concurrency 5",
        program
    );
    std::process::exit(1);
}

struct CliOptions {
    root: Option<PathBuf>,
    endpoint: Option<String>,
    batch_size: usize,
    concurrency: usize,
    worker_id: Option<String>,
    batches: usize,
    delay_secs: u64,
    timeout_secs: u64,
    translate_timeout_secs: u64,
    qa_max_source_ratio: Option<f64>,
    qa_max_punct_ratio: Option<f64>,
    qa_min_abstract_chars: Option<usize>,
    qa_source_script: Option<String>,
}

impl Default for CliOptions {
    fn default() -> Self {
        Self {
            root: None,
            endpoint: None,
            batch_size: 10,
            concurrency: 4,
            worker_id: None,
            batches: 0,
            delay_secs: 2,
            timeout_secs: 900,
            translate_timeout_secs: 120,
            qa_max_source_ratio: None,
            qa_max_punct_ratio: None,
            qa_min_abstract_chars: None,
            qa_source_script: None,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("translation-pipeline");

    if args.len() < 2 {
        usage(program);
    }
    let command = args[1].clone();

    let mut opts = CliOptions::default();
    let mut i = 2;
    while i < args.len() {
        let flag = args[i].as_str();
        let value = args.get(i + 1).cloned();
        let take = |name: &str| -> String {
            match value.clone() {
                Some(value) => value,
                None => {
                    eprintln!("Missing value for {}", name);
                    std::process::exit(1);
                }
            }
        };
        match flag {
            "--root" => opts.root = Some(PathBuf::from(take("--root"))),
            "--endpoint" => opts.endpoint = Some(take("--endpoint")),
            "--batch-size" => opts.batch_size = take("--batch-size").parse()?,
            "--concurrency" => opts.concurrency = take("--concurrency").parse()?,
            "--worker-id" => opts.worker_id = Some(take("--worker-id")),
            "--batches" => opts.batches = take("--batches").parse()?,
            "--delay-secs" => opts.delay_secs = take("--delay-secs").parse()?,
            "--timeout-secs" => opts.timeout_secs = take("--timeout-secs").parse()?,
            "--translate-timeout-secs" => {
                opts.translate_timeout_secs = take("--translate-timeout-secs").parse()?
            }
            "--qa-max-source-ratio" => {
                opts.qa_max_source_ratio = Some(take("--qa-max-source-ratio").parse()?)
            }
            "--qa-max-punct-ratio" => {
                opts.qa_max_punct_ratio = Some(take("--qa-max-punct-ratio").parse()?)
            }
            "--qa-min-abstract-chars" => {
                opts.qa_min_abstract_chars = Some(take("--qa-min-abstract-chars").parse()?)
            }
            "--qa-source-script" => {
                opts.qa_source_script = Some(take("--qa-source-script"))
            }
            _ => {
                eprintln!("Unknown option: {}", flag);
                usage(program);
            }
        }
        i += 2;
    }

    let Some(root) = opts.root.clone() else {
        eprintln!("--root is required");
        usage(program);
    };

    if opts.batch_size == 0 || opts.concurrency == 0 {
        eprintln!("--batch-size and --concurrency must be greater than zero");
        std::process::exit(1);
    }
    if opts.concurrency > opts.batch_size {
        tracing::warn!(
            "Concurrency {} exceeds batch size {}; extra pool slots will idle",
            opts.concurrency,
            opts.batch_size
        );
    }

    let store = Arc::new(FileStore::new(root.join("queue.json")));
    let policy = CommitPolicy::default();

    match command.as_str() {
        "init" => {
            store.ensure_initialized()?;
            let sources = SourceStore::new(sources_dir(&root));
            let doc_ids = sources.scan_ids()?;
            let created = ops::init_queue(store.as_ref(), &policy, &doc_ids).await?;
            println!(
                "{} source document(s) scanned, {} job(s) created",
                doc_ids.len(),
                created
            );
        }
        "stats" => {
            let stats = store.stats()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        "list-failed" => {
            for job in ops::list_by_status(store.as_ref(), JobStatus::Failed)? {
                println!(
                    "{}\tattempts={}\t{}",
                    job.id,
                    job.attempts,
                    job.last_error.as_deref().unwrap_or("-")
                );
            }
        }
        "list-flagged" => {
            for job in ops::list_by_status(store.as_ref(), JobStatus::QaFlagged)? {
                println!(
                    "{}\tattempts={}\t{}",
                    job.id,
                    job.attempts,
                    job.last_error.as_deref().unwrap_or("-")
                );
            }
        }
        "reset-stuck" => {
            let reclaimer = Reclaimer::new(store.clone(), policy.clone());
            let reclaimed = reclaimer
                .reclaim(Duration::from_secs(opts.timeout_secs))
                .await?;
            println!("{} job(s) returned to pending", reclaimed);
        }
        "retry-failed" => {
            let requeued = ops::retry_failed(store.as_ref(), &policy).await?;
            println!("{} job(s) returned to pending", requeued);
        }
        "retry-flagged" => {
            let requeued = ops::retry_flagged(store.as_ref(), &policy).await?;
            println!("{} job(s) returned to pending", requeued);
        }
        "work" => {
            let ctx = build_context(&root, store.clone(), policy.clone(), &opts)?;
            let worker_id = opts.worker_id.clone().unwrap_or_else(random_worker_id);
            let worker = BatchWorker::new(
                ctx,
                BatchConfig {
                    batch_size: opts.batch_size,
                    concurrency: opts.concurrency,
                    worker_id,
                    translate_timeout: Duration::from_secs(opts.translate_timeout_secs),
                },
            );
            let report = worker.run().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        "orchestrate" => {
            let ctx = build_context(&root, store.clone(), policy.clone(), &opts)?;
            let orchestrator = Orchestrator::new(
                ctx,
                OrchestratorConfig {
                    total_batches: opts.batches,
                    batch_size: opts.batch_size,
                    concurrency: opts.concurrency,
                    delay_between_batches: Duration::from_secs(opts.delay_secs),
                    translate_timeout: Duration::from_secs(opts.translate_timeout_secs),
                    worker_name: opts
                        .worker_id
                        .clone()
                        .unwrap_or_else(|| "worker".to_string()),
                    ..OrchestratorConfig::default()
                },
            );
            let report = orchestrator.run().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        other => {
            eprintln!("Unknown command: {}", other);
            usage(program);
        }
    }

    Ok(())
}

fn build_context(
    root: &std::path::Path,
    store: Arc<FileStore>,
    policy: CommitPolicy,
    opts: &CliOptions,
) -> anyhow::Result<WorkerContext> {
    let Some(endpoint) = opts.endpoint.clone() else {
        anyhow::bail!("--endpoint is required for this command");
    };

    let mut qa_config = QaConfig::default();
    if let Some(ratio) = opts.qa_max_source_ratio {
        qa_config.max_source_char_ratio = ratio;
    }
    if let Some(ratio) = opts.qa_max_punct_ratio {
        qa_config.max_source_punct_ratio = ratio;
    }
    if let Some(chars) = opts.qa_min_abstract_chars {
        qa_config.min_abstract_chars = chars;
    }
    if let Some(pattern) = &opts.qa_source_script {
        qa_config.source_chars = Regex::new(pattern)?;
    }

    Ok(WorkerContext {
        store,
        sources: Arc::new(SourceStore::new(sources_dir(root))),
        translator: Arc::new(HttpTranslator::new(
            endpoint,
            Duration::from_secs(opts.translate_timeout_secs),
        )),
        artifacts: Arc::new(FileArtifacts::new(root)),
        gate: Arc::new(QaGate::new(qa_config)),
        policy,
    })
}

fn random_worker_id() -> String {
    let suffix = Uuid::new_v4().to_string();
    format!("worker-{}", &suffix[..8])
}
