use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use aws_config::BehaviorVersion;
use clap::{Parser, ValueEnum};
use shared::{load_descriptors, read_domain_name, FunctionDescriptor, ResponseEnvelope};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio::time::Instant;

#[derive(Default)]
struct Stats {
    success_count: usize,
    error_count: usize,
    total_latency_ms: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// POST the test event to https://api.<domain>/<function>
    Http,
    /// Invoke the deployed Lambda function directly
    Lambda,
}

#[derive(Parser, Debug)]
#[command(name = "invoke-test")]
#[command(about = "Invoke every deployed function with the test event from its descriptor")]
struct Args {
    /// Directory holding one JSON descriptor per function
    #[arg(long, default_value = "configs/lambdas")]
    configs: PathBuf,

    /// File whose first line assigns the domain name
    #[arg(long, default_value = "configs/domainName.ts")]
    domain_file: PathBuf,

    /// Use this domain instead of reading --domain-file
    #[arg(long)]
    domain: Option<String>,

    /// How the functions are reached
    #[arg(long, value_enum, default_value = "http")]
    mode: Mode,

    /// Only test this function
    #[arg(long)]
    function: Option<String>,

    /// Prefix of the deployed Lambda function names
    #[arg(long, default_value = "")]
    function_prefix: String,

    /// Number of rounds over all descriptors
    #[arg(long, default_value = "1")]
    iters: usize,

    /// Number of parallel threads
    #[arg(long, default_value = "1")]
    threads: usize,
}

struct Case {
    function_name: String,
    descriptor: FunctionDescriptor,
}

/// What came back from one invocation.
struct Outcome {
    status: u16,
    body: String,
    envelope: bool,
}

enum Target {
    Http {
        client: reqwest::Client,
        endpoint: String,
    },
    Lambda {
        client: aws_sdk_lambda::Client,
        prefix: String,
    },
}

impl Target {
    async fn invoke(&self, case: &Case) -> anyhow::Result<Outcome> {
        match self {
            Target::Http { client, endpoint } => {
                let response = client
                    .post(format!("{endpoint}/{}", case.function_name))
                    .json(&case.descriptor.test_event)
                    .send()
                    .await?;
                let status = response.status().as_u16();
                let body = response.text().await?;
                Ok(Outcome {
                    status,
                    body,
                    envelope: false,
                })
            }
            Target::Lambda { client, prefix } => {
                let function_name = format!("{prefix}{}", case.function_name);
                let payload = serde_json::to_vec(&case.descriptor.test_request())?;
                let response = client
                    .invoke()
                    .function_name(&function_name)
                    .payload(aws_sdk_lambda::primitives::Blob::new(payload))
                    .send()
                    .await?;

                let raw = response
                    .payload()
                    .map(|b| String::from_utf8_lossy(b.as_ref()).to_string())
                    .unwrap_or_else(|| "No response".to_string());
                if let Some(function_error) = response.function_error() {
                    bail!("{function_name} failed with {function_error}: {raw}");
                }

                let envelope: ResponseEnvelope = serde_json::from_str(&raw)
                    .with_context(|| format!("{function_name} returned an unexpected payload: {raw}"))?;
                Ok(Outcome {
                    status: envelope.status_code,
                    body: envelope.body,
                    envelope: true,
                })
            }
        }
    }
}

/// Failure reason for an outcome, if any.
fn check(case: &Case, outcome: &Outcome) -> Option<String> {
    if outcome.status != 200 {
        return Some(format!("status {}: {}", outcome.status, outcome.body));
    }
    match &case.descriptor.expected_result {
        Some(expected) if outcome.envelope && &outcome.body != expected => {
            Some(format!("expected {expected:?}, got {:?}", outcome.body))
        }
        _ => None,
    }
}

async fn run_invocations(
    target: Arc<Target>,
    cases: Arc<Vec<Case>>,
    thread_id: usize,
    start: usize,
    end: usize,
    total: usize,
    stats: Arc<Mutex<Stats>>,
) {
    for i in start..=end {
        let case = &cases[(i - 1) % cases.len()];

        let started = Instant::now();
        let result = target.invoke(case).await;
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        let failure = match &result {
            Ok(outcome) => check(case, outcome),
            Err(e) => Some(format!("{e:#}")),
        };

        // Update stats
        {
            let mut stats = stats.lock().await;
            if failure.is_some() {
                stats.error_count += 1;
            } else {
                stats.success_count += 1;
                stats.total_latency_ms += latency_ms;
            }
        }

        match failure {
            None => println!(
                "[Thread {}: {}/{}] {} => ok in {:.3}ms",
                thread_id, i, total, case.function_name, latency_ms
            ),
            Some(reason) => eprintln!(
                "[Thread {}: {}/{}] {} => {}",
                thread_id, i, total, case.function_name, reason
            ),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if args.threads == 0 {
        bail!("--threads must be at least 1");
    }

    let cases: Vec<Case> = load_descriptors(&args.configs)?
        .into_iter()
        .filter(|(name, _)| args.function.as_ref().map_or(true, |only| only == name))
        .map(|(function_name, descriptor)| Case {
            function_name,
            descriptor,
        })
        .collect();
    if cases.is_empty() {
        bail!("no descriptors to test in {}", args.configs.display());
    }
    let cases = Arc::new(cases);

    let target = match args.mode {
        Mode::Http => {
            let domain = match &args.domain {
                Some(domain) => domain.clone(),
                None => read_domain_name(&args.domain_file)?,
            };
            Target::Http {
                client: reqwest::Client::new(),
                endpoint: format!("https://api.{domain}"),
            }
        }
        Mode::Lambda => {
            let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
            Target::Lambda {
                client: aws_sdk_lambda::Client::new(&config),
                prefix: args.function_prefix.clone(),
            }
        }
    };
    let target = Arc::new(target);

    let total_iters = args.iters * cases.len();
    println!(
        "Running {} invocations of {} function(s) across {} thread(s)",
        total_iters,
        cases.len(),
        args.threads
    );

    // Create shared stats
    let stats = Arc::new(Mutex::new(Stats::default()));

    // Calculate iterations per thread
    let iters_per_thread = total_iters / args.threads;
    let remainder = total_iters % args.threads;

    let mut tasks = JoinSet::new();

    let mut start = 1;
    for t in 1..=args.threads {
        let end = if t == args.threads {
            start + iters_per_thread - 1 + remainder
        } else {
            start + iters_per_thread - 1
        };
        if end < start {
            continue;
        }

        let target = Arc::clone(&target);
        let cases = Arc::clone(&cases);
        let stats = Arc::clone(&stats);

        tasks.spawn(async move {
            run_invocations(target, cases, t, start, end, total_iters, stats).await;
        });

        start = end + 1;
    }

    // Wait for all tasks to complete
    while let Some(result) = tasks.join_next().await {
        if let Err(e) = result {
            eprintln!("Task failed: {}", e);
        }
    }

    // Print summary
    let stats = stats.lock().await;
    println!("Completed {} invocations", total_iters);
    println!();
    println!("Results:");
    println!("  Success: {}", stats.success_count);
    println!("  Errors:  {}", stats.error_count);
    if stats.success_count > 0 {
        let avg_latency = stats.total_latency_ms / stats.success_count as f64;
        println!("  Avg latency: {:.3}ms", avg_latency);
    }

    if stats.error_count > 0 || stats.success_count != total_iters {
        bail!("{} of {} invocations failed", total_iters - stats.success_count, total_iters);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn case(expected_result: Option<&str>) -> Case {
        Case {
            function_name: "query_in_clause_generator".to_string(),
            descriptor: serde_json::from_value(json!({
                "test_event": { "strings": "x\ny" },
                "expected_result": expected_result,
            }))
            .unwrap(),
        }
    }

    fn outcome(status: u16, body: &str, envelope: bool) -> Outcome {
        Outcome {
            status,
            body: body.to_string(),
            envelope,
        }
    }

    #[test]
    fn non_200_is_a_failure() {
        let reason = check(&case(None), &outcome(500, "boom", false)).unwrap();
        assert!(reason.contains("status 500"));
    }

    #[test]
    fn envelope_body_is_compared_with_expected_result() {
        let case = case(Some("in ('x','y')"));
        assert!(check(&case, &outcome(200, "in ('x','y')", true)).is_none());
        assert!(check(&case, &outcome(200, "in ('y')", true)).is_some());
    }

    #[test]
    fn http_mode_only_checks_status() {
        let case = case(Some("in ('x','y')"));
        assert!(check(&case, &outcome(200, "anything", false)).is_none());
    }

    #[test]
    fn parses_arguments() {
        let args = Args::parse_from([
            "invoke-test",
            "--mode",
            "lambda",
            "--function",
            "format_json",
            "--threads",
            "4",
        ]);
        assert_eq!(args.mode, Mode::Lambda);
        assert_eq!(args.function.as_deref(), Some("format_json"));
        assert_eq!(args.threads, 4);
        assert_eq!(args.iters, 1);
        assert_eq!(args.configs, PathBuf::from("configs/lambdas"));
    }
}
