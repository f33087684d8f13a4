use std::time::Duration;

use squat_controller::{Detection, DetectionController, HttpTransport, LifecycleState};
use squat_types::{ApiError, DEFAULT_DEPTH_THRESHOLD, DetectionRequest, DetectionResult};
use tracing::warn;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";
const DEFAULT_TIMEOUT_MS: u64 = 600_000;
/// Extra time the HTTP call gets past `--timeout-ms`, so the run deadline fires first.
const TRANSPORT_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq)]
struct RunArgs {
    base_url: String,
    depth_threshold: f64,
    timeout_ms: u64,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let mut args = std::env::args().skip(1).collect::<Vec<_>>();
    if args.is_empty() {
        return Err(usage());
    }

    let command = args.remove(0);
    match command.as_str() {
        "run" => match parse_run_args(args)? {
            Some(run_args) => run_detection(run_args),
            None => Ok(()),
        },
        "status" => run_status(args),
        "-h" | "--help" | "help" => {
            println!("{}", usage());
            Ok(())
        }
        other => Err(format!("unknown command: {other}\n\n{}", usage())),
    }
}

/// Returns `None` when help was requested and printed.
fn parse_run_args(args: Vec<String>) -> Result<Option<RunArgs>, String> {
    let mut run_args = RunArgs {
        base_url: DEFAULT_BASE_URL.to_string(),
        depth_threshold: DEFAULT_DEPTH_THRESHOLD,
        timeout_ms: DEFAULT_TIMEOUT_MS,
    };
    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--url" => {
                i += 1;
                let Some(value) = args.get(i) else {
                    return Err("missing value for --url".to_string());
                };
                run_args.base_url = value.clone();
            }
            "--threshold" => {
                i += 1;
                let Some(value) = args.get(i) else {
                    return Err("missing value for --threshold".to_string());
                };
                run_args.depth_threshold = value
                    .parse::<f64>()
                    .map_err(|e| format!("invalid --threshold: {e}"))?;
            }
            "--timeout-ms" => {
                i += 1;
                let Some(value) = args.get(i) else {
                    return Err("missing value for --timeout-ms".to_string());
                };
                run_args.timeout_ms = value
                    .parse::<u64>()
                    .map_err(|e| format!("invalid --timeout-ms: {e}"))?;
            }
            "--help" | "-h" => {
                println!("{}", run_usage());
                return Ok(None);
            }
            other => return Err(format!("unknown flag for run: {other}\n\n{}", run_usage())),
        }
        i += 1;
    }
    Ok(Some(run_args))
}

fn run_detection(run_args: RunArgs) -> Result<(), String> {
    let request = DetectionRequest::webcam(run_args.depth_threshold);
    if let Err(err) = request.validate() {
        warn!(%err, "sending anyway; the backend decides what it accepts");
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build tokio runtime: {e}"))?;
    let outcome = runtime.block_on(drive(run_args, request));
    // A timed-out HTTP call may still hold a blocking thread; do not wait for it.
    runtime.shutdown_background();
    outcome
}

async fn drive(run_args: RunArgs, request: DetectionRequest) -> Result<(), String> {
    let timeout = Duration::from_millis(run_args.timeout_ms);
    let transport = HttpTransport::with_timeout(&run_args.base_url, timeout + TRANSPORT_GRACE);
    let controller = DetectionController::new(transport);
    let mut updates = controller.subscribe();
    controller.start(request);

    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);
    loop {
        let state = updates.borrow_and_update().clone();
        if state.phase().is_terminal() {
            return finish(&state);
        }
        if let Some(run) = state.run() {
            println!("Processing... ({run})");
        }

        tokio::select! {
            changed = updates.changed() => {
                changed.map_err(|e| format!("controller went away: {e}"))?;
            }
            () = &mut deadline => {
                controller.cancel();
                return Err(format!(
                    "squat detection timed out after {}ms",
                    run_args.timeout_ms
                ));
            }
        }
    }
}

/// Prints the outcome of a settled run, or hands back its failure message.
fn finish(state: &LifecycleState) -> Result<(), String> {
    if let Some(message) = state.error_message() {
        return Err(message.to_string());
    }
    if let Some(detection) = state.result() {
        println!("{}", render_detection(detection)?);
    }
    Ok(())
}

fn render_detection(detection: &Detection) -> Result<String, String> {
    match detection.report() {
        Some(result) => Ok(render_result(result)),
        None => Ok(format!("Results:\n{}", pretty_json(detection.as_str())?)),
    }
}

fn render_result(result: &DetectionResult) -> String {
    format!(
        "Results:\n  Squat Reps: {}\n  Processing Time: {:.2} seconds\n  Depth Threshold: {}°",
        result.squat_reps, result.processing_time, result.depth_threshold
    )
}

fn pretty_json(text: &str) -> Result<String, String> {
    let value = facet_json::from_str::<facet_value::Value>(text)
        .map_err(|e| format!("decode response as json: {e}"))?;
    facet_json::to_string_pretty(&value).map_err(|e| format!("pretty response: {e}"))
}

fn run_status(args: Vec<String>) -> Result<(), String> {
    let mut base_url = DEFAULT_BASE_URL.to_string();
    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--url" => {
                i += 1;
                let Some(value) = args.get(i) else {
                    return Err("missing value for --url".to_string());
                };
                base_url = value.clone();
            }
            "--help" | "-h" => {
                println!("{}", status_usage());
                return Ok(());
            }
            other => {
                return Err(format!(
                    "unknown flag for status: {other}\n\n{}",
                    status_usage()
                ));
            }
        }
        i += 1;
    }

    let url = format!("{}/api/squat", base_url.trim_end_matches('/'));
    let body = http_get_text(&url)?;
    println!("{}", pretty_json(&body)?);
    Ok(())
}

fn http_get_text(url: &str) -> Result<String, String> {
    let response = match ureq::get(url).call() {
        Ok(response) => response,
        Err(ureq::Error::Status(status, response)) => {
            let message = response
                .into_string()
                .ok()
                .and_then(|text| facet_json::from_str::<ApiError>(&text).ok())
                .map(|api_error| api_error.error)
                .unwrap_or_else(|| format!("relay responded with status {status}"));
            return Err(message);
        }
        Err(err) => return Err(format!("GET {url}: {err}")),
    };
    response
        .into_string()
        .map_err(|e| format!("read GET response body: {e}"))
}

fn usage() -> String {
    format!(
        "squat-cli commands:\n  run [--url URL] [--threshold DEGREES] [--timeout-ms N]\n  status [--url URL]\n\n{}",
        defaults_usage()
    )
}

fn run_usage() -> String {
    format!(
        "squat-cli run [--url URL] [--threshold DEGREES] [--timeout-ms N]\n\n{}",
        defaults_usage()
    )
}

fn status_usage() -> String {
    format!("squat-cli status [--url URL]\n\n{}", defaults_usage())
}

fn defaults_usage() -> String {
    format!(
        "defaults:\n  --url {}\n  --threshold {}\n  --timeout-ms {}",
        DEFAULT_BASE_URL, DEFAULT_DEPTH_THRESHOLD, DEFAULT_TIMEOUT_MS
    )
}
