//! Replicate CLI: 预测提交、状态查询、取消与流式输出的命令行工具
//!
//! Usage:
//!   replicate-cli run <model> [key=value ...]       Submit and wait for the result
//!   replicate-cli stream <model> [key=value ...]    Submit and print streamed output
//!   replicate-cli status <id>                       Show the current snapshot
//!   replicate-cli wait <id>                         Poll until the prediction finishes
//!   replicate-cli cancel <id>                       Request cancellation
//!   replicate-cli upload <path>                     Upload a file for use as input

use anyhow::{anyhow, bail, Context};
use futures::StreamExt;
use replicate_lib_rust::{
    ClientConfig, Prediction, PredictionClient, PredictionRequest, SubmitOptions,
};
use serde_json::Value;
use std::io::Write;
use std::path::Path;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let result = match args[1].as_str() {
        "run" => cmd_run(&args[2..]).await,
        "stream" => cmd_stream(&args[2..]).await,
        "status" => cmd_status(&args[2..]).await,
        "wait" => cmd_wait(&args[2..]).await,
        "cancel" => cmd_cancel(&args[2..]).await,
        "upload" => cmd_upload(&args[2..]).await,
        "version" | "--version" | "-V" => {
            cmd_version();
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"replicate-cli: Replicate 预测命令行工具

USAGE:
    replicate-cli <COMMAND> [OPTIONS]

COMMANDS:
    run <owner/name> [key=value ...]      Submit a prediction and wait for it
    stream <owner/name> [key=value ...]   Submit a prediction and print streamed output
    status <id>                           Show the current state of a prediction
    wait <id>                             Poll until a prediction finishes
    cancel <id>                           Request cancellation
    upload <path>                         Upload a file and print its URL
    version                               Show version information
    help                                  Show this help message

OPTIONS (run / stream):
    --version <id>          Submit against a model version instead of a model name
    --wait [seconds]        Ask the service to hold the response (Prefer: wait)
    --cancel-after <dur>    Cancel server-side after a duration, e.g. 90s or 5m
    --config <path>         Load client settings from a YAML file

INPUTS:
    key=value               JSON values are parsed (n=3, flag=true); anything else is a string
    key=@path               A local file, inlined or uploaded depending on size

ENVIRONMENT:
    REPLICATE_API_TOKEN     API token (falls back to the OS keyring)
    REPLICATE_BASE_URL      API base URL
    RUST_LOG                Log filter (default: info)"#
    );
}

fn cmd_version() {
    println!("replicate-cli {}", env!("CARGO_PKG_VERSION"));
}

/// Flags and positional arguments of `run` / `stream`.
#[derive(Debug, Default)]
struct SubmitArgs {
    model: Option<String>,
    version: Option<String>,
    prefer_wait: Option<String>,
    cancel_after: Option<String>,
    config: Option<String>,
    inputs: Vec<(String, String)>,
}

fn parse_submit_args(args: &[String]) -> anyhow::Result<SubmitArgs> {
    let mut parsed = SubmitArgs::default();
    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        match arg.as_str() {
            "--version" => {
                i += 1;
                parsed.version = Some(args.get(i).context("--version needs a value")?.clone());
            }
            "--cancel-after" => {
                i += 1;
                parsed.cancel_after =
                    Some(args.get(i).context("--cancel-after needs a value")?.clone());
            }
            "--config" => {
                i += 1;
                parsed.config = Some(args.get(i).context("--config needs a path")?.clone());
            }
            "--wait" => {
                // Optional numeric value
                match args.get(i + 1) {
                    Some(next) if next.chars().all(|c| c.is_ascii_digit()) => {
                        parsed.prefer_wait = Some(next.clone());
                        i += 1;
                    }
                    _ => parsed.prefer_wait = Some("wait".to_string()),
                }
            }
            _ if arg.starts_with("--") => bail!("Unknown option: {arg}"),
            _ => match arg.split_once('=') {
                Some((key, value)) => parsed.inputs.push((key.to_string(), value.to_string())),
                None if parsed.model.is_none() && parsed.inputs.is_empty() => {
                    parsed.model = Some(arg.clone())
                }
                None => bail!("Expected key=value, got: {arg}"),
            },
        }
        i += 1;
    }
    Ok(parsed)
}

fn parse_input_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn build_client(config_path: Option<&str>) -> anyhow::Result<PredictionClient> {
    let config = match config_path {
        Some(path) => ClientConfig::from_yaml_file(path)?,
        None => ClientConfig::from_env(),
    };
    Ok(PredictionClient::builder().config(config).build()?)
}

async fn build_request(
    client: &PredictionClient,
    parsed: &SubmitArgs,
) -> anyhow::Result<PredictionRequest> {
    let mut request = match &parsed.version {
        Some(version) => PredictionRequest::for_version(version.clone()),
        None => PredictionRequest::new(),
    };
    for (key, raw) in &parsed.inputs {
        let value = match raw.strip_prefix('@') {
            Some(path) => {
                let bytes = tokio::fs::read(path)
                    .await
                    .with_context(|| format!("Cannot read {path}"))?;
                client.file_input(bytes, &file_name(path), None).await?
            }
            None => parse_input_value(raw),
        };
        request = request.with_input(key.clone(), value);
    }
    Ok(request)
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

fn submit_options(parsed: &SubmitArgs) -> SubmitOptions {
    let mut options = SubmitOptions::new();
    if let Some(wait) = &parsed.prefer_wait {
        options = options.prefer_wait(wait.clone());
    }
    if let Some(after) = &parsed.cancel_after {
        options = options.cancel_after(after.clone());
    }
    options
}

fn print_prediction(prediction: &Prediction) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(prediction)?);
    Ok(())
}

fn single_id(args: &[String], command: &str) -> anyhow::Result<String> {
    args.first()
        .cloned()
        .ok_or_else(|| anyhow!("Usage: replicate-cli {command} <prediction-id>"))
}

async fn cmd_run(args: &[String]) -> anyhow::Result<()> {
    let parsed = parse_submit_args(args)?;
    let client = build_client(parsed.config.as_deref())?;
    let request = build_request(&client, &parsed).await?;
    let prediction = client
        .submit_and_wait(parsed.model.as_deref(), &request, &submit_options(&parsed))
        .await?;
    print_prediction(&prediction)
}

async fn cmd_stream(args: &[String]) -> anyhow::Result<()> {
    let parsed = parse_submit_args(args)?;
    let client = build_client(parsed.config.as_deref())?;
    let request = build_request(&client, &parsed).await?;
    let mut stream = client.stream(parsed.model.as_deref(), &request).await?;

    let mut stdout = std::io::stdout();
    while let Some(item) = stream.next().await {
        let chunk = item?;
        if let Some(text) = chunk.output_text() {
            write!(stdout, "{text}")?;
            stdout.flush()?;
        }
    }
    writeln!(stdout)?;
    Ok(())
}

async fn cmd_status(args: &[String]) -> anyhow::Result<()> {
    let id = single_id(args, "status")?;
    let client = build_client(None)?;
    print_prediction(&client.get_status(&id).await?)
}

async fn cmd_wait(args: &[String]) -> anyhow::Result<()> {
    let id = single_id(args, "wait")?;
    let client = build_client(None)?;
    print_prediction(&client.wait_for_completion(&id).await?)
}

async fn cmd_cancel(args: &[String]) -> anyhow::Result<()> {
    let id = single_id(args, "cancel")?;
    let client = build_client(None)?;
    print_prediction(&client.cancel(&id).await?)
}

async fn cmd_upload(args: &[String]) -> anyhow::Result<()> {
    let path = args
        .first()
        .ok_or_else(|| anyhow!("Usage: replicate-cli upload <path>"))?;
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Cannot read {path}"))?;
    let client = build_client(None)?;
    let name = file_name(path);
    let mime = replicate_lib_rust::utils::mime_for_filename(&name);
    let upload = client.upload_file(bytes, &name, Some(mime)).await?;
    match upload.url() {
        Some(url) => println!("{url}"),
        None => println!("{}", upload.id),
    }
    Ok(())
}
