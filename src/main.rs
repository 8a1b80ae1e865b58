//! bagview - an embeddable 3D package-customization view
//!
//! Headless binary: loads the package model once, resolves its label
//! surfaces, then serves the external command protocol until the host
//! tears the view down.

mod config;
mod control;
mod font_utils;
mod preview;
mod view;

use anyhow::{Context, Result};
use config::ViewConfig;
use control::controller::{ControlEndpoint, ControlMsg};
use control::server::ControlServer;
use font_utils::SystemFontResolver;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::mpsc::TryRecvError;
use std::time::Duration;
use std::{env, thread};
use tracing::{error, info};
use view::CustomizerView;

fn main() -> Result<()> {
    // Initialize tracing with WARN level by default (can be overridden via RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    info!("Starting bagview v{}", env!("CARGO_PKG_VERSION"));

    let cli = CliOptions::parse(env::args().skip(1))?;

    let mut view_config = match &cli.config {
        Some(path) => ViewConfig::load_from_path(path),
        None => ViewConfig::load(),
    };
    if let Some(model) = cli.model.clone() {
        view_config.model_path = model;
    }
    if let Some(addr) = cli.control_addr.clone() {
        view_config.control_addr = addr;
    }

    // Load failure leaves an inert view rather than exiting: the
    // command channel stays up and every command is a safe no-op.
    let view = match bagview_assets::graph_from_file(&view_config.model_path) {
        Ok(graph) => {
            info!(
                model = %view_config.model_path.display(),
                name = graph.name(),
                "model loaded"
            );
            CustomizerView::new(view_config.clone(), graph, Box::new(SystemFontResolver))
        }
        Err(err) => {
            error!(
                %err,
                model = %view_config.model_path.display(),
                "model load failed; view is inert"
            );
            CustomizerView::inert(view_config.clone(), Box::new(SystemFontResolver))
        }
    };

    if let Some(script) = &cli.oneshot_commands {
        return run_oneshot(view, script, cli.capture_out.as_deref());
    }

    if let Some(path) = cli.control_uds.clone() {
        #[cfg(unix)]
        {
            let handle = ControlServer::start_uds(path, cli.control_log.clone())?;
            return run_loop(view, handle.endpoint);
        }
        #[cfg(not(unix))]
        {
            let _ = path;
            anyhow::bail!("--control-uds is only supported on unix");
        }
    }

    let addr: SocketAddr = view_config
        .control_addr
        .parse()
        .with_context(|| format!("invalid control address {}", view_config.control_addr))?;
    let handle = ControlServer::start(addr, cli.control_log.clone())?;
    run_loop(view, handle.endpoint)
}

/// Cooperative single-threaded loop: drain pending commands, apply
/// each to completion in delivery order, then refresh the preview.
fn run_loop(mut view: CustomizerView, endpoint: ControlEndpoint) -> Result<()> {
    loop {
        loop {
            match endpoint.rx.try_recv() {
                Ok(ControlMsg::Connected) => info!("controller connected"),
                Ok(ControlMsg::Disconnected) => info!("controller disconnected"),
                Ok(ControlMsg::Command {
                    command,
                    respond_to,
                }) => {
                    if let Some(event) = view.apply(command) {
                        if respond_to.try_send(event).is_err() {
                            tracing::warn!("controller went away before event delivery");
                        }
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    info!("control server stopped; shutting down");
                    return Ok(());
                }
            }
        }
        view.frame();
        thread::sleep(Duration::from_millis(50));
    }
}

/// Apply a newline-delimited command script, then exit. Outbound
/// events print to stdout; `--capture-out` additionally writes the
/// final frame as PNG.
fn run_oneshot(
    mut view: CustomizerView,
    script: &Path,
    capture_out: Option<&Path>,
) -> Result<()> {
    let contents = std::fs::read_to_string(script)
        .with_context(|| format!("failed to read command script {}", script.display()))?;

    for line in contents.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let command = control::protocol::decode_command(trimmed);
        if let Some(event) = view.apply(command) {
            println!("{event}");
        }
    }

    view.frame();
    if let Some(path) = capture_out {
        let png = bagview_capture::encode_png(view.latest_frame())?;
        std::fs::write(path, png)
            .with_context(|| format!("failed to write capture {}", path.display()))?;
        info!(path = %path.display(), "capture written");
    }
    Ok(())
}

#[derive(Debug, Default)]
struct CliOptions {
    config: Option<PathBuf>,
    model: Option<PathBuf>,
    control_addr: Option<String>,
    control_uds: Option<PathBuf>,
    control_log: Option<PathBuf>,
    oneshot_commands: Option<PathBuf>,
    capture_out: Option<PathBuf>,
}

impl CliOptions {
    fn parse<I: Iterator<Item = String>>(mut args: I) -> Result<Self> {
        let mut opts = CliOptions::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => opts.config = Some(next_path(&mut args, "--config")?),
                "--model" => opts.model = Some(next_path(&mut args, "--model")?),
                "--control-addr" => {
                    opts.control_addr = Some(next_value(&mut args, "--control-addr")?);
                }
                "--control-uds" => opts.control_uds = Some(next_path(&mut args, "--control-uds")?),
                "--control-log" => opts.control_log = Some(next_path(&mut args, "--control-log")?),
                "--oneshot-commands" => {
                    opts.oneshot_commands = Some(next_path(&mut args, "--oneshot-commands")?);
                }
                "--capture-out" => opts.capture_out = Some(next_path(&mut args, "--capture-out")?),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                other => anyhow::bail!("unknown argument: {other} (try --help)"),
            }
        }
        Ok(opts)
    }
}

fn next_value<I: Iterator<Item = String>>(args: &mut I, flag: &str) -> Result<String> {
    args.next()
        .ok_or_else(|| anyhow::anyhow!("{flag} requires a value"))
}

fn next_path<I: Iterator<Item = String>>(args: &mut I, flag: &str) -> Result<PathBuf> {
    Ok(PathBuf::from(next_value(args, flag)?))
}

fn print_usage() {
    println!(
        "bagview {}\n\n\
         USAGE: bagview [OPTIONS]\n\n\
         OPTIONS:\n\
           --config <PATH>            view config (default config/view.toml)\n\
           --model <PATH>             model manifest (default assets/model/package.json)\n\
           --control-addr <ADDR>      TCP control address (default 127.0.0.1:4460)\n\
           --control-uds <PATH>       unix socket control endpoint (unix only)\n\
           --control-log <PATH>       append-only JSONL session log\n\
           --oneshot-commands <PATH>  apply a command script, then exit\n\
           --capture-out <PATH>       with --oneshot-commands: write the final frame PNG",
        env!("CARGO_PKG_VERSION")
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliOptions> {
        CliOptions::parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn parses_all_flags() {
        let opts = parse(&[
            "--model",
            "bag.json",
            "--control-addr",
            "127.0.0.1:9000",
            "--control-log",
            "session.jsonl",
        ])
        .unwrap();
        assert_eq!(opts.model.unwrap(), PathBuf::from("bag.json"));
        assert_eq!(opts.control_addr.as_deref(), Some("127.0.0.1:9000"));
        assert_eq!(opts.control_log.unwrap(), PathBuf::from("session.jsonl"));
    }

    #[test]
    fn rejects_unknown_flags_and_missing_values() {
        assert!(parse(&["--frobnicate"]).is_err());
        assert!(parse(&["--model"]).is_err());
    }
}
