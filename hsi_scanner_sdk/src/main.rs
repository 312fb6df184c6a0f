//! # HSI Scanner CLI
//!
//! Reports fwupd host security attribute states for the requested stream IDs
//! as a JSON probe report.

use clap::Parser;
use hsi_scanner_base::api::{
    AttributeListing, CollectionFlag, ProbeConfig, ProbeReport, ReportError,
};
use hsi_scanner_sdk::cli::Cli;
use hsi_scanner_sdk::{apply_overrides, create_probe, exit_code, TransportSource, EXIT_UNAVAILABLE};
use std::path::Path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter()))
        .init();

    let config = match &cli.config {
        Some(path) => ProbeConfig::from_file(path)?,
        None => {
            let config = ProbeConfig::default();
            config.validate()?;
            config
        }
    };
    let config = apply_overrides(config, cli.offline, cli.exact_match);

    let source = match &cli.replay {
        Some(attrs) => TransportSource::Replay {
            attrs: attrs.as_path(),
            host_security_id: cli.replay_hsi.as_deref(),
        },
        None => TransportSource::Bus,
    };
    let probe = create_probe(&config, source);

    if cli.list {
        return match probe.list_attributes() {
            Ok(attributes) => match &cli.output {
                Some(path) => {
                    std::fs::write(path, serde_json::to_string_pretty(&attributes)?)?;
                    Ok(())
                }
                None => {
                    print_listing(&attributes);
                    Ok(())
                }
            },
            Err(reason) => {
                eprintln!("Error: {}", reason);
                std::process::exit(if probe.offline_mode() { 0 } else { EXIT_UNAVAILABLE });
            }
        };
    }

    let report = probe.collect(&cli.stream_ids, cli.hsi);

    match &cli.output {
        Some(path) => {
            write_report(&report, path)?;
            if !cli.quiet {
                print_summary(&report);
                eprintln!("\n[OK] Report saved to: {}", path.display());
            }
        }
        None => {
            println!("{}", report.to_json()?);
            if !cli.quiet {
                print_summary(&report);
            }
        }
    }

    let code = exit_code(&report);
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

fn write_report(report: &ProbeReport, path: &Path) -> Result<(), ReportError> {
    let json = report.to_json()?;
    std::fs::write(path, json).map_err(|e| ReportError::Write {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn print_listing(attributes: &[AttributeListing]) {
    if attributes.is_empty() {
        println!("No host security attributes reported");
        return;
    }

    let width = attributes.iter().map(|a| a.name.len()).max().unwrap_or(0);
    for attribute in attributes {
        let state = match attribute.label {
            Some(label) => label.to_string(),
            None => format!("<code {}>", attribute.result_code),
        };
        let name = if attribute.name.is_empty() {
            "<unnamed>"
        } else {
            attribute.name.as_str()
        };
        println!("{:<width$}  {}", name, state, width = width);
    }
}

fn print_summary(report: &ProbeReport) {
    eprintln!("\n=== HSI Probe Results ===");
    eprintln!("Host: {} ({})", report.host.hostname, report.host.os_info);
    if let Some(level) = &report.hsi_level {
        eprintln!("Security Level: {}", level.raw);
    } else if let Some(err) = &report.hsi_error {
        eprintln!("Security Level: unavailable ({})", err);
    }

    for object in &report.objects {
        let state = match (object.flag, object.security_attr()) {
            (_, Some(label)) => label.to_string(),
            (CollectionFlag::Complete, None) => object
                .items
                .first()
                .and_then(|item| item.message.clone())
                .unwrap_or_else(|| "not collected".to_string()),
            (CollectionFlag::NotCollected, None) => "not collected".to_string(),
            (CollectionFlag::Error, None) => format!("error: {}", object.messages.join("; ")),
        };
        eprintln!("  {}: {}", object.stream_id, state);
    }

    eprintln!(
        "Requested: {}  Found: {}  Not found: {}  Unavailable: {}",
        report.summary.requested,
        report.summary.found,
        report.summary.not_found,
        report.summary.unavailable
    );
    eprintln!("Duration: {}ms", report.timestamp.duration_ms);
}
