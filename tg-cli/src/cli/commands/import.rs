//! `tg import`

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Result, bail};
use chrono::Local;
use clap::Args;
use colored::*;

use crate::cli::{connect, default_output_path};
use crate::console::ConsoleChannel;
use crate::excel::XlsxCodec;
use crate::import::{EntityType, ImportReport, ImportRequest, ImportStatus, run_import};

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Excel file with RemoteNetwork and/or Resource sheets
    #[arg(short, long)]
    pub file: PathBuf,

    /// Import Remote Networks
    #[arg(short = 'n', long)]
    pub remote_networks: bool,

    /// Import Resources
    #[arg(short = 'r', long)]
    pub resources: bool,

    /// Audit file to write (default: `<account>-import-<timestamp>.xlsx`)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Plan and write the audit without creating anything
    #[arg(long)]
    pub dry_run: bool,

    /// Do not ask for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

impl ImportArgs {
    /// Types selected by flags; all types when none is given
    pub fn entity_types(&self) -> Vec<EntityType> {
        let mut types = Vec::new();
        if self.remote_networks {
            types.push(EntityType::RemoteNetwork);
        }
        if self.resources {
            types.push(EntityType::Resource);
        }
        if types.is_empty() {
            types = EntityType::ALL.to_vec();
        }
        types
    }
}

pub async fn handle_import_command(args: ImportArgs, account_flag: Option<&str>) -> Result<ExitCode> {
    if !args.file.exists() {
        bail!("Input file does not exist: {}", args.file.display());
    }

    let (credentials, client) = connect(account_flag)?;
    let request = ImportRequest {
        entity_types: args.entity_types(),
        output: args
            .output
            .clone()
            .unwrap_or_else(|| default_output_path(&credentials.account, Some("import"), Local::now())),
        input: args.file.clone(),
        dry_run: args.dry_run,
    };

    println!(
        "Importing {} into {}",
        request.input.display().to_string().cyan(),
        credentials.account.bold()
    );

    let report = run_import(&client, &XlsxCodec, &ConsoleChannel::new(args.yes), &request).await?;
    print_report(&report);

    if report.summary.has_failures() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn print_report(report: &ImportReport) {
    println!();
    match report.status {
        ImportStatus::Cancelled => {
            println!("{}", "Import cancelled, nothing was created.".yellow());
            return;
        }
        ImportStatus::DryRun => println!("{}", "Dry run, nothing was created.".yellow()),
        ImportStatus::Completed => {}
    }

    for (entity_type, counts) in &report.summary.entities {
        let created = if report.status == ImportStatus::DryRun {
            format!("{} to create", counts.pending)
        } else {
            format!("{} created", counts.created)
        };
        let failed = format!("{} failed", counts.failed);
        println!(
            "{:<16} {}, {} skipped, {}",
            entity_type.label(),
            created.green(),
            counts.skipped,
            if counts.failed > 0 { failed.red() } else { failed.normal() }
        );
    }

    if !report.failures.is_empty() {
        println!();
        println!("{}", "Failures:".red().bold());
        for failure in &report.failures {
            println!("  {}", failure);
        }
    }

    if let Some(path) = &report.audit_path {
        println!();
        println!("Audit written to {}", path.display().to_string().cyan());
    }
}
