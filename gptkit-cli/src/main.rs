// gptkit-cli/src/main.rs

mod partarg;
mod report;
mod utils;

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;
use diskio::prelude::*;
use gptkit::{GptLayout, Outcome, SyncOptions, check_disk, inspect_disk, sync_gpt, write_gpt};

use crate::utils::*;

#[derive(Parser)]
#[command(name = "gptkit", version, about = "GPT checker and repair tool", long_about = None)]
struct Cli {
    /// Only print errors and results
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Print repair plans and per-partition details
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Logical sector size of the target, in bytes
    #[arg(long, global = true, default_value_t = gptkit::DEFAULT_SECTOR_SIZE)]
    sector_size: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate both GPT copies without writing anything
    Check {
        /// Disk image or block device
        target: PathBuf,

        /// Skip bounds, GUID and overlap checks on the entries
        #[arg(long)]
        no_entry_checks: bool,
    },
    /// Rebuild a missing or corrupt GPT copy from the valid one
    Repair {
        /// Disk image or block device
        target: PathBuf,

        /// Only show what would be written
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// List partitions from the authoritative copy
    List {
        /// Disk image or block device
        target: PathBuf,
    },
    /// Write a fresh GPT, creating the image file if needed
    Init {
        /// Disk image or block device
        target: PathBuf,

        /// Image size (e.g. 64M); required when the file does not exist yet
        #[arg(short, long)]
        size: Option<String>,

        /// Number of entry slots
        #[arg(long, default_value_t = 128)]
        entries: u32,

        /// Partition as TYPE:START:END[:NAME]; TYPE is efi, kernel, rootfs, reserved or a GUID
        #[arg(short, long = "part")]
        parts: Vec<String>,

        /// Overwrite an existing valid GPT without asking
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

fn open_target(path: &Path, write: bool) -> Result<File> {
    OpenOptions::new()
        .read(true)
        .write(write)
        .open(path)
        .with_context(|| format!("failed to open {}", path.display()))
}

fn confirm(question: &str) -> Result<bool> {
    print!("{} {question} (y/N): ", "WARNING".yellow().bold());
    std::io::stdout().flush()?;
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

fn cmd_check(target: &Path, sector_size: u64, no_entry_checks: bool) -> Result<()> {
    let mut file = open_target(target, false)?;
    let mut io = StdDiskIO::with_sector_size(&mut file, sector_size);

    let mut opts = SyncOptions::new().dry_run();
    if no_entry_checks {
        opts = opts.no_entry_checks();
    }
    let report = check_disk(&mut io, &opts)?;
    report::print_report(&target.display().to_string(), &report);

    if !report.is_healthy() {
        bail!("{}: {}", target.display(), report.outcome());
    }
    log_info!("{}", "GPT healthy".green());
    Ok(())
}

fn cmd_repair(target: &Path, sector_size: u64, dry_run: bool, yes: bool) -> Result<()> {
    let mut file = open_target(target, !dry_run)?;
    let mut io = StdDiskIO::with_sector_size(&mut file, sector_size);

    let report = check_disk(&mut io, &SyncOptions::new())?;
    report::print_report(&target.display().to_string(), &report);

    match report.outcome() {
        Outcome::BothValid => {
            log_info!("nothing to repair");
            return Ok(());
        }
        Outcome::InconsistentMirrors | Outcome::NeitherValid => {
            // Both carry an operator-facing error.
            let err = report.reconciliation.into_result().err();
            bail!(
                "refusing to repair {}: {}",
                target.display(),
                err.map(|e| e.to_string()).unwrap_or_default()
            );
        }
        Outcome::PrimaryOnly | Outcome::SecondaryOnly => {}
    }

    if dry_run {
        log_normal!("Dry run mode: no data will be written.");
        return Ok(());
    }
    if !yes && !confirm(&format!("rewrite the damaged GPT copy on {}?", target.display()))? {
        log_normal!("Operation cancelled.");
        return Ok(());
    }

    let report = sync_gpt(&mut io, &SyncOptions::new())?;
    if !report.repaired {
        bail!("{} changed since it was checked: {}", target.display(), report.outcome());
    }
    log_verbose!("repair written, re-checking");

    let after = check_disk(&mut io, &SyncOptions::new().no_entry_checks())?;
    if after.outcome() != Outcome::BothValid {
        bail!("repair did not verify: {}", after.outcome());
    }
    log_info!("{}", "GPT repaired".green());
    Ok(())
}

fn cmd_list(target: &Path, sector_size: u64) -> Result<()> {
    let mut file = open_target(target, false)?;
    let mut io = StdDiskIO::with_sector_size(&mut file, sector_size);
    let reconciliation = inspect_disk(&mut io)?;
    if reconciliation.outcome() != Outcome::BothValid {
        log_info!("{}: {}", "WARN".yellow(), reconciliation.outcome());
    }
    let copy = reconciliation.into_result()?;
    log_verbose!("reading {} copy", copy.side);
    report::print_table(&copy, sector_size)
}

fn cmd_init(
    target: &Path,
    sector_size: u64,
    size: Option<&str>,
    entries: u32,
    parts: &[String],
    yes: bool,
) -> Result<()> {
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(size.is_some())
        .truncate(false)
        .open(target)
        .with_context(|| format!("failed to open {}", target.display()))?;

    if let Some(size) = size {
        let bytes = parse_size(size).with_context(|| format!("bad size '{size}'"))?;
        file.set_len(bytes)?;
        log_verbose!("image size set to {}", pretty_bytes(bytes));
    }

    let mut io = StdDiskIO::with_sector_size(&mut file, sector_size);
    let total = io.disk_sector_count()?;

    let existing = inspect_disk(&mut io)?;
    if existing.outcome() != Outcome::NeitherValid
        && !yes
        && !confirm(&format!("{} already has a GPT, overwrite it?", target.display()))?
    {
        log_normal!("Operation cancelled.");
        return Ok(());
    }

    let entries_list = parts
        .iter()
        .map(|p| partarg::parse_part(p))
        .collect::<Result<Vec<_>>>()?;

    let layout = GptLayout::new(total, partarg::random_guid())
        .with_sector_size(sector_size)
        .with_entries(entries, gptkit::entry::GPT_ENTRY_SIZE as u32);
    let header = write_gpt(&mut io, &layout, &entries_list)?;

    log_info!(
        "{} written to {}: disk {} | usable {}..={} | {} partition(s)",
        "GPT".green(),
        target.display(),
        header.disk_uuid,
        header.first_usable_lba,
        header.last_usable_lba,
        entries_list.len()
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    set_log_level(if cli.quiet {
        LogLevel::Quiet
    } else if cli.verbose {
        LogLevel::Verbose
    } else {
        LogLevel::Normal
    });

    match cli.command {
        Commands::Check {
            target,
            no_entry_checks,
        } => cmd_check(&target, cli.sector_size, no_entry_checks),
        Commands::Repair {
            target,
            dry_run,
            yes,
        } => cmd_repair(&target, cli.sector_size, dry_run, yes),
        Commands::List { target } => cmd_list(&target, cli.sector_size),
        Commands::Init {
            target,
            size,
            entries,
            parts,
            yes,
        } => cmd_init(
            &target,
            cli.sector_size,
            size.as_deref(),
            entries,
            &parts,
            yes,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn init_then_repair_then_check() {
        set_log_level(LogLevel::Quiet);
        let dir = tempfile::tempdir().unwrap();
        let img = dir.path().join("disk.img");
        let parts = vec!["efi:64:199:EFI".to_string(), "rootfs:200:900".to_string()];

        cmd_init(&img, 512, Some("500K"), 128, &parts, true).unwrap();
        cmd_check(&img, 512, false).unwrap();

        // Trash the primary header.
        {
            let mut f = open_target(&img, true).unwrap();
            let mut io = StdDiskIO::new(&mut f);
            io.write_at(512, b"NOT GPT!").unwrap();
        }
        assert!(cmd_check(&img, 512, false).is_err());

        cmd_repair(&img, 512, true, true).unwrap();
        assert!(cmd_check(&img, 512, false).is_err());

        cmd_repair(&img, 512, false, true).unwrap();
        cmd_check(&img, 512, false).unwrap();
        cmd_list(&img, 512).unwrap();
    }

    #[test]
    fn repair_refuses_blank_disk() {
        set_log_level(LogLevel::Quiet);
        let dir = tempfile::tempdir().unwrap();
        let img = dir.path().join("blank.img");
        File::create(&img).unwrap().set_len(512 * 100).unwrap();
        assert!(cmd_repair(&img, 512, false, true).is_err());
    }

    #[test]
    fn device_errors_reach_the_top_level() {
        set_log_level(LogLevel::Quiet);
        let dir = tempfile::tempdir().unwrap();
        let img = dir.path().join("zero-sector.img");
        let err = cmd_init(&img, 0, Some("4K"), 128, &[], true).unwrap_err();
        assert_eq!(
            err.downcast_ref::<DiskIOError>(),
            Some(&DiskIOError::Unsupported)
        );
    }

    #[test]
    fn init_rejects_overlaps() {
        set_log_level(LogLevel::Quiet);
        let dir = tempfile::tempdir().unwrap();
        let img = dir.path().join("bad.img");
        let parts = vec!["efi:64:300".to_string(), "rootfs:200:900".to_string()];
        assert!(cmd_init(&img, 512, Some("500K"), 128, &parts, true).is_err());
    }
}
