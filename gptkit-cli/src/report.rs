use colored::Colorize;
use gptkit::{DiskReport, EntryFinding, GptCopy, GptError, Reconciliation};

use crate::{log_normal, log_verbose};
use crate::utils::*;

fn status(err: Option<&GptError>) -> String {
    match err {
        None => "OK".green().to_string(),
        Some(e) => format!("{} {e}", "FAIL".red()),
    }
}

/// Per-side error, `None` when that copy is valid.
fn side_errors(rec: &Reconciliation) -> (Option<&GptError>, Option<&GptError>) {
    match rec {
        Reconciliation::BothValid { .. } | Reconciliation::Inconsistent { .. } => (None, None),
        Reconciliation::PrimaryOnly {
            secondary_error, ..
        } => (None, Some(secondary_error)),
        Reconciliation::SecondaryOnly { primary_error, .. } => (Some(primary_error), None),
        Reconciliation::NeitherValid {
            primary_error,
            secondary_error,
        } => (Some(primary_error), Some(secondary_error)),
    }
}

fn finding_line(f: &EntryFinding) -> String {
    match f.other {
        Some(other) => format!("slot {} (with slot {other}): {}", f.index, f.error),
        None => format!("slot {}: {}", f.index, f.error),
    }
}

pub fn print_report(target: &str, report: &DiskReport) {
    let geo = report.geometry;
    log_normal!(
        "{target}: {} sectors x {} B ({})",
        sep_u64(geo.total_sectors),
        geo.sector_size,
        pretty_bytes(geo.total_sectors * geo.sector_size)
    );

    let (p, s) = side_errors(&report.reconciliation);
    println!("  primary   : {}", status(p));
    println!("  secondary : {}", status(s));

    if let Reconciliation::Inconsistent { mismatches, .. } = &report.reconciliation {
        println!(
            "  {} copies disagree on: {}",
            "WARN".yellow(),
            mismatches.join(", ")
        );
    }

    let outcome = report.outcome().to_string();
    if report.is_healthy() {
        println!("  outcome   : {}", outcome.green());
    } else {
        println!("  outcome   : {}", outcome.yellow());
    }

    if let Some(repair) = report.reconciliation.repair() {
        log_verbose!(
            "repair plan: {} header at LBA {}, entries at LBA {} ({} bytes)",
            repair.side,
            repair.header_lba,
            repair.entries_lba,
            repair.entries_block.len()
        );
    }

    for f in &report.findings {
        println!("  {} {}", "ENTRY".red(), finding_line(f));
    }
}

pub fn print_table(copy: &GptCopy, sector_size: u64) -> anyhow::Result<()> {
    let h = &copy.header;
    log_normal!(
        "disk {} | usable {}..={} | {} slots x {} B",
        h.disk_uuid,
        h.first_usable_lba,
        h.last_usable_lba,
        h.number_of_entries,
        h.size_of_entry
    );
    println!(
        "  {:>3}  {:>12}  {:>12}  {:>10}  {:<22}  {}",
        "#", "start", "end", "size", "type", "name"
    );
    for (i, e) in copy.entries()?.iter().enumerate() {
        if e.is_unused() {
            continue;
        }
        println!(
            "  {:>3}  {:>12}  {:>12}  {:>10}  {:<22}  {}",
            i,
            e.starting_lba,
            e.ending_lba,
            pretty_bytes(e.size_in_sectors() * sector_size),
            e.kind().to_string(),
            e.name_string()
        );
        log_verbose!("       unique {} attrs {:#018X}", e.unique_guid, e.attributes);
    }
    Ok(())
}
