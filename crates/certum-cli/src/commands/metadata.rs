//! `certum metadata`: author a descriptive record file.

use chrono::{NaiveDate, Utc};
use clap::Args;
use std::path::PathBuf;

use certum_core::DescriptiveRecord;

#[derive(Args, Debug)]
pub struct MetadataArgs {
    /// Holder's display name.
    #[arg(long)]
    pub name: String,

    /// Program or course completed.
    #[arg(long)]
    pub program: String,

    /// Grade awarded.
    #[arg(long)]
    pub grade: String,

    /// Issuing institution.
    #[arg(long)]
    pub authority: String,

    /// Issue date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Reference to an attached document, e.g. a PDF.
    #[arg(long)]
    pub attachment: Option<String>,

    /// Output file.
    #[arg(short, long)]
    pub out: PathBuf,
}

/// The record described by `args`.
pub fn build(args: &MetadataArgs) -> DescriptiveRecord {
    let date = args.date.unwrap_or_else(|| Utc::now().date_naive());
    let record = DescriptiveRecord::completion_certificate(
        &args.name,
        &args.program,
        &args.grade,
        date,
        &args.authority,
    );
    match args.attachment.as_deref().map(str::trim) {
        Some(attachment) if !attachment.is_empty() => record.with_attachment(attachment),
        _ => record,
    }
}

pub fn run(args: &MetadataArgs) -> anyhow::Result<()> {
    let record = build(args);
    let json = serde_json::to_string_pretty(&record)?;
    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&args.out, json)?;
    println!("Descriptive record written to {}", args.out.display());
    println!("Publish it and pass its URI to `certum issue --reference`.");
    Ok(())
}
