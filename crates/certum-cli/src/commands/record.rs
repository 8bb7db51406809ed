//! `certum record`: show one credential record.

use clap::Args;

use certum_core::CredentialRecord;

use super::verify::print_verified;
use super::{get_json, DEFAULT_ENDPOINT};

#[derive(Args, Debug)]
pub struct RecordArgs {
    /// Credential id.
    pub id: u64,

    /// Also resolve and show the descriptive record.
    #[arg(long)]
    pub resolve: bool,

    /// Print the raw JSON response.
    #[arg(long)]
    pub json: bool,

    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

pub async fn run(args: &RecordArgs) -> anyhow::Result<()> {
    if args.resolve {
        let path = format!("credentials/{}/verify", args.id);
        let verified: serde_json::Value = get_json(&args.endpoint, &path, "verification").await?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&verified)?);
        } else {
            print_verified(&verified)?;
        }
        return Ok(());
    }

    let path = format!("credentials/{}", args.id);
    let raw: serde_json::Value = get_json(&args.endpoint, &path, "lookup").await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&raw)?);
        return Ok(());
    }
    let record: CredentialRecord = serde_json::from_value(raw)?;
    println!("Credential {}", record.id);
    println!("  Holder:     {}", record.holder);
    println!("  Reference:  {}", record.reference);
    println!("  Issued at:  {}", record.issued_at);
    match record.revoked_at {
        Some(at) if record.revoked => println!("  Status:     REVOKED ({})", at.to_rfc3339()),
        _ if record.revoked => println!("  Status:     REVOKED (unknown time)"),
        _ => println!("  Status:     active"),
    }
    Ok(())
}
