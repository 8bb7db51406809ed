//! `certum verify`: verify every credential held by an identity.

use clap::Args;
use serde_json::Value;

use certum_core::Identity;

use super::{get_json, DEFAULT_ENDPOINT};

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Holder address.
    pub holder: String,

    /// Print the raw JSON response.
    #[arg(long)]
    pub json: bool,

    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

pub async fn run(args: &VerifyArgs) -> anyhow::Result<()> {
    let holder = Identity::parse(&args.holder)?;
    let path = format!("holders/{}/verify", holder);
    let data: Value = get_json(&args.endpoint, &path, "verification").await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    let credentials = data["credentials"].as_array().cloned().unwrap_or_default();
    if credentials.is_empty() {
        println!("{} holds no credentials", holder);
        return Ok(());
    }
    println!("{} holds {} credential(s)", holder, credentials.len());
    for credential in &credentials {
        println!();
        print_verified(credential)?;
    }
    Ok(())
}

/// One-line status for a verified credential.
///
/// Fails when the node's reply lacks the revocation flag or the resolution
/// status, rather than guessing.
pub fn status_line(credential: &Value) -> anyhow::Result<String> {
    let revoked = credential["revoked"]
        .as_bool()
        .ok_or_else(|| anyhow::anyhow!("malformed node reply: credential has no `revoked` flag"))?;
    let descriptive = &credential["descriptive"];
    let state = if revoked { "REVOKED" } else { "valid" };
    match descriptive["status"].as_str() {
        Some("available") => Ok(state.to_string()),
        Some("unavailable") => Ok(format!(
            "{}, details unavailable ({})",
            state,
            descriptive["reason"].as_str().unwrap_or("unknown reason")
        )),
        other => anyhow::bail!(
            "malformed node reply: unexpected descriptive status {:?}",
            other
        ),
    }
}

/// Human-readable rendering of a verified credential.
pub fn print_verified(credential: &Value) -> anyhow::Result<()> {
    println!("Credential {}  [{}]", credential["id"], status_line(credential)?);
    println!("  Holder:     {}", credential["holder"].as_str().unwrap_or("-"));
    println!("  Reference:  {}", credential["reference"].as_str().unwrap_or("-"));
    let record = &credential["descriptive"]["record"];
    if record.is_object() {
        let field = |name: &str| record[name].as_str().unwrap_or("-").to_string();
        println!("  Name:       {}", field("name"));
        println!("  Holder:     {}", field("holderDisplayName"));
        println!("  Program:    {}", field("program"));
        println!("  Grade:      {}", field("grade"));
        println!("  Issued:     {}", field("issueDate"));
        println!("  Authority:  {}", field("issuingAuthority"));
        if let Some(attachment) = record["attachmentReference"].as_str() {
            println!("  Attachment: {}", attachment);
        }
    }
    Ok(())
}
