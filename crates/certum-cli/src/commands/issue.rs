//! `certum issue`: issue a credential to a holder.

use clap::Args;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use certum_core::Identity;
use certum_crypto::{KeyPair, RequestAuth, SignedAction};

use super::{post_json, DEFAULT_ENDPOINT};

#[derive(Args, Debug)]
pub struct IssueArgs {
    /// Holder address (0x + 40 hex digits).
    #[arg(long)]
    pub holder: String,

    /// URI of the credential's descriptive record.
    #[arg(short, long)]
    pub reference: String,

    /// Authority key file.
    #[arg(short, long, default_value = "certum.key")]
    pub key: PathBuf,

    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Serialize)]
struct IssueRequest<'a> {
    holder: String,
    reference: &'a str,
    auth: RequestAuth,
}

#[derive(Deserialize)]
struct IssueResponse {
    id: u64,
    holder: String,
    reference: String,
}

pub async fn run(args: &IssueArgs) -> anyhow::Result<()> {
    let holder = Identity::parse(&args.holder)?;
    let keypair = KeyPair::load(&args.key)?;
    let auth = RequestAuth::sign_now(
        &SignedAction::Issue {
            holder: &holder,
            reference: &args.reference,
        },
        &keypair,
    );
    let body = IssueRequest {
        holder: holder.to_string(),
        reference: &args.reference,
        auth,
    };

    let data: IssueResponse =
        post_json(&args.endpoint, "credentials/issue", &body, "issuance").await?;
    println!("Credential issued!");
    println!("  ID:         {}", data.id);
    println!("  Holder:     {}", data.holder);
    println!("  Reference:  {}", data.reference);
    Ok(())
}
