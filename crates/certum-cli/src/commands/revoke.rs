//! `certum revoke`: permanently revoke a credential.

use clap::Args;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use certum_crypto::{KeyPair, RequestAuth, SignedAction};

use super::{post_json, DEFAULT_ENDPOINT};

#[derive(Args, Debug)]
pub struct RevokeArgs {
    /// Credential id.
    pub id: u64,

    /// Authority key file.
    #[arg(short, long, default_value = "certum.key")]
    pub key: PathBuf,

    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Serialize)]
struct RevokeRequest {
    auth: RequestAuth,
}

#[derive(Deserialize)]
struct RevokeResponse {
    id: u64,
    revoked_at: Option<String>,
}

pub async fn run(args: &RevokeArgs) -> anyhow::Result<()> {
    let keypair = KeyPair::load(&args.key)?;
    let body = RevokeRequest {
        auth: RequestAuth::sign_now(&SignedAction::Revoke { id: args.id }, &keypair),
    };

    let path = format!("credentials/{}/revoke", args.id);
    let data: RevokeResponse = post_json(&args.endpoint, &path, &body, "revocation").await?;
    println!("Credential {} revoked", data.id);
    if let Some(at) = data.revoked_at {
        println!("  Revoked at:  {}", at);
    }
    Ok(())
}
