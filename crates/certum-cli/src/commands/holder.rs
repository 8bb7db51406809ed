//! `certum holder`: list a holder's credential ids.

use clap::Args;
use serde::Deserialize;

use certum_core::Identity;

use super::{get_json, DEFAULT_ENDPOINT};

#[derive(Args, Debug)]
pub struct HolderArgs {
    /// Holder address.
    pub holder: String,

    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Deserialize)]
struct HolderCredentialsResponse {
    holder: String,
    ids: Vec<u64>,
}

pub async fn run(args: &HolderArgs) -> anyhow::Result<()> {
    let holder = Identity::parse(&args.holder)?;
    let path = format!("holders/{}/credentials", holder);
    let data: HolderCredentialsResponse = get_json(&args.endpoint, &path, "lookup").await?;

    if data.ids.is_empty() {
        println!("{} holds no credentials", data.holder);
    } else {
        println!("{} holds {} credential(s):", data.holder, data.ids.len());
        for id in &data.ids {
            println!("  {}", id);
        }
    }
    Ok(())
}
