//! `certum status` and `certum authority`: node information.

use clap::Args;
use serde::Deserialize;

use super::{get_json, DEFAULT_ENDPOINT};

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Args, Debug)]
pub struct AuthorityArgs {
    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Deserialize)]
struct StatusResponse {
    version: String,
    authority: String,
    total_issued: u64,
    uptime_secs: u64,
}

#[derive(Deserialize)]
struct AuthorityResponse {
    authority: String,
}

pub async fn run(args: &StatusArgs) -> anyhow::Result<()> {
    let status: StatusResponse = get_json(&args.endpoint, "status", "status query").await?;
    println!("Node Status:");
    println!("  Version:       {}", status.version);
    println!("  Authority:     {}", status.authority);
    println!("  Total issued:  {}", status.total_issued);
    println!("  Uptime:        {}s", status.uptime_secs);
    Ok(())
}

pub async fn authority(args: &AuthorityArgs) -> anyhow::Result<()> {
    let data: AuthorityResponse = get_json(&args.endpoint, "authority", "authority query").await?;
    println!("{}", data.authority);
    Ok(())
}
