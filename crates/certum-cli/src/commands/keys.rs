//! `certum keygen` and `certum address`: signing key management.

use clap::Args;
use std::path::PathBuf;

use certum_crypto::KeyPair;

#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Where to write the key file.
    #[arg(short, long, default_value = "certum.key")]
    pub out: PathBuf,

    /// Overwrite an existing key file.
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct AddressArgs {
    /// Key file produced by `certum keygen`.
    #[arg(short, long, default_value = "certum.key")]
    pub key: PathBuf,
}

pub fn keygen(args: &KeygenArgs) -> anyhow::Result<()> {
    if args.out.exists() && !args.force {
        anyhow::bail!(
            "{} already exists; pass --force to overwrite it",
            args.out.display()
        );
    }
    let keypair = KeyPair::generate();
    keypair.save(&args.out)?;
    println!("Key written to {}", args.out.display());
    println!("  Address:     {}", keypair.identity());
    println!("  Public key:  {}", keypair.public_key().to_hex());
    Ok(())
}

pub fn address(args: &AddressArgs) -> anyhow::Result<()> {
    let keypair = KeyPair::load(&args.key)?;
    println!("{}", keypair.identity());
    Ok(())
}
