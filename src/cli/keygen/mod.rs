//! Keygen command - writes a fresh RSA key store

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tracing::info;

use crate::infrastructure::keygen::{self, KeygenOptions};
use crate::infrastructure::keystore::KeyStoreType;
use crate::infrastructure::logging::LogOutput;

#[derive(Args, Clone, Debug)]
pub struct KeygenArgs {
    /// RSA modulus width: 1024, 2048 or 4096
    #[arg(long, default_value_t = 2048)]
    pub key_width: usize,

    /// SHA-2 hash length of the signing algorithm: 256, 384 or 512.
    /// Only JWKS output records it; a PKCS#8 key is signed with the
    /// configured `jwt.signing_algorithm`.
    #[arg(long, default_value_t = 256)]
    pub hash_length: u16,

    /// Key id for JWKS output (defaults to today's date)
    #[arg(long)]
    pub kid: Option<String>,

    /// Key store format: pkcs8 or jwks
    #[arg(long, default_value = "pkcs8")]
    pub format: KeyStoreType,

    /// Password encrypting a PKCS#8 key store
    #[arg(long)]
    pub password: Option<String>,

    /// Output file (stdout when omitted)
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

impl KeygenArgs {
    fn options(&self) -> KeygenOptions {
        KeygenOptions {
            key_width: self.key_width,
            hash_length: self.hash_length,
            kid: self.kid.clone(),
            format: self.format,
            password: self.password.clone(),
        }
    }
}

pub async fn run(args: KeygenArgs, output: LogOutput) -> anyhow::Result<()> {
    super::init_default_logging(output);

    let options = args.options();
    options.validate()?;

    let store = tokio::task::spawn_blocking(move || keygen::generate(&options))
        .await
        .context("Key generation task failed")??;

    match &args.output {
        Some(path) => {
            tokio::fs::write(path, &store.contents)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(
                path = %path.display(),
                format = %store.format,
                algorithm = ?store.algorithm,
                kid = store.kid.as_deref().unwrap_or("<thumbprint>"),
                "Key store written"
            );
        }
        None => println!("{}", String::from_utf8_lossy(&store.contents)),
    }

    Ok(())
}
