//! Mint command - prints a token signed with the configured key store

use clap::Args;
use serde_json::Value;

use crate::domain::ClaimsSet;
use crate::infrastructure::auth::JwtBundle;
use crate::infrastructure::logging::LogOutput;

#[derive(Args, Clone, Debug)]
pub struct MintArgs {
    /// Application claim as `name=value`; JSON values are kept typed
    #[arg(long = "claim", value_parser = parse_claim)]
    pub claims: Vec<(String, Value)>,
}

pub async fn run(args: MintArgs, output: LogOutput) -> anyhow::Result<()> {
    let config = super::load_config(output)?;
    let bundle = JwtBundle::new(config.jwt)?;

    let claims: ClaimsSet = args.claims.into_iter().collect();
    let token = bundle.token_factory().await?.mint(claims)?;

    println!("{}", token.serialize());
    Ok(())
}

fn parse_claim(raw: &str) -> Result<(String, Value), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{}'", raw))?;

    let name = name.trim();
    if name.is_empty() {
        return Err("claim name must not be empty".to_string());
    }

    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((name.to_string(), value))
}
