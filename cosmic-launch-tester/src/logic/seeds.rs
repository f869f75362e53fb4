use anyhow::{Context, Result, bail};
use std::collections::HashSet;

pub const DEFAULT_SEED: u64 = 1337;

/// Seed requested on the command line, with the token it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedInfo {
    pub seed: u64,
    pub label: String,
}

impl SeedInfo {
    #[must_use]
    pub fn from_numeric(seed: u64) -> Self {
        Self {
            seed,
            label: seed.to_string(),
        }
    }
}

/// Resolve CLI seed tokens into canonical seeds.
///
/// Accepts decimal integers (negative values use their magnitude) and
/// `0x`-prefixed hexadecimal. Duplicates collapse onto the first occurrence.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut seen = HashSet::new();
    let mut resolved = Vec::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }
        let seed = parse_seed_token(token)?;
        if seen.insert(seed) {
            resolved.push(SeedInfo {
                seed,
                label: token.clone(),
            });
        }
    }

    if resolved.is_empty() {
        resolved.push(SeedInfo::from_numeric(DEFAULT_SEED));
    }

    Ok(resolved)
}

fn parse_seed_token(token: &str) -> Result<u64> {
    if let Some(hex) = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        return u64::from_str_radix(&hex.replace('_', ""), 16)
            .with_context(|| format!("invalid hex seed: {token}"));
    }
    if let Ok(value) = token.parse::<i64>() {
        return Ok(value.unsigned_abs());
    }
    if let Ok(value) = token.parse::<u64>() {
        return Ok(value);
    }
    bail!("Unrecognized seed token: {token}")
}
