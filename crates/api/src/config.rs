// config.rs - Runtime configuration shared with request handlers

use std::path::PathBuf;

/// Secret and lifetime for one kind of JWT
#[derive(Clone, Debug)]
pub struct TokenSettings {
    pub secret: String,
    pub validity_in_seconds: i64,
}

#[derive(Clone, Debug)]
pub struct TokenConfig {
    pub access: TokenSettings,
    pub refresh: TokenSettings,
}

#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub dir: PathBuf,
    pub max_bytes: usize,
}

// Ten years, well inside what chrono can add to the current time
const MAX_DURATION_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// Parses `90`, `45s`, `15m`, `12h` or `7d` into seconds
pub fn parse_duration(value: &str) -> Result<i64, String> {
    let value = value.trim();
    let (digits, multiplier) = match value.char_indices().last() {
        Some((i, 's')) => (&value[..i], 1),
        Some((i, 'm')) => (&value[..i], 60),
        Some((i, 'h')) => (&value[..i], 60 * 60),
        Some((i, 'd')) => (&value[..i], 24 * 60 * 60),
        Some(_) => (value, 1),
        None => return Err("empty duration".to_string()),
    };

    let amount: i64 = digits
        .trim()
        .parse()
        .map_err(|_| format!("invalid duration: {value}"))?;
    if amount <= 0 {
        return Err(format!("duration must be positive: {value}"));
    }

    amount
        .checked_mul(multiplier)
        .filter(|secs| *secs <= MAX_DURATION_SECS)
        .ok_or_else(|| format!("duration out of range: {value}"))
}
