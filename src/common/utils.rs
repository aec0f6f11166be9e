//! Utility functions for twintrader

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Parse duration string (e.g., "250ms", "5s", "1m")
pub fn parse_duration(s: &str) -> crate::Result<std::time::Duration> {
    let s = s.trim();
    if s.is_empty() {
        return Err(crate::Error::InvalidConfig("empty duration".into()));
    }

    let (num_str, unit) = if let Some(num) = s.strip_suffix("ms") {
        (num, "ms")
    } else if s.ends_with(|c: char| c.is_ascii_digit()) {
        // bare number: seconds
        (s, "s")
    } else {
        let last = s.char_indices().last().map(|(i, _)| i).unwrap_or(0);
        s.split_at(last)
    };

    let num: u64 = num_str
        .parse()
        .map_err(|_| crate::Error::InvalidConfig(format!("invalid duration: {}", s)))?;

    let secs = |factor: u64| {
        num.checked_mul(factor)
            .map(std::time::Duration::from_secs)
            .ok_or_else(|| crate::Error::InvalidConfig(format!("duration out of range: {}", s)))
    };

    match unit {
        "ms" => Ok(std::time::Duration::from_millis(num)),
        "s" => Ok(std::time::Duration::from_secs(num)),
        "m" => secs(60),
        "h" => secs(3600),
        _ => Err(crate::Error::InvalidConfig(format!(
            "unknown duration unit: {}",
            unit
        ))),
    }
}

/// Base URL for a `host:port` address (an explicit scheme is kept).
pub fn base_url(addr: &str) -> String {
    let addr = addr.trim().trim_end_matches('/');
    if addr.starts_with("http://") || addr.starts_with("https://") {
        addr.to_string()
    } else {
        format!("http://{}", addr)
    }
}

/// Current wall-clock time
pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// Peer liveness as last observed by a trader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeState {
    Alive,
    Suspect,
    Dead,
}
