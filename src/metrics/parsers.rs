//! Utility functions for metrics processing

const WEEK: u64 = 7 * 24 * 3600;
const DAY: u64 = 24 * 3600;
const HOUR: u64 = 3600;
const MINUTE: u64 = 60;

/// Parse RouterOS uptime string to seconds
///
/// Accepts the compact unit form `1w2d3h4m5s` (any subset of units). A digit
/// run counts only when it is immediately followed by `w`, `d`, `h`, `m` or
/// `s`; anything else is skipped, so `5x10s` is 10 and `""` is 0.
pub fn parse_uptime_to_seconds(s: &str) -> u64 {
    let mut total = 0u64;
    let mut num = String::new();
    for ch in s.chars() {
        if ch.is_ascii_digit() {
            num.push(ch);
            continue;
        }
        if num.is_empty() {
            continue;
        }
        let unit_seconds = match ch {
            'w' => WEEK,
            'd' => DAY,
            'h' => HOUR,
            'm' => MINUTE,
            's' => 1,
            _ => 0,
        };
        let value = num.parse::<u64>().unwrap_or(u64::MAX);
        total = total.saturating_add(value.saturating_mul(unit_seconds));
        num.clear();
    }
    // a trailing number without unit is ignored
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_uptime() {
        assert_eq!(parse_uptime_to_seconds("1d2h3m4s"), 93784);
        assert_eq!(parse_uptime_to_seconds("1h5m"), 3900);
        assert_eq!(parse_uptime_to_seconds("30s"), 30);
        assert_eq!(parse_uptime_to_seconds("1w2d3h4m5s"), 788_645);
    }

    #[test]
    fn test_parse_uptime_skips_unknown_units() {
        assert_eq!(parse_uptime_to_seconds("5x10s"), 10);
        assert_eq!(parse_uptime_to_seconds("garbage"), 0);
        assert_eq!(parse_uptime_to_seconds("42"), 0);
    }
}
