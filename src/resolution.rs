//! Mapping between UDF resolution tokens and Binance kline intervals.
//!
//! The supported set is fixed: the intersection of Binance's interval
//! vocabulary and what UDF resolution tokens can encode. Lookup is total
//! over that set and fails with `InvalidResolution` for anything else.

use crate::error::Error;

/// One supported resolution: the UDF token, the Binance interval token it
/// translates to, and the interval duration in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionSpec {
    pub udf_token: &'static str,
    pub upstream_interval: &'static str,
    pub seconds: i64,
}

// The weekly and monthly second counts are nominal (calendar weeks and
// months vary); they are used only to bound how many bars a single upstream
// call can cover. Bar boundaries themselves are aligned by the exchange.
const SUPPORTED: &[ResolutionSpec] = &[
    ResolutionSpec { udf_token: "1", upstream_interval: "1m", seconds: 60 },
    ResolutionSpec { udf_token: "3", upstream_interval: "3m", seconds: 180 },
    ResolutionSpec { udf_token: "5", upstream_interval: "5m", seconds: 300 },
    ResolutionSpec { udf_token: "15", upstream_interval: "15m", seconds: 900 },
    ResolutionSpec { udf_token: "30", upstream_interval: "30m", seconds: 1_800 },
    ResolutionSpec { udf_token: "60", upstream_interval: "1h", seconds: 3_600 },
    ResolutionSpec { udf_token: "120", upstream_interval: "2h", seconds: 7_200 },
    ResolutionSpec { udf_token: "240", upstream_interval: "4h", seconds: 14_400 },
    ResolutionSpec { udf_token: "360", upstream_interval: "6h", seconds: 21_600 },
    ResolutionSpec { udf_token: "480", upstream_interval: "8h", seconds: 28_800 },
    ResolutionSpec { udf_token: "720", upstream_interval: "12h", seconds: 43_200 },
    ResolutionSpec { udf_token: "D", upstream_interval: "1d", seconds: 86_400 },
    ResolutionSpec { udf_token: "W", upstream_interval: "1w", seconds: 604_800 },
    ResolutionSpec { udf_token: "M", upstream_interval: "1M", seconds: 30 * 86_400 },
];

/// Resolve a UDF resolution token into its spec.
///
/// Accepts the "1D"/"1W"/"1M" spellings some front-ends send as aliases for
/// the letter tokens.
pub fn resolve(token: &str) -> Result<&'static ResolutionSpec, Error> {
    let canonical = match token {
        "1D" => "D",
        "1W" => "W",
        "1M" => "M",
        other => other,
    };

    SUPPORTED
        .iter()
        .find(|spec| spec.udf_token == canonical)
        .ok_or(Error::InvalidResolution)
}

/// The supported UDF tokens, in ascending duration order. Served in the
/// datafeed config and in every symbol's `supported_resolutions` field.
pub fn supported_tokens() -> Vec<String> {
    SUPPORTED
        .iter()
        .map(|spec| spec.udf_token.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_supported_token_resolves_to_itself() {
        for spec in SUPPORTED {
            let resolved = resolve(spec.udf_token).unwrap();
            assert_eq!(resolved, spec);
            assert!(resolved.seconds > 0);
        }
    }

    #[test]
    fn resolve_is_deterministic() {
        let a = resolve("60").unwrap();
        let b = resolve("60").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.upstream_interval, "1h");
        assert_eq!(a.seconds, 3_600);
    }

    #[test]
    fn day_week_month_map_to_calendar_intervals() {
        assert_eq!(resolve("D").unwrap().seconds, 86_400);
        assert_eq!(resolve("W").unwrap().seconds, 604_800);
        assert_eq!(resolve("M").unwrap().upstream_interval, "1M");
    }

    #[test]
    fn prefixed_aliases_resolve_to_letter_tokens() {
        assert_eq!(resolve("1D").unwrap().udf_token, "D");
        assert_eq!(resolve("1W").unwrap().udf_token, "W");
        assert_eq!(resolve("1M").unwrap().udf_token, "M");
    }

    #[test]
    fn unsupported_tokens_are_rejected() {
        for token in ["", "17", "x", "2", "1s", "d", "MM"] {
            assert!(matches!(resolve(token), Err(Error::InvalidResolution)));
        }
    }
}
