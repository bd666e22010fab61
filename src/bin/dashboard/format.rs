use super::*;

/// Signed dollar amount with an explicit leading `+` for non-negative
/// values, e.g. `+$12.00` / `-$12.30`. Non-finite input renders as zero.
pub(crate) fn format_currency(v: f64) -> String {
    let n = if v.is_finite() { v } else { 0.0 };
    let sign = if n >= 0.0 { "+" } else { "-" };
    format!("{sign}${:.2}", n.abs())
}

/// Signed one-decimal percentage, e.g. `+5.0%` / `-5.0%`.
pub(crate) fn format_percent(v: f64) -> String {
    let n = if v.is_finite() { v } else { 0.0 };
    let sign = if n >= 0.0 { "+" } else { "" };
    format!("{sign}{n:.1}%")
}

/// Best-effort short label for a ticker like `KXBTC15M-26FEB081615-15`:
/// the first known asset symbol plus the first 4-digit run that directly
/// precedes a `-`. Lossy on purpose; anything unrecognized degrades to the
/// placeholder rather than failing.
pub(crate) fn short_ticker(ticker: Option<&str>) -> String {
    let Some(t) = ticker.filter(|t| !t.is_empty()) else {
        return "???".to_string();
    };

    let asset = ["BTC", "SOL", "ETH"]
        .iter()
        .filter_map(|a| t.find(*a).map(|at| (at, *a)))
        .min_by_key(|(at, _)| *at)
        .map(|(_, a)| a)
        .unwrap_or("???");

    let bytes = t.as_bytes();
    let mut time = "";
    for i in 0..bytes.len().saturating_sub(4) {
        if bytes[i..i + 4].iter().all(|b| b.is_ascii_digit()) && bytes[i + 4] == b'-' {
            time = &t[i..i + 4];
            break;
        }
    }

    format!("{asset} {time}")
}

/// `wins / (wins + losses)` as a one-decimal percentage; the literal `0%`
/// when no trades have settled (never divides by zero).
pub(crate) fn win_rate(wins: u32, losses: u32) -> String {
    let total = wins + losses;
    if total == 0 {
        return "0%".to_string();
    }
    format!("{:.1}%", f64::from(wins) / f64::from(total) * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_signs_and_rounding() {
        assert_eq!(format_currency(-12.3), "-$12.30");
        assert_eq!(format_currency(12.0), "+$12.00");
        assert_eq!(format_currency(0.0), "+$0.00");
        assert_eq!(format_currency(-0.004), "+$0.00");
        assert_eq!(format_currency(f64::NAN), "+$0.00");
    }

    #[test]
    fn percent_signs() {
        assert_eq!(format_percent(-5.0), "-5.0%");
        assert_eq!(format_percent(5.04), "+5.0%");
        assert_eq!(format_percent(0.0), "+0.0%");
        assert_eq!(format_percent(f64::NAN), "+0.0%");
    }

    #[test]
    fn non_numeric_payload_values_format_as_zero() {
        // The decode layer coerces junk to 0.0; the formatter then renders
        // the explicit-sign zero literal.
        let v = serde_json::json!({"session": {"pnl": "abc"}});
        let session = &PnlSummary::from_value(&v).session;
        assert_eq!(format_currency(session.pnl), "+$0.00");
        assert_eq!(format_percent(session.pct), "+0.0%");
    }

    #[test]
    fn ticker_extracts_asset_and_time() {
        assert_eq!(short_ticker(Some("KXBTC15M-26FEB081615-15")), "BTC 1615");
        assert_eq!(short_ticker(Some("KXSOL15M-26FEB080000-05")), "SOL 0000");
        // First asset occurrence wins when several appear.
        assert_eq!(short_ticker(Some("ETHBTC-0930-")), "ETH 0930");
    }

    #[test]
    fn ticker_degrades_to_placeholders() {
        assert_eq!(short_ticker(None), "???");
        assert_eq!(short_ticker(Some("")), "???");
        assert_eq!(short_ticker(Some("XYZ-26FEB")), "??? ");
        assert_eq!(short_ticker(Some("BTC")), "BTC ");
    }

    #[test]
    fn win_rate_guards_the_empty_session() {
        assert_eq!(win_rate(3, 0), "100.0%");
        assert_eq!(win_rate(0, 0), "0%");
        assert_eq!(win_rate(5, 2), "71.4%");
        assert_eq!(win_rate(0, 4), "0.0%");
    }
}
