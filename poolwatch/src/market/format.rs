//! Human-readable renderings of prices, amounts and swap activity.

use ethers::types::{Address, H256};
use serde::Serialize;

use crate::market::types::SwapEvent;

/// Rows shown in an activity listing.
pub const ACTIVITY_LIMIT: usize = 50;

const SCALES: [(f64, &str); 4] = [
    (1_000_000_000_000.0, "T"),
    (1_000_000_000.0, "B"),
    (1_000_000.0, "M"),
    (1_000.0, "K"),
];

/// Compact amount: `1500` → `1.50K`, `2_000_000` → `2M`.
pub fn format_amount(amount: f64) -> String {
    for (threshold, suffix) in SCALES {
        if amount >= threshold {
            let scaled = amount / threshold;
            return if scaled.fract() == 0.0 {
                format!("{scaled}{suffix}")
            } else {
                format!("{scaled:.2}{suffix}")
            };
        }
    }
    format!("{amount}")
}

/// Coarse age of `timestamp` relative to `now`, both unix seconds.
pub fn format_time_ago(timestamp: u64, now: u64) -> String {
    let diff = now.saturating_sub(timestamp);
    match diff {
        d if d < 60 => format!("{d}s ago"),
        d if d < 3_600 => format!("{}m ago", d / 60),
        d if d < 86_400 => format!("{}h ago", d / 3_600),
        d => format!("{}d ago", d / 86_400),
    }
}

/// `0x1234...abcd` form of a hex identifier.
pub fn shorten(hex: &str) -> String {
    if hex.len() <= 10 {
        return hex.to_string();
    }
    format!("{}...{}", &hex[..6], &hex[hex.len() - 4..])
}

pub fn short_address(address: Address) -> String {
    shorten(&format!("{address:#x}"))
}

pub fn short_hash(hash: H256) -> String {
    shorten(&format!("{hash:#x}"))
}

/// Fixed-decimal number with thousands separators.
///
/// Zero prints as `0`; magnitudes below one cent switch to exponent form.
pub fn format_usd(num: f64, decimals: usize) -> String {
    if num == 0.0 {
        return "0".to_string();
    }
    if num.abs() < 0.01 {
        return format!("{num:.2e}");
    }

    let sign = if num < 0.0 { "-" } else { "" };
    let magnitude = num.abs();
    let fixed = format!("{magnitude:.decimals$}");
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

/// One line of the recent-activity table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityRow {
    pub kind: String,
    pub age: String,
    pub amount_usd: String,
    pub sender: String,
    pub tx: String,
}

impl ActivityRow {
    pub fn from_event(event: &SwapEvent, now: u64) -> Self {
        Self {
            kind: event.direction.to_string(),
            age: format_time_ago(event.timestamp, now),
            amount_usd: format!("${}", format_usd(event.usd_volume(), 2)),
            sender: short_address(event.sender),
            tx: short_hash(event.tx_hash),
        }
    }
}

/// The newest `limit` swaps as display rows, in list order.
pub fn activity_rows(events: &[SwapEvent], now: u64, limit: usize) -> Vec<ActivityRow> {
    events
        .iter()
        .take(limit)
        .map(|e| ActivityRow::from_event(e, now))
        .collect()
}

#[cfg(test)]
mod tests {
    use ethers::types::U256;

    use super::*;
    use crate::market::types::Direction;

    #[test]
    fn amounts_pick_the_largest_suffix() {
        assert_eq!(format_amount(999.0), "999");
        assert_eq!(format_amount(1_000.0), "1K");
        assert_eq!(format_amount(1_500.0), "1.50K");
        assert_eq!(format_amount(2_000_000.0), "2M");
        assert_eq!(format_amount(3_250_000_000.0), "3.25B");
        assert_eq!(format_amount(7e12), "7T");
        assert_eq!(format_amount(0.5), "0.5");
    }

    #[test]
    fn age_buckets() {
        let now = 1_000_000;
        assert_eq!(format_time_ago(now - 5, now), "5s ago");
        assert_eq!(format_time_ago(now - 125, now), "2m ago");
        assert_eq!(format_time_ago(now - 7_200, now), "2h ago");
        assert_eq!(format_time_ago(now - 3 * 86_400, now), "3d ago");
        assert_eq!(format_time_ago(now + 10, now), "0s ago");
    }

    #[test]
    fn usd_grouping_and_small_values() {
        assert_eq!(format_usd(0.0, 2), "0");
        assert_eq!(format_usd(0.001234, 2), "1.23e-3");
        assert_eq!(format_usd(12.5, 2), "12.50");
        assert_eq!(format_usd(1_234_567.891, 2), "1,234,567.89");
        assert_eq!(format_usd(999_999.0, 0), "999,999");
        assert_eq!(format_usd(100.0, 2), "100.00");
    }

    #[test]
    fn negative_usd_keeps_sign_outside_grouping() {
        assert_eq!(format_usd(-1234.5, 2), "-1,234.50");
        assert_eq!(format_usd(-123_456.0, 0), "-123,456");
        assert_eq!(format_usd(-0.001, 2), "-1.00e-3");
        assert_eq!(format_usd(-12.5, 2), "-12.50");
    }

    #[test]
    fn identifiers_are_shortened() {
        let addr = Address::from_low_u64_be(0xabcd);
        assert_eq!(short_address(addr), "0x0000...abcd");
        assert_eq!(shorten("0x12"), "0x12");
    }

    #[test]
    fn activity_rows_are_capped_and_keep_order() {
        let now = 2_000_000;
        let events: Vec<SwapEvent> = (0..60u64)
            .map(|i| SwapEvent {
                tx_hash: H256::from_low_u64_be(i + 1),
                block_number: 100 - i,
                log_index: 0,
                timestamp: now - 60 * i,
                sender: Address::from_low_u64_be(0xbeef),
                recipient: Address::zero(),
                amount_base_in: U256::zero(),
                amount_quote_in: U256::zero(),
                amount_base_out: U256::zero(),
                amount_quote_out: U256::zero(),
                usd_in: 1_000.0,
                usd_out: 1_200.5,
                price_per_unit: 2.0,
                direction: if i % 2 == 0 { Direction::Buy } else { Direction::Sell },
            })
            .collect();

        let rows = activity_rows(&events, now, ACTIVITY_LIMIT);
        assert_eq!(rows.len(), 50);
        assert_eq!(rows[0].kind, "BUY");
        assert_eq!(rows[1].kind, "SELL");
        assert_eq!(rows[0].age, "0s ago");
        assert_eq!(rows[1].age, "1m ago");
        assert_eq!(rows[0].amount_usd, "$1,200.50");
        assert_eq!(rows[0].sender, "0x0000...beef");
        assert_eq!(rows[0].tx, "0x0000...0001");
    }
}
