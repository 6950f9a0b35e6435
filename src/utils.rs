use near_sdk::env;

/// Denominator for all parts-per-million arithmetic.
pub const MILLION: u128 = 1_000_000;

// Helper for consistent logging
pub fn log_event(event: &str, fields: &[(&str, String)]) {
    let body = fields
        .iter()
        .map(|(key, value)| format!("{}='{}'", key, value))
        .collect::<Vec<_>>()
        .join(", ");
    env::log_str(&format!("{}: {}", event, body));
}

/// `amount * ppm / 1e6` in integer math.
pub fn ppm_of(amount: u128, ppm: u128) -> u128 {
    amount * ppm / MILLION
}

pub fn pow10(decimals: u8) -> u128 {
    10u128.pow(decimals as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ppm_of_rounds_down() {
        assert_eq!(ppm_of(100_000_000, 20_000), 2_000_000);
        assert_eq!(ppm_of(1, 999_999), 0);
        assert_eq!(ppm_of(MILLION, MILLION), MILLION);
    }

    #[test]
    fn pow10_covers_token_decimals() {
        assert_eq!(pow10(0), 1);
        assert_eq!(pow10(6), 1_000_000);
        assert_eq!(pow10(8), 100_000_000);
        assert_eq!(pow10(18), 1_000_000_000_000_000_000);
    }
}
