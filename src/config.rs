use bigdecimal::BigDecimal;
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_url: String,
    pub staff_api_key: String,
    pub notify_gateway_url: String,
    pub staff_channel: String,
    pub reminder_delay_minutes: i64,
    pub reminder_scan_interval_minutes: u64,
    pub duplicate_report_window_minutes: i64,
    pub match_epsilon: BigDecimal,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok(); // Load .env file if present

        Ok(Config {
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            database_url: env::var("DATABASE_URL")?,
            staff_api_key: env::var("STAFF_API_KEY")?,
            notify_gateway_url: env::var("NOTIFY_GATEWAY_URL")?,
            staff_channel: env::var("STAFF_CHANNEL")
                .unwrap_or_else(|_| "billing-ops".to_string()),
            reminder_delay_minutes: env::var("REMINDER_DELAY_MINUTES")
                .unwrap_or_else(|_| "60".to_string())
                .parse()?,
            reminder_scan_interval_minutes: env::var("REMINDER_SCAN_INTERVAL_MINUTES")
                .unwrap_or_else(|_| "15".to_string())
                .parse()?,
            duplicate_report_window_minutes: env::var("DUPLICATE_REPORT_WINDOW_MINUTES")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,
            match_epsilon: parse_epsilon(
                &env::var("MATCH_EPSILON").unwrap_or_else(|_| "0.01".to_string()),
            )?,
        })
    }
}

fn parse_epsilon(raw: &str) -> anyhow::Result<BigDecimal> {
    let value: BigDecimal = raw
        .trim()
        .parse()
        .map_err(|e| anyhow::anyhow!("MATCH_EPSILON is not a decimal: {}", e))?;

    if value < BigDecimal::from(0) {
        anyhow::bail!("MATCH_EPSILON must not be negative");
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epsilon_accepts_plain_decimals() {
        assert_eq!(parse_epsilon("0.01").unwrap(), "0.01".parse().unwrap());
        assert_eq!(parse_epsilon(" 0.05 ").unwrap(), "0.05".parse().unwrap());
        assert_eq!(parse_epsilon("0").unwrap(), BigDecimal::from(0));
    }

    #[test]
    fn epsilon_rejects_garbage_and_negatives() {
        assert!(parse_epsilon("a penny").is_err());
        assert!(parse_epsilon("-0.01").is_err());
    }
}
