//! Bank extract parsing.
//!
//! Extracts arrive as CSV with columns `date, description, amount,
//! transactionId`. A malformed row is collected as a per-row error and never
//! aborts the rest of the import.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::BankTransaction;

#[derive(Debug, Deserialize)]
struct RawRow {
    date: String,
    description: String,
    amount: String,
    #[serde(rename = "transactionId")]
    transaction_id: String,
}

/// One rejected extract row. `line` is 1-based and counts the header.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RowError {
    pub line: u64,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ParsedExtract {
    pub transactions: Vec<BankTransaction>,
    pub row_errors: Vec<RowError>,
}

pub fn parse_extract(input: &str) -> ParsedExtract {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input.as_bytes());

    let mut parsed = ParsedExtract::default();

    for (index, record) in reader.deserialize::<RawRow>().enumerate() {
        // header occupies line 1
        let line = index as u64 + 2;
        match record {
            Ok(raw) => match parse_row(&raw) {
                Ok(tx) => parsed.transactions.push(tx),
                Err(message) => parsed.row_errors.push(RowError { line, message }),
            },
            Err(e) => parsed.row_errors.push(RowError {
                line,
                message: format!("unreadable row: {}", e),
            }),
        }
    }

    parsed
}

fn parse_row(raw: &RawRow) -> Result<BankTransaction, String> {
    let date = parse_date(&raw.date)?;
    let amount = parse_amount(&raw.amount)?;

    if raw.transaction_id.is_empty() {
        return Err("missing transactionId".to_string());
    }

    Ok(BankTransaction {
        date,
        description: raw.description.clone(),
        amount,
        external_id: raw.transaction_id.clone(),
    })
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    // ISO first; some bank exports use US month-first dates.
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%m/%d/%Y"))
        .map_err(|_| format!("invalid date: {:?}", raw))
}

fn parse_amount(raw: &str) -> Result<BigDecimal, String> {
    let cleaned: String = raw
        .trim_start_matches('$')
        .chars()
        .filter(|ch| *ch != ',')
        .collect();

    let amount: BigDecimal = cleaned
        .parse()
        .map_err(|_| format!("invalid amount: {:?}", raw))?;

    if amount <= BigDecimal::from(0) {
        return Err(format!("amount must be positive: {:?}", raw));
    }

    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "date,description,amount,transactionId\n";

    #[test]
    fn parses_a_clean_extract() {
        let input = format!(
            "{}2025-03-01,ZELLE PAYMENT,150.00,TXN555\n2025-03-02,WIRE IN,89.00,TXN556\n",
            HEADER
        );
        let parsed = parse_extract(&input);

        assert!(parsed.row_errors.is_empty());
        assert_eq!(parsed.transactions.len(), 2);
        assert_eq!(parsed.transactions[0].external_id, "TXN555");
        assert_eq!(parsed.transactions[0].amount, "150.00".parse().unwrap());
        assert_eq!(parsed.transactions[1].description, "WIRE IN");
    }

    #[test]
    fn keeps_extract_order() {
        let input = format!("{}2025-03-02,B,2.00,T2\n2025-03-01,A,1.00,T1\n", HEADER);
        let parsed = parse_extract(&input);
        let ids: Vec<&str> = parsed
            .transactions
            .iter()
            .map(|t| t.external_id.as_str())
            .collect();
        assert_eq!(ids, vec!["T2", "T1"]);
    }

    #[test]
    fn malformed_row_is_collected_not_fatal() {
        let input = format!(
            "{}2025-03-01,OK,10.00,T1\nnot-a-date,BAD,10.00,T2\n2025-03-03,OK,12.00,T3\n",
            HEADER
        );
        let parsed = parse_extract(&input);

        assert_eq!(parsed.transactions.len(), 2);
        assert_eq!(parsed.row_errors.len(), 1);
        assert_eq!(parsed.row_errors[0].line, 3);
        assert!(parsed.row_errors[0].message.contains("invalid date"));
    }

    #[test]
    fn rejects_zero_and_negative_amounts() {
        let input = format!("{}2025-03-01,ZERO,0.00,T1\n2025-03-01,NEG,-5.00,T2\n", HEADER);
        let parsed = parse_extract(&input);

        assert!(parsed.transactions.is_empty());
        assert_eq!(parsed.row_errors.len(), 2);
    }

    #[test]
    fn accepts_us_dates_and_currency_formatting() {
        let input = format!("{}03/01/2025,ZELLE,\"$1,250.00\",T9\n", HEADER);
        let parsed = parse_extract(&input);

        assert!(parsed.row_errors.is_empty());
        assert_eq!(parsed.transactions[0].amount, "1250.00".parse().unwrap());
    }

    #[test]
    fn missing_transaction_id_is_an_error() {
        let input = format!("{}2025-03-01,NO ID,10.00,\n", HEADER);
        let parsed = parse_extract(&input);

        assert_eq!(parsed.row_errors.len(), 1);
        assert!(parsed.row_errors[0].message.contains("transactionId"));
    }

    #[test]
    fn empty_extract_is_fine() {
        let parsed = parse_extract(HEADER);
        assert!(parsed.transactions.is_empty());
        assert!(parsed.row_errors.is_empty());
    }
}
