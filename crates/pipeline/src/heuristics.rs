//! Heuristic field extraction
//!
//! Independent regex rules over the raw document text. Each rule covers a
//! disjoint set of fields, applies its patterns in a fixed order (first
//! match wins) and shares no state with the others. A matched, parseable
//! value overrides the model prediction for that field; anything that fails
//! to parse leaves the field untouched rather than defaulting it. No rule
//! exists for `after_fee`, so it is never overridden.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

const AMOUNT: &str = r"[0-9][0-9,]*(?:\.[0-9]+)?";

// Labeled primary amount: "Wire Amount (USD): 1,250.50"
static WIRE_AMOUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i:wire amount)\s*\(([A-Z]{{3}})\)\s*:?\s*({AMOUNT})"
    ))
    .unwrap()
});

// Phrase-order alternate: "1,250.50 USD Transfer amount"
static TRANSFER_AMOUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"({AMOUNT})\s*([A-Z]{{3}})\s+(?i:transfer amount)"
    ))
    .unwrap()
});

// Any later amount+currency pair, candidate for the converted amount
static AMOUNT_PAIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"({AMOUNT})\s*([A-Z]{{3}})\b")).unwrap());

// "1 USD = 0.91 EUR" (the rate is the right-hand amount)
static RATE_EQUATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"({AMOUNT})\s*[A-Z]{{3}}\s*=\s*({AMOUNT})\s*[A-Z]{{3}}"
    ))
    .unwrap()
});

// "Exchange Rate: 0.91"
static RATE_LABELED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i:exchange rate)\s*:?\s*({AMOUNT})")).unwrap()
});

// "Wire Fee (USD): 25.00"
static WIRE_FEE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i:wire fee)\s*\(([A-Z]{{3}})\)\s*:?\s*({AMOUNT})"
    ))
    .unwrap()
});

// "25.00 USD Transfer fee"
static TRANSFER_FEE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"({AMOUNT})\s*([A-Z]{{3}})\s+(?i:transfer fee)")).unwrap()
});

// "Wire Date: 8/2/2023"
static WIRE_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i:wire date)\s*:?\s*([0-9]{1,2})/([0-9]{1,2})/([0-9]{2,4})").unwrap()
});

/// Partial field map produced by the heuristic rules
///
/// Every field is independent; `None` means the rules found nothing usable
/// and the model prediction stands.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeuristicFields {
    pub amount_before: Option<f64>,
    pub from_currency: Option<String>,
    pub amount_converted: Option<f64>,
    pub to_currency: Option<String>,
    pub exchange_rate: Option<f64>,
    pub fee: Option<f64>,
    pub fee_currency: Option<String>,
    pub date: Option<NaiveDate>,
}

/// Run every rule over the raw text.
pub fn scan(text: &str) -> HeuristicFields {
    let mut fields = HeuristicFields::default();
    scan_amounts(text, &mut fields);
    scan_exchange_rate(text, &mut fields);
    scan_fee(text, &mut fields);
    scan_date(text, &mut fields);
    fields
}

/// Parse a heuristic amount, stripping thousands separators.
///
/// Returns `None` when the string still fails to parse; the field is then
/// omitted, never defaulted to zero.
pub fn parse_amount(raw: &str) -> Option<f64> {
    raw.replace(',', "").parse::<f64>().ok()
}

/// Primary amount+currency pair, and optionally a second distinct pair
/// later in the text which is treated as the converted amount/currency.
fn scan_amounts(text: &str, fields: &mut HeuristicFields) {
    let primary = WIRE_AMOUNT
        .captures(text)
        .and_then(|c| {
            let amount = parse_amount(&c[2])?;
            Some((amount, c[1].to_string(), c.get(0).unwrap().end()))
        })
        .or_else(|| {
            TRANSFER_AMOUNT.captures(text).and_then(|c| {
                let amount = parse_amount(&c[1])?;
                Some((amount, c[2].to_string(), c.get(0).unwrap().end()))
            })
        });

    let Some((amount, currency, end)) = primary else {
        return;
    };

    fields.amount_before = Some(amount);
    fields.from_currency = Some(currency.clone());

    let rest = &text[end..];
    for captures in AMOUNT_PAIR.captures_iter(rest) {
        let Some(pair_amount) = parse_amount(&captures[1]) else {
            continue;
        };
        let pair_currency = &captures[2];

        // Pairs flanking an '=' belong to the exchange-rate equation.
        let whole = captures.get(0).unwrap();
        if next_significant_char(rest, whole.end()) == Some('=')
            || prev_significant_char(rest, whole.start()) == Some('=')
        {
            continue;
        }

        // The phrase-order fee pair is not a converted amount.
        if TRANSFER_FEE
            .captures(rest)
            .is_some_and(|fee| fee.get(0).unwrap().start() == whole.start())
        {
            continue;
        }

        if pair_amount != amount || pair_currency != currency {
            fields.amount_converted = Some(pair_amount);
            fields.to_currency = Some(pair_currency.to_string());
            break;
        }
    }
}

fn next_significant_char(text: &str, from: usize) -> Option<char> {
    text[from..].chars().find(|c| !c.is_whitespace())
}

fn prev_significant_char(text: &str, to: usize) -> Option<char> {
    text[..to].chars().rev().find(|c| !c.is_whitespace())
}

/// Exchange rate: equation form first, labeled form second.
fn scan_exchange_rate(text: &str, fields: &mut HeuristicFields) {
    if let Some(captures) = RATE_EQUATION.captures(text) {
        if let Some(rate) = parse_amount(&captures[2]) {
            fields.exchange_rate = Some(rate);
            return;
        }
    }

    if let Some(captures) = RATE_LABELED.captures(text) {
        fields.exchange_rate = parse_amount(&captures[1]);
    }
}

/// Wire fee: labeled form first, phrase-order alternate second.
fn scan_fee(text: &str, fields: &mut HeuristicFields) {
    if let Some(captures) = WIRE_FEE.captures(text) {
        if let Some(fee) = parse_amount(&captures[2]) {
            fields.fee = Some(fee);
            fields.fee_currency = Some(captures[1].to_string());
            return;
        }
    }

    if let Some(captures) = TRANSFER_FEE.captures(text) {
        if let Some(fee) = parse_amount(&captures[1]) {
            fields.fee = Some(fee);
            fields.fee_currency = Some(captures[2].to_string());
        }
    }
}

/// Labeled wire date, normalized to a calendar date.
///
/// Source documents inconsistently order day and month, so the slashed
/// value is interpreted day-first, then month-first, accepting the first
/// format that parses. Two-digit years land in the 2000s. If neither
/// interpretation parses the date is omitted, not guessed.
fn scan_date(text: &str, fields: &mut HeuristicFields) {
    let Some(captures) = WIRE_DATE.captures(text) else {
        return;
    };

    // Captures are digit-only and within u32/i32 range by construction.
    let first: u32 = captures[1].parse().unwrap_or(0);
    let second: u32 = captures[2].parse().unwrap_or(0);
    let mut year: i32 = captures[3].parse().unwrap_or(0);
    if year < 100 {
        year += 2000;
    }

    fields.date = NaiveDate::from_ymd_opt(year, second, first)
        .or_else(|| NaiveDate::from_ymd_opt(year, first, second));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labeled_wire_amount() {
        let fields = scan("Wire Amount (USD): 1,250.50");
        assert_eq!(fields.amount_before, Some(1250.50));
        assert_eq!(fields.from_currency.as_deref(), Some("USD"));
        assert_eq!(fields.amount_converted, None);
        assert_eq!(fields.to_currency, None);
    }

    #[test]
    fn test_phrase_order_transfer_amount() {
        let fields = scan("1,250.50 USD Transfer amount initiated");
        assert_eq!(fields.amount_before, Some(1250.50));
        assert_eq!(fields.from_currency.as_deref(), Some("USD"));
    }

    #[test]
    fn test_second_pair_is_converted_amount() {
        let fields = scan("Wire Amount (USD): 1,250.50\nCredited: 1,140.00 EUR to beneficiary");
        assert_eq!(fields.amount_before, Some(1250.50));
        assert_eq!(fields.from_currency.as_deref(), Some("USD"));
        assert_eq!(fields.amount_converted, Some(1140.00));
        assert_eq!(fields.to_currency.as_deref(), Some("EUR"));
    }

    #[test]
    fn test_repeated_identical_pair_is_not_converted() {
        let fields = scan("Wire Amount (USD): 1,250.50\nTotal: 1,250.50 USD");
        assert_eq!(fields.amount_converted, None);
        assert_eq!(fields.to_currency, None);
    }

    #[test]
    fn test_equation_pairs_not_taken_as_converted() {
        let fields = scan("Wire Amount (USD): 1,250.50\n1 USD = 0.91 EUR");
        assert_eq!(fields.amount_converted, None);
        assert_eq!(fields.exchange_rate, Some(0.91));
    }

    #[test]
    fn test_exchange_rate_equation_takes_right_hand_side() {
        let fields = scan("Rate applied: 1.00 USD = 0.9123 EUR");
        assert_eq!(fields.exchange_rate, Some(0.9123));
    }

    #[test]
    fn test_exchange_rate_labeled() {
        let fields = scan("Exchange Rate: 1.0845");
        assert_eq!(fields.exchange_rate, Some(1.0845));
    }

    #[test]
    fn test_equation_preferred_over_label() {
        let fields = scan("Exchange Rate: 99.0\n1 USD = 0.91 EUR");
        assert_eq!(fields.exchange_rate, Some(0.91));
    }

    #[test]
    fn test_labeled_wire_fee() {
        let fields = scan("Wire Fee (GBP): 25.00");
        assert_eq!(fields.fee, Some(25.0));
        assert_eq!(fields.fee_currency.as_deref(), Some("GBP"));
    }

    #[test]
    fn test_phrase_order_transfer_fee() {
        let fields = scan("A charge of 15.00 USD Transfer fee applies");
        assert_eq!(fields.fee, Some(15.0));
        assert_eq!(fields.fee_currency.as_deref(), Some("USD"));
    }

    #[test]
    fn test_fee_pair_not_mistaken_for_converted_amount() {
        let fields = scan("Wire Amount (USD): 1,250.50\n15.00 USD Transfer fee");
        assert_eq!(fields.fee, Some(15.0));
        assert_eq!(fields.amount_converted, None);
    }

    #[test]
    fn test_date_day_first() {
        let fields = scan("Wire Date: 8/2/2023");
        assert_eq!(fields.date, NaiveDate::from_ymd_opt(2023, 2, 8));
    }

    #[test]
    fn test_date_month_first_fallback() {
        // 25 cannot be a month, so day-first fails and month-first wins
        let fields = scan("Wire Date: 2/25/2023");
        assert_eq!(fields.date, NaiveDate::from_ymd_opt(2023, 2, 25));
    }

    #[test]
    fn test_date_unparseable_is_omitted() {
        let fields = scan("Wire Date: 13/25/2023");
        assert_eq!(fields.date, None);
    }

    #[test]
    fn test_date_two_digit_year() {
        let fields = scan("Wire Date: 8/2/23");
        assert_eq!(fields.date, NaiveDate::from_ymd_opt(2023, 2, 8));
    }

    #[test]
    fn test_parse_amount_strips_separators() {
        assert_eq!(parse_amount("12,345.67"), Some(12345.67));
        assert_eq!(parse_amount("1250"), Some(1250.0));
        assert_eq!(parse_amount("abc"), None);
    }

    #[test]
    fn test_no_matches_leaves_everything_unset() {
        let fields = scan("Dear customer, thank you for banking with us.");
        assert_eq!(fields, HeuristicFields::default());
    }

    #[test]
    fn test_rules_are_independent() {
        // A fee and a date with no amount anywhere
        let fields = scan("Wire Fee (USD): 25.00\nWire Date: 8/2/2023");
        assert_eq!(fields.amount_before, None);
        assert_eq!(fields.fee, Some(25.0));
        assert!(fields.date.is_some());
    }
}
