//! Extraction fields and the result record

use serde::{Deserialize, Serialize};

/// Maximum number of characters of document text carried in the result.
pub const RAW_TEXT_LIMIT: usize = 1000;

/// The eight predicted fields.
///
/// Five are numeric (regression models), three are categorical currency
/// codes (classification models decoded through a label encoder).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldName {
    AmountBefore,
    FromCurrency,
    ToCurrency,
    ExchangeRate,
    Fee,
    FeeCurrency,
    AmountConverted,
    AfterFee,
}

impl FieldName {
    /// All fields, in result-record order.
    pub const ALL: [FieldName; 8] = [
        FieldName::AmountBefore,
        FieldName::FromCurrency,
        FieldName::ToCurrency,
        FieldName::ExchangeRate,
        FieldName::Fee,
        FieldName::FeeCurrency,
        FieldName::AmountConverted,
        FieldName::AfterFee,
    ];

    /// The categorical fields decoded through a label encoder.
    pub const CATEGORICAL: [FieldName; 3] = [
        FieldName::FromCurrency,
        FieldName::ToCurrency,
        FieldName::FeeCurrency,
    ];

    /// Wire/artifact key for this field (`amount_before`, ...).
    pub fn key(&self) -> &'static str {
        match self {
            FieldName::AmountBefore => "amount_before",
            FieldName::FromCurrency => "from_currency",
            FieldName::ToCurrency => "to_currency",
            FieldName::ExchangeRate => "exchange_rate",
            FieldName::Fee => "fee",
            FieldName::FeeCurrency => "fee_currency",
            FieldName::AmountConverted => "amount_converted",
            FieldName::AfterFee => "after_fee",
        }
    }

    /// File name of the trained model for this field in the artifact dir.
    pub fn model_file(&self) -> String {
        format!("{}_model.onnx", self.key())
    }

    /// True for fields whose raw prediction is a class index.
    pub fn is_categorical(&self) -> bool {
        FieldName::CATEGORICAL.contains(self)
    }
}

impl std::fmt::Display for FieldName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Structured result for one document.
///
/// Created fresh per request and never mutated after return. Numeric fields
/// are decimal numbers, currency fields uppercase 3-letter codes (empty
/// string when the classifier produced an index the encoder does not know).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub amount_before: f64,
    pub from_currency: String,
    pub to_currency: String,
    pub exchange_rate: f64,
    pub fee: f64,
    pub fee_currency: String,
    pub amount_converted: f64,
    pub after_fee: f64,
    /// ISO `YYYY-MM-DD`; present only when a date pattern matched and parsed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// First [`RAW_TEXT_LIMIT`] characters of the document text.
    pub raw_text: String,
}

/// Truncate document text for the result record.
///
/// Text longer than [`RAW_TEXT_LIMIT`] characters is cut at that many
/// characters and suffixed with `"..."`; shorter text passes through
/// unchanged. Counts characters, not bytes, so multibyte text never splits
/// inside a code point.
pub fn truncate_raw_text(text: &str) -> String {
    match text.char_indices().nth(RAW_TEXT_LIMIT) {
        None => text.to_string(),
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
    }
}
