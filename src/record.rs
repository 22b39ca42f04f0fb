//! The structured product record and the labeled-field parser.
//!
//! The completion reply is free text; the model is relied on to answer with
//! `<Label>: value` lines. Parsing is a case-insensitive search for each
//! label followed by a colon, capturing the remainder of that line. The
//! first occurrence wins; later repeats of the same label are ignored.
//!
//! One [`Field`] enum plus one compiled pattern per label keeps the
//! contract (case-insensitive, colon required, first match) in a single
//! place instead of four ad hoc lookups.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// The four labeled fields the extraction prompt asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    ProductName,
    Price,
    Color,
    Nature,
}

fn field_pattern(label: &str) -> Regex {
    // `\s*` may cross a line break when the rest of the label's line is
    // empty; `(.*)` then captures the next line.
    Regex::new(&format!(r"(?i){}:\s*(.*)", regex::escape(label))).unwrap()
}

static RE_PRODUCT_NAME: Lazy<Regex> = Lazy::new(|| field_pattern("Product Name"));
static RE_PRICE: Lazy<Regex> = Lazy::new(|| field_pattern("Price"));
static RE_COLOR: Lazy<Regex> = Lazy::new(|| field_pattern("Color"));
static RE_NATURE: Lazy<Regex> = Lazy::new(|| field_pattern("Nature"));

impl Field {
    /// The label as it appears in the reply, e.g. `Product Name`.
    pub fn label(self) -> &'static str {
        match self {
            Field::ProductName => "Product Name",
            Field::Price => "Price",
            Field::Color => "Color",
            Field::Nature => "Nature",
        }
    }

    fn pattern(self) -> &'static Regex {
        match self {
            Field::ProductName => &RE_PRODUCT_NAME,
            Field::Price => &RE_PRICE,
            Field::Color => &RE_COLOR,
            Field::Nature => &RE_NATURE,
        }
    }

    /// Extract this field's value from a completion reply.
    ///
    /// Returns `None` iff `<label>:` does not appear in the reply
    /// (case-insensitive). Deterministic; no side effects.
    pub fn value_in(self, reply: &str) -> Option<String> {
        self.pattern()
            .captures(reply)
            .map(|caps| caps[1].to_string())
    }
}

/// The final structured record for one submission.
///
/// Every field is nullable: the model may omit any of them and parsing
/// never fails. Serialises with the camelCase names downstream consumers
/// expect (`productName`, `price`, `color`, `nature`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub product_name: Option<String>,
    pub price: Option<String>,
    pub color: Option<String>,
    pub nature: Option<String>,
}

impl ProductRecord {
    /// Parse all four fields out of a completion reply.
    pub fn from_reply(reply: &str) -> Self {
        Self {
            product_name: Field::ProductName.value_in(reply),
            price: Field::Price.value_in(reply),
            color: Field::Color.value_in(reply),
            nature: Field::Nature.value_in(reply),
        }
    }
}
