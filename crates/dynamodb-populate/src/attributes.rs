//! Conversion of rendered JSON items into DynamoDB attribute maps.
//!
//! Numbers keep the exact text they were rendered with, so integers wider
//! than 64 bits and long decimals reach the table unchanged.

use crate::error::PopulateError;
use aws_sdk_dynamodb::types::AttributeValue;
use item_template::RenderedItem;
use serde_json::{Number, Value};
use std::collections::HashMap;

/// Significant digits a DynamoDB number can hold.
pub const MAX_NUMBER_DIGITS: usize = 38;

/// Convert a rendered item into the attribute map of a `PutRequest`.
pub fn to_attributes(
    item: RenderedItem,
) -> Result<HashMap<String, AttributeValue>, PopulateError> {
    item.into_iter()
        .map(|(name, value)| Ok((name, to_attribute(value)?)))
        .collect()
}

/// Convert one JSON value into a DynamoDB attribute value.
pub fn to_attribute(value: Value) -> Result<AttributeValue, PopulateError> {
    Ok(match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(b),
        Value::Number(n) => AttributeValue::N(number_text(&n)?),
        Value::String(s) => AttributeValue::S(s),
        Value::Array(values) => AttributeValue::L(
            values
                .into_iter()
                .map(to_attribute)
                .collect::<Result<_, _>>()?,
        ),
        Value::Object(map) => AttributeValue::M(to_attributes(map)?),
    })
}

fn number_text(n: &Number) -> Result<String, PopulateError> {
    let text = n.to_string();
    if significant_digits(&text) > MAX_NUMBER_DIGITS {
        return Err(PopulateError::NumberPrecision(text));
    }
    Ok(text)
}

/// Digits of the mantissa without leading or trailing zeros.
fn significant_digits(text: &str) -> usize {
    let mantissa = text.split(['e', 'E']).next().unwrap_or(text);
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    digits.trim_start_matches('0').trim_end_matches('0').len()
}
