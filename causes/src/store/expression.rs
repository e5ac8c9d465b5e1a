use super::{Item, StoreError};
use std::collections::HashSet;

/// Parses `SET a = :x, b = :y` into `(attribute, placeholder)` pairs.
pub fn parse_set_expression(expression: &str) -> Result<Vec<(String, String)>, StoreError> {
    let invalid = |reason: &str| StoreError::InvalidExpression(format!("{reason}: {expression}"));

    let expression = expression.trim();
    let (keyword, assignments) = expression
        .split_once(char::is_whitespace)
        .ok_or_else(|| invalid("missing assignments"))?;
    if !keyword.eq_ignore_ascii_case("SET") {
        return Err(invalid("only SET actions are supported"));
    }

    let mut seen = HashSet::new();
    let mut pairs = Vec::new();
    for assignment in assignments.split(',') {
        let (name, placeholder) = assignment
            .split_once('=')
            .ok_or_else(|| invalid("expected `attribute = :value`"))?;
        let name = name.trim();
        let placeholder = placeholder.trim();

        if !is_attribute_name(name) {
            return Err(invalid("bad attribute name"));
        }
        if !placeholder
            .strip_prefix(':')
            .is_some_and(is_attribute_name)
        {
            return Err(invalid("bad value placeholder"));
        }
        if !seen.insert(name) {
            return Err(invalid("attribute assigned twice"));
        }

        pairs.push((name.to_string(), placeholder.to_string()));
    }

    Ok(pairs)
}

fn is_attribute_name(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Condition {
    AttributeExists(String),
}

impl Condition {
    /// Evaluates the condition against the currently stored item.
    pub fn holds(&self, item: Option<&Item>) -> bool {
        match self {
            Condition::AttributeExists(name) => item.is_some_and(|i| i.contains_key(name)),
        }
    }
}

/// Parses `attribute_exists(name)`, the only condition the upsert sends.
pub fn parse_condition(expression: &str) -> Result<Condition, StoreError> {
    let expression = expression.trim();
    let (function, rest) = expression
        .split_once('(')
        .ok_or_else(|| StoreError::InvalidExpression(expression.to_string()))?;
    let name = rest
        .strip_suffix(')')
        .map(str::trim)
        .filter(|name| is_attribute_name(name))
        .ok_or_else(|| StoreError::InvalidExpression(expression.to_string()))?;

    match function.trim() {
        "attribute_exists" => Ok(Condition::AttributeExists(name.to_string())),
        _ => Err(StoreError::InvalidExpression(expression.to_string())),
    }
}
