// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Keep-predicates applied to parsed records before they are normalized.
//!
//! A filter is written `<field> <operator> <value>`, for example
//! `user_agent !~* ^ELB-HealthChecker`. A record is emitted only if every filter keeps it.

use std::cmp::Ordering;
use std::str::FromStr;

use regex::{Regex, RegexBuilder};

use super::FormatError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Match,
    NotMatch,
    MatchInsensitive,
    NotMatchInsensitive,
}

impl FromStr for Operator {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "==" => Ok(Operator::Eq),
            "!=" => Ok(Operator::Ne),
            ">" => Ok(Operator::Gt),
            ">=" => Ok(Operator::Ge),
            "<" => Ok(Operator::Lt),
            "<=" => Ok(Operator::Le),
            "=~" => Ok(Operator::Match),
            "!~" => Ok(Operator::NotMatch),
            "=~*" => Ok(Operator::MatchInsensitive),
            "!~*" => Ok(Operator::NotMatchInsensitive),
            other => Err(FormatError::InvalidFilter(format!(
                "unknown operator \"{other}\""
            ))),
        }
    }
}

#[derive(Debug, Clone)]
enum Operand {
    Text(String),
    Pattern(Regex),
}

#[derive(Debug, Clone)]
pub struct Filter {
    field: String,
    /// Position of `field` among the format's labels
    index: usize,
    operator: Operator,
    operand: Operand,
}

impl Filter {
    /// Parses `expression` and binds its field against `labels`.
    pub fn parse(expression: &str, labels: &[String]) -> Result<Self, FormatError> {
        let invalid = |reason: &str| FormatError::InvalidFilter(format!("{reason}: \"{expression}\""));

        let mut parts = expression.trim().splitn(3, char::is_whitespace);
        let (Some(field), Some(operator), Some(value)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid("expected <field> <operator> <value>"));
        };
        let value = value.trim();
        if value.is_empty() {
            return Err(invalid("missing value"));
        }

        let index = labels
            .iter()
            .position(|label| label == field)
            .ok_or_else(|| invalid("unknown field"))?;
        let operator = operator.parse::<Operator>()?;

        let operand = match operator {
            Operator::Match | Operator::NotMatch => Operand::Pattern(
                Regex::new(value).map_err(|e| invalid(&format!("bad pattern ({e})")))?,
            ),
            Operator::MatchInsensitive | Operator::NotMatchInsensitive => Operand::Pattern(
                RegexBuilder::new(value)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| invalid(&format!("bad pattern ({e})")))?,
            ),
            _ => Operand::Text(value.to_string()),
        };

        Ok(Filter {
            field: field.to_string(),
            index,
            operator,
            operand,
        })
    }

    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Returns true if the record with these `values` passes the filter.
    #[must_use]
    pub fn keep(&self, values: &[&str]) -> bool {
        let Some(actual) = values.get(self.index) else {
            return false;
        };
        match (&self.operand, self.operator) {
            (Operand::Pattern(re), Operator::Match | Operator::MatchInsensitive) => {
                re.is_match(actual)
            }
            (Operand::Pattern(re), _) => !re.is_match(actual),
            (Operand::Text(expected), Operator::Eq) => actual == expected,
            (Operand::Text(expected), Operator::Ne) => actual != expected,
            (Operand::Text(expected), operator) => {
                let ordering = compare(actual, expected);
                match operator {
                    Operator::Gt => ordering == Ordering::Greater,
                    Operator::Ge => ordering != Ordering::Less,
                    Operator::Lt => ordering == Ordering::Less,
                    _ => ordering != Ordering::Greater,
                }
            }
        }
    }
}

// numeric when both sides are numbers, lexicographic otherwise
fn compare(actual: &str, expected: &str) -> Ordering {
    match (actual.parse::<f64>(), expected.parse::<f64>()) {
        (Ok(a), Ok(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        _ => actual.cmp(expected),
    }
}
