//! Condition evaluation collaborator contract and the built-in text
//! evaluator.
//!
//! The core invokes rule conditions only through [`ConditionEvaluator`],
//! located via scope helper lookup. The built-in [`TextConditionEvaluator`]
//! handles one `lhs op rhs` comparison where operands are JSON literals or
//! data-domain field names.

use std::cmp::Ordering;

use serde_json::Value;
use thiserror::Error;

use crate::engine::evaluation::Evaluation;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConditionError {
    #[error("invalid condition '{condition}': {message}")]
    InvalidExpression { condition: String, message: String },

    #[error("unknown field '{field}' in data domain")]
    UnknownField { field: String },

    #[error("cannot order {left} against {right}")]
    UnorderedTypes { left: String, right: String },
}

/// Uniform evaluate contract for rule conditions.
///
/// Implementations that defer must clone whatever they need into the returned
/// future and do their work when it is polled, not when `evaluate` is called.
pub trait ConditionEvaluator {
    fn evaluate(
        &self,
        condition: &str,
        domain: &Value,
    ) -> Evaluation<'static, Result<bool, ConditionError>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Identifier(String),
    Literal(Value),
    Operator(Comparison),
}

/// Built-in single-comparison evaluator. Always immediate.
pub struct TextConditionEvaluator;

impl ConditionEvaluator for TextConditionEvaluator {
    fn evaluate(
        &self,
        condition: &str,
        domain: &Value,
    ) -> Evaluation<'static, Result<bool, ConditionError>> {
        Evaluation::Ready(evaluate_condition(condition, domain))
    }
}

/// Evaluates one comparison against a JSON data domain. An empty condition
/// is vacuously true.
pub fn evaluate_condition(condition: &str, domain: &Value) -> Result<bool, ConditionError> {
    if condition.trim().is_empty() {
        return Ok(true);
    }
    let tokens = tokenize(condition)?;
    let invalid = |message: &str| ConditionError::InvalidExpression {
        condition: condition.to_string(),
        message: message.to_string(),
    };
    let [left, Token::Operator(op), right] = tokens.as_slice() else {
        return Err(invalid("expected exactly 'operand operator operand'"));
    };
    let left = resolve_operand(left, domain, condition)?;
    let right = resolve_operand(right, domain, condition)?;
    compare(&left, &right, *op)
}

fn tokenize(condition: &str) -> Result<Vec<Token>, ConditionError> {
    let mut tokens = Vec::new();
    let mut chars = condition.chars().peekable();
    let invalid = |message: String| ConditionError::InvalidExpression {
        condition: condition.to_string(),
        message,
    };

    while let Some(&ch) = chars.peek() {
        match ch {
            ' ' | '\t' | '\n' | '\r' => {
                chars.next();
            }
            '=' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                }
                tokens.push(Token::Operator(Comparison::Equal));
            }
            '!' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Operator(Comparison::NotEqual));
                } else {
                    return Err(invalid("expected '!=' not '!'".to_string()));
                }
            }
            '<' => {
                chars.next();
                match chars.peek() {
                    Some(&'=') => {
                        chars.next();
                        tokens.push(Token::Operator(Comparison::LessThanOrEqual));
                    }
                    Some(&'>') => {
                        chars.next();
                        tokens.push(Token::Operator(Comparison::NotEqual));
                    }
                    _ => tokens.push(Token::Operator(Comparison::LessThan)),
                }
            }
            '>' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Operator(Comparison::GreaterThanOrEqual));
                } else {
                    tokens.push(Token::Operator(Comparison::GreaterThan));
                }
            }
            '\'' | '"' => {
                let quote = ch;
                chars.next();
                let mut literal = String::new();
                loop {
                    match chars.next() {
                        Some(c) if c == quote => break,
                        Some(c) => literal.push(c),
                        None => return Err(invalid("unterminated string literal".to_string())),
                    }
                }
                tokens.push(Token::Literal(Value::String(literal)));
            }
            c if c.is_ascii_digit() || c == '-' => {
                let mut number = String::new();
                number.push(c);
                chars.next();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_digit() || c == '.' {
                        number.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let parsed: f64 = number
                    .parse()
                    .map_err(|_| invalid(format!("invalid number '{number}'")))?;
                let number = serde_json::Number::from_f64(parsed)
                    .ok_or_else(|| invalid(format!("non-finite number '{parsed}'")))?;
                tokens.push(Token::Literal(Value::Number(number)));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' {
                        ident.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                match ident.as_str() {
                    "true" => tokens.push(Token::Literal(Value::Bool(true))),
                    "false" => tokens.push(Token::Literal(Value::Bool(false))),
                    "null" => tokens.push(Token::Literal(Value::Null)),
                    _ => tokens.push(Token::Identifier(ident)),
                }
            }
            _ => {
                return Err(invalid(format!("unexpected character '{ch}'")));
            }
        }
    }

    Ok(tokens)
}

fn resolve_operand(
    token: &Token,
    domain: &Value,
    condition: &str,
) -> Result<Value, ConditionError> {
    match token {
        Token::Literal(value) => Ok(value.clone()),
        Token::Identifier(field) => domain
            .get(field)
            .cloned()
            .ok_or_else(|| ConditionError::UnknownField {
                field: field.clone(),
            }),
        Token::Operator(_) => Err(ConditionError::InvalidExpression {
            condition: condition.to_string(),
            message: "operator where an operand was expected".to_string(),
        }),
    }
}

fn compare(left: &Value, right: &Value, op: Comparison) -> Result<bool, ConditionError> {
    let ordering = match (left, right) {
        (Value::Number(l), Value::Number(r)) => {
            let l = l.as_f64().unwrap_or(f64::NAN);
            let r = r.as_f64().unwrap_or(f64::NAN);
            l.partial_cmp(&r)
        }
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        _ => None,
    };
    match op {
        Comparison::Equal => Ok(match ordering {
            Some(ordering) => ordering == Ordering::Equal,
            None => left == right,
        }),
        Comparison::NotEqual => Ok(match ordering {
            Some(ordering) => ordering != Ordering::Equal,
            None => left != right,
        }),
        Comparison::LessThan => Ok(require_order(ordering, left, right)? == Ordering::Less),
        Comparison::LessThanOrEqual => {
            Ok(require_order(ordering, left, right)? != Ordering::Greater)
        }
        Comparison::GreaterThan => Ok(require_order(ordering, left, right)? == Ordering::Greater),
        Comparison::GreaterThanOrEqual => {
            Ok(require_order(ordering, left, right)? != Ordering::Less)
        }
    }
}

fn require_order(
    ordering: Option<Ordering>,
    left: &Value,
    right: &Value,
) -> Result<Ordering, ConditionError> {
    ordering.ok_or_else(|| ConditionError::UnorderedTypes {
        left: type_name(left).to_string(),
        right: type_name(right).to_string(),
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_condition_is_true() {
        assert!(evaluate_condition("", &json!({})).unwrap());
        assert!(evaluate_condition("   ", &json!({})).unwrap());
    }

    #[test]
    fn test_numeric_comparisons() {
        let domain = json!({"amount": 25});
        assert!(evaluate_condition("amount > 10", &domain).unwrap());
        assert!(evaluate_condition("amount <= 25", &domain).unwrap());
        assert!(!evaluate_condition("amount < 25", &domain).unwrap());
        assert!(evaluate_condition("amount = 25", &domain).unwrap());
        assert!(evaluate_condition("amount == 25", &domain).unwrap());
        assert!(evaluate_condition("amount != 26", &domain).unwrap());
        assert!(evaluate_condition("amount <> 26", &domain).unwrap());
        assert!(evaluate_condition("-5 < amount", &domain).unwrap());
    }

    #[test]
    fn test_string_comparisons_are_lexical() {
        let domain = json!({"code": "abc"});
        assert!(evaluate_condition("code = 'abc'", &domain).unwrap());
        assert!(evaluate_condition("code < \"abd\"", &domain).unwrap());
        assert!(evaluate_condition("'ab' < 'b'", &domain).unwrap());
    }

    #[test]
    fn test_boolean_and_null_equality_only() {
        let domain = json!({"active": true, "missing": null});
        assert!(evaluate_condition("active = true", &domain).unwrap());
        assert!(evaluate_condition("missing = null", &domain).unwrap());
        assert!(matches!(
            evaluate_condition("active < true", &domain),
            Err(ConditionError::UnorderedTypes { .. })
        ));
    }

    #[test]
    fn test_mixed_types_equal_is_false() {
        let domain = json!({"amount": 5});
        assert!(!evaluate_condition("amount = '5'", &domain).unwrap());
        assert!(evaluate_condition("amount != '5'", &domain).unwrap());
        assert!(matches!(
            evaluate_condition("amount > '5'", &domain),
            Err(ConditionError::UnorderedTypes { .. })
        ));
    }

    #[test]
    fn test_unknown_field() {
        assert_eq!(
            evaluate_condition("5 = test", &json!({})),
            Err(ConditionError::UnknownField {
                field: "test".to_string()
            })
        );
    }

    #[test]
    fn test_invalid_expressions() {
        let domain = json!({"a": 1});
        assert!(matches!(
            evaluate_condition("a =", &domain),
            Err(ConditionError::InvalidExpression { .. })
        ));
        assert!(matches!(
            evaluate_condition("a 1", &domain),
            Err(ConditionError::InvalidExpression { .. })
        ));
        assert!(matches!(
            evaluate_condition("a ! 1", &domain),
            Err(ConditionError::InvalidExpression { .. })
        ));
        assert!(matches!(
            evaluate_condition("a = 'open", &domain),
            Err(ConditionError::InvalidExpression { .. })
        ));
    }

    #[test]
    fn test_evaluator_is_immediate() {
        let evaluation = TextConditionEvaluator.evaluate("1 = 1", &json!({}));
        assert!(evaluation.is_ready());
    }
}
