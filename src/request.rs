//! Brightness request expressions.
//!
//! A request is written as `[prefix][number][suffix]`. The prefix selects
//! how the number is applied: `+` and `-` make it relative to the current
//! level, `=` (or no prefix) makes it absolute. The suffix selects the
//! unit: `%` (or no suffix) means percentage of the output's range, `=`
//! means the property's native units.

use anyhow::{Context, Result, anyhow};
use regex::Regex;

/// Pattern a brightness expression must match: optional `+`/`-`/`=` prefix,
/// digits and dots, optional `%`/`=` suffix.
const NUMBER_LIKE_PATTERN: &str = r"^([-+=])?([0-9.]+)[%=]?$";

/// A fully parsed brightness change request.
///
/// `value` keeps the sign of the expression, so a `-` prefix yields a
/// negative relative value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrightnessRequest {
    /// Requested amount, in percent or native units depending on `percent`.
    pub value: f64,
    /// Whether `value` is added to the current level.
    pub relative: bool,
    /// Whether `value` is a percentage rather than native units.
    pub percent: bool,
}

impl BrightnessRequest {
    /// Parse a brightness expression such as `30`, `+5`, `-10%`, `=50` or
    /// `200=`.
    pub fn parse(expr: &str) -> Result<Self> {
        let re = Regex::new(NUMBER_LIKE_PATTERN)?;
        let caps = re
            .captures(expr)
            .ok_or_else(|| anyhow!("not a brightness expression: {expr:?}"))?;
        let relative = matches!(caps.get(1).map(|m| m.as_str()), Some("+") | Some("-"));

        // The `=` prefix only marks the request as explicitly absolute;
        // `+`/`-` stay on the number and keep its sign.
        let mut body = expr.strip_prefix('=').unwrap_or(expr);
        let mut percent = true;
        if let Some(rest) = body.strip_suffix('%') {
            body = rest;
        } else if let Some(rest) = body.strip_suffix('=') {
            body = rest;
            percent = false;
        }
        let value: f64 = body
            .parse()
            .with_context(|| format!("invalid number in brightness expression: {expr:?}"))?;

        Ok(Self {
            value,
            relative,
            percent,
        })
    }
}

/// Check whether `expr` would parse as a brightness expression.
///
/// With `allow_prefix` false, expressions carrying a `+`/`-`/`=` prefix are
/// rejected; the `-set`/`-inc`/`-dec` flags take bare numbers.
pub fn is_number_like(expr: &str, allow_prefix: bool) -> bool {
    let Ok(re) = Regex::new(NUMBER_LIKE_PATTERN) else {
        return false;
    };
    let Some(caps) = re.captures(expr) else {
        return false;
    };
    if !allow_prefix && caps.get(1).is_some() {
        return false;
    }
    caps.get(2)
        .is_some_and(|m| m.as_str().parse::<f64>().is_ok())
}
