//! Typed, range-checked values for the viewer's reactive parameters.

use crate::error::ViewerError;

/// A runtime value held by (or destined for) a registered parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    Number(f64),
}

impl ParamValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Bool(_) => "bool",
            ParamValue::Number(_) => "number",
        }
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Number(value)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum ParamKind {
    Bool,
    /// Inclusive bounds. `step` is a UI granularity hint, not enforced here.
    Number { min: f64, max: f64, step: f64 },
}

impl ParamKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamKind::Bool => "bool",
            ParamKind::Number { .. } => "number",
        }
    }
}

/// Static description of one user-adjustable parameter.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub default: ParamValue,
}

impl ParamSpec {
    /// Checks type and range, leaving any reporting to the caller.
    pub fn validate(&self, value: &ParamValue) -> Result<(), ViewerError> {
        let reason = match (self.kind, value) {
            (ParamKind::Bool, ParamValue::Bool(_)) => return Ok(()),
            (ParamKind::Number { min, max, .. }, ParamValue::Number(v)) => {
                if v.is_finite() && (min..=max).contains(v) {
                    return Ok(());
                }
                format!("{v} is outside [{min}, {max}]")
            }
            _ => format!(
                "expected a {}, got a {}",
                self.kind.type_name(),
                value.type_name()
            ),
        };

        Err(ViewerError::InvalidParameter {
            name: self.name.to_owned(),
            reason,
        })
    }
}
