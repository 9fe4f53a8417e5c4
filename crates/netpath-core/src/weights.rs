//! Scoring coefficients sent with every path query.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Trade-off between latency, load and security used by the backend's path search.
///
/// Values are forwarded raw; any normalization (e.g. sum-to-1) is the backend's
/// business.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightVector {
    pub latency: f64,
    pub load: f64,
    pub security: f64,
}

impl Default for WeightVector {
    fn default() -> Self {
        Self {
            latency: 0.4,
            load: 0.4,
            security: 0.2,
        }
    }
}

impl WeightVector {
    pub fn new(latency: f64, load: f64, security: f64) -> Self {
        Self {
            latency,
            load,
            security,
        }
    }

    /// True iff every coefficient is a finite, non-negative number.
    pub fn validate(&self) -> bool {
        self.components()
            .iter()
            .all(|(_, v)| v.is_finite() && *v >= 0.0)
    }

    /// Like [`validate`](Self::validate), but names the offending coefficient.
    pub fn check(&self) -> Result<()> {
        for (name, value) in self.components() {
            if !value.is_finite() {
                return Err(Error::Validation(format!(
                    "weight '{}' must be a finite number, got {}",
                    name, value
                )));
            }
            if value < 0.0 {
                return Err(Error::Validation(format!(
                    "weight '{}' must be non-negative, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// Parse `latency load security` from user-entered tokens.
    pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Result<Self> {
        if tokens.len() != 3 {
            return Err(Error::Validation(format!(
                "expected 3 weights (latency load security), got {}",
                tokens.len()
            )));
        }
        let mut values = [0.0f64; 3];
        for (slot, token) in values.iter_mut().zip(tokens) {
            let token = token.as_ref();
            *slot = token
                .parse()
                .map_err(|_| Error::Validation(format!("'{}' is not a number", token)))?;
        }
        Ok(Self::new(values[0], values[1], values[2]))
    }

    fn components(&self) -> [(&'static str, f64); 3] {
        [
            ("latency", self.latency),
            ("load", self.load),
            ("security", self.security),
        ]
    }
}
