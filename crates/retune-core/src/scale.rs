//! Scale model: cumulative degree offsets in cents over one formal period.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::math::{floor_div_mod, ratio_to_cents};
use crate::{Error, Result};

/// Largest number of degrees a scale may have.
pub const MAX_DEGREES: usize = 128;

/// One scale degree as written in a scale file.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Degree {
    /// Decimal cents literal, e.g. `701.955`.
    Cents(f64),
    /// Frequency ratio `num/den`, e.g. `3/2`. A bare integer `n` is `n/1`.
    Ratio { num: u64, den: u64 },
}

impl Degree {
    #[inline]
    pub fn cents(&self) -> f64 {
        match *self {
            Degree::Cents(cents) => cents,
            Degree::Ratio { num, den } => ratio_to_cents(num as f64 / den as f64),
        }
    }
}

impl FromStr for Degree {
    type Err = String;

    /// A token containing `.` is cents; otherwise `n/d` or `n`.
    fn from_str(token: &str) -> core::result::Result<Self, Self::Err> {
        let token = token.trim();
        if token.is_empty() {
            return Err("empty degree".to_string());
        }

        if token.contains('.') {
            return token
                .parse::<f64>()
                .ok()
                .filter(|cents| cents.is_finite())
                .map(Degree::Cents)
                .ok_or_else(|| format!("'{}' contains '.' but is not a cents value", token));
        }

        let (num, den) = match token.split_once('/') {
            Some((num, den)) => (num.trim(), den.trim()),
            None => (token, "1"),
        };
        let num: u64 = num
            .parse()
            .map_err(|_| format!("numerator of '{}' is not a positive integer", token))?;
        let den: u64 = den
            .parse()
            .map_err(|_| format!("denominator of '{}' is not a positive integer", token))?;
        if num == 0 || den == 0 {
            return Err(format!("ratio '{}' has a zero term", token));
        }
        Ok(Degree::Ratio { num, den })
    }
}

impl fmt::Display for Degree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Degree::Cents(cents) => write!(f, "{:.5}", cents),
            Degree::Ratio { num, den } => write!(f, "{}/{}", num, den),
        }
    }
}

/// Ordered degree offsets in cents from the tonic; the last degree is the period.
///
/// The tonic itself (0 cents) is implicit: step 0 of every period sits at the
/// period boundary and step `i > 0` at `degrees[i - 1]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    label: String,
    degrees: Vec<f64>,
}

impl Scale {
    /// Validates degree count, finiteness and a positive period.
    pub fn new(label: impl Into<String>, degrees: Vec<f64>) -> Result<Self> {
        let label = label.into();
        if degrees.is_empty() {
            return Err(Error::InvalidScale("scale has no degrees".to_string()));
        }
        if degrees.len() > MAX_DEGREES {
            return Err(Error::InvalidScale(format!(
                "{} degrees exceeds the maximum of {}",
                degrees.len(),
                MAX_DEGREES
            )));
        }
        if let Some(index) = degrees.iter().position(|cents| !cents.is_finite()) {
            return Err(Error::InvalidScale(format!("degree {} is not finite", index + 1)));
        }

        let period = degrees[degrees.len() - 1];
        if period <= 0.0 {
            return Err(Error::InvalidScale(format!(
                "period must be positive, got {} cents",
                period
            )));
        }

        if degrees.windows(2).any(|pair| pair[1] <= pair[0]) {
            tracing::warn!("Scale '{}' degrees are not strictly increasing", label);
        }

        Ok(Self { label, degrees })
    }

    pub fn from_degrees(label: impl Into<String>, degrees: &[Degree]) -> Result<Self> {
        Self::new(label, degrees.iter().map(Degree::cents).collect())
    }

    /// `steps` equal divisions of `period_cents`.
    pub fn equal_temperament(steps: usize, period_cents: f64) -> Result<Self> {
        if steps == 0 {
            return Err(Error::InvalidScale("cannot divide into zero steps".to_string()));
        }
        let degrees = (1..=steps)
            .map(|i| period_cents * i as f64 / steps as f64)
            .collect();
        Self::new(format!("{}-step equal temperament", steps), degrees)
    }

    /// Standard 12-tone equal temperament.
    pub fn twelve_tet() -> Self {
        Self {
            label: "12-tone equal temperament".to_string(),
            degrees: (1..=12).map(|i| 100.0 * i as f64).collect(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Degree count L.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.degrees.len()
    }

    pub fn degrees(&self) -> &[f64] {
        &self.degrees
    }

    /// Formal octave width in cents.
    pub fn period_cents(&self) -> f64 {
        self.degrees[self.degrees.len() - 1]
    }

    /// Cents above the tonic of the pitch `steps` scale steps away from it.
    ///
    /// Negative steps count down through earlier periods with floor semantics.
    pub fn step_cents(&self, steps: i32) -> f64 {
        let (periods, degree) = floor_div_mod(steps, self.degrees.len() as i32);
        let within = match degree {
            0 => 0.0,
            d => self.degrees[d as usize - 1],
        };
        self.period_cents() * periods as f64 + within
    }
}
