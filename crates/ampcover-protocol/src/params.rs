use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive `min..=max` constraint pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds<T> {
    pub min: T,
    pub max: T,
}

impl<T: PartialOrd + Copy> Bounds<T> {
    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    pub fn is_ordered(&self) -> bool {
        self.min <= self.max
    }

    pub fn contains(&self, value: T) -> bool {
        self.min <= value && value <= self.max
    }
}

impl<T: fmt::Display> fmt::Display for Bounds<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

/// Design constraints handed to the primer engine on every invocation.
///
/// The relaxation methods only ever loosen a constraint; nothing in the run
/// tightens one again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignParameters {
    pub primer_len: Bounds<usize>,
    pub amplicon_size: Bounds<usize>,
    /// Percent GC.
    pub gc: Bounds<f64>,
    /// Melting temperature in °C.
    pub tm: Bounds<f64>,
    pub tm_step: f64,
    pub pool_size: Bounds<usize>,
    /// Bases of flank an amplicon must extend past a target base to count
    /// it as covered.
    pub pad: u64,
}

impl Default for DesignParameters {
    fn default() -> Self {
        Self {
            primer_len: Bounds::new(18, 26),
            amplicon_size: Bounds::new(160, 240),
            gc: Bounds::new(40.0, 60.0),
            tm: Bounds::new(58.0, 62.0),
            tm_step: 0.5,
            pool_size: Bounds::new(2, 40),
            pad: 10,
        }
    }
}

impl DesignParameters {
    /// Minimum pool size for a pool to count as multiplexable.
    pub fn pool_min(&self) -> usize {
        self.pool_size.min
    }

    pub fn widen_amplicon(&mut self, incr: usize) {
        self.amplicon_size.max = self.amplicon_size.max.saturating_add(incr);
        self.amplicon_size.min = self.amplicon_size.min.saturating_sub(incr);
    }

    pub fn widen_tm(&mut self, incr: f64) {
        self.tm.max += incr;
        self.tm.min -= incr;
    }

    pub fn double_tm_step(&mut self) {
        self.tm_step += self.tm_step;
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.primer_len.is_ordered() {
            return Err(format!("primer length bounds {} are inverted", self.primer_len));
        }
        if self.primer_len.min == 0 {
            return Err("primer length minimum must be > 0".to_string());
        }
        if !self.amplicon_size.is_ordered() {
            return Err(format!(
                "amplicon size bounds {} are inverted",
                self.amplicon_size
            ));
        }
        if !self.gc.is_ordered() {
            return Err(format!("GC bounds {} are inverted", self.gc));
        }
        if !self.tm.is_ordered() {
            return Err(format!("Tm bounds {} are inverted", self.tm));
        }
        if self.tm_step.is_nan() || self.tm_step <= 0.0 {
            return Err(format!("Tm step must be > 0, got {}", self.tm_step));
        }
        if !self.pool_size.is_ordered() {
            return Err(format!("pool size bounds {} are inverted", self.pool_size));
        }
        if self.pool_size.min == 0 {
            return Err("pool size minimum must be >= 1".to_string());
        }
        Ok(())
    }
}
