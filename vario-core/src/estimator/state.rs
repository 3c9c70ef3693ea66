//! Filter state and covariance storage

use crate::{constants::estimator::INITIAL_VARIANCE, time::Timestamp};

/// State vector index: altitude
pub const ALTITUDE: usize = 0;
/// State vector index: vertical speed
pub const VERTICAL_SPEED: usize = 1;
/// State vector index: bias
pub const BIAS: usize = 2;

/// 3×3 symmetric covariance over (altitude, vertical speed, bias)
///
/// Entries are only ever written in mirrored pairs, so `P[i][j]` and
/// `P[j][i]` come from the same expression and are bit-identical.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Covariance([[f64; 3]; 3]);

impl Covariance {
    /// Diagonal covariance with `variance` on every component
    pub fn diagonal_of(variance: f64) -> Self {
        let mut p = [[0.0; 3]; 3];
        for (i, row) in p.iter_mut().enumerate() {
            row[i] = variance;
        }
        Self(p)
    }

    /// Build from the upper triangle, mirroring into the lower one
    pub(crate) fn from_upper(p00: f64, p01: f64, p02: f64, p11: f64, p12: f64, p22: f64) -> Self {
        Self([
            [p00, p01, p02],
            [p01, p11, p12],
            [p02, p12, p22],
        ])
    }

    /// Build from an arbitrary matrix by averaging mirrored entries
    pub(crate) fn symmetrized(m: &[[f64; 3]; 3]) -> Self {
        let avg = |i: usize, j: usize| 0.5 * (m[i][j] + m[j][i]);
        Self::from_upper(m[0][0], avg(0, 1), avg(0, 2), m[1][1], avg(1, 2), m[2][2])
    }

    /// Entry at row `i`, column `j`
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.0[i][j]
    }

    /// Raw matrix
    pub fn as_array(&self) -> &[[f64; 3]; 3] {
        &self.0
    }

    /// Variances (altitude, vertical speed, bias)
    pub fn diagonal(&self) -> [f64; 3] {
        [self.0[0][0], self.0[1][1], self.0[2][2]]
    }

    /// Sum of variances
    pub fn trace(&self) -> f64 {
        self.0[0][0] + self.0[1][1] + self.0[2][2]
    }

    /// Whether mirrored entries agree within `tolerance`
    pub fn is_symmetric(&self, tolerance: f64) -> bool {
        (0..3).all(|i| (0..3).all(|j| libm::fabs(self.0[i][j] - self.0[j][i]) <= tolerance))
    }

    /// Whether every entry is a finite number
    pub fn is_finite(&self) -> bool {
        self.0.iter().flatten().all(|v| v.is_finite())
    }

    /// Clamp negative variances to zero and keep each correlation within ±1
    ///
    /// Returns true when anything had to be adjusted.
    pub(crate) fn condition(&mut self) -> bool {
        let mut adjusted = false;

        for i in 0..3 {
            if self.0[i][i] < 0.0 {
                self.0[i][i] = 0.0;
                adjusted = true;
            }
        }

        for i in 0..3 {
            for j in (i + 1)..3 {
                let bound = libm::sqrt(self.0[i][i] * self.0[j][j]);
                let value = self.0[i][j];
                if libm::fabs(value) > bound {
                    let clamped = value.clamp(-bound, bound);
                    self.0[i][j] = clamped;
                    self.0[j][i] = clamped;
                    adjusted = true;
                }
            }
        }

        adjusted
    }
}

impl Default for Covariance {
    fn default() -> Self {
        Self::diagonal_of(INITIAL_VARIANCE)
    }
}

/// Everything the estimator knows about the vertical channel
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FilterState {
    /// Best estimate of altitude (m)
    pub altitude: f64,
    /// Best estimate of rate of altitude change (m/s)
    pub vertical_speed: f64,
    /// Sensor offset added to true altitude in each raw reading (m)
    pub bias: f64,
    /// Joint uncertainty over the three components
    pub covariance: Covariance,
    /// Time of the previous predict/update cycle, `None` while cold
    pub last_update: Option<Timestamp>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            altitude: 0.0,
            vertical_speed: 0.0,
            bias: 0.0,
            covariance: Covariance::default(),
            last_update: None,
        }
    }
}

impl FilterState {
    /// State vector (altitude, vertical speed, bias)
    pub fn vector(&self) -> [f64; 3] {
        [self.altitude, self.vertical_speed, self.bias]
    }

    /// The quantity the barometer observes: altitude plus bias
    pub fn observed_altitude(&self) -> f64 {
        self.altitude + self.bias
    }

    /// Whether a previous cycle has been recorded
    pub fn is_warm(&self) -> bool {
        self.last_update.is_some()
    }
}
