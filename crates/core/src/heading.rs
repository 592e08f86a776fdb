//! Compass buckets for vehicle icon selection.

use serde::Serialize;
use strum::{Display, EnumIter, IntoStaticStr};

/// Eight-way compass label. Each label owns a 45° arc centered on its angle.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr, Serialize,
)]
pub enum Compass {
    #[default]
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl Compass {
    /// Canonical angle of the bucket center
    pub fn degrees(&self) -> f64 {
        match self {
            Compass::N => 0.0,
            Compass::NE => 45.0,
            Compass::E => 90.0,
            Compass::SE => 135.0,
            Compass::S => 180.0,
            Compass::SW => 225.0,
            Compass::W => 270.0,
            Compass::NW => 315.0,
        }
    }
}

/// Fold any bearing into `[0, 360)`. Non-finite input folds to 0.
pub fn normalize_degrees(bearing: f64) -> f64 {
    if !bearing.is_finite() {
        return 0.0;
    }

    (bearing % 360.0 + 360.0) % 360.0
}

/// Map a bearing in degrees to its compass bucket.
///
/// Bucket edges sit 22.5° off each compass point and belong to the upper
/// bucket: 22.5 is NE, 67.5 is E, 337.5 is N.
pub fn bearing_to_compass(bearing: f64) -> Compass {
    let b = normalize_degrees(bearing);

    if b < 22.5 {
        Compass::N
    } else if b < 67.5 {
        Compass::NE
    } else if b < 112.5 {
        Compass::E
    } else if b < 157.5 {
        Compass::SE
    } else if b < 202.5 {
        Compass::S
    } else if b < 247.5 {
        Compass::SW
    } else if b < 292.5 {
        Compass::W
    } else if b < 337.5 {
        Compass::NW
    } else {
        Compass::N
    }
}
