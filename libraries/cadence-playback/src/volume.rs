//! Output volume
//!
//! Linear gain in 0.0-1.0, the unit a media element's `volume` expects.

/// Clamped linear volume
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Volume {
    level: f64,
}

impl Volume {
    /// Create a volume, clamping `level` into 0.0-1.0
    pub fn new(level: f64) -> Self {
        Self {
            level: Self::clamp(level),
        }
    }

    /// Set volume level, clamping into 0.0-1.0
    pub fn set_level(&mut self, level: f64) {
        self.level = Self::clamp(level);
    }

    /// Current volume level (0.0-1.0)
    pub fn level(&self) -> f64 {
        self.level
    }

    /// Volume as a whole percentage, for display
    pub fn percent(&self) -> u8 {
        (self.level * 100.0).round() as u8
    }

    /// NaN maps to silence
    fn clamp(level: f64) -> f64 {
        if level.is_nan() {
            0.0
        } else {
            level.clamp(0.0, 1.0)
        }
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(0.7)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_volume_level_clamps() {
        let mut vol = Volume::new(0.5);
        assert_eq!(vol.level(), 0.5);

        vol.set_level(-1.0);
        assert_eq!(vol.level(), 0.0);

        vol.set_level(5.0);
        assert_eq!(vol.level(), 1.0);

        vol.set_level(f64::NAN);
        assert_eq!(vol.level(), 0.0);

        vol.set_level(f64::INFINITY);
        assert_eq!(vol.level(), 1.0);
    }

    #[test]
    fn percent_rounds() {
        assert_eq!(Volume::new(0.7).percent(), 70);
        assert_eq!(Volume::new(0.333).percent(), 33);
        assert_eq!(Volume::default().percent(), 70);
    }
}
