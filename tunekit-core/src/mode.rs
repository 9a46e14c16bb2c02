//! Target selection for tuning-table mode.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TunerError};
use crate::tuning::{TuningTable, TuningTarget};

/// Whether the tuner follows the played string or a pinned one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum TargetMode {
    /// Nearest target by frequency, re-evaluated every frame.
    #[default]
    Auto,
    /// Always measure against the target at `index`.
    Manual { index: usize },
}

impl TargetMode {
    /// Pins a target after checking it exists in the table.
    pub fn manual(table: Option<&TuningTable>, index: usize) -> Result<Self> {
        let table = table.ok_or(TunerError::NoTuningTable)?;
        if index >= table.len() {
            return Err(TunerError::TargetOutOfRange {
                index,
                len: table.len(),
            });
        }
        Ok(TargetMode::Manual { index })
    }

    /// Picks the target a frequency should be measured against.
    ///
    /// # Returns
    /// * `Some((index, target))` - Selected target
    /// * `None` - Manual index no longer exists in the table
    pub fn select<'a>(&self, table: &'a TuningTable, freq: f32) -> Option<(usize, &'a TuningTarget)> {
        match *self {
            TargetMode::Auto => table.nearest(freq),
            TargetMode::Manual { index } => table.get(index).map(|target| (index, target)),
        }
    }

    pub fn is_manual(&self) -> bool {
        matches!(self, TargetMode::Manual { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning;

    #[test]
    fn auto_follows_the_nearest_string() {
        let guitar = tuning::preset("guitar-standard").unwrap();
        let mode = TargetMode::Auto;
        assert_eq!(mode.select(&guitar, 108.0).unwrap().1.label, "A2");
        assert_eq!(mode.select(&guitar, 200.0).unwrap().1.label, "G3");
    }

    #[test]
    fn manual_ignores_proximity() {
        let guitar = tuning::preset("guitar-standard").unwrap();
        let mode = TargetMode::manual(Some(&guitar), 5).unwrap();
        assert_eq!(mode.select(&guitar, 82.0).unwrap(), (5, &guitar.targets[5]));
    }

    #[test]
    fn manual_requires_valid_index_and_table() {
        let guitar = tuning::preset("guitar-standard").unwrap();
        assert!(matches!(
            TargetMode::manual(Some(&guitar), 6),
            Err(TunerError::TargetOutOfRange { index: 6, len: 6 })
        ));
        assert!(matches!(
            TargetMode::manual(None, 0),
            Err(TunerError::NoTuningTable)
        ));
    }
}
