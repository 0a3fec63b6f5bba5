//! Tuning table builder.
//!
//! Runs once at startup. The finished [`TuningTable`] is immutable and is the only
//! state the real-time translator shares with the rest of the program.

use core::fmt;

use retune_midi::{PitchBend, KEY_COUNT};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::mapping::KeyboardMapping;
use crate::math::{cents_to_ratio, ratio_to_cents, ReferencePitches};
use crate::scale::Scale;
use crate::{Error, Result};

/// Slack on the bend range check, so a bend of exactly the range is accepted.
const RANGE_EPSILON: f64 = 1e-6;

/// Retuning for one input key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TuningEntry {
    /// The key produces no output.
    #[default]
    Unmapped,
    /// Play `output_key` on a channel bent by `bend`.
    Mapped { output_key: u8, bend: PitchBend },
}

impl TuningEntry {
    #[inline]
    pub fn is_mapped(&self) -> bool {
        matches!(self, TuningEntry::Mapped { .. })
    }

    #[inline]
    pub fn output_key(&self) -> Option<u8> {
        match *self {
            TuningEntry::Mapped { output_key, .. } => Some(output_key),
            TuningEntry::Unmapped => None,
        }
    }

    #[inline]
    pub fn bend(&self) -> Option<PitchBend> {
        match *self {
            TuningEntry::Mapped { bend, .. } => Some(bend),
            TuningEntry::Unmapped => None,
        }
    }
}

/// 128 entries indexed by input key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TuningTable {
    entries: [TuningEntry; KEY_COUNT],
}

impl TuningTable {
    /// Builds the table for `scale` under `mapping` with a ±`pitch_range_cents` bend.
    pub fn build(
        scale: &Scale,
        mapping: &KeyboardMapping,
        pitch_range_cents: f64,
    ) -> Result<Self> {
        TableBuilder::new(scale, mapping, pitch_range_cents)?.build()
    }

    /// Every key plays itself without bend.
    pub fn identity() -> Self {
        Self {
            entries: std::array::from_fn(|key| TuningEntry::Mapped {
                output_key: key as u8,
                bend: PitchBend::CENTER,
            }),
        }
    }

    /// Entry for `key`; the high bit of a data byte is ignored.
    #[inline]
    pub fn entry(&self, key: u8) -> TuningEntry {
        self.entries[(key & 0x7F) as usize]
    }

    #[inline]
    pub fn entries(&self) -> &[TuningEntry; KEY_COUNT] {
        &self.entries
    }

    pub fn mapped_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_mapped()).count()
    }
}

/// Diagnostics for one input key.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct KeyReport {
    pub key: u8,
    /// Key in scale space, `None` when the mapping silences the key.
    pub mapped_key: Option<u8>,
    pub target_hz: Option<f64>,
    pub entry: TuningEntry,
    /// Bend applied on top of the output key's 12-TET pitch.
    pub cents_offset: Option<f64>,
}

/// One [`KeyReport`] per key, printable as the translation table.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TableReport {
    rows: Vec<KeyReport>,
}

impl TableReport {
    pub fn rows(&self) -> &[KeyReport] {
        &self.rows
    }

    pub fn row(&self, key: u8) -> Option<&KeyReport> {
        self.rows.get(key as usize)
    }
}

impl fmt::Display for TableReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reference = ReferencePitches::equal_tempered();
        writeln!(
            f,
            "key  map   12tet Hz     target Hz  out  lsb  msb   bend    cents"
        )?;
        for row in &self.rows {
            write!(f, "{:>3}  ", row.key)?;
            match row.mapped_key {
                Some(mapped) => write!(f, "{:>3}", mapped)?,
                None => write!(f, "---")?,
            }
            write!(f, "  {:>10.4}  ", reference.freq(row.key))?;
            match row.target_hz {
                Some(target) => write!(f, "{:>12.4}", target)?,
                None => write!(f, "{:>12}", "---")?,
            }
            match (row.entry, row.cents_offset) {
                (TuningEntry::Mapped { output_key, bend }, Some(cents)) => writeln!(
                    f,
                    "  {:>3}  {:>3}  {:>3}  {:>5}  {:>7.3}",
                    output_key,
                    bend.lsb(),
                    bend.msb(),
                    bend.value(),
                    cents
                )?,
                _ => writeln!(f, "  ---  ---  ---    ---      ---")?,
            }
        }
        Ok(())
    }
}

/// Combines a scale and a keyboard mapping into a [`TuningTable`].
#[derive(Debug)]
pub struct TableBuilder<'a> {
    scale: &'a Scale,
    mapping: &'a KeyboardMapping,
    pitch_range_cents: f64,
    reference: ReferencePitches,
    /// Frequency of scale degree 0 at `middle_key`.
    anchor_hz: f64,
}

impl<'a> TableBuilder<'a> {
    pub fn new(
        scale: &'a Scale,
        mapping: &'a KeyboardMapping,
        pitch_range_cents: f64,
    ) -> Result<Self> {
        mapping.validate()?;
        if !(pitch_range_cents.is_finite() && pitch_range_cents > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "pitch_range_cents must be positive, got {}",
                pitch_range_cents
            )));
        }
        let reference_steps = mapping.reference_key as i32 - mapping.middle_key as i32;
        let anchor_hz =
            mapping.reference_freq_hz / cents_to_ratio(scale.step_cents(reference_steps));
        Ok(Self {
            scale,
            mapping,
            pitch_range_cents,
            reference: ReferencePitches::equal_tempered(),
            anchor_hz,
        })
    }

    /// Frequency of a key in scale space.
    ///
    /// Degree 0 sits on the middle key, tuned so that the reference key sounds at the
    /// reference frequency.
    pub fn target_frequency(&self, scale_key: u8) -> f64 {
        let steps = scale_key as i32 - self.mapping.middle_key as i32;
        self.anchor_hz * cents_to_ratio(self.scale.step_cents(steps))
    }

    /// Frequency given to scale degree 0 at the middle key.
    pub fn anchor_frequency(&self) -> f64 {
        self.anchor_hz
    }

    pub fn build(&self) -> Result<TuningTable> {
        self.build_with_report().map(|(table, _)| table)
    }

    pub fn build_with_report(&self) -> Result<(TuningTable, TableReport)> {
        let mut entries = [TuningEntry::Unmapped; KEY_COUNT];
        let mut rows = Vec::with_capacity(KEY_COUNT);
        let mut unreachable = 0usize;

        for key in 0..KEY_COUNT as u8 {
            let row = self.resolve(key)?;
            if row.target_hz.is_some() && !row.entry.is_mapped() {
                unreachable += 1;
            }
            entries[key as usize] = row.entry;
            rows.push(row);
        }

        let table = TuningTable { entries };
        if unreachable > 0 {
            warn!(
                "{} keys have target pitches outside the 12-TET range and stay silent",
                unreachable
            );
        }
        debug!(
            "Built tuning table for '{}': {} of {} keys mapped",
            self.scale.label(),
            table.mapped_count(),
            KEY_COUNT
        );
        Ok((table, TableReport { rows }))
    }

    fn resolve(&self, key: u8) -> Result<KeyReport> {
        let mut row = KeyReport {
            key,
            mapped_key: None,
            target_hz: None,
            entry: TuningEntry::Unmapped,
            cents_offset: None,
        };

        let Some(mapped_key) = self.mapping.map_key(key) else {
            return Ok(row);
        };
        row.mapped_key = Some(mapped_key);

        let target_hz = self.target_frequency(mapped_key);
        row.target_hz = Some(target_hz);

        let Some(output_key) = self.reference.find_key(target_hz) else {
            return Ok(row);
        };

        // Within the tolerance of a grid pitch the offset can be a hair below zero
        let cents = ratio_to_cents(target_hz / self.reference.freq(output_key));
        if cents.abs() > self.pitch_range_cents + RANGE_EPSILON {
            return Err(Error::PitchBendOutOfRange {
                key,
                cents,
                range: self.pitch_range_cents,
            });
        }

        row.cents_offset = Some(cents);
        row.entry = TuningEntry::Mapped {
            output_key,
            bend: PitchBend::from_cents(cents, self.pitch_range_cents),
        };
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::Degree;
    use approx::assert_relative_eq;

    fn fifths() -> Scale {
        Scale::from_degrees(
            "fifths",
            &[
                Degree::Ratio { num: 1, den: 1 },
                Degree::Ratio { num: 3, den: 2 },
                Degree::Ratio { num: 2, den: 1 },
            ],
        )
        .unwrap()
    }

    fn fifths_table() -> TuningTable {
        let scale = fifths();
        TuningTable::build(&scale, &KeyboardMapping::linear(scale.len()), 200.0).unwrap()
    }

    fn mapped(output_key: u8, bend: u16) -> TuningEntry {
        TuningEntry::Mapped {
            output_key,
            bend: PitchBend::new(bend).unwrap(),
        }
    }

    #[test]
    fn test_twelve_tet_is_identity() {
        let table =
            TuningTable::build(&Scale::twelve_tet(), &KeyboardMapping::default(), 200.0).unwrap();
        assert_eq!(table, TuningTable::identity());
        assert_eq!(table.mapped_count(), 128);
    }

    #[test]
    fn test_fifths_reference_key() {
        let table = fifths_table();
        assert_eq!(table.entry(69), mapped(69, 8192));
        // Step 1 of the scale is the implicit tonic, so 70 sounds like 69
        assert_eq!(table.entry(70), mapped(69, 8192));
    }

    #[test]
    fn test_fifths_bent_keys() {
        let table = fifths_table();
        // 660 Hz is 1.955 cents above E5
        let entry = table.entry(71);
        assert_eq!(entry, mapped(76, 8272));
        let bend = entry.bend().unwrap();
        assert_eq!(bend.lsb(), 80);
        assert_eq!(bend.msb(), 64);

        assert_eq!(table.entry(72), mapped(81, 8192));
        assert_eq!(table.entry(68), mapped(64, 8272));
        assert_eq!(table.entry(76), mapped(93, 8192));
    }

    #[test]
    fn test_target_frequency() {
        let scale = fifths();
        let mapping = KeyboardMapping::linear(scale.len());
        let builder = TableBuilder::new(&scale, &mapping, 200.0).unwrap();
        assert_relative_eq!(builder.target_frequency(69), 440.0, epsilon = 1e-9);
        assert_relative_eq!(builder.target_frequency(71), 660.0, epsilon = 1e-9);
        assert_relative_eq!(builder.target_frequency(72), 880.0, epsilon = 1e-9);
        assert_relative_eq!(builder.target_frequency(68), 330.0, epsilon = 1e-9);
    }

    /// Just major scale, 9/8 up to 2/1.
    fn just_major() -> Scale {
        Scale::from_degrees(
            "Just major",
            &[
                Degree::Ratio { num: 9, den: 8 },
                Degree::Ratio { num: 5, den: 4 },
                Degree::Ratio { num: 4, den: 3 },
                Degree::Ratio { num: 3, den: 2 },
                Degree::Ratio { num: 5, den: 3 },
                Degree::Ratio { num: 15, den: 8 },
                Degree::Ratio { num: 2, den: 1 },
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_degree_zero_sits_on_middle_key() {
        // 69 - 60 = 9 keys is one period plus two degrees of a 7-note scale
        let scale = just_major();
        let mapping = KeyboardMapping::linear(scale.len());
        let builder = TableBuilder::new(&scale, &mapping, 200.0).unwrap();

        assert_relative_eq!(builder.anchor_frequency(), 176.0, epsilon = 1e-9);
        assert_relative_eq!(builder.target_frequency(60), 176.0, epsilon = 1e-9);
        assert_relative_eq!(builder.target_frequency(69), 440.0, epsilon = 1e-9);
        assert_relative_eq!(builder.target_frequency(61), 198.0, epsilon = 1e-9);
        assert_relative_eq!(builder.target_frequency(67), 352.0, epsilon = 1e-9);
        assert_relative_eq!(builder.target_frequency(53), 88.0, epsilon = 1e-9);

        // The reference key resolves to A4 with no bend
        let table = builder.build().unwrap();
        assert_eq!(table.entry(69), mapped(69, 8192));
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(fifths_table(), fifths_table());
    }

    #[test]
    fn test_unreachable_keys_are_unmapped() {
        // Wide steps push both ends of the keyboard off the 12-TET grid
        let scale = fifths();
        let table =
            TuningTable::build(&scale, &KeyboardMapping::linear(scale.len()), 200.0).unwrap();
        // Key 0 is 23 periods below the reference
        assert_eq!(table.entry(0), TuningEntry::Unmapped);
        assert_eq!(table.entry(127), TuningEntry::Unmapped);
        assert!(table.mapped_count() < 128);
    }

    #[test]
    fn test_silent_mapping_positions() {
        let mapping = KeyboardMapping {
            offsets: vec![
                Some(0),
                None,
                Some(2),
                None,
                Some(4),
                Some(5),
                None,
                Some(7),
                None,
                Some(9),
                None,
                Some(11),
            ],
            ..KeyboardMapping::default()
        };
        let table = TuningTable::build(&Scale::twelve_tet(), &mapping, 200.0).unwrap();
        assert_eq!(table.entry(60), mapped(60, 8192));
        assert_eq!(table.entry(61), TuningEntry::Unmapped);
        assert_eq!(table.entry(59), mapped(59, 8192));
        assert_eq!(table.entry(58), TuningEntry::Unmapped);
    }

    #[test]
    fn test_bend_out_of_range() {
        let scale = Scale::equal_temperament(7, 1200.0).unwrap();
        let mapping = KeyboardMapping::linear(scale.len());
        // One 7-EDO step above A4 is 71.4 cents above A#4
        match TuningTable::build(&scale, &mapping, 50.0) {
            Err(Error::PitchBendOutOfRange { cents, range, .. }) => {
                assert!(cents > 50.0);
                assert_eq!(range, 50.0);
            }
            other => panic!("Expected PitchBendOutOfRange, got {:?}", other),
        }
        assert!(TuningTable::build(&scale, &mapping, 100.0).is_ok());
    }

    #[test]
    fn test_invalid_range() {
        let scale = Scale::twelve_tet();
        let mapping = KeyboardMapping::default();
        assert!(TuningTable::build(&scale, &mapping, 0.0).is_err());
        assert!(TuningTable::build(&scale, &mapping, f64::NAN).is_err());
    }

    #[test]
    fn test_report() {
        let scale = fifths();
        let mapping = KeyboardMapping::linear(scale.len());
        let (table, report) = TableBuilder::new(&scale, &mapping, 200.0)
            .unwrap()
            .build_with_report()
            .unwrap();
        assert_eq!(report.rows().len(), 128);

        let row = report.row(71).unwrap();
        assert_eq!(row.mapped_key, Some(71));
        assert_eq!(row.entry, table.entry(71));
        assert_relative_eq!(row.target_hz.unwrap(), 660.0, epsilon = 1e-9);
        assert_relative_eq!(row.cents_offset.unwrap(), 1.955, epsilon = 1e-3);

        let text = report.to_string();
        assert_eq!(text.lines().count(), 129);
        assert!(text.lines().nth(72).unwrap().starts_with(" 71   71"));
    }
}
