//! Builder for configuring and constructing a `RetuneEngine`.

use std::path::PathBuf;

use retune_core::{
    read_kbm_file, read_scl_file, ChannelAllocator, KeyboardMapping, RetuneConfig, Scale,
    TableBuilder,
};
use tracing::{debug, info};

use crate::{Result, RetuneEngine};

enum Source<T> {
    Value(T),
    File(PathBuf),
}

/// Without a scale the engine uses 12-tone equal temperament; without a mapping it
/// maps one key per scale degree with A4 (key 69) at 440 Hz.
///
/// # Example
///
/// ```ignore
/// use retune::prelude::*;
///
/// let engine = RetuneEngine::builder()
///     .scale_file("fifths.scl")
///     .pitch_range(200.0)
///     .build()?;
///
/// println!("{}", engine.report());
/// ```
#[derive(Default)]
pub struct RetuneEngineBuilder {
    config: RetuneConfig,
    scale: Option<Source<Scale>>,
    mapping: Option<Source<KeyboardMapping>>,
}

impl RetuneEngineBuilder {
    /// Replaces the whole configuration.
    pub fn config(mut self, config: RetuneConfig) -> Self {
        self.config = config;
        self
    }

    pub fn scale(mut self, scale: Scale) -> Self {
        self.scale = Some(Source::Value(scale));
        self
    }

    /// Scala `.scl` file, read during [`build`](Self::build).
    pub fn scale_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.scale = Some(Source::File(path.into()));
        self
    }

    pub fn mapping(mut self, mapping: KeyboardMapping) -> Self {
        self.mapping = Some(Source::Value(mapping));
        self
    }

    /// Scala `.kbm` file, read during [`build`](Self::build).
    pub fn mapping_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.mapping = Some(Source::File(path.into()));
        self
    }

    /// Pitch-bend half range of the receiver in cents.
    pub fn pitch_range(mut self, cents: f64) -> Self {
        self.config.pitch_range_cents = cents;
        self
    }

    pub fn channel_mask(mut self, mask: u16) -> Self {
        self.config.channel_mask = mask;
        self
    }

    /// Loads the inputs and builds the tuning table. Every startup error surfaces here.
    pub fn build(self) -> Result<RetuneEngine> {
        self.config.validate()?;
        // Rejects an empty mask before anything is opened
        ChannelAllocator::new(self.config.channels())?;

        let scale = match self.scale {
            Some(Source::Value(scale)) => scale,
            Some(Source::File(path)) => {
                let scale = read_scl_file(&path)?;
                info!(
                    "Loaded scale '{}' ({} degrees) from {}",
                    scale.label(),
                    scale.len(),
                    path.display()
                );
                scale
            }
            None => Scale::twelve_tet(),
        };

        let mapping = match self.mapping {
            Some(Source::Value(mapping)) => mapping,
            Some(Source::File(path)) => {
                let mapping = read_kbm_file(&path)?;
                info!(
                    "Loaded keyboard mapping ({} keys per period) from {}",
                    mapping.period_size,
                    path.display()
                );
                mapping
            }
            None => KeyboardMapping::linear(scale.len()),
        };

        let (table, report) =
            TableBuilder::new(&scale, &mapping, self.config.pitch_range_cents)?
                .build_with_report()?;
        debug!(
            "Tuning table ready: {} keys mapped, ±{} cent bend range",
            table.mapped_count(),
            self.config.pitch_range_cents
        );

        Ok(RetuneEngine::new(self.config, scale, mapping, table, report))
    }
}
