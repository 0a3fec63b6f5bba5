//! The assembled re-tuner: tuning table plus everything needed to run it.

use std::sync::Arc;

use retune_core::{
    ChannelAllocator, KeyboardMapping, RetuneConfig, Retuner, Scale, TableReport, TuningTable,
};
use retune_midi_io::{InputProducer, MidiHost, OutputSink};

use crate::{Result, RetuneEngineBuilder};

/// Immutable once built. Each [`Retuner`] it hands out shares the same table.
pub struct RetuneEngine {
    config: RetuneConfig,
    scale: Scale,
    mapping: KeyboardMapping,
    table: Arc<TuningTable>,
    report: TableReport,
}

impl RetuneEngine {
    pub fn builder() -> RetuneEngineBuilder {
        RetuneEngineBuilder::default()
    }

    pub(crate) fn new(
        config: RetuneConfig,
        scale: Scale,
        mapping: KeyboardMapping,
        table: TuningTable,
        report: TableReport,
    ) -> Self {
        Self {
            config,
            scale,
            mapping,
            table: Arc::new(table),
            report,
        }
    }

    pub fn config(&self) -> &RetuneConfig {
        &self.config
    }

    pub fn scale(&self) -> &Scale {
        &self.scale
    }

    pub fn mapping(&self) -> &KeyboardMapping {
        &self.mapping
    }

    pub fn table(&self) -> &Arc<TuningTable> {
        &self.table
    }

    /// Per-key diagnostics, printable as the translation table.
    pub fn report(&self) -> &TableReport {
        &self.report
    }

    /// A translator with every enabled channel free.
    pub fn retuner(&self) -> Result<Retuner> {
        let channels = ChannelAllocator::new(self.config.channels())?;
        Ok(Retuner::new(Arc::clone(&self.table), channels))
    }

    /// Runs the translator against `sink`, fed through the returned producer.
    pub fn start_with<S: OutputSink>(&self, sink: S) -> Result<(MidiHost, InputProducer)> {
        let (host, producer) = MidiHost::start(self.retuner()?, sink, &self.config)?;
        Ok((host, producer))
    }

    /// Opens the configured MIDI ports and starts translating.
    #[cfg(feature = "midi-io")]
    pub fn open(&self) -> Result<MidiHost> {
        Ok(MidiHost::open(self.retuner()?, &self.config)?)
    }
}

impl std::fmt::Debug for RetuneEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetuneEngine")
            .field("scale", &self.scale.label())
            .field("degrees", &self.scale.len())
            .field("mapped_keys", &self.table.mapped_count())
            .field("config", &self.config)
            .finish()
    }
}
