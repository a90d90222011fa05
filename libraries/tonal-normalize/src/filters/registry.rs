//! Filter Registry - Factory Pattern for Chain Stages
//!
//! Maps filter names to constructors taking a parsed option string and the
//! shape of the stage's input, so the chain builder never names concrete
//! filter types.

use super::buffer::{BufferSink, BufferSource};
use super::delay::Delay;
use super::format::FormatConverter;
use super::limiter::Limiter;
use super::meter::Meter;
use super::options::FilterOptions;
use super::trim::Trim;
use super::volume::Volume;
use super::{AudioFilter, StreamSpec};
use crate::error::Result;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use tonal_media::MediaError;

/// Constructor of one filter type
pub type CreateFn =
    Arc<dyn Fn(&mut FilterOptions, &StreamSpec) -> Result<Box<dyn AudioFilter>> + Send + Sync>;

/// Factory for a specific filter type
#[derive(Clone)]
pub struct FilterFactory {
    /// Filter name used in chain descriptions
    pub name: &'static str,
    /// Human-readable summary
    pub description: &'static str,
    /// Build an instance from options and the input stream shape
    pub create: CreateFn,
}

impl Debug for FilterFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterFactory")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}

/// Registry of available filter types
#[derive(Debug, Default, Clone)]
pub struct FilterRegistry {
    factories: HashMap<&'static str, FilterFactory>,
}

impl FilterRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Create a registry with all built-in filters registered
    pub fn with_builtin_filters() -> Self {
        let mut registry = Self::new();
        registry.register_builtin_filters();
        registry
    }

    /// Register a new filter factory
    pub fn register(&mut self, factory: FilterFactory) {
        self.factories.insert(factory.name, factory);
    }

    pub fn get_factory(&self, name: &str) -> Option<&FilterFactory> {
        self.factories.get(name)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// All registered filter names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Instantiate `name` configured by `options` for frames shaped like `input`.
    ///
    /// Fails when the filter is unknown, an option value is malformed, or an
    /// option is not understood by the filter.
    pub fn create(
        &self,
        name: &str,
        options: &str,
        input: &StreamSpec,
    ) -> Result<Box<dyn AudioFilter>> {
        let factory = self.factories.get(name).ok_or_else(|| {
            MediaError::new("find filter", format!("no filter named '{}'", name))
        })?;
        let mut opts = FilterOptions::parse(name, options)?;
        let filter = (factory.create)(&mut opts, input)?;
        opts.ensure_consumed()?;
        Ok(filter)
    }

    fn register_builtin_filters(&mut self) {
        self.register(factory(
            "abuffer",
            "Chain input with a declared stream shape",
            |opts, _| Ok(Box::new(BufferSource::from_options(opts)?)),
        ));
        self.register(factory("abuffersink", "Chain output", |_, input| {
            Ok(Box::new(BufferSink::new(*input)))
        }));
        self.register(factory(
            "adelay",
            "Pad silence before the first sample",
            |opts, input| Ok(Box::new(Delay::from_options(opts, input)?)),
        ));
        self.register(factory("atrim", "Drop leading audio", |opts, input| {
            Ok(Box::new(Trim::from_options(opts, input)?))
        }));
        self.register(factory("volume", "Uniform gain", |opts, input| {
            Ok(Box::new(Volume::from_options(opts, input)?))
        }));
        self.register(factory(
            "alimiter",
            "Lookahead peak limiter",
            |opts, input| Ok(Box::new(Limiter::from_options(opts, input)?)),
        ));
        self.register(factory(
            "aformat",
            "Channel remix, resampling and requantization",
            |opts, input| Ok(Box::new(FormatConverter::from_options(opts, input)?)),
        ));
        self.register(factory(
            "ebur128",
            "Integrated loudness and peak meter",
            |opts, input| Ok(Box::new(Meter::from_options(opts, input)?)),
        ));
    }
}

pub(crate) fn factory<F>(name: &'static str, description: &'static str, create: F) -> FilterFactory
where
    F: Fn(&mut FilterOptions, &StreamSpec) -> Result<Box<dyn AudioFilter>> + Send + Sync + 'static,
{
    FilterFactory {
        name,
        description,
        create: Arc::new(create),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonal_media::{SampleFormat, TimeBase};

    fn spec() -> StreamSpec {
        StreamSpec {
            sample_rate: 48000,
            channels: 2,
            sample_format: SampleFormat::S16,
            time_base: TimeBase::from_rate(48000),
        }
    }

    #[test]
    fn test_registry_builtin_filters() {
        let registry = FilterRegistry::with_builtin_filters();
        assert_eq!(
            registry.names(),
            vec![
                "abuffer",
                "abuffersink",
                "adelay",
                "aformat",
                "alimiter",
                "atrim",
                "ebur128",
                "volume"
            ]
        );
        assert!(!registry.is_registered("equalizer"));
    }

    #[test]
    fn test_create_by_name() {
        let registry = FilterRegistry::with_builtin_filters();
        let filter = registry.create("volume", "volume=-6dB", &spec()).unwrap();
        assert_eq!(filter.name(), "volume");
        assert_eq!(filter.output_spec().sample_format, SampleFormat::F32Planar);
    }

    #[test]
    fn test_unknown_filter() {
        let registry = FilterRegistry::with_builtin_filters();
        let err = registry
            .create("equalizer", "", &spec())
            .err()
            .expect("equalizer is not registered");
        assert!(err.to_string().contains("find filter"));
    }

    #[test]
    fn test_unknown_option() {
        let registry = FilterRegistry::with_builtin_filters();
        let err = registry
            .create("volume", "volume=1:precision=fixed", &spec())
            .err()
            .expect("precision is not a volume option");
        assert!(err.to_string().contains("precision"));
    }

    #[test]
    fn test_factory_debug_omits_closure() {
        let registry = FilterRegistry::with_builtin_filters();
        let factory = registry.get_factory("atrim").unwrap();
        let text = format!("{:?}", factory);
        assert!(text.contains("atrim"));
    }
}
