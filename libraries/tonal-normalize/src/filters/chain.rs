//! Linear filter chain between a buffer source and a buffer sink

use super::buffer::BufferSource;
use super::registry::FilterRegistry;
use super::{AudioFilter, StageDescriptor, StreamSpec};
use crate::error::Result;
use std::collections::VecDeque;
use tonal_media::{Frame, MediaError, Receive};
use tracing::{debug, info};

/// One named filter instance of a chain
struct Instance {
    label: &'static str,
    filter: Box<dyn AudioFilter>,
}

/// Chain of filters processed in order
///
/// Built once from a list of [`StageDescriptor`]s and driven push/pull:
/// [`FilterChain::send_frame`] pushes a frame (or `None` for end of stream)
/// and [`FilterChain::receive_frame`] pulls whatever reached the sink.
pub struct FilterChain {
    instances: Vec<Instance>,
    output_spec: StreamSpec,
    output: VecDeque<Frame>,
    flushed: bool,
}

impl FilterChain {
    /// Build a chain for frames shaped like `input` from the built-in filters
    pub fn build(input: StreamSpec, stages: &[StageDescriptor]) -> Result<Self> {
        Self::build_with(&FilterRegistry::with_builtin_filters(), input, stages)
    }

    /// Build a chain resolving filter names through `registry`
    pub fn build_with(
        registry: &FilterRegistry,
        input: StreamSpec,
        stages: &[StageDescriptor],
    ) -> Result<Self> {
        let mut instances = Vec::with_capacity(stages.len() + 2);
        let source = registry.create("abuffer", &BufferSource::options_for(&input), &input)?;
        let mut spec = source.output_spec();
        instances.push(Instance {
            label: "in",
            filter: source,
        });

        for stage in stages {
            let name = stage.filter_name();
            let options = stage.options();
            info!("Applying {} filter", name);
            debug!("{} options: {}", name, options);
            let filter = registry.create(name, &options, &spec)?;
            spec = filter.output_spec();
            instances.push(Instance {
                label: name,
                filter,
            });
        }

        let sink = registry.create("abuffersink", "", &spec)?;
        instances.push(Instance {
            label: "out",
            filter: sink,
        });

        Ok(Self {
            instances,
            output_spec: spec,
            output: VecDeque::new(),
            flushed: false,
        })
    }

    /// Push a frame into the chain; `None` signals end of stream and flushes
    /// every stage in order.
    pub fn send_frame(&mut self, frame: Option<Frame>) -> Result<()> {
        if self.flushed {
            return match frame {
                None => Ok(()),
                Some(_) => Err(MediaError::new("filter frame", "chain already flushed").into()),
            };
        }
        match frame {
            Some(frame) => self.push_through(0, VecDeque::from([frame])),
            None => {
                for index in 0..self.instances.len() {
                    let mut tail = VecDeque::new();
                    self.instances[index].filter.flush(&mut tail)?;
                    self.push_through(index + 1, tail)?;
                }
                self.flushed = true;
                Ok(())
            }
        }
    }

    /// Pull the next frame that reached the sink
    pub fn receive_frame(&mut self) -> Receive<Frame> {
        match self.output.pop_front() {
            Some(frame) => Receive::Ready(frame),
            None if self.flushed => Receive::EndOfStream,
            None => Receive::NotReady,
        }
    }

    /// Read a numeric property of the instance labelled `label`.
    ///
    /// `Ok(None)` if there is no such instance or it has no such property.
    pub fn property(&self, label: &str, key: &str) -> Result<Option<f64>> {
        match self.instances.iter().find(|instance| instance.label == label) {
            Some(instance) => instance.filter.property(key),
            None => Ok(None),
        }
    }

    /// Shape of the frames leaving the chain
    pub fn output_spec(&self) -> StreamSpec {
        self.output_spec
    }

    /// Instance labels from source to sink
    pub fn labels(&self) -> Vec<&'static str> {
        self.instances.iter().map(|instance| instance.label).collect()
    }

    fn push_through(&mut self, start: usize, mut frames: VecDeque<Frame>) -> Result<()> {
        for instance in self.instances.iter_mut().skip(start) {
            if frames.is_empty() {
                return Ok(());
            }
            let mut next = VecDeque::with_capacity(frames.len());
            for frame in frames {
                instance.filter.filter_frame(frame, &mut next)?;
            }
            frames = next;
        }
        self.output.extend(frames);
        Ok(())
    }
}
