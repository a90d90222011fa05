//! Output format conversion: channel remix, resampling, requantization
//!
//! Channels are remixed first so the resampler only runs over the output
//! channel count. Surround inputs are laid out by channel count:
//!
//! | channels | layout                        |
//! |----------|-------------------------------|
//! | 3        | FL FR FC                      |
//! | 4        | FL FR FC BC                   |
//! | 5        | FL FR FC SL SR                |
//! | 6        | FL FR FC LFE SL SR            |
//! | 7        | FL FR FC LFE BC SL SR         |
//! | 8        | FL FR FC LFE BL BR SL SR      |
//!
//! and folded to stereo with centre and surrounds at -3 dB; LFE is dropped.

use super::options::FilterOptions;
use super::{frames_to_ticks, AudioFilter, StreamSpec};
use crate::error::Result;
use std::collections::VecDeque;
use tonal_media::resampling::{Resampler, ResamplingQuality};
use tonal_media::{ensure, Frame, MediaError, OrMedia, SampleFormat, TimeBase};

/// -3 dB
const MIX_LEVEL: f32 = std::f32::consts::FRAC_1_SQRT_2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Left,
    Right,
    Center,
    Lfe,
    LeftSurround,
    RightSurround,
    BackCenter,
}

fn layout(channels: usize) -> Option<&'static [Position]> {
    use Position::{BackCenter, Center, Left, LeftSurround, Lfe, Right, RightSurround};
    Some(match channels {
        3 => &[Left, Right, Center],
        4 => &[Left, Right, Center, BackCenter],
        5 => &[Left, Right, Center, LeftSurround, RightSurround],
        6 => &[Left, Right, Center, Lfe, LeftSurround, RightSurround],
        7 => &[
            Left,
            Right,
            Center,
            Lfe,
            BackCenter,
            LeftSurround,
            RightSurround,
        ],
        8 => &[
            Left,
            Right,
            Center,
            Lfe,
            LeftSurround,
            RightSurround,
            LeftSurround,
            RightSurround,
        ],
        _ => return None,
    })
}

/// Fold a surround layout to two rows of (left, right) coefficients
fn stereo_fold(channels: usize) -> Option<Vec<Vec<f32>>> {
    let positions = layout(channels)?;
    let mut left = Vec::with_capacity(channels);
    let mut right = Vec::with_capacity(channels);
    for position in positions {
        let (l, r) = match position {
            Position::Left => (1.0, 0.0),
            Position::Right => (0.0, 1.0),
            Position::Center => (MIX_LEVEL, MIX_LEVEL),
            Position::Lfe => (0.0, 0.0),
            Position::LeftSurround => (MIX_LEVEL, 0.0),
            Position::RightSurround => (0.0, MIX_LEVEL),
            Position::BackCenter => (0.5, 0.5),
        };
        left.push(l);
        right.push(r);
    }
    Some(vec![left, right])
}

/// Mixing matrix `[output][input]`, or `None` when channels pass through
fn mix_matrix(input: usize, output: usize) -> Option<Vec<Vec<f32>>> {
    match (input, output) {
        (i, o) if i == o => None,
        (1, 2) => Some(vec![vec![MIX_LEVEL], vec![MIX_LEVEL]]),
        (2, 1) => Some(vec![vec![0.5, 0.5]]),
        (i, 2) => stereo_fold(i),
        (i, 1) => stereo_fold(i).map(|rows| {
            let mono = rows[0]
                .iter()
                .zip(&rows[1])
                .map(|(l, r)| 0.5 * (l + r))
                .collect();
            vec![mono]
        }),
        _ => None,
    }
}

fn remix(matrix: &[Vec<f32>], planes: &[Vec<f32>]) -> Vec<Vec<f32>> {
    let frames = planes.first().map_or(0, Vec::len);
    matrix
        .iter()
        .map(|row| {
            let mut mixed = vec![0.0_f32; frames];
            for (coefficient, plane) in row.iter().zip(planes) {
                if *coefficient == 0.0 {
                    continue;
                }
                for (out, sample) in mixed.iter_mut().zip(plane) {
                    *out += coefficient * sample;
                }
            }
            mixed
        })
        .collect()
}

fn quantize(format: SampleFormat, planes: &mut [Vec<f32>]) {
    if !format.is_float() {
        for sample in planes.iter_mut().flatten() {
            *sample = format.quantize(*sample);
        }
    }
}

fn first_entry(raw: &str) -> &str {
    raw.split('|').next().unwrap_or(raw)
}

/// Converts frames to a fixed sample format, rate and channel layout
pub struct FormatConverter {
    input: StreamSpec,
    spec: StreamSpec,
    matrix: Option<Vec<Vec<f32>>>,
    resampler: Option<Resampler>,
    first_pts: Option<i64>,
    started: bool,
    emitted: usize,
}

impl FormatConverter {
    /// Options: `sample_fmts`, `sample_rates` and `channel_layouts`
    /// (`mono` or `stereo`). Lists separated by `|` use their first entry;
    /// anything omitted keeps the input's value.
    pub fn from_options(opts: &mut FilterOptions, input: &StreamSpec) -> Result<Self> {
        let sample_format = match opts.take("sample_fmts") {
            None => input.sample_format,
            Some(raw) => SampleFormat::from_name(first_entry(&raw)).ok_or_else(|| {
                MediaError::new(
                    "configure filter",
                    format!("unknown sample format '{}' for aformat", raw),
                )
            })?,
        };
        let sample_rate = match opts.take("sample_rates") {
            None => input.sample_rate,
            Some(raw) => first_entry(&raw).parse().map_err(|_| {
                MediaError::new(
                    "configure filter",
                    format!("invalid sample rate '{}' for aformat", raw),
                )
            })?,
        };
        let channels: u16 = match opts.take("channel_layouts").as_deref().map(first_entry) {
            None => input.channels,
            Some("mono") => 1,
            Some("stereo") => 2,
            Some(other) => {
                return Err(MediaError::new(
                    "configure filter",
                    format!("unsupported channel layout '{}' for aformat", other),
                )
                .into())
            }
        };
        ensure(
            sample_rate > 0,
            "configure filter",
            "aformat sample rate must be positive",
        )?;

        let matrix = mix_matrix(usize::from(input.channels), usize::from(channels));
        ensure(
            matrix.is_some() || input.channels == channels,
            "configure filter",
            format!(
                "cannot remix {} channels to {}",
                input.channels, channels
            ),
        )?;

        let resampler = if sample_rate == input.sample_rate {
            None
        } else {
            Some(
                Resampler::new(
                    input.sample_rate,
                    sample_rate,
                    usize::from(channels),
                    ResamplingQuality::High,
                )
                .or_media("configure filter")?,
            )
        };
        let time_base = if resampler.is_some() {
            TimeBase::from_rate(sample_rate)
        } else {
            input.time_base
        };

        Ok(Self {
            input: *input,
            spec: StreamSpec {
                sample_rate,
                channels,
                sample_format,
                time_base,
            },
            matrix,
            resampler,
            first_pts: None,
            started: false,
            emitted: 0,
        })
    }

    fn emit(&mut self, mut planes: Vec<Vec<f32>>, out: &mut VecDeque<Frame>) {
        let frames = planes.first().map_or(0, Vec::len);
        if frames == 0 {
            return;
        }
        quantize(self.spec.sample_format, &mut planes);
        let pts = self.first_pts.map(|first| {
            first + frames_to_ticks(self.emitted, self.spec.sample_rate, self.spec.time_base)
        });
        self.emitted += frames;
        out.push_back(Frame::new(
            planes,
            self.spec.sample_rate,
            self.spec.sample_format,
            self.spec.time_base,
            pts,
        ));
    }
}

impl AudioFilter for FormatConverter {
    fn name(&self) -> &'static str {
        "aformat"
    }

    fn output_spec(&self) -> StreamSpec {
        self.spec
    }

    fn filter_frame(&mut self, mut frame: Frame, out: &mut VecDeque<Frame>) -> Result<()> {
        ensure(
            frame.channels() == usize::from(self.input.channels),
            "filter frame",
            format!(
                "aformat expects {} channels, got {}",
                self.input.channels,
                frame.channels()
            ),
        )?;
        if !self.started {
            self.started = true;
            self.first_pts = frame
                .pts
                .map(|pts| TimeBase::rescale(pts, frame.time_base, self.spec.time_base));
        }

        let planes = match &self.matrix {
            Some(matrix) => remix(matrix, &frame.planes),
            None => std::mem::take(&mut frame.planes),
        };

        match self.resampler.as_mut() {
            Some(resampler) => {
                let resampled = resampler.process(&planes).or_media("resample")?;
                self.emit(resampled, out);
            }
            None => {
                let mut planes = planes;
                quantize(self.spec.sample_format, &mut planes);
                frame.planes = planes;
                frame.format = self.spec.sample_format;
                out.push_back(frame);
            }
        }
        Ok(())
    }

    fn flush(&mut self, out: &mut VecDeque<Frame>) -> Result<()> {
        if let Some(resampler) = self.resampler.as_mut() {
            let tail = resampler.flush().or_media("resample")?;
            self.emit(tail, out);
        }
        Ok(())
    }
}
