//! Peak limiting stage

use super::options::FilterOptions;
use super::{frames_to_ticks, AudioFilter, StreamSpec};
use crate::error::Result;
use std::collections::VecDeque;
use tonal_loudness::{linear_to_db, LimiterSettings, PeakLimiter};
use tonal_media::{ensure, Frame, SampleFormat, TimeBase};

/// Brick-wall limiter stage around [`PeakLimiter`].
///
/// The limiter's lookahead is compensated: output timestamps continue from
/// the first input timestamp and the tail is released on flush.
pub struct Limiter {
    spec: StreamSpec,
    limiter: PeakLimiter,
    level_in: f32,
    /// Output factor, including makeup gain when `level` is set
    level_out: f32,
    first_pts: Option<i64>,
    time_base: TimeBase,
    started: bool,
    emitted: usize,
}

impl Limiter {
    /// Options: `limit` (linear or `dB`, 0.0625..=1, default 1), `attack`
    /// and `release` in milliseconds (defaults 5 and 50), `level` to
    /// normalize the output back to full scale (default on), `level_in` and
    /// `level_out` gains.
    pub fn from_options(opts: &mut FilterOptions, input: &StreamSpec) -> Result<Self> {
        let limit = opts.take_gain("limit")?.unwrap_or(1.0);
        let attack_ms = opts.take_f64("attack")?.unwrap_or(5.0);
        let release_ms = opts.take_f64("release")?.unwrap_or(50.0);
        let level = opts.take_bool("level")?.unwrap_or(true);
        let level_in = opts.take_gain("level_in")?.unwrap_or(1.0);
        let level_out = opts.take_gain("level_out")?.unwrap_or(1.0);

        ensure(
            (0.0625..=1.0).contains(&limit),
            "configure filter",
            format!("alimiter limit {} outside 0.0625..1", limit),
        )?;

        let settings = LimiterSettings {
            ceiling_db: linear_to_db(limit) as f32,
            attack_ms: attack_ms as f32,
            release_ms: release_ms as f32,
        };
        let limiter = PeakLimiter::new(input.sample_rate, usize::from(input.channels), settings)?;
        let makeup = if level { 1.0 / limiter.threshold() } else { 1.0 };

        Ok(Self {
            spec: StreamSpec {
                sample_format: SampleFormat::F32Planar,
                ..*input
            },
            limiter,
            level_in: level_in as f32,
            level_out: level_out as f32 * makeup,
            first_pts: None,
            time_base: input.time_base,
            started: false,
            emitted: 0,
        })
    }

    fn emit(&mut self, mut planes: Vec<Vec<f32>>, out: &mut VecDeque<Frame>) {
        let frames = planes.first().map_or(0, Vec::len);
        if frames == 0 {
            return;
        }
        if (self.level_out - 1.0).abs() > f32::EPSILON {
            for sample in planes.iter_mut().flatten() {
                *sample *= self.level_out;
            }
        }
        let pts = self.first_pts.map(|first| {
            first + frames_to_ticks(self.emitted, self.spec.sample_rate, self.time_base)
        });
        self.emitted += frames;
        out.push_back(Frame::new(
            planes,
            self.spec.sample_rate,
            SampleFormat::F32Planar,
            self.time_base,
            pts,
        ));
    }
}

impl AudioFilter for Limiter {
    fn name(&self) -> &'static str {
        "alimiter"
    }

    fn output_spec(&self) -> StreamSpec {
        self.spec
    }

    fn filter_frame(&mut self, mut frame: Frame, out: &mut VecDeque<Frame>) -> Result<()> {
        if !self.started {
            self.started = true;
            self.first_pts = frame.pts;
            self.time_base = frame.time_base;
        }
        if (self.level_in - 1.0).abs() > f32::EPSILON {
            for sample in frame.planes.iter_mut().flatten() {
                *sample *= self.level_in;
            }
        }
        let limited = self.limiter.process(&frame.planes);
        self.emit(limited, out);
        Ok(())
    }

    fn flush(&mut self, out: &mut VecDeque<Frame>) -> Result<()> {
        let tail = self.limiter.flush();
        self.emit(tail, out);
        Ok(())
    }

    fn property(&self, key: &str) -> Result<Option<f64>> {
        Ok(match key {
            "latency" => Some(self.limiter.latency_samples() as f64),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> StreamSpec {
        StreamSpec {
            sample_rate: 48000,
            channels: 2,
            sample_format: SampleFormat::S16,
            time_base: TimeBase::from_rate(48000),
        }
    }

    fn limiter(options: &str) -> Result<Limiter> {
        let mut opts = FilterOptions::parse("alimiter", options)?;
        let limiter = Limiter::from_options(&mut opts, &spec())?;
        opts.ensure_consumed()?;
        Ok(limiter)
    }

    fn run(filter: &mut Limiter, input: Vec<Vec<f32>>) -> Vec<Frame> {
        let mut out = VecDeque::new();
        let len = input[0].len();
        for start in (0..len).step_by(1000) {
            let end = (start + 1000).min(len);
            let planes = input.iter().map(|p| p[start..end].to_vec()).collect();
            let frame = Frame::new(
                planes,
                48000,
                SampleFormat::S16,
                TimeBase::from_rate(48000),
                Some(start as i64),
            );
            filter.filter_frame(frame, &mut out).unwrap();
        }
        filter.flush(&mut out).unwrap();
        out.into_iter().collect()
    }

    #[test]
    fn configured_from_stage_options() {
        let filter = limiter("limit=0dB:attack=12:release=200:level=0").unwrap();
        assert_eq!(filter.property("latency").unwrap(), Some(576.0));
        assert!(limiter("limit=2").is_err());
        assert!(limiter("limit=-30dB").is_err());
        assert!(limiter("attack=0").is_err());
    }

    #[test]
    fn output_is_aligned_and_complete() {
        let mut filter = limiter("limit=-6dB:attack=5:release=50:level=0").unwrap();
        let ceiling = 10.0_f32.powf(-6.0 / 20.0);
        let tone: Vec<f32> = (0..4800)
            .map(|i| 1.5 * (2.0 * std::f32::consts::PI * 1000.0 * i as f32 / 48000.0).sin())
            .collect();
        let frames = run(&mut filter, vec![tone.clone(), tone]);

        let total: usize = frames.iter().map(Frame::frames).sum();
        assert_eq!(total, 4800);
        assert_eq!(frames[0].pts, Some(0));
        let mut expected = 0;
        for frame in &frames {
            assert_eq!(frame.pts, Some(expected));
            assert_eq!(frame.format, SampleFormat::F32Planar);
            expected += frame.frames() as i64;
        }
        assert!(frames
            .iter()
            .flat_map(|f| f.planes.iter().flatten())
            .all(|s| s.abs() <= ceiling + 1e-6));
    }

    #[test]
    fn level_restores_full_scale() {
        let mut filter = limiter("limit=0.5:level=1").unwrap();
        let frames = run(&mut filter, vec![vec![0.25; 2000]; 2]);
        let last = frames.last().unwrap();
        assert!((last.planes[0][0] - 0.5).abs() < 1e-6);
    }
}
