//! `key=value:key=value` filter option strings

use crate::error::Result;
use tonal_media::MediaError;

/// Parsed options of one filter instance.
///
/// Filters `take` the keys they understand; anything left over when
/// [`FilterOptions::ensure_consumed`] runs is reported as unknown.
#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    filter: String,
    entries: Vec<(String, String)>,
}

impl FilterOptions {
    pub fn parse(filter: &str, options: &str) -> Result<Self> {
        let mut entries = Vec::new();
        for pair in options.split(':').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                MediaError::new(
                    "parse filter options",
                    format!("'{}' of {} is not key=value", pair, filter),
                )
            })?;
            entries.push((key.trim().to_string(), value.trim().to_string()));
        }
        Ok(Self {
            filter: filter.to_string(),
            entries,
        })
    }

    fn invalid(&self, key: &str, value: &str) -> MediaError {
        MediaError::new(
            "configure filter",
            format!("invalid value '{}' for {}:{}", value, self.filter, key),
        )
    }

    /// Remove and return the raw value of `key`
    pub fn take(&mut self, key: &str) -> Option<String> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn take_f64(&mut self, key: &str) -> Result<Option<f64>> {
        match self.take(key) {
            None => Ok(None),
            Some(raw) => parse_number(&raw)
                .map(Some)
                .ok_or_else(|| self.invalid(key, &raw).into()),
        }
    }

    pub fn take_u32(&mut self, key: &str) -> Result<Option<u32>> {
        match self.take(key) {
            None => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| self.invalid(key, &raw).into()),
        }
    }

    /// Boolean flag: `1`/`0`, `true`/`false`
    pub fn take_bool(&mut self, key: &str) -> Result<Option<bool>> {
        match self.take(key) {
            None => Ok(None),
            Some(raw) => match raw.as_str() {
                "1" | "true" => Ok(Some(true)),
                "0" | "false" => Ok(Some(false)),
                _ => Err(self.invalid(key, &raw).into()),
            },
        }
    }

    /// Amplitude factor: a `dB`-suffixed value is converted, anything else
    /// is taken as linear.
    pub fn take_gain(&mut self, key: &str) -> Result<Option<f64>> {
        match self.take(key) {
            None => Ok(None),
            Some(raw) => parse_gain(&raw)
                .map(Some)
                .ok_or_else(|| self.invalid(key, &raw).into()),
        }
    }

    /// Duration in seconds; `s`, `ms` and `us` suffixes, bare values are seconds
    pub fn take_seconds(&mut self, key: &str) -> Result<Option<f64>> {
        match self.take(key) {
            None => Ok(None),
            Some(raw) => parse_duration(&raw, Unit::Seconds)
                .map(Some)
                .ok_or_else(|| self.invalid(key, &raw).into()),
        }
    }

    /// Fail on any key no filter code has taken
    pub fn ensure_consumed(&self) -> Result<()> {
        match self.entries.first() {
            None => Ok(()),
            Some((key, _)) => Err(MediaError::new(
                "configure filter",
                format!("option '{}' not found in {}", key, self.filter),
            )
            .into()),
        }
    }
}

/// Unit of a bare duration value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Unit {
    Seconds,
    Milliseconds,
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub(crate) fn parse_gain(raw: &str) -> Option<f64> {
    match raw.strip_suffix("dB") {
        Some(db) => parse_number(db).map(|db| 10.0_f64.powf(db / 20.0)),
        None => parse_number(raw),
    }
}

pub(crate) fn parse_duration(raw: &str, bare: Unit) -> Option<f64> {
    if let Some(us) = raw.strip_suffix("us") {
        return parse_number(us).map(|v| v / 1_000_000.0);
    }
    if let Some(ms) = raw.strip_suffix("ms") {
        return parse_number(ms).map(|v| v / 1000.0);
    }
    if let Some(s) = raw.strip_suffix('s') {
        return parse_number(s);
    }
    let value = parse_number(raw)?;
    Some(match bare {
        Unit::Seconds => value,
        Unit::Milliseconds => value / 1000.0,
    })
}
