//! Streaming pump driven directly over reader, chain and writer

mod common;

use common::{wav_info, write_programme};
use tempfile::tempdir;
use tonal_media::{Encoder, MediaReader, MediaWriter, SampleFormat};
use tonal_normalize::{
    FilterChain, NormalizationTarget, PumpOutput, StageDescriptor, StreamSpec, StreamingPump,
};

#[test]
fn discard_output_decodes_everything() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("tone.wav");
    write_programme(&src, 48000, 2.0, 0.1);

    let mut reader = MediaReader::open(&src).unwrap();
    let decoder = reader.open_decoder().unwrap();
    let spec = StreamSpec::from(reader.stream());
    let mut chain = FilterChain::build(spec, &[StageDescriptor::Meter]).unwrap();

    let stats = StreamingPump::new(&mut reader, decoder, &mut chain, PumpOutput::Discard)
        .run()
        .unwrap();
    assert_eq!(stats.samples_filtered, 96_000);
    assert_eq!(stats.packets_written, 0);
    assert_eq!(stats.packets_skipped, 0);
    assert!(stats.frames_decoded > 0);
    assert_eq!(stats.frames_decoded, stats.frames_filtered);
    assert_eq!(chain.property("ebur128", "duration").unwrap(), Some(2.0));
}

#[test]
fn encode_output_finalizes_container() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("tone.wav");
    let dst = dir.path().join("float.wav");
    write_programme(&src, 44100, 1.0, 0.1);

    let target = NormalizationTarget {
        codec: tonal_media::CodecId::PcmF32Le,
        sample_format: SampleFormat::F32,
        ..NormalizationTarget::default()
    };
    let stages = [
        StageDescriptor::Gain { db: -6.0 },
        StageDescriptor::Format {
            sample_format: SampleFormat::F32,
            sample_rate: 48000,
            channel_layout: "stereo",
        },
    ];

    let mut reader = MediaReader::open(&src).unwrap();
    let decoder = reader.open_decoder().unwrap();
    let encoder = Encoder::open(target.encoder_config()).unwrap();
    let mut writer = MediaWriter::create(&dst).unwrap();
    writer.add_stream(&encoder).unwrap();
    let mut chain = FilterChain::build(StreamSpec::from(reader.stream()), &stages).unwrap();
    writer.write_header().unwrap();

    let stats = StreamingPump::new(
        &mut reader,
        decoder,
        &mut chain,
        PumpOutput::Encode { encoder, writer },
    )
    .run()
    .unwrap();

    assert_eq!(stats.samples_filtered, 48_000);
    assert!(stats.packets_written > 0);

    let (frames, spec) = wav_info(&dst);
    assert_eq!(frames, 48_000);
    assert_eq!(spec.sample_format, hound::SampleFormat::Float);
    assert_eq!(spec.bits_per_sample, 32);
}

#[test]
fn format_stage_keeps_timing() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("tone.wav");
    let dst = dir.path().join("resampled.wav");
    write_programme(&src, 44100, 1.0, 0.3);

    let target = NormalizationTarget::default();
    let stages = [StageDescriptor::Format {
        sample_format: SampleFormat::S16,
        sample_rate: 48000,
        channel_layout: "stereo",
    }];

    let mut reader = MediaReader::open(&src).unwrap();
    let decoder = reader.open_decoder().unwrap();
    let encoder = Encoder::open(target.encoder_config()).unwrap();
    let mut writer = MediaWriter::create(&dst).unwrap();
    writer.add_stream(&encoder).unwrap();
    let mut chain = FilterChain::build(StreamSpec::from(reader.stream()), &stages).unwrap();
    writer.write_header().unwrap();
    StreamingPump::new(
        &mut reader,
        decoder,
        &mut chain,
        PumpOutput::Encode { encoder, writer },
    )
    .run()
    .unwrap();

    // the burst crest sits at 10.25 ms, sample 492 at 48 kHz
    let mut wav = hound::WavReader::open(&dst).unwrap();
    let left: Vec<i16> = wav
        .samples::<i16>()
        .step_by(2)
        .take(4800)
        .map(Result::unwrap)
        .collect();
    let peak = left
        .iter()
        .enumerate()
        .max_by_key(|(_, s)| s.unsigned_abs())
        .map(|(i, _)| i)
        .unwrap();
    assert!(peak.abs_diff(492) <= 3, "burst peak at sample {}", peak);
}
