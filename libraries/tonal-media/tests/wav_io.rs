//! Reader and writer against real WAV files on disk

use std::path::Path;
use tempfile::tempdir;
use tonal_media::{
    staging_path, CodecId, Encoder, EncoderConfig, Frame, MediaReader, MediaType, Receive,
    SampleFormat,
};

fn write_wav(path: &Path, rate: u32, channels: u16, frames: usize) {
    let spec = hound::WavSpec {
        channels,
        sample_rate: rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for i in 0..frames {
        let t = i as f32 / rate as f32;
        let v = (0.25 * (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 32768.0) as i16;
        for _ in 0..channels {
            writer.write_sample(v).unwrap();
        }
    }
    writer.finalize().unwrap();
}

fn decode_all(reader: &mut MediaReader) -> Vec<Frame> {
    let mut decoder = reader.open_decoder().unwrap();
    let mut frames = Vec::new();
    while let Some(packet) = reader.read_packet().unwrap() {
        if packet.stream_index() != reader.stream().stream_index {
            continue;
        }
        decoder.send_packet(Some(&packet)).unwrap();
        while let Receive::Ready(frame) = decoder.receive_frame() {
            frames.push(frame);
        }
    }
    decoder.send_packet(None).unwrap();
    loop {
        match decoder.receive_frame() {
            Receive::Ready(frame) => frames.push(frame),
            Receive::EndOfStream => break,
            Receive::NotReady => panic!("flushed decoder must not report NotReady"),
        }
    }
    frames
}

#[test]
fn describes_pcm_wav_stream() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tone.wav");
    write_wav(&path, 44100, 2, 4410);

    let reader = MediaReader::open(&path).unwrap();
    let stream = reader.stream();
    assert_eq!(stream.media_type, MediaType::Audio);
    assert_eq!(stream.codec, CodecId::PcmS16Le);
    assert_eq!(stream.sample_format, SampleFormat::S16);
    assert_eq!(stream.sample_rate, 44100);
    assert_eq!(stream.channels, 2);
}

#[test]
fn decodes_every_sample() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tone.wav");
    write_wav(&path, 48000, 1, 12_345);

    let mut reader = MediaReader::open(&path).unwrap();
    let frames = decode_all(&mut reader);
    let total: usize = frames.iter().map(Frame::frames).sum();
    assert_eq!(total, 12_345);
    assert_eq!(frames[0].pts, Some(0));
    assert!(frames.iter().all(|f| f.channels() == 1));
}

#[test]
fn non_audio_file_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "this is not audio, just some text\n".repeat(64)).unwrap();

    let err = MediaReader::open(&path).err().expect("text is not media");
    assert!(err.to_string().starts_with("Failed to "));
    assert_eq!(err.path(), Some(path.as_path()));
}

#[test]
fn writer_stages_until_trailer() {
    let dir = tempdir().unwrap();
    let dst = dir.path().join("out.wav");
    let config = EncoderConfig {
        codec: CodecId::PcmS16Le,
        sample_format: SampleFormat::S16,
        sample_rate: 48000,
        channels: 2,
    };

    let mut encoder = Encoder::open(config).unwrap();
    let mut writer = tonal_media::MediaWriter::create(&dst).unwrap();
    writer.add_stream(&encoder).unwrap();
    writer.write_header().unwrap();
    assert!(staging_path(&dst).exists());
    assert!(!dst.exists());

    let frame = Frame::new(
        vec![vec![0.5; 480], vec![-0.5; 480]],
        48000,
        SampleFormat::S16,
        encoder.time_base(),
        Some(0),
    );
    encoder.send_frame(Some(&frame)).unwrap();
    encoder.send_frame(None).unwrap();
    while let Receive::Ready(packet) = encoder.receive_packet() {
        writer.write_interleaved(&packet).unwrap();
    }
    writer.write_trailer().unwrap();

    assert!(dst.exists());
    assert!(!staging_path(&dst).exists());

    let mut reader = hound::WavReader::open(&dst).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.sample_rate, 48000);
    assert_eq!(spec.bits_per_sample, 16);
    let samples: Vec<i16> = reader.samples::<i16>().map(Result::unwrap).collect();
    assert_eq!(samples.len(), 960);
    assert_eq!(samples[0], 16384);
    assert_eq!(samples[1], -16384);
}

#[test]
fn written_file_reads_back_through_reader() {
    let dir = tempdir().unwrap();
    let dst = dir.path().join("float.wav");
    let config = EncoderConfig {
        codec: CodecId::PcmF32Le,
        sample_format: SampleFormat::F32,
        sample_rate: 22050,
        channels: 1,
    };
    let mut encoder = Encoder::open(config).unwrap();
    let mut writer = tonal_media::MediaWriter::create(&dst).unwrap();
    writer.add_stream(&encoder).unwrap();
    writer.write_header().unwrap();
    let frame = Frame::new(
        vec![vec![0.125; 2205]],
        22050,
        SampleFormat::F32,
        encoder.time_base(),
        Some(0),
    );
    encoder.send_frame(Some(&frame)).unwrap();
    encoder.send_frame(None).unwrap();
    while let Receive::Ready(packet) = encoder.receive_packet() {
        writer.write_interleaved(&packet).unwrap();
    }
    writer.write_trailer().unwrap();

    let mut reader = MediaReader::open(&dst).unwrap();
    assert_eq!(reader.stream().codec, CodecId::PcmF32Le);
    assert_eq!(reader.stream().sample_format, SampleFormat::F32);
    let frames = decode_all(&mut reader);
    let samples: Vec<f32> = frames.iter().flat_map(|f| f.planes[0].clone()).collect();
    assert_eq!(samples.len(), 2205);
    assert!(samples.iter().all(|&s| s == 0.125));
}
