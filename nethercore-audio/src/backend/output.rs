//! Default output device through cpal

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{debug, error, info};

use super::{AudioBackend, BackendError, Renderer};
use crate::{AUDIO_FREQUENCY, MIX_BLOCK_FRAMES};

/// Output channel count requested from the device
const OUTPUT_CHANNELS: u16 = 2;

/// Sample formats we can feed, in order of preference
const PREFERRED_FORMATS: [cpal::SampleFormat; 3] = [
    cpal::SampleFormat::I16,
    cpal::SampleFormat::F32,
    cpal::SampleFormat::U16,
];

/// Plays the mix on the host's default output device
#[derive(Default)]
pub struct CpalBackend {
    /// The cpal stream (kept alive while running)
    stream: Option<cpal::Stream>,
}

impl CpalBackend {
    /// Create an idle backend; the device is opened by `start`
    pub fn new() -> Self {
        Self::default()
    }
}

fn pick_config(device: &cpal::Device) -> Result<cpal::SupportedStreamConfig, BackendError> {
    let ranges: Vec<_> = device
        .supported_output_configs()
        .map_err(|e| BackendError::Config(e.to_string()))?
        .filter(|range| {
            range.channels() == OUTPUT_CHANNELS
                && range.min_sample_rate().0 <= AUDIO_FREQUENCY
                && range.max_sample_rate().0 >= AUDIO_FREQUENCY
        })
        .collect();

    PREFERRED_FORMATS
        .iter()
        .find_map(|format| ranges.iter().find(|r| r.sample_format() == *format))
        .map(|range| range.with_sample_rate(cpal::SampleRate(AUDIO_FREQUENCY)))
        .ok_or_else(|| {
            BackendError::Config(format!(
                "device has no {} channel {} Hz output",
                OUTPUT_CHANNELS, AUDIO_FREQUENCY
            ))
        })
}

fn build_stream(
    device: &cpal::Device,
    supported: cpal::SupportedStreamConfig,
    renderer: Renderer,
) -> Result<cpal::Stream, BackendError> {
    let format = supported.sample_format();
    let config: cpal::StreamConfig = supported.into();
    let on_error = |err: cpal::StreamError| error!("Audio stream error: {}", err);

    let stream = match format {
        cpal::SampleFormat::I16 => device.build_output_stream(
            &config,
            move |data: &mut [i16], _: &cpal::OutputCallbackInfo| renderer.render(data),
            on_error,
            None,
        ),
        cpal::SampleFormat::F32 => {
            // Pre-allocated mix buffer, grown only if the device asks for more
            let mut mix = vec![0i16; MIX_BLOCK_FRAMES * 2];
            device.build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    if mix.len() < data.len() {
                        mix.resize(data.len(), 0);
                    }
                    let mix = &mut mix[..data.len()];
                    renderer.render(mix);
                    for (dst, &src) in data.iter_mut().zip(mix.iter()) {
                        *dst = f32::from(src) / 32768.0;
                    }
                },
                on_error,
                None,
            )
        }
        cpal::SampleFormat::U16 => {
            let mut mix = vec![0i16; MIX_BLOCK_FRAMES * 2];
            device.build_output_stream(
                &config,
                move |data: &mut [u16], _: &cpal::OutputCallbackInfo| {
                    if mix.len() < data.len() {
                        mix.resize(data.len(), 0);
                    }
                    let mix = &mut mix[..data.len()];
                    renderer.render(mix);
                    // 0x8000 is silence for u16 audio
                    for (dst, &src) in data.iter_mut().zip(mix.iter()) {
                        *dst = (i32::from(src) + 32768) as u16;
                    }
                },
                on_error,
                None,
            )
        }
        other => {
            return Err(BackendError::Config(format!(
                "unsupported sample format: {:?}",
                other
            )));
        }
    };

    stream.map_err(|e| BackendError::Stream(e.to_string()))
}

impl AudioBackend for CpalBackend {
    fn start(&mut self, renderer: Renderer) -> Result<(), BackendError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(BackendError::NoDevice)?;

        let supported = pick_config(&device)?;
        debug!(
            "Audio output config: {:?} at {} Hz",
            supported.sample_format(),
            AUDIO_FREQUENCY
        );

        let stream = build_stream(&device, supported, renderer)?;
        stream
            .play()
            .map_err(|e| BackendError::Stream(e.to_string()))?;

        info!(
            "Audio output started on {}",
            device.name().unwrap_or_else(|_| "unknown device".to_string())
        );
        self.stream = Some(stream);
        Ok(())
    }

    fn stop(&mut self) {
        if self.stream.take().is_some() {
            debug!("Audio output stopped");
        }
    }

    fn supports_async_load(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "cpal"
    }
}
