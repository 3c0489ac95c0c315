//! CPAL audio output wrapper.

use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use fundsp::audiounit::AudioUnit;
use fundsp::realnet::NetBackend;

use crate::clock::AudioClock;
use crate::{Error, Result};

/// Wrapper to hold `cpal::Stream` in a `Send` context.
///
/// # Safety
/// `cpal::Stream` is `!Send` due to platform internals. This is safe because
/// the engine is only accessed behind a `Mutex` in `AudioContext`.
struct StreamHandle(#[allow(dead_code)] cpal::Stream);

unsafe impl Send for StreamHandle {}

/// State moved into the real-time callback.
pub(crate) struct CallbackState {
    pub(crate) backend: NetBackend,
    pub(crate) clock: Arc<AudioClock>,
}

pub(crate) struct OutputEngine {
    sample_rate: f64,
    is_running: bool,
    device_index: Option<usize>,
    _stream: Option<StreamHandle>,
}

impl OutputEngine {
    pub(crate) fn new(device_index: Option<usize>) -> Result<Self> {
        let device = get_device(device_index)?;
        let config = device.default_output_config()?;

        Ok(Self {
            sample_rate: config.sample_rate().0 as f64,
            is_running: false,
            device_index,
            _stream: None,
        })
    }

    pub(crate) fn start(&mut self, state: CallbackState) -> Result<()> {
        if self.is_running {
            return Ok(());
        }

        let device = get_device(self.device_index)?;
        let config = device.default_output_config()?;

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config.into(), state)?,
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config.into(), state)?,
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config.into(), state)?,
            format => {
                return Err(Error::InvalidConfig(format!(
                    "Unsupported sample format: {format:?}"
                )));
            }
        };

        stream.play()?;
        self._stream = Some(StreamHandle(stream));
        self.is_running = true;

        Ok(())
    }

    pub(crate) fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub(crate) fn is_running(&self) -> bool {
        self.is_running
    }

    pub(crate) fn list_devices() -> Result<Vec<String>> {
        cpal::default_host()
            .output_devices()?
            .enumerate()
            .map(|(i, d)| Ok(format!("{i}: {}", d.name()?)))
            .collect()
    }
}

fn get_device(index: Option<usize>) -> Result<cpal::Device> {
    let host = cpal::default_host();

    match index {
        Some(i) => {
            let devices: Vec<_> = host.output_devices()?.collect();
            let count = devices.len();
            devices.into_iter().nth(i).ok_or_else(|| {
                Error::InvalidDevice(format!("Device index {i} out of range ({count} available)"))
            })
        }
        None => host
            .default_output_device()
            .ok_or_else(|| Error::InvalidDevice("No output device available".into())),
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    state: CallbackState,
) -> Result<cpal::Stream>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let channels = config.channels as usize;
    let CallbackState { mut backend, clock } = state;

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                // One frame at a time so scheduled voices land sample-exact
                // on the shared clock.
                for frame in data.chunks_mut(channels) {
                    let (left, right) = backend.get_stereo();
                    clock.advance(1);
                    match channels {
                        1 => frame[0] = T::from_sample(0.5 * (left + right)),
                        _ => {
                            frame[0] = T::from_sample(left);
                            frame[1] = T::from_sample(right);
                            for sample in frame.iter_mut().skip(2) {
                                *sample = T::from_sample(0.0);
                            }
                        }
                    }
                }
            }));

            if result.is_err() {
                for sample in data.iter_mut() {
                    *sample = T::from_sample(0.0);
                }
            }
        },
        |_err| {},
        None,
    )?;

    Ok(stream)
}
