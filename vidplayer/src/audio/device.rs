/*!
    Audio output device collaborator (spec §6.3).

    Grounded on the teacher's `audio::output::AudioOutput`, which opens a
    default `cpal` host/device and wires a `build_output_stream` callback
    straight to a consumer. Adapted to request an interleaved S16 stream
    instead of f32 (the gain stage multiplies 16-bit samples in place) and
    to hand the raw byte buffer to an arbitrary `AudioCallback` rather than
    a single hardcoded consumer type.
*/

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleRate, Stream, StreamConfig};

use crate::core::PlayerError;

/// What the renderer asks for when opening the device.
#[derive(Clone, Copy, Debug)]
pub struct AudioDeviceRequest {
    pub sample_rate: u32,
    pub channels: u16,
    pub frames_per_callback: u32,
}

/// What the device actually opened with; may differ from the request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AudioDeviceFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

/// The buffer the platform hands the callback is always interleaved,
/// native-endian signed 16-bit samples, presented as raw bytes so the
/// caller doesn't need to depend on a particular sample type.
pub type AudioCallback = Box<dyn FnMut(&mut [u8]) + Send>;

pub trait AudioDevice: Send {
    fn open(
        &mut self,
        request: AudioDeviceRequest,
        callback: AudioCallback,
    ) -> Result<AudioDeviceFormat, PlayerError>;
    fn start(&mut self) -> Result<(), PlayerError>;
    fn stop(&mut self) -> Result<(), PlayerError>;
    fn close(&mut self);
}

pub struct CpalAudioDevice {
    stream: Option<Stream>,
}

impl CpalAudioDevice {
    pub fn new() -> Self {
        Self { stream: None }
    }
}

impl Default for CpalAudioDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioDevice for CpalAudioDevice {
    fn open(
        &mut self,
        request: AudioDeviceRequest,
        mut callback: AudioCallback,
    ) -> Result<AudioDeviceFormat, PlayerError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| PlayerError::DeviceOpenFailed("no audio output device".into()))?;

        log::info!(
            "audio device: {}",
            device.name().unwrap_or_else(|_| "<unknown>".into())
        );

        let config = StreamConfig {
            channels: request.channels,
            sample_rate: SampleRate(request.sample_rate),
            buffer_size: BufferSize::Fixed(request.frames_per_callback),
        };

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                    callback(bytemuck::cast_slice_mut(data));
                },
                |err| log::error!("audio stream error: {err}"),
                None,
            )
            .map_err(|e| PlayerError::DeviceOpenFailed(e.to_string()))?;

        self.stream = Some(stream);

        Ok(AudioDeviceFormat {
            sample_rate: request.sample_rate,
            channels: request.channels,
        })
    }

    fn start(&mut self) -> Result<(), PlayerError> {
        match &self.stream {
            Some(stream) => stream
                .play()
                .map_err(|e| PlayerError::DeviceOpenFailed(e.to_string())),
            None => Err(PlayerError::DeviceOpenFailed("device not open".into())),
        }
    }

    fn stop(&mut self) -> Result<(), PlayerError> {
        match &self.stream {
            Some(stream) => stream
                .pause()
                .map_err(|e| PlayerError::DeviceOpenFailed(e.to_string())),
            None => Ok(()),
        }
    }

    fn close(&mut self) {
        self.stream = None;
    }
}
