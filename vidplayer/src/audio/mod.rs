mod device;

pub use device::{AudioCallback, AudioDevice, AudioDeviceFormat, AudioDeviceRequest, CpalAudioDevice};
