//! cpal output stream driving the core synthesizer.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample};
use forest_core::audio::{AudioBackend, Envelope, NodeId, NodeSpec, ParamRef, Sink, Synth};
use forest_core::AudioError;
use std::sync::{Arc, Mutex, MutexGuard};

type SharedFailure = Arc<Mutex<Option<AudioError>>>;

/// The synthesizer lives behind a mutex shared with the audio callback; its
/// sample counter is the audio clock.
pub struct CpalBackend {
    synth: Arc<Mutex<Synth>>,
    stream: Option<cpal::Stream>,
    failure: SharedFailure,
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CpalBackend {
    pub fn new() -> Self {
        Self {
            synth: Arc::new(Mutex::new(Synth::new(48_000.0))),
            stream: None,
            failure: Arc::new(Mutex::new(None)),
        }
    }

    fn synth(&self) -> Result<MutexGuard<'_, Synth>, AudioError> {
        self.synth
            .lock()
            .map_err(|_| AudioError::Unavailable("audio thread panicked".into()))
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    synth: Arc<Mutex<Synth>>,
    failure: SharedFailure,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = (config.channels as usize).max(1);
    device.build_output_stream(
        config,
        move |data: &mut [T], _| match synth.lock() {
            Ok(mut synth) => {
                // mono graph, same sample on every channel
                for frame in data.chunks_mut(channels) {
                    let s = synth.next_sample().clamp(-1.0, 1.0);
                    for out in frame.iter_mut() {
                        *out = T::from_sample(s);
                    }
                }
            }
            Err(_) => {
                for out in data.iter_mut() {
                    *out = T::from_sample(0.0f32);
                }
            }
        },
        move |err| {
            log::error!("audio stream error: {err}");
            if let Ok(mut slot) = failure.lock() {
                slot.get_or_insert(AudioError::Unavailable(err.to_string()));
            }
        },
        None,
    )
}

impl AudioBackend for CpalBackend {
    fn open(&mut self) -> Result<(), AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| AudioError::Unavailable("no output device".into()))?;
        let supported = device
            .default_output_config()
            .map_err(|e| AudioError::Unavailable(format!("output config: {e}")))?;
        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();
        let sample_rate = config.sample_rate.0 as f32;

        *self.synth()? = Synth::new(sample_rate);
        let synth = Arc::clone(&self.synth);
        let failure = Arc::clone(&self.failure);
        let stream = match sample_format {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, synth, failure),
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, synth, failure),
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, synth, failure),
            other => {
                return Err(AudioError::Unavailable(format!(
                    "unsupported sample format {other:?}"
                )))
            }
        }
        .map_err(|e| AudioError::Unavailable(format!("build stream: {e}")))?;

        log::info!(
            "output stream open: {} Hz, {} channel(s), {:?}",
            sample_rate,
            config.channels,
            sample_format
        );
        self.stream = Some(stream);
        Ok(())
    }

    fn create_node(&mut self, id: NodeId, spec: &NodeSpec) -> Result<(), AudioError> {
        self.synth()?.add_node(id, spec)
    }

    fn connect(&mut self, from: NodeId, to: Sink) -> Result<(), AudioError> {
        self.synth()?.connect(from, to)
    }

    fn start_source(&mut self, id: NodeId) -> Result<(), AudioError> {
        self.synth()?.start(id)
    }

    fn stop_source(&mut self, id: NodeId) {
        if let Ok(mut synth) = self.synth() {
            synth.stop(id);
        }
    }

    fn schedule(&mut self, param: ParamRef, envelope: &Envelope) -> Result<(), AudioError> {
        self.synth()?.set_envelope(param, envelope.clone())
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        let stream = self
            .stream
            .as_ref()
            .ok_or_else(|| AudioError::Unavailable("output stream not open".into()))?;
        stream
            .play()
            .map_err(|e| AudioError::Unavailable(format!("play: {e}")))
    }

    fn current_time(&self) -> f64 {
        self.synth().map(|s| s.time()).unwrap_or(0.0)
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.pause();
            log::info!("output stream closed");
        }
    }

    fn poll_failure(&mut self) -> Option<AudioError> {
        self.failure.lock().ok().and_then(|mut slot| slot.take())
    }
}
