//! Offline interpreter for an [`AudioNodeGraph`](super::graph::AudioNodeGraph).
//!
//! The desktop host runs this on the device callback thread; tests render
//! blocks directly. Parameter envelopes are evaluated per sample against the
//! synth's own sample clock.

use super::envelope::Envelope;
use super::graph::{
    AudioNodeGraph, FilterMode, NodeId, NodeKind, NodeSpec, ParamKind, ParamRef, Sink, Waveform,
};
use crate::constants::{BROWN_LEAK, BROWN_OUTPUT_GAIN, BROWN_STEP};
use crate::error::{AudioError, ConfigError};
use rand::prelude::*;
use smallvec::SmallVec;
use std::f32::consts::PI;

/// Integrated white noise: `b = (b + 0.02·w) / 1.02`, emitted as `0.6·b`.
pub fn brown_noise<R: Rng>(len: usize, rng: &mut R) -> Vec<f32> {
    let mut b = 0.0_f32;
    (0..len)
        .map(|_| {
            let w: f32 = rng.gen_range(-1.0..=1.0);
            b = (b + BROWN_STEP * w) / BROWN_LEAK;
            b * BROWN_OUTPUT_GAIN
        })
        .collect()
}

/// Zero-delay-feedback state variable filter (trapezoidal integration).
#[derive(Copy, Clone, Debug, Default)]
pub struct Svf {
    ic1: f32,
    ic2: f32,
}

impl Svf {
    #[inline]
    pub fn process(&mut self, x: f32, cutoff: f32, q: f32, sample_rate: f32, mode: FilterMode) -> f32 {
        let fc = cutoff.clamp(1.0, sample_rate * 0.49);
        let g = (PI * fc / sample_rate).tan();
        let k = 1.0 / q.max(1e-4);
        let a1 = 1.0 / (1.0 + g * (g + k));
        let a2 = g * a1;
        let a3 = g * a2;

        let v3 = x - self.ic2;
        let v1 = a1 * self.ic1 + a2 * v3;
        let v2 = self.ic2 + a2 * self.ic1 + a3 * v3;
        self.ic1 = 2.0 * v1 - self.ic1;
        self.ic2 = 2.0 * v2 - self.ic2;

        match mode {
            // unity gain at the centre frequency
            FilterMode::Bandpass => k * v1,
            FilterMode::Highpass => x - k * v1 - v2,
        }
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct Osc {
    phase: f32,
}

impl Osc {
    #[inline]
    pub fn next(&mut self, waveform: Waveform, frequency: f32, sample_rate: f32) -> f32 {
        let out = match waveform {
            Waveform::Sine => (self.phase * 2.0 * PI).sin(),
            Waveform::Triangle => 1.0 - 4.0 * (self.phase - 0.5).abs(),
        };
        self.phase += frequency / sample_rate;
        self.phase -= self.phase.floor();
        out
    }
}

#[derive(Clone, Debug)]
struct Param {
    base: f32,
    envelope: Option<Envelope>,
}

impl Param {
    fn new(base: f32) -> Self {
        Self {
            base,
            envelope: None,
        }
    }

    #[inline]
    fn value(&self, t: f64) -> f32 {
        match &self.envelope {
            Some(e) => e.evaluate(t),
            None => self.base,
        }
    }
}

#[derive(Clone, Debug)]
enum Voice {
    Noise { buffer: Vec<f32>, cursor: usize },
    Osc { waveform: Waveform, osc: Osc },
    Filter { mode: FilterMode, q: f32, svf: Svf },
    Gain,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Playback {
    Idle,
    Running,
    Stopped,
}

#[derive(Clone, Debug)]
struct SynthNode {
    label: &'static str,
    voice: Voice,
    gain: Param,
    frequency: Param,
    playback: Playback,
    inputs: SmallVec<[usize; 4]>,
}

pub struct Synth {
    sample_rate: f32,
    frame: u64,
    graph: AudioNodeGraph,
    nodes: Vec<SynthNode>,
    outputs: Vec<f32>,
    order: Vec<usize>,
    destination: SmallVec<[usize; 2]>,
    rng: StdRng,
}

impl Synth {
    pub fn new(sample_rate: f32) -> Self {
        Self::with_rng(sample_rate, StdRng::from_entropy())
    }

    /// Seeded variant, so rendered noise is reproducible.
    pub fn with_rng(sample_rate: f32, rng: StdRng) -> Self {
        Self {
            sample_rate: sample_rate.max(1.0),
            frame: 0,
            graph: AudioNodeGraph::new(),
            nodes: Vec::new(),
            outputs: Vec::new(),
            order: Vec::new(),
            destination: SmallVec::new(),
            rng,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Seconds of audio rendered so far.
    pub fn time(&self) -> f64 {
        self.frame as f64 / self.sample_rate as f64
    }

    /// Nodes must be added in id order.
    pub fn add_node(&mut self, id: NodeId, spec: &NodeSpec) -> Result<(), AudioError> {
        if id.0 != self.nodes.len() {
            return Err(AudioError::NodeCreation {
                node: spec.label,
                reason: format!("expected id {}, got {}", self.nodes.len(), id.0),
            });
        }
        let voice = match spec.kind {
            NodeKind::NoiseLoop { seconds } => {
                let len = ((seconds * self.sample_rate) as usize).max(1);
                Voice::Noise {
                    buffer: brown_noise(len, &mut self.rng),
                    cursor: 0,
                }
            }
            NodeKind::Oscillator { waveform, .. } => Voice::Osc {
                waveform,
                osc: Osc::default(),
            },
            NodeKind::Filter { mode, q, .. } => Voice::Filter {
                mode,
                q,
                svf: Svf::default(),
            },
            NodeKind::Gain { .. } => Voice::Gain,
        };
        self.graph.add(spec.label, spec.role, spec.kind);
        self.nodes.push(SynthNode {
            label: spec.label,
            voice,
            gain: Param::new(spec.kind.param(ParamKind::Gain).unwrap_or(1.0)),
            frequency: Param::new(spec.kind.param(ParamKind::Frequency).unwrap_or(0.0)),
            playback: if spec.kind.is_source() {
                Playback::Idle
            } else {
                Playback::Running
            },
            inputs: SmallVec::new(),
        });
        self.outputs.push(0.0);
        self.refresh_order().map_err(|e| AudioError::NodeCreation {
            node: spec.label,
            reason: e.to_string(),
        })
    }

    pub fn connect(&mut self, from: NodeId, to: Sink) -> Result<(), AudioError> {
        let label = self.label(from);
        if from.0 >= self.nodes.len() {
            return Err(AudioError::Connection {
                from: label,
                reason: "unknown node".into(),
            });
        }
        match to {
            Sink::Node(target) => {
                let node = self.nodes.get_mut(target.0).ok_or_else(|| AudioError::Connection {
                    from: label,
                    reason: format!("unknown target {}", target.0),
                })?;
                node.inputs.push(from.0);
            }
            Sink::Destination => self.destination.push(from.0),
        }
        self.graph.connect(from, to);
        self.refresh_order().map_err(|e| AudioError::Connection {
            from: label,
            reason: e.to_string(),
        })
    }

    fn refresh_order(&mut self) -> Result<(), ConfigError> {
        self.order = self
            .graph
            .topological_order()?
            .into_iter()
            .map(|id| id.0)
            .collect();
        Ok(())
    }

    fn label(&self, id: NodeId) -> &'static str {
        self.nodes.get(id.0).map(|n| n.label).unwrap_or("?")
    }

    pub fn start(&mut self, id: NodeId) -> Result<(), AudioError> {
        let node = self.nodes.get_mut(id.0).ok_or_else(|| AudioError::SourceStart {
            node: "?",
            reason: format!("unknown node {}", id.0),
        })?;
        match node.playback {
            Playback::Idle => {
                node.playback = Playback::Running;
                Ok(())
            }
            Playback::Running if matches!(node.voice, Voice::Noise { .. } | Voice::Osc { .. }) => {
                Err(AudioError::SourceStart {
                    node: node.label,
                    reason: "already started".into(),
                })
            }
            Playback::Running => Err(AudioError::SourceStart {
                node: node.label,
                reason: "not a source".into(),
            }),
            Playback::Stopped => Err(AudioError::SourceStart {
                node: node.label,
                reason: "sources cannot restart".into(),
            }),
        }
    }

    /// Silence a source for good. Stopping twice is a no-op.
    pub fn stop(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            if matches!(node.voice, Voice::Noise { .. } | Voice::Osc { .. }) {
                node.playback = Playback::Stopped;
            }
        }
    }

    pub fn is_running(&self, id: NodeId) -> bool {
        self.nodes
            .get(id.0)
            .map(|n| n.playback == Playback::Running && matches!(n.voice, Voice::Noise { .. } | Voice::Osc { .. }))
            .unwrap_or(false)
    }

    pub fn running_sources(&self) -> usize {
        (0..self.nodes.len()).filter(|&i| self.is_running(NodeId(i))).count()
    }

    /// Replace all automation on `param` with `envelope`.
    pub fn set_envelope(&mut self, param: ParamRef, envelope: Envelope) -> Result<(), AudioError> {
        let node = self
            .nodes
            .get_mut(param.node.0)
            .ok_or_else(|| AudioError::Schedule(format!("unknown node {}", param.node.0)))?;
        let has_param = match (&node.voice, param.param) {
            (Voice::Gain, ParamKind::Gain) => true,
            (Voice::Osc { .. } | Voice::Filter { .. }, ParamKind::Frequency) => true,
            _ => false,
        };
        if !has_param {
            return Err(AudioError::Schedule(format!(
                "`{}` has no {:?} parameter",
                node.label, param.param
            )));
        }
        let slot = match param.param {
            ParamKind::Gain => &mut node.gain,
            ParamKind::Frequency => &mut node.frequency,
        };
        slot.envelope = Some(envelope);
        Ok(())
    }

    /// Current value of a parameter on the synth clock.
    pub fn param(&self, param: ParamRef) -> Option<f32> {
        let node = self.nodes.get(param.node.0)?;
        let t = self.time();
        Some(match param.param {
            ParamKind::Gain => node.gain.value(t),
            ParamKind::Frequency => node.frequency.value(t),
        })
    }

    /// Render one mono sample and advance the clock.
    pub fn next_sample(&mut self) -> f32 {
        let t = self.time();
        let sr = self.sample_rate;
        let outputs = &mut self.outputs;
        for &i in &self.order {
            let input: f32 = self.nodes[i].inputs.iter().map(|&j| outputs[j]).sum();
            let node = &mut self.nodes[i];
            let running = node.playback == Playback::Running;
            let out = match &mut node.voice {
                Voice::Noise { buffer, cursor } => {
                    if running {
                        let s = buffer[*cursor];
                        *cursor = (*cursor + 1) % buffer.len();
                        s
                    } else {
                        0.0
                    }
                }
                Voice::Osc { waveform, osc } => {
                    if running {
                        osc.next(*waveform, node.frequency.value(t), sr)
                    } else {
                        0.0
                    }
                }
                Voice::Filter { mode, q, svf } => {
                    svf.process(input, node.frequency.value(t), *q, sr, *mode)
                }
                Voice::Gain => input * node.gain.value(t),
            };
            outputs[i] = out;
        }
        self.frame += 1;
        self.destination.iter().map(|&j| outputs[j]).sum()
    }

    pub fn render(&mut self, out: &mut [f32]) {
        for s in out.iter_mut() {
            *s = self.next_sample();
        }
    }
}
