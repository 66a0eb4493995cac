//! Ambient soundscape: graph description, envelope interpreter, software
//! synthesizer and the engagement state machine.

pub mod envelope;
pub mod graph;
pub mod soundscape;
pub mod synth;

pub use envelope::{Automation, Envelope};
pub use graph::{
    nodes, AudioNodeGraph, EngagementSchedule, FilterMode, NodeId, NodeKind, NodeRole, NodeSpec,
    ParamKind, ParamRef, ScheduledParam, Sink, Waveform,
};
pub use soundscape::{AudioBackend, AudioState, Soundscape};
pub use synth::{brown_noise, Osc, Svf, Synth};
