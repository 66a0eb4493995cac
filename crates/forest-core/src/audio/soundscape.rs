//! Engagement lifecycle of the ambient soundscape over a device backend.
//!
//! The graph is built lazily on the first engagement, which hosts issue from
//! inside a user gesture. Any failure leaves the soundscape permanently
//! unavailable; the visuals carry on without it.

use super::envelope::Envelope;
use super::graph::{AudioNodeGraph, EngagementSchedule, NodeId, NodeSpec, ParamRef, Sink};
use crate::error::AudioError;

/// Device seam. Web Audio and the native synthesizer both implement it.
pub trait AudioBackend {
    fn open(&mut self) -> Result<(), AudioError>;
    fn create_node(&mut self, id: NodeId, spec: &NodeSpec) -> Result<(), AudioError>;
    fn connect(&mut self, from: NodeId, to: Sink) -> Result<(), AudioError>;
    fn start_source(&mut self, id: NodeId) -> Result<(), AudioError>;
    fn stop_source(&mut self, id: NodeId);
    /// Cancel automation on `param` from the envelope origin and apply it.
    fn schedule(&mut self, param: ParamRef, envelope: &Envelope) -> Result<(), AudioError>;
    fn resume(&mut self) -> Result<(), AudioError>;
    /// Device clock in seconds.
    fn current_time(&self) -> f64;
    fn close(&mut self);

    /// Failure reported after the fact, e.g. a rejected resume promise.
    fn poll_failure(&mut self) -> Option<AudioError> {
        None
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AudioState {
    Uninitialized,
    Idle,
    Engaged,
    Steady,
    Unavailable,
    Disposed,
}

impl AudioState {
    pub fn label(self) -> &'static str {
        match self {
            AudioState::Engaged | AudioState::Steady => "Immersive audio active",
            AudioState::Unavailable => "Audio unavailable",
            AudioState::Uninitialized | AudioState::Idle | AudioState::Disposed => {
                "Enable immersive audio"
            }
        }
    }

    /// Whether the engagement control accepts input.
    pub fn control_enabled(self) -> bool {
        matches!(self, AudioState::Uninitialized | AudioState::Idle)
    }

    pub fn is_active(self) -> bool {
        matches!(self, AudioState::Engaged | AudioState::Steady)
    }
}

/// Stops every started source and closes the device unless disarmed.
struct ConstructionGuard<'a, B: AudioBackend> {
    backend: &'a mut B,
    started: Vec<NodeId>,
    armed: bool,
}

impl<'a, B: AudioBackend> ConstructionGuard<'a, B> {
    fn new(backend: &'a mut B) -> Self {
        Self {
            backend,
            started: Vec::new(),
            armed: true,
        }
    }

    fn start(&mut self, id: NodeId) -> Result<(), AudioError> {
        self.backend.start_source(id)?;
        self.started.push(id);
        Ok(())
    }

    fn disarm(mut self) -> Vec<NodeId> {
        self.armed = false;
        std::mem::take(&mut self.started)
    }
}

impl<'a, B: AudioBackend> Drop for ConstructionGuard<'a, B> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        for &id in self.started.iter().rev() {
            self.backend.stop_source(id);
        }
        self.backend.close();
    }
}

pub struct Soundscape<B: AudioBackend> {
    backend: B,
    graph: AudioNodeGraph,
    state: AudioState,
    started: Vec<NodeId>,
    schedule: Option<EngagementSchedule>,
}

impl<B: AudioBackend> Soundscape<B> {
    pub fn new(backend: B) -> Self {
        Self::with_graph(backend, AudioNodeGraph::ambient_forest())
    }

    pub fn with_graph(backend: B, graph: AudioNodeGraph) -> Self {
        Self {
            backend,
            graph,
            state: AudioState::Uninitialized,
            started: Vec::new(),
            schedule: None,
        }
    }

    pub fn state(&self) -> AudioState {
        self.state
    }

    pub fn label(&self) -> &'static str {
        self.state.label()
    }

    pub fn schedule(&self) -> Option<&EngagementSchedule> {
        self.schedule.as_ref()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn graph(&self) -> &AudioNodeGraph {
        &self.graph
    }

    /// Build and start the graph without engaging it.
    pub fn prepare(&mut self) -> Result<AudioState, AudioError> {
        if self.state != AudioState::Uninitialized {
            return Ok(self.state);
        }
        match self.construct() {
            Ok(started) => {
                self.started = started;
                self.state = AudioState::Idle;
                log::info!("soundscape ready: {} nodes", self.graph.len());
                Ok(self.state)
            }
            Err(e) => {
                log::error!("soundscape construction failed: {}", e);
                self.state = AudioState::Unavailable;
                Err(e)
            }
        }
    }

    fn construct(&mut self) -> Result<Vec<NodeId>, AudioError> {
        self.graph.validate()?;
        self.backend.open()?;
        let mut guard = ConstructionGuard::new(&mut self.backend);
        for (id, spec) in self.graph.nodes() {
            guard.backend.create_node(id, spec)?;
        }
        for &(from, to) in self.graph.edges() {
            guard.backend.connect(from, to)?;
        }
        for id in self.graph.sources() {
            guard.start(id)?;
        }
        Ok(guard.disarm())
    }

    /// Start the fade-in. Repeated calls after the first are no-ops.
    pub fn engage(&mut self) -> Result<AudioState, AudioError> {
        self.prepare()?;
        if self.state != AudioState::Idle {
            return Ok(self.state);
        }
        if let Err(e) = self.begin() {
            self.fail(e.clone());
            return Err(e);
        }
        Ok(self.state)
    }

    fn begin(&mut self) -> Result<(), AudioError> {
        self.backend.resume()?;
        let t0 = self.backend.current_time();
        let schedule = self.graph.engagement_schedule(t0)?;
        for entry in schedule.entries() {
            self.backend.schedule(entry.target, &entry.envelope)?;
        }
        log::info!(
            "soundscape engaged at t0={:.3}s, settles after {:.1}s",
            t0,
            schedule.settle_time()
        );
        self.schedule = Some(schedule);
        self.state = AudioState::Engaged;
        Ok(())
    }

    /// Per-frame bookkeeping: picks up late device failures and marks the
    /// schedule steady once it has settled.
    pub fn update(&mut self) -> AudioState {
        if self.state.is_active() {
            if let Some(e) = self.backend.poll_failure() {
                self.fail(e);
                return self.state;
            }
        }
        if self.state == AudioState::Engaged {
            let now = self.backend.current_time();
            if self.schedule.as_ref().map(|s| s.is_steady(now)).unwrap_or(false) {
                log::info!("soundscape steady at {:.1}s", now);
                self.state = AudioState::Steady;
            }
        }
        self.state
    }

    /// Mark the soundscape unavailable and release the device.
    pub fn fail(&mut self, error: AudioError) {
        if matches!(self.state, AudioState::Unavailable | AudioState::Disposed) {
            return;
        }
        log::warn!("audio unavailable: {}", error);
        let opened = self.state != AudioState::Uninitialized;
        self.release(opened);
        self.state = AudioState::Unavailable;
    }

    fn release(&mut self, opened: bool) {
        for id in self.started.drain(..).rev() {
            self.backend.stop_source(id);
        }
        if opened {
            self.backend.close();
        }
        self.schedule = None;
    }

    /// Stop every source and release the device. Idempotent.
    pub fn teardown(&mut self) {
        match self.state {
            AudioState::Disposed => return,
            AudioState::Uninitialized | AudioState::Unavailable => {}
            AudioState::Idle | AudioState::Engaged | AudioState::Steady => {
                self.release(true);
                log::info!("soundscape torn down");
            }
        }
        self.state = AudioState::Disposed;
    }
}

impl<B: AudioBackend> Drop for Soundscape<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}
