// Host-side tests for the soundscape state machine against a recording backend.

use forest_core::audio::{
    nodes, AudioBackend, AudioNodeGraph, AudioState, Envelope, NodeId, NodeSpec, ParamRef, Sink,
    Soundscape,
};
use forest_core::AudioError;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone, Debug, PartialEq)]
enum Call {
    Open,
    Create(NodeId),
    Connect(NodeId, Sink),
    Start(NodeId),
    Stop(NodeId),
    Schedule(ParamRef),
    Resume,
    Close,
}

#[derive(Default)]
struct Record {
    calls: Vec<Call>,
    schedules: Vec<(ParamRef, Envelope)>,
}

impl Record {
    fn count(&self, call: &Call) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }

    fn running(&self) -> Vec<NodeId> {
        let mut running = Vec::new();
        for c in &self.calls {
            match c {
                Call::Start(id) => running.push(*id),
                Call::Stop(id) => running.retain(|r| r != id),
                _ => {}
            }
        }
        running
    }
}

#[derive(Default)]
struct MockBackend {
    record: Rc<RefCell<Record>>,
    now: Rc<RefCell<f64>>,
    fail_open: bool,
    fail_start: Option<NodeId>,
    fail_resume: bool,
    late_failure: Rc<RefCell<Option<AudioError>>>,
}

impl MockBackend {
    fn log(&self, call: Call) {
        self.record.borrow_mut().calls.push(call);
    }
}

impl AudioBackend for MockBackend {
    fn open(&mut self) -> Result<(), AudioError> {
        if self.fail_open {
            return Err(AudioError::Unavailable("no device".into()));
        }
        self.log(Call::Open);
        Ok(())
    }

    fn create_node(&mut self, id: NodeId, _spec: &NodeSpec) -> Result<(), AudioError> {
        self.log(Call::Create(id));
        Ok(())
    }

    fn connect(&mut self, from: NodeId, to: Sink) -> Result<(), AudioError> {
        self.log(Call::Connect(from, to));
        Ok(())
    }

    fn start_source(&mut self, id: NodeId) -> Result<(), AudioError> {
        if self.fail_start == Some(id) {
            return Err(AudioError::SourceStart {
                node: "mock",
                reason: "refused".into(),
            });
        }
        self.log(Call::Start(id));
        Ok(())
    }

    fn stop_source(&mut self, id: NodeId) {
        self.log(Call::Stop(id));
    }

    fn schedule(&mut self, param: ParamRef, envelope: &Envelope) -> Result<(), AudioError> {
        self.log(Call::Schedule(param));
        self.record
            .borrow_mut()
            .schedules
            .push((param, envelope.clone()));
        Ok(())
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        if self.fail_resume {
            return Err(AudioError::Unavailable("resume rejected".into()));
        }
        self.log(Call::Resume);
        Ok(())
    }

    fn current_time(&self) -> f64 {
        *self.now.borrow()
    }

    fn close(&mut self) {
        self.log(Call::Close);
    }

    fn poll_failure(&mut self) -> Option<AudioError> {
        self.late_failure.borrow_mut().take()
    }
}

fn mock() -> (MockBackend, Rc<RefCell<Record>>, Rc<RefCell<f64>>) {
    let backend = MockBackend::default();
    let record = backend.record.clone();
    let now = backend.now.clone();
    (backend, record, now)
}

#[test]
fn construction_is_lazy() {
    let (backend, record, _) = mock();
    let scape = Soundscape::new(backend);
    assert_eq!(scape.state(), AudioState::Uninitialized);
    assert!(record.borrow().calls.is_empty());
    assert_eq!(scape.label(), "Enable immersive audio");
    assert!(scape.state().control_enabled());
}

#[test]
fn engage_builds_starts_and_schedules() {
    let (backend, record, now) = mock();
    *now.borrow_mut() = 1.5;
    let mut scape = Soundscape::new(backend);
    assert_eq!(scape.engage(), Ok(AudioState::Engaged));
    assert_eq!(scape.label(), "Immersive audio active");
    assert!(!scape.state().control_enabled());

    let r = record.borrow();
    assert_eq!(r.calls[0], Call::Open);
    assert_eq!(r.count(&Call::Resume), 1);
    assert_eq!(r.running(), vec![nodes::NOISE, nodes::RESONANCE, nodes::CHIME]);
    assert_eq!(r.schedules.len(), 5);
    assert!(r.schedules.iter().all(|(_, e)| e.origin() == 1.5));
    assert!(r
        .calls
        .contains(&Call::Connect(nodes::MASTER, Sink::Destination)));
}

#[test]
fn engagement_is_idempotent() {
    let (backend, record, now) = mock();
    let mut scape = Soundscape::new(backend);
    scape.engage().unwrap();
    let first = scape.schedule().cloned();
    let calls = record.borrow().calls.len();
    *now.borrow_mut() = 4.0;
    assert_eq!(scape.engage(), Ok(AudioState::Engaged));
    assert_eq!(scape.schedule().cloned(), first);
    assert_eq!(record.borrow().calls.len(), calls);
}

#[test]
fn reaches_steady_after_the_settle_time() {
    let (backend, _, now) = mock();
    *now.borrow_mut() = 2.0;
    let mut scape = Soundscape::new(backend);
    scape.engage().unwrap();
    *now.borrow_mut() = 2.0 + 38.0;
    assert_eq!(scape.update(), AudioState::Engaged);
    *now.borrow_mut() = 2.0 + 39.0;
    assert_eq!(scape.update(), AudioState::Steady);
    assert_eq!(scape.label(), "Immersive audio active");
}

#[test]
fn teardown_stops_everything_and_releases_the_device() {
    let (backend, record, _) = mock();
    let mut scape = Soundscape::new(backend);
    scape.engage().unwrap();
    scape.teardown();
    assert_eq!(scape.state(), AudioState::Disposed);
    {
        let r = record.borrow();
        assert!(r.running().is_empty());
        assert_eq!(r.count(&Call::Close), 1);
    }
    let calls = record.borrow().calls.len();
    scape.teardown();
    assert_eq!(scape.engage(), Ok(AudioState::Disposed));
    drop(scape);
    assert_eq!(record.borrow().calls.len(), calls);
}

#[test]
fn dropping_tears_down() {
    let (backend, record, _) = mock();
    {
        let mut scape = Soundscape::new(backend);
        scape.engage().unwrap();
    }
    let r = record.borrow();
    assert!(r.running().is_empty());
    assert_eq!(r.count(&Call::Close), 1);
}

#[test]
fn partial_construction_failure_stops_started_sources() {
    let (mut backend, record, _) = mock();
    backend.fail_start = Some(nodes::CHIME);
    let mut scape = Soundscape::new(backend);
    assert!(matches!(scape.engage(), Err(AudioError::SourceStart { .. })));
    assert_eq!(scape.state(), AudioState::Unavailable);
    assert_eq!(scape.label(), "Audio unavailable");
    assert!(!scape.state().control_enabled());
    {
        let r = record.borrow();
        assert_eq!(r.count(&Call::Start(nodes::NOISE)), 1);
        assert_eq!(r.count(&Call::Stop(nodes::NOISE)), 1);
        assert_eq!(r.count(&Call::Stop(nodes::RESONANCE)), 1);
        assert!(r.running().is_empty());
        assert_eq!(r.count(&Call::Close), 1);
    }
    // unavailable is terminal
    let calls = record.borrow().calls.len();
    assert_eq!(scape.engage(), Ok(AudioState::Unavailable));
    drop(scape);
    assert_eq!(record.borrow().calls.len(), calls);
}

#[test]
fn missing_device_is_unavailable_without_closing() {
    let (mut backend, record, _) = mock();
    backend.fail_open = true;
    let mut scape = Soundscape::new(backend);
    assert!(matches!(scape.engage(), Err(AudioError::Unavailable(_))));
    assert_eq!(scape.state(), AudioState::Unavailable);
    assert!(record.borrow().calls.is_empty());
}

#[test]
fn resume_failure_releases_the_running_graph() {
    let (mut backend, record, _) = mock();
    backend.fail_resume = true;
    let mut scape = Soundscape::new(backend);
    assert!(scape.engage().is_err());
    assert_eq!(scape.state(), AudioState::Unavailable);
    let r = record.borrow();
    assert!(r.running().is_empty());
    assert_eq!(r.count(&Call::Close), 1);
    assert!(r.schedules.is_empty());
}

#[test]
fn late_failure_is_picked_up_on_update() {
    let (backend, record, _) = mock();
    let late = backend.late_failure.clone();
    let mut scape = Soundscape::new(backend);
    scape.engage().unwrap();
    *late.borrow_mut() = Some(AudioError::Unavailable("suspended".into()));
    assert_eq!(scape.update(), AudioState::Unavailable);
    assert!(record.borrow().running().is_empty());
    assert_eq!(record.borrow().count(&Call::Close), 1);
}

#[test]
fn invalid_graph_never_touches_the_device() {
    let (backend, record, _) = mock();
    let mut graph = AudioNodeGraph::ambient_forest();
    graph.connect(nodes::NOISE, Sink::Destination);
    let mut scape = Soundscape::with_graph(backend, graph);
    assert!(matches!(scape.engage(), Err(AudioError::Config(_))));
    assert!(record.borrow().calls.is_empty());
}
