//! Static description of the ambient forest node graph and its engagement
//! schedule.

use super::envelope::Envelope;
use crate::constants::*;
use crate::error::ConfigError;
use fnv::FnvHashMap;
use smallvec::SmallVec;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Fixed ids of the nodes built by [`AudioNodeGraph::ambient_forest`].
pub mod nodes {
    use super::NodeId;

    pub const NOISE: NodeId = NodeId(0);
    pub const WIND_FILTER: NodeId = NodeId(1);
    pub const WIND_GAIN: NodeId = NodeId(2);
    pub const RESONANCE: NodeId = NodeId(3);
    pub const RESONANCE_GAIN: NodeId = NodeId(4);
    pub const CHIME: NodeId = NodeId(5);
    pub const CHIME_FILTER: NodeId = NodeId(6);
    pub const CHIME_GAIN: NodeId = NodeId(7);
    pub const MASTER: NodeId = NodeId(8);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterMode {
    Bandpass,
    Highpass,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NodeKind {
    /// Looping brown-noise buffer of the given length.
    NoiseLoop { seconds: f32 },
    Oscillator { waveform: Waveform, frequency: f32 },
    Filter { mode: FilterMode, frequency: f32, q: f32 },
    Gain { gain: f32 },
}

impl NodeKind {
    pub fn is_source(&self) -> bool {
        matches!(self, NodeKind::NoiseLoop { .. } | NodeKind::Oscillator { .. })
    }

    /// Initial value of `param`, if this node has it.
    pub fn param(&self, param: ParamKind) -> Option<f32> {
        match (self, param) {
            (NodeKind::Gain { gain }, ParamKind::Gain) => Some(*gain),
            (NodeKind::Oscillator { frequency, .. }, ParamKind::Frequency)
            | (NodeKind::Filter { frequency, .. }, ParamKind::Frequency) => Some(*frequency),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeRole {
    Source,
    Processor,
    /// The single node allowed to reach the device output.
    Master,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeSpec {
    pub label: &'static str,
    pub role: NodeRole,
    pub kind: NodeKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sink {
    Node(NodeId),
    Destination,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Gain,
    Frequency,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ParamRef {
    pub node: NodeId,
    pub param: ParamKind,
}

impl ParamRef {
    pub const fn gain(node: NodeId) -> Self {
        Self {
            node,
            param: ParamKind::Gain,
        }
    }

    pub const fn frequency(node: NodeId) -> Self {
        Self {
            node,
            param: ParamKind::Frequency,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AudioNodeGraph {
    nodes: Vec<NodeSpec>,
    edges: Vec<(NodeId, Sink)>,
}

impl AudioNodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, label: &'static str, role: NodeRole, kind: NodeKind) -> NodeId {
        self.nodes.push(NodeSpec { label, role, kind });
        NodeId(self.nodes.len() - 1)
    }

    pub fn connect(&mut self, from: NodeId, to: Sink) {
        self.edges.push((from, to));
    }

    /// Noise bed through a bandpass, a low sine resonance and a filtered
    /// triangle chime, all summed into one master gain.
    pub fn ambient_forest() -> Self {
        let mut g = Self::new();
        let noise = g.add(
            "noise",
            NodeRole::Source,
            NodeKind::NoiseLoop {
                seconds: NOISE_SECONDS,
            },
        );
        let wind_filter = g.add(
            "wind_filter",
            NodeRole::Processor,
            NodeKind::Filter {
                mode: FilterMode::Bandpass,
                frequency: WIND_FILTER_HZ,
                q: WIND_FILTER_Q,
            },
        );
        let wind_gain = g.add("wind_gain", NodeRole::Processor, NodeKind::Gain { gain: WIND_GAIN });
        let resonance = g.add(
            "resonance",
            NodeRole::Source,
            NodeKind::Oscillator {
                waveform: Waveform::Sine,
                frequency: RESONANCE_HZ,
            },
        );
        let resonance_gain = g.add("resonance_gain", NodeRole::Processor, NodeKind::Gain { gain: 0.0 });
        let chime = g.add(
            "chime",
            NodeRole::Source,
            NodeKind::Oscillator {
                waveform: Waveform::Triangle,
                frequency: CHIME_HZ,
            },
        );
        let chime_filter = g.add(
            "chime_filter",
            NodeRole::Processor,
            NodeKind::Filter {
                mode: FilterMode::Highpass,
                frequency: CHIME_HIGHPASS_HZ,
                q: CHIME_HIGHPASS_Q,
            },
        );
        let chime_gain = g.add("chime_gain", NodeRole::Processor, NodeKind::Gain { gain: 0.0 });
        let master = g.add("master", NodeRole::Master, NodeKind::Gain { gain: 0.0 });
        debug_assert_eq!(master, nodes::MASTER);

        g.connect(noise, Sink::Node(wind_filter));
        g.connect(wind_filter, Sink::Node(wind_gain));
        g.connect(wind_gain, Sink::Node(master));
        g.connect(resonance, Sink::Node(resonance_gain));
        g.connect(resonance_gain, Sink::Node(master));
        g.connect(chime, Sink::Node(chime_filter));
        g.connect(chime_filter, Sink::Node(chime_gain));
        g.connect(chime_gain, Sink::Node(master));
        g.connect(master, Sink::Destination);
        g
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &NodeSpec)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeSpec> {
        self.nodes.get(id.0)
    }

    pub fn edges(&self) -> &[(NodeId, Sink)] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn sources(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes()
            .filter(|(_, n)| n.kind.is_source())
            .map(|(id, _)| id)
    }

    pub fn master(&self) -> Option<NodeId> {
        self.nodes()
            .find(|(_, n)| n.role == NodeRole::Master)
            .map(|(id, _)| id)
    }

    /// Initial value of a parameter as declared on its node.
    pub fn param_value(&self, param: ParamRef) -> Option<f32> {
        self.node(param.node).and_then(|n| n.kind.param(param.param))
    }

    fn label(&self, id: NodeId) -> &'static str {
        self.node(id).map(|n| n.label).unwrap_or("?")
    }

    /// Node indices in an order where every node follows all of its inputs.
    pub fn topological_order(&self) -> Result<Vec<NodeId>, ConfigError> {
        let n = self.nodes.len();
        let mut indegree = vec![0usize; n];
        let mut outputs: Vec<SmallVec<[usize; 2]>> = vec![SmallVec::new(); n];
        for &(from, to) in &self.edges {
            if from.0 >= n {
                return Err(ConfigError::AudioGraph(format!("edge from unknown node {}", from.0)));
            }
            if let Sink::Node(to) = to {
                if to.0 >= n {
                    return Err(ConfigError::AudioGraph(format!("edge to unknown node {}", to.0)));
                }
                outputs[from.0].push(to.0);
                indegree[to.0] += 1;
            }
        }
        let mut ready: Vec<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);
        while let Some(i) = ready.pop() {
            order.push(NodeId(i));
            for &o in &outputs[i] {
                indegree[o] -= 1;
                if indegree[o] == 0 {
                    ready.push(o);
                }
            }
        }
        if order.len() != n {
            return Err(ConfigError::AudioGraph("graph contains a cycle".into()));
        }
        Ok(order)
    }

    /// Exactly one master, only the master feeds the destination, no cycles,
    /// sources have no inputs and every node reaches the master.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let masters: SmallVec<[NodeId; 2]> = self
            .nodes()
            .filter(|(_, n)| n.role == NodeRole::Master)
            .map(|(id, _)| id)
            .collect();
        let master = match masters.as_slice() {
            [m] => *m,
            other => {
                return Err(ConfigError::AudioGraph(format!(
                    "expected exactly one master, found {}",
                    other.len()
                )))
            }
        };
        for (id, node) in self.nodes() {
            let declared_source = node.role == NodeRole::Source;
            if declared_source != node.kind.is_source() {
                return Err(ConfigError::AudioGraph(format!(
                    "`{}` role does not match its kind",
                    node.label
                )));
            }
            if node.role == NodeRole::Master && !matches!(node.kind, NodeKind::Gain { .. }) {
                return Err(ConfigError::AudioGraph("master must be a gain node".into()));
            }
            if !node.kind.is_source() {
                continue;
            }
            if self.edges.iter().any(|&(_, to)| to == Sink::Node(id)) {
                return Err(ConfigError::AudioGraph(format!(
                    "source `{}` cannot take inputs",
                    node.label
                )));
            }
        }
        let mut reaches_destination = false;
        for &(from, to) in &self.edges {
            if to == Sink::Destination {
                if from != master {
                    return Err(ConfigError::AudioGraph(format!(
                        "`{}` connects to the destination directly",
                        self.label(from)
                    )));
                }
                reaches_destination = true;
            }
        }
        if !reaches_destination {
            return Err(ConfigError::AudioGraph("master is not connected to the destination".into()));
        }

        let order = self.topological_order()?;
        // walk back-to-front so every node's outputs are resolved first
        let mut reaches: FnvHashMap<NodeId, bool> = FnvHashMap::default();
        for &id in order.iter().rev() {
            let ok = id == master
                || self.edges.iter().any(|&(from, to)| {
                    from == id && matches!(to, Sink::Node(t) if reaches.get(&t).copied().unwrap_or(false))
                });
            if !ok {
                return Err(ConfigError::AudioGraph(format!(
                    "`{}` does not reach the master",
                    self.label(id)
                )));
            }
            reaches.insert(id, ok);
        }
        Ok(())
    }

    /// Envelopes applied when the listener engages at `t0`.
    pub fn engagement_schedule(&self, t0: f64) -> Result<EngagementSchedule, ConfigError> {
        let held = |param: ParamRef| {
            self.param_value(param).ok_or_else(|| {
                ConfigError::AudioGraph(format!("`{}` has no {:?} parameter", self.label(param.node), param.param))
            })
        };
        let master = ParamRef::gain(self.master().unwrap_or(nodes::MASTER));
        let resonance = ParamRef::gain(nodes::RESONANCE_GAIN);
        let wind_filter = ParamRef::frequency(nodes::WIND_FILTER);
        let wind_gain = ParamRef::gain(nodes::WIND_GAIN);
        let chime = ParamRef::gain(nodes::CHIME_GAIN);

        let entries = vec![
            ScheduledParam {
                label: "master",
                target: master,
                envelope: Envelope::new(held(master)?, t0).linear_ramp(MASTER_TARGET, t0 + 6.0),
            },
            ScheduledParam {
                label: "resonance",
                target: resonance,
                envelope: Envelope::new(held(resonance)?, t0)
                    .linear_ramp(0.1, t0 + 8.0)
                    .approach(0.03, t0 + 12.0, 5.0),
            },
            ScheduledParam {
                label: "wind_filter",
                target: wind_filter,
                envelope: Envelope::new(held(wind_filter)?, t0)
                    .approach(360.0, t0, 4.0)
                    .approach(260.0, t0 + 9.0, 6.0),
            },
            ScheduledParam {
                label: "wind_gain",
                target: wind_gain,
                envelope: Envelope::new(held(wind_gain)?, t0)
                    .approach(WIND_GAIN, t0, 5.0)
                    .approach(0.18, t0 + 6.0, 6.0),
            },
            ScheduledParam {
                label: "chime",
                target: chime,
                envelope: Envelope::new(held(chime)?, t0)
                    .linear_ramp(0.02, t0 + 4.0)
                    .approach(0.006, t0 + 9.0, 6.0),
            },
        ];
        for entry in &entries {
            entry.envelope.validate(entry.label)?;
        }
        Ok(EngagementSchedule { origin: t0, entries })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScheduledParam {
    pub label: &'static str,
    pub target: ParamRef,
    pub envelope: Envelope,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EngagementSchedule {
    origin: f64,
    entries: Vec<ScheduledParam>,
}

impl EngagementSchedule {
    pub fn origin(&self) -> f64 {
        self.origin
    }

    pub fn entries(&self) -> &[ScheduledParam] {
        &self.entries
    }

    pub fn get(&self, label: &str) -> Option<&ScheduledParam> {
        self.entries.iter().find(|e| e.label == label)
    }

    /// Value of the labelled parameter at absolute time `t`.
    pub fn value_at(&self, label: &str, t: f64) -> Option<f32> {
        self.get(label).map(|e| e.envelope.evaluate(t))
    }

    pub fn settle_time(&self) -> f64 {
        self.entries
            .iter()
            .map(|e| e.envelope.settle_time())
            .fold(0.0, f64::max)
    }

    pub fn is_steady(&self, t: f64) -> bool {
        t >= self.origin + self.settle_time()
    }
}
