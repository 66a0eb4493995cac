//! Web Audio implementation of the soundscape backend.

use forest_core::audio::{
    brown_noise, AudioBackend, Envelope, FilterMode, NodeId, NodeKind, NodeSpec, ParamKind,
    ParamRef, Sink, Waveform,
};
use forest_core::constants::BREAKPOINT_SPACING_SEC;
use forest_core::AudioError;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys as web;

enum WebNode {
    Noise(web::AudioBufferSourceNode),
    Osc(web::OscillatorNode),
    Filter(web::BiquadFilterNode),
    Gain(web::GainNode),
}

impl WebNode {
    fn audio_node(&self) -> &web::AudioNode {
        match self {
            WebNode::Noise(n) => n,
            WebNode::Osc(n) => n,
            WebNode::Filter(n) => n,
            WebNode::Gain(n) => n,
        }
    }

    fn source(&self) -> Option<&web::AudioScheduledSourceNode> {
        match self {
            WebNode::Noise(n) => Some(n),
            WebNode::Osc(n) => Some(n),
            WebNode::Filter(_) | WebNode::Gain(_) => None,
        }
    }

    fn param(&self, kind: ParamKind) -> Option<web::AudioParam> {
        match (self, kind) {
            (WebNode::Gain(n), ParamKind::Gain) => Some(n.gain()),
            (WebNode::Osc(n), ParamKind::Frequency) => Some(n.frequency()),
            (WebNode::Filter(n), ParamKind::Frequency) => Some(n.frequency()),
            _ => None,
        }
    }
}

fn create_gain(
    audio_ctx: &web::AudioContext,
    value: f32,
    label: &'static str,
) -> Result<web::GainNode, AudioError> {
    match web::GainNode::new(audio_ctx) {
        Ok(g) => {
            g.gain().set_value(value);
            Ok(g)
        }
        Err(e) => {
            log::error!("{} GainNode error: {:?}", label, e);
            Err(AudioError::NodeCreation {
                node: label,
                reason: format!("{:?}", e),
            })
        }
    }
}

fn create_noise_loop(
    audio_ctx: &web::AudioContext,
    seconds: f32,
    label: &'static str,
) -> Result<web::AudioBufferSourceNode, AudioError> {
    let fail = |e: wasm_bindgen::JsValue| AudioError::NodeCreation {
        node: label,
        reason: format!("{:?}", e),
    };
    let sr = audio_ctx.sample_rate();
    let len = ((sr * seconds) as u32).max(1);
    let buffer = audio_ctx.create_buffer(1, len, sr).map_err(fail)?;
    let mut data = brown_noise(len as usize, &mut rand::thread_rng());
    buffer.copy_to_channel(&mut data, 0).map_err(fail)?;
    let src = audio_ctx.create_buffer_source().map_err(fail)?;
    src.set_buffer(Some(&buffer));
    src.set_loop(true);
    Ok(src)
}

/// Owns the `AudioContext` and one Web Audio node per graph node.
pub struct WebAudioBackend {
    ctx: Option<web::AudioContext>,
    nodes: Vec<Option<(&'static str, WebNode)>>,
    // written by the resume promise
    failure: Rc<RefCell<Option<AudioError>>>,
}

impl Default for WebAudioBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl WebAudioBackend {
    pub fn new() -> Self {
        Self {
            ctx: None,
            nodes: Vec::new(),
            failure: Rc::new(RefCell::new(None)),
        }
    }

    fn ctx(&self) -> Result<&web::AudioContext, AudioError> {
        self.ctx
            .as_ref()
            .ok_or_else(|| AudioError::Unavailable("audio context not open".into()))
    }

    fn node(&self, id: NodeId) -> Option<(&'static str, &WebNode)> {
        self.nodes
            .get(id.0)
            .and_then(|n| n.as_ref())
            .map(|(label, node)| (*label, node))
    }
}

impl AudioBackend for WebAudioBackend {
    fn open(&mut self) -> Result<(), AudioError> {
        let ctx = web::AudioContext::new()
            .map_err(|e| AudioError::Unavailable(format!("AudioContext error: {:?}", e)))?;
        log::info!("AudioContext open at {} Hz", ctx.sample_rate());
        self.ctx = Some(ctx);
        Ok(())
    }

    fn create_node(&mut self, id: NodeId, spec: &NodeSpec) -> Result<(), AudioError> {
        let ctx = self.ctx()?;
        let fail = |e: wasm_bindgen::JsValue| AudioError::NodeCreation {
            node: spec.label,
            reason: format!("{:?}", e),
        };
        let node = match spec.kind {
            NodeKind::NoiseLoop { seconds } => WebNode::Noise(create_noise_loop(ctx, seconds, spec.label)?),
            NodeKind::Oscillator { waveform, frequency } => {
                let osc = web::OscillatorNode::new(ctx).map_err(fail)?;
                osc.set_type(match waveform {
                    Waveform::Sine => web::OscillatorType::Sine,
                    Waveform::Triangle => web::OscillatorType::Triangle,
                });
                osc.frequency().set_value(frequency);
                WebNode::Osc(osc)
            }
            NodeKind::Filter { mode, frequency, q } => {
                let filter = web::BiquadFilterNode::new(ctx).map_err(fail)?;
                filter.set_type(match mode {
                    FilterMode::Bandpass => web::BiquadFilterType::Bandpass,
                    FilterMode::Highpass => web::BiquadFilterType::Highpass,
                });
                filter.frequency().set_value(frequency);
                filter.q().set_value(q);
                WebNode::Filter(filter)
            }
            NodeKind::Gain { gain } => WebNode::Gain(create_gain(ctx, gain, spec.label)?),
        };
        if self.nodes.len() <= id.0 {
            self.nodes.resize_with(id.0 + 1, || None);
        }
        self.nodes[id.0] = Some((spec.label, node));
        Ok(())
    }

    fn connect(&mut self, from: NodeId, to: Sink) -> Result<(), AudioError> {
        let ctx = self.ctx()?;
        let (label, src) = self.node(from).ok_or_else(|| AudioError::Connection {
            from: "?",
            reason: format!("unknown node {}", from.0),
        })?;
        let result = match to {
            Sink::Node(target) => {
                let (_, dst) = self.node(target).ok_or_else(|| AudioError::Connection {
                    from: label,
                    reason: format!("unknown target {}", target.0),
                })?;
                src.audio_node().connect_with_audio_node(dst.audio_node())
            }
            Sink::Destination => src.audio_node().connect_with_audio_node(&ctx.destination()),
        };
        result.map(|_| ()).map_err(|e| AudioError::Connection {
            from: label,
            reason: format!("{:?}", e),
        })
    }

    fn start_source(&mut self, id: NodeId) -> Result<(), AudioError> {
        let (label, node) = self.node(id).ok_or_else(|| AudioError::SourceStart {
            node: "?",
            reason: format!("unknown node {}", id.0),
        })?;
        let src = node.source().ok_or_else(|| AudioError::SourceStart {
            node: label,
            reason: "not a source".into(),
        })?;
        src.start().map_err(|e| AudioError::SourceStart {
            node: label,
            reason: format!("{:?}", e),
        })
    }

    fn stop_source(&mut self, id: NodeId) {
        if let Some((_, node)) = self.node(id) {
            if let Some(src) = node.source() {
                let _ = src.stop();
            }
            let _ = node.audio_node().disconnect();
        }
    }

    /// Cancel from the origin, pin the start value, then replay the curve as
    /// linear ramps between breakpoints.
    fn schedule(&mut self, param: ParamRef, envelope: &Envelope) -> Result<(), AudioError> {
        let (label, node) = self
            .node(param.node)
            .ok_or_else(|| AudioError::Schedule(format!("unknown node {}", param.node.0)))?;
        let target = node
            .param(param.param)
            .ok_or_else(|| AudioError::Schedule(format!("`{}` has no {:?} parameter", label, param.param)))?;
        let fail = |e: wasm_bindgen::JsValue| AudioError::Schedule(format!("{}: {:?}", label, e));
        target.cancel_scheduled_values(envelope.origin()).map_err(fail)?;
        let points = envelope.breakpoints(BREAKPOINT_SPACING_SEC);
        let mut iter = points.iter();
        if let Some(&(t, v)) = iter.next() {
            target.set_value_at_time(v, t).map_err(fail)?;
        }
        for &(t, v) in iter {
            target.linear_ramp_to_value_at_time(v, t).map_err(fail)?;
        }
        log::debug!("{}: {} breakpoints", label, points.len());
        Ok(())
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        let promise = self
            .ctx()?
            .resume()
            .map_err(|e| AudioError::Unavailable(format!("resume error: {:?}", e)))?;
        let failure = self.failure.clone();
        spawn_local(async move {
            if let Err(e) = JsFuture::from(promise).await {
                log::error!("AudioContext resume rejected: {:?}", e);
                *failure.borrow_mut() = Some(AudioError::Unavailable(format!("resume rejected: {:?}", e)));
            }
        });
        Ok(())
    }

    fn current_time(&self) -> f64 {
        self.ctx.as_ref().map(|c| c.current_time()).unwrap_or(0.0)
    }

    fn close(&mut self) {
        for (_, node) in self.nodes.drain(..).flatten() {
            let _ = node.audio_node().disconnect();
        }
        if let Some(ctx) = self.ctx.take() {
            let _ = ctx.close();
            log::info!("AudioContext closed");
        }
    }

    fn poll_failure(&mut self) -> Option<AudioError> {
        self.failure.borrow_mut().take()
    }
}
