// Host-side tests for the software synthesizer, rendered offline.

use forest_core::audio::{
    brown_noise, nodes, AudioNodeGraph, Envelope, FilterMode, NodeId, NodeKind, NodeRole, NodeSpec,
    Osc, ParamRef, Sink, Svf, Synth, Waveform,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

const SR: f32 = 48_000.0;

fn build(graph: &AudioNodeGraph) -> Synth {
    let mut synth = Synth::with_rng(SR, StdRng::seed_from_u64(99));
    for (id, spec) in graph.nodes() {
        synth.add_node(id, spec).unwrap();
    }
    for &(from, to) in graph.edges() {
        synth.connect(from, to).unwrap();
    }
    for id in graph.sources() {
        synth.start(id).unwrap();
    }
    synth
}

fn rms(block: &[f32]) -> f32 {
    (block.iter().map(|s| s * s).sum::<f32>() / block.len() as f32).sqrt()
}

#[test]
fn brown_noise_is_bounded_and_not_silent() {
    let buf = brown_noise(96_000, &mut StdRng::seed_from_u64(5));
    assert_eq!(buf.len(), 96_000);
    // |b| can never exceed 0.02 / 0.02 = 1 before the 0.6 output gain
    assert!(buf.iter().all(|s| s.abs() <= 0.6));
    assert!(rms(&buf) > 1e-3);
}

#[test]
fn oscillators_stay_in_range() {
    let mut osc = Osc::default();
    for _ in 0..10_000 {
        let s = osc.next(Waveform::Triangle, 1024.0, SR);
        assert!((-1.0..=1.0).contains(&s));
    }
    let mut osc = Osc::default();
    assert_eq!(osc.next(Waveform::Sine, 172.0, SR), 0.0);
}

#[test]
fn highpass_blocks_dc() {
    let mut svf = Svf::default();
    let mut y = 1.0;
    for _ in 0..48_000 {
        y = svf.process(1.0, 850.0, 1.6, SR, FilterMode::Highpass);
    }
    assert!(y.abs() < 1e-3, "y={}", y);
}

#[test]
fn bandpass_passes_its_centre_at_unity() {
    let mut svf = Svf::default();
    let mut osc = Osc::default();
    let mut out = Vec::new();
    for i in 0..48_000 {
        let x = osc.next(Waveform::Sine, 320.0, SR);
        let y = svf.process(x, 320.0, 0.8, SR, FilterMode::Bandpass);
        if i >= 24_000 {
            out.push(y);
        }
    }
    let gain = rms(&out) / std::f32::consts::FRAC_1_SQRT_2;
    assert!((gain - 1.0).abs() < 0.05, "gain={}", gain);
}

#[test]
fn silent_until_engaged() {
    let mut synth = build(&AudioNodeGraph::ambient_forest());
    let mut block = vec![1.0; 4_800];
    synth.render(&mut block);
    assert!(block.iter().all(|&s| s == 0.0));
    assert!((synth.time() - 0.1).abs() < 1e-9);
}

#[test]
fn master_envelope_fades_audio_in() {
    let graph = AudioNodeGraph::ambient_forest();
    let mut synth = build(&graph);
    let schedule = graph.engagement_schedule(synth.time()).unwrap();
    for entry in schedule.entries() {
        synth.set_envelope(entry.target, entry.envelope.clone()).unwrap();
    }
    let mut early = vec![0.0; 4_800];
    synth.render(&mut early);
    let mut skip = vec![0.0; 48_000 * 6];
    synth.render(&mut skip);
    let mut late = vec![0.0; 48_000];
    synth.render(&mut late);
    assert!(rms(&late) > rms(&early) * 4.0, "{} vs {}", rms(&late), rms(&early));
    assert!(late.iter().all(|s| s.is_finite() && s.abs() < 1.0));
    let master = synth.param(ParamRef::gain(nodes::MASTER)).unwrap();
    assert!((master - 0.7).abs() < 1e-6);
}

#[test]
fn stopped_sources_go_quiet_for_good() {
    let mut graph = AudioNodeGraph::new();
    let osc = graph.add(
        "tone",
        NodeRole::Source,
        NodeKind::Oscillator {
            waveform: Waveform::Sine,
            frequency: 440.0,
        },
    );
    let master = graph.add("master", NodeRole::Master, NodeKind::Gain { gain: 1.0 });
    graph.connect(osc, Sink::Node(master));
    graph.connect(master, Sink::Destination);
    let mut synth = build(&graph);
    let mut block = vec![0.0; 480];
    synth.render(&mut block);
    assert!(rms(&block) > 0.5);
    assert_eq!(synth.running_sources(), 1);

    synth.stop(osc);
    synth.render(&mut block);
    assert!(block.iter().all(|&s| s == 0.0));
    assert_eq!(synth.running_sources(), 0);
    assert!(synth.start(osc).is_err());
}

#[test]
fn nodes_must_arrive_in_order() {
    let mut synth = Synth::new(SR);
    let spec = NodeSpec {
        label: "gain",
        role: NodeRole::Processor,
        kind: NodeKind::Gain { gain: 1.0 },
    };
    assert!(synth.add_node(NodeId(3), &spec).is_err());
    assert!(synth.add_node(NodeId(0), &spec).is_ok());
}

#[test]
fn envelopes_need_a_matching_param() {
    let mut synth = build(&AudioNodeGraph::ambient_forest());
    let env = Envelope::new(0.0, 0.0).linear_ramp(1.0, 1.0);
    assert!(synth.set_envelope(ParamRef::gain(nodes::NOISE), env.clone()).is_err());
    assert!(synth.set_envelope(ParamRef::frequency(nodes::CHIME), env).is_ok());
}
