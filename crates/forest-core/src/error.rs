use thiserror::Error;

/// Problems detected while validating scene or audio configuration.
///
/// Every variant is raised at construction time; the per-frame path never
/// produces one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("population `{population}` must have a positive count")]
    EmptyPopulation { population: &'static str },
    #[error("`{field}` must be finite, got {value}")]
    NonFinite { field: &'static str, value: f32 },
    #[error("`{field}` range is inverted: {min} > {max}")]
    InvertedRange {
        field: &'static str,
        min: f32,
        max: f32,
    },
    #[error("`{field}` must be positive, got {value}")]
    NonPositive { field: &'static str, value: f32 },
    #[error("malformed color `{value}` (expected #rrggbb)")]
    MalformedColor { value: String },
    #[error("dust bounds invalid: {0}")]
    DustBounds(String),
    #[error("post chain out of order: `{stage}` after a screen-space pass")]
    PostOrder { stage: &'static str },
    #[error("envelope for `{param}` is invalid: {reason}")]
    Envelope { param: String, reason: String },
    #[error("audio graph invalid: {0}")]
    AudioGraph(String),
    #[error("rig `{rig}`: part `{part}` names unknown parent `{parent}`")]
    UnknownRigParent {
        rig: &'static str,
        part: &'static str,
        parent: &'static str,
    },
}

/// Failures talking to an audio device.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AudioError {
    #[error("audio device unavailable: {0}")]
    Unavailable(String),
    #[error("creating node `{node}` failed: {reason}")]
    NodeCreation { node: &'static str, reason: String },
    #[error("connecting `{from}` failed: {reason}")]
    Connection { from: &'static str, reason: String },
    #[error("starting source `{node}` failed: {reason}")]
    SourceStart { node: &'static str, reason: String },
    #[error("scheduling automation failed: {0}")]
    Schedule(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
