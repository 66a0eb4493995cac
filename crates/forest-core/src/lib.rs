pub mod audio;
pub mod camera;
pub mod clock;
pub mod config;
pub mod constants;
pub mod dust;
pub mod error;
pub mod foliage;
pub mod geometry;
pub mod instance;
pub mod lighting;
pub mod material;
pub mod rig;
pub mod sampler;
pub mod scene;

pub use camera::{Camera, CameraPose, DollyCamera};
pub use clock::FrameClock;
pub use config::{SceneConfig, SeedSource, Span};
pub use error::{AudioError, ConfigError};
pub use geometry::{MeshData, Shape};
pub use instance::{DrawBatch, InstanceRaw, Transform};
pub use lighting::{LightRig, PostChain, PostStage, ShaftAnchor};
pub use material::Material;
pub use scene::{ForestScene, PopulationCounts, RenderGraph};
