pub mod camera;
pub mod cluster;
pub mod config;
pub mod frame;
pub mod input;
pub mod obb;
pub mod partition;
pub mod pick;
pub mod settings;
pub mod shaders;
pub mod state;
pub mod store;
pub mod types;
pub mod visibility;

/// Capacity of the decal ring buffer, and the number of bits in a cluster cell.
pub const N_MAX_STORED_DECALS: usize = 64;
/// Depth slices of the cluster grid.
pub const NUM_Z_TILES: u32 = 16;
/// Screen-space edge of a cluster tile in pixels.
pub const TILE_SIZE: u32 = 16;
/// Bitmask words per cluster cell.
pub const CLUSTER_WORDS_PER_CELL: u32 = (N_MAX_STORED_DECALS as u32).div_ceil(32);
/// Swapchain images requested, and therefore per-frame buffer slots.
pub const FRAMES_IN_FLIGHT: usize = 3;
/// Per-slot stride granularity inside frame-buffered allocations.
pub const UNIFORM_ALIGNMENT: u64 = 256;

pub use camera::{CameraState, FlyCamera};
pub use cluster::{ClusterBuilder, ClusterGridLayout, ClusterPass};
pub use config::{ConfigError, DecalConfig, ViewerConfig};
pub use frame::{FrameOrchestrator, FrameStages, ShadingInputs};
pub use input::FrameInput;
pub use obb::Obb;
pub use partition::IndexPartition;
pub use pick::{PickController, PickState};
pub use settings::{DecalSettings, LightSettings, ParamKind};
pub use state::{FrameState, RecordedCounts};
pub use store::DecalStore;
pub use types::{CursorPreview, DecalRecord, GpuDecal, PickResult, ZBounds};
pub use visibility::{Visibility, VisibilityClassifier};
