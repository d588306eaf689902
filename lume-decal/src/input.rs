use glam::Vec2;

use crate::settings::ParamKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Down,
    Up,
}

/// Sun controls: direction components and overall irradiance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LightParam {
    DirectionX,
    DirectionY,
    DirectionZ,
    Irradiance,
}

/// Movement axes in [-1, 1] plus accumulated mouse and wheel deltas.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CameraInput {
    pub forward: f32,
    pub right: f32,
    pub look: Vec2,
    pub scroll: f32,
}

/// Everything the frame logic consumes from the windowing side, once per frame.
/// Edge-triggered fields are true for exactly one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameInput {
    pub delta_time: f32,
    pub clicked: bool,
    pub held: Vec<(ParamKind, Direction)>,
    pub light: Vec<(LightParam, Direction)>,
    pub next_kind: bool,
    pub next_decal: bool,
    pub reset_params: bool,
    pub toggle_cursor_decal: bool,
    pub toggle_all_decals: bool,
    pub camera: CameraInput,
}
