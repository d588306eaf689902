use glam::{Vec3, Vec4};
use log::debug;

use crate::config::{DecalConfig, ParamRange};
use crate::input::{Direction, FrameInput, LightParam};
use crate::types::{CursorPreview, CursorUniform, LightUniform};

/// A clamped scalar swept by held keys.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Param {
    pub value: f32,
    pub init: f32,
    pub min: f32,
    pub max: f32,
    /// Units per second.
    pub speed: f32,
}

impl Param {
    pub fn new(range: ParamRange) -> Self {
        let sweep = if range.sweep_seconds > 0.0 { range.sweep_seconds } else { 5.0 };
        Self {
            value: range.init.clamp(range.min, range.max),
            init: range.init,
            min: range.min,
            max: range.max,
            speed: (range.max - range.min) / sweep,
        }
    }

    pub fn up(&mut self, dt: f32) {
        self.value = (self.value + self.speed * dt).min(self.max);
    }

    pub fn down(&mut self, dt: f32) {
        self.value = (self.value - self.speed * dt).max(self.min);
    }

    pub fn step(&mut self, direction: Direction, dt: f32) {
        match direction {
            Direction::Up => self.up(dt),
            Direction::Down => self.down(dt),
        }
    }

    pub fn reset(&mut self) {
        self.value = self.init.clamp(self.min, self.max);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Width,
    Height,
    Thickness,
    Rotation,
    AngleFade,
    Intensity,
    Albedo,
}

impl ParamKind {
    pub const ALL: [ParamKind; 7] = [
        ParamKind::Width,
        ParamKind::Height,
        ParamKind::Thickness,
        ParamKind::Rotation,
        ParamKind::AngleFade,
        ParamKind::Intensity,
        ParamKind::Albedo,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// The decal the user is about to place.
#[derive(Clone, Debug)]
pub struct DecalSettings {
    params: [Param; 7],
    pub kind: u32,
    pub id: u32,
    pub kind_count: u32,
    pub decals_per_kind: u32,
    pub show_cursor_decal: bool,
    pub show_all_decals: bool,
}

impl DecalSettings {
    pub fn new(config: &DecalConfig) -> Self {
        let range = |kind: ParamKind| match kind {
            ParamKind::Width => config.width,
            ParamKind::Height => config.height,
            ParamKind::Thickness => config.thickness,
            ParamKind::Rotation => config.rotation,
            ParamKind::AngleFade => config.angle_fade,
            ParamKind::Intensity => config.intensity,
            ParamKind::Albedo => config.albedo,
        };

        Self {
            params: ParamKind::ALL.map(|kind| Param::new(range(kind))),
            kind: 0,
            id: 0,
            kind_count: config.kind_count.max(1),
            decals_per_kind: config.decals_per_kind.max(1),
            show_cursor_decal: true,
            show_all_decals: true,
        }
    }

    pub fn param(&self, kind: ParamKind) -> &Param {
        &self.params[kind.index()]
    }

    pub fn param_mut(&mut self, kind: ParamKind) -> &mut Param {
        &mut self.params[kind.index()]
    }

    pub fn reset_params(&mut self) {
        self.params.iter_mut().for_each(Param::reset);
    }

    pub fn next_kind(&mut self) {
        self.kind = (self.kind + 1) % self.kind_count;
        self.id = 0;
        self.reset_params();
        debug!("Decal kind {} selected", self.kind);
    }

    pub fn next_decal(&mut self) {
        self.id = (self.id + 1) % self.decals_per_kind;
        self.reset_params();
        debug!("Decal {} of kind {} selected", self.id, self.kind);
    }

    /// Applies held keys and discrete triggers for one frame.
    pub fn apply(&mut self, input: &FrameInput) {
        if input.next_kind {
            self.next_kind();
        }
        if input.next_decal {
            self.next_decal();
        }
        if input.reset_params {
            self.reset_params();
        }
        if input.toggle_cursor_decal {
            self.show_cursor_decal = !self.show_cursor_decal;
        }
        if input.toggle_all_decals {
            self.show_all_decals = !self.show_all_decals;
        }
        for &(kind, direction) in &input.held {
            self.param_mut(kind).step(direction, input.delta_time);
        }
    }

    /// Texture array layer shared by the albedo and normal maps of the selection.
    pub fn texture_index(&self) -> u32 {
        self.kind * self.decals_per_kind + self.id
    }

    pub fn cursor_preview(&self) -> CursorPreview {
        let value = |kind| self.param(kind).value;
        CursorPreview {
            size: Vec3::new(value(ParamKind::Width), value(ParamKind::Height), value(ParamKind::Thickness)),
            rotation: value(ParamKind::Rotation),
            angle_fade: value(ParamKind::AngleFade),
            albedo: value(ParamKind::Albedo),
            intensity: value(ParamKind::Intensity),
            albedo_index: self.texture_index(),
            normal_index: self.texture_index(),
        }
    }

    pub fn cursor_uniform(&self) -> CursorUniform {
        self.cursor_preview().to_uniform(self.show_cursor_decal, self.show_all_decals)
    }
}

#[derive(Clone, Debug)]
pub struct LightSettings {
    direction: [Param; 3],
    irradiance: Param,
    color: Vec3,
}

impl Default for LightSettings {
    fn default() -> Self {
        let axis = |init| Param::new(ParamRange::new(-1.0, init, 1.0));
        Self {
            direction: [axis(0.3), axis(-1.0), axis(-0.4)],
            irradiance: Param::new(ParamRange::new(0.0, 3.0, 10.0)),
            color: Vec3::new(1.0, 0.96, 0.9),
        }
    }
}

impl LightSettings {
    pub fn apply(&mut self, input: &FrameInput) {
        for &(param, direction) in &input.light {
            let target = match param {
                LightParam::DirectionX => &mut self.direction[0],
                LightParam::DirectionY => &mut self.direction[1],
                LightParam::DirectionZ => &mut self.direction[2],
                LightParam::Irradiance => &mut self.irradiance,
            };
            target.step(direction, input.delta_time);
        }
    }

    /// Direction the light travels, normalized. Falls back to straight down.
    pub fn sun_direction(&self) -> Vec3 {
        Vec3::new(self.direction[0].value, self.direction[1].value, self.direction[2].value)
            .try_normalize()
            .unwrap_or(-Vec3::Y)
    }

    pub fn uniform(&self) -> LightUniform {
        LightUniform {
            sun_direction: self.sun_direction().extend(0.0),
            irradiance: Vec4::from((self.color * self.irradiance.value, 1.0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_sweeps_full_range_in_sweep_time() {
        let mut param = Param::new(ParamRange::new(0.0, 0.0, 10.0));
        assert_eq!(param.speed, 2.0);
        param.up(2.5);
        assert_eq!(param.value, 5.0);
        param.up(100.0);
        assert_eq!(param.value, 10.0);
        param.down(100.0);
        assert_eq!(param.value, 0.0);
        param.value = 7.0;
        param.reset();
        assert_eq!(param.value, 0.0);
    }

    #[test]
    fn test_next_kind_wraps_and_resets() {
        let mut settings = DecalSettings::new(&DecalConfig::default());
        settings.id = 5;
        settings.param_mut(ParamKind::Width).value = 1.7;
        for _ in 0..3 {
            settings.next_kind();
        }
        assert_eq!(settings.kind, 3);
        settings.next_kind();
        assert_eq!(settings.kind, 0);
        assert_eq!(settings.id, 0);
        assert_eq!(settings.param(ParamKind::Width).value, 0.5);
    }

    #[test]
    fn test_preview_texture_index() {
        let mut settings = DecalSettings::new(&DecalConfig::default());
        settings.next_kind();
        settings.next_decal();
        settings.next_decal();
        let preview = settings.cursor_preview();
        assert_eq!(preview.albedo_index, 8 + 2);
        assert_eq!(preview.normal_index, preview.albedo_index);
    }

    #[test]
    fn test_apply_held_keys_and_toggles() {
        let mut settings = DecalSettings::new(&DecalConfig::default());
        let input = FrameInput {
            delta_time: 1.0,
            held: vec![(ParamKind::Intensity, Direction::Down)],
            toggle_cursor_decal: true,
            ..Default::default()
        };
        settings.apply(&input);
        assert!((settings.param(ParamKind::Intensity).value - 0.8).abs() < 1e-6);
        assert!(!settings.show_cursor_decal);
        assert!(settings.show_all_decals);
        assert_eq!(settings.cursor_uniform().indices.z, 0);
    }

    #[test]
    fn test_sun_direction_is_normalized() {
        let mut light = LightSettings::default();
        light.apply(&FrameInput {
            delta_time: 0.3,
            light: vec![(LightParam::DirectionX, Direction::Up)],
            ..Default::default()
        });
        assert!((light.sun_direction().length() - 1.0).abs() < 1e-5);
        assert_eq!(light.uniform().sun_direction.w, 0.0);
    }

    #[test]
    fn test_irradiance_scales_light_color() {
        let mut light = LightSettings::default();
        light.apply(&FrameInput {
            delta_time: 1.0,
            light: vec![(LightParam::Irradiance, Direction::Up)],
            ..Default::default()
        });
        let expected = Vec4::new(1.0, 0.96, 0.9, 0.2) * 5.0;
        assert!(light.uniform().irradiance.abs_diff_eq(expected, 1e-5));

        light.apply(&FrameInput {
            delta_time: 100.0,
            light: vec![(LightParam::Irradiance, Direction::Down)],
            ..Default::default()
        });
        assert_eq!(light.uniform().irradiance.truncate(), Vec3::ZERO);
    }
}
