use std::collections::HashSet;

use glam::Vec2;
use lume_decal::input::{CameraInput, Direction, FrameInput, LightParam};
use lume_decal::ParamKind;
use winit::event::{ElementState, MouseButton, MouseScrollDelta};
use winit::keyboard::KeyCode;

/// Keys that adjust a decal parameter while held.
const PARAM_KEYS: [(KeyCode, ParamKind, Direction); 14] = [
    (KeyCode::Digit1, ParamKind::Width, Direction::Down),
    (KeyCode::Digit2, ParamKind::Width, Direction::Up),
    (KeyCode::Digit3, ParamKind::Height, Direction::Down),
    (KeyCode::Digit4, ParamKind::Height, Direction::Up),
    (KeyCode::Digit5, ParamKind::Thickness, Direction::Down),
    (KeyCode::Digit6, ParamKind::Thickness, Direction::Up),
    (KeyCode::Digit7, ParamKind::Rotation, Direction::Down),
    (KeyCode::Digit8, ParamKind::Rotation, Direction::Up),
    (KeyCode::Digit9, ParamKind::AngleFade, Direction::Down),
    (KeyCode::Digit0, ParamKind::AngleFade, Direction::Up),
    (KeyCode::Minus, ParamKind::Intensity, Direction::Down),
    (KeyCode::Equal, ParamKind::Intensity, Direction::Up),
    (KeyCode::BracketLeft, ParamKind::Albedo, Direction::Down),
    (KeyCode::BracketRight, ParamKind::Albedo, Direction::Up),
];

const LIGHT_KEYS: [(KeyCode, LightParam, Direction); 8] = [
    (KeyCode::ArrowLeft, LightParam::DirectionX, Direction::Down),
    (KeyCode::ArrowRight, LightParam::DirectionX, Direction::Up),
    (KeyCode::PageDown, LightParam::DirectionY, Direction::Down),
    (KeyCode::PageUp, LightParam::DirectionY, Direction::Up),
    (KeyCode::ArrowDown, LightParam::DirectionZ, Direction::Down),
    (KeyCode::ArrowUp, LightParam::DirectionZ, Direction::Up),
    (KeyCode::End, LightParam::Irradiance, Direction::Down),
    (KeyCode::Home, LightParam::Irradiance, Direction::Up),
];

/// Accumulates window events between frames and turns them into one
/// [`FrameInput`]. Presses are edges; held keys are levels.
#[derive(Debug, Default)]
pub struct InputState {
    held: HashSet<KeyCode>,
    pressed: HashSet<KeyCode>,
    clicked: bool,
    look: Vec2,
    scroll: f32,
}

impl InputState {
    pub fn on_key(&mut self, code: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                // Key repeat arrives as further presses; only the first is an edge.
                if self.held.insert(code) {
                    self.pressed.insert(code);
                }
            }
            ElementState::Released => {
                self.held.remove(&code);
            }
        }
    }

    pub fn on_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        if button == MouseButton::Left && state == ElementState::Pressed {
            self.clicked = true;
        }
    }

    pub fn on_mouse_motion(&mut self, dx: f64, dy: f64) {
        self.look += Vec2::new(dx as f32, dy as f32);
    }

    pub fn on_scroll(&mut self, delta: MouseScrollDelta) {
        self.scroll += match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(position) => position.y as f32 / 100.0,
        };
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.held.contains(&code)
    }

    /// True once per press.
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.pressed.contains(&code)
    }

    /// Drops held keys, e.g. when the window loses focus and releases go missing.
    pub fn release_all(&mut self) {
        self.held.clear();
    }

    fn axis(&self, positive: KeyCode, negative: KeyCode) -> f32 {
        self.is_held(positive) as i32 as f32 - self.is_held(negative) as i32 as f32
    }

    /// Builds this frame's input and clears every edge and delta.
    pub fn take_frame(&mut self, delta_time: f32) -> FrameInput {
        let held = PARAM_KEYS
            .iter()
            .filter(|(code, _, _)| self.is_held(*code))
            .map(|&(_, kind, direction)| (kind, direction))
            .collect();
        let light = LIGHT_KEYS
            .iter()
            .filter(|(code, _, _)| self.is_held(*code))
            .map(|&(_, param, direction)| (param, direction))
            .collect();

        let input = FrameInput {
            delta_time,
            clicked: self.clicked,
            held,
            light,
            next_kind: self.was_pressed(KeyCode::Tab),
            next_decal: self.was_pressed(KeyCode::KeyQ),
            reset_params: self.was_pressed(KeyCode::KeyR),
            toggle_cursor_decal: self.was_pressed(KeyCode::KeyC),
            toggle_all_decals: self.was_pressed(KeyCode::KeyV),
            camera: CameraInput {
                forward: self.axis(KeyCode::KeyW, KeyCode::KeyS),
                right: self.axis(KeyCode::KeyD, KeyCode::KeyA),
                look: self.look,
                scroll: self.scroll,
            },
        };

        self.pressed.clear();
        self.clicked = false;
        self.look = Vec2::ZERO;
        self.scroll = 0.0;
        input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_is_an_edge_and_hold_is_a_level() {
        let mut input = InputState::default();
        input.on_key(KeyCode::Tab, ElementState::Pressed);
        input.on_key(KeyCode::Digit2, ElementState::Pressed);

        let first = input.take_frame(0.016);
        assert!(first.next_kind);
        assert_eq!(first.held, vec![(ParamKind::Width, Direction::Up)]);

        // Repeat while held must not produce another edge.
        input.on_key(KeyCode::Tab, ElementState::Pressed);
        let second = input.take_frame(0.016);
        assert!(!second.next_kind);
        assert_eq!(second.held, vec![(ParamKind::Width, Direction::Up)]);

        input.on_key(KeyCode::Digit2, ElementState::Released);
        input.on_key(KeyCode::Tab, ElementState::Released);
        input.on_key(KeyCode::Tab, ElementState::Pressed);
        let third = input.take_frame(0.016);
        assert!(third.next_kind);
        assert!(third.held.is_empty());
    }

    #[test]
    fn test_click_is_consumed_once() {
        let mut input = InputState::default();
        input.on_mouse_button(MouseButton::Right, ElementState::Pressed);
        input.on_mouse_button(MouseButton::Left, ElementState::Released);
        assert!(!input.take_frame(0.016).clicked);

        input.on_mouse_button(MouseButton::Left, ElementState::Pressed);
        assert!(input.take_frame(0.016).clicked);
        assert!(!input.take_frame(0.016).clicked);
    }

    #[test]
    fn test_camera_axes_and_deltas() {
        let mut input = InputState::default();
        input.on_key(KeyCode::KeyW, ElementState::Pressed);
        input.on_key(KeyCode::KeyA, ElementState::Pressed);
        input.on_mouse_motion(3.0, -2.0);
        input.on_mouse_motion(1.0, 0.5);
        input.on_scroll(MouseScrollDelta::LineDelta(0.0, 2.0));

        let frame = input.take_frame(0.02);
        assert_eq!(frame.camera.forward, 1.0);
        assert_eq!(frame.camera.right, -1.0);
        assert_eq!(frame.camera.look, Vec2::new(4.0, -1.5));
        assert_eq!(frame.camera.scroll, 2.0);
        assert_eq!(frame.delta_time, 0.02);

        let next = input.take_frame(0.02);
        assert_eq!(next.camera.look, Vec2::ZERO);
        assert_eq!(next.camera.scroll, 0.0);
        assert_eq!(next.camera.forward, 1.0);
    }

    #[test]
    fn test_light_keys_and_release_all() {
        let mut input = InputState::default();
        input.on_key(KeyCode::PageUp, ElementState::Pressed);
        assert_eq!(input.take_frame(0.1).light, vec![(LightParam::DirectionY, Direction::Up)]);
        input.release_all();
        assert!(input.take_frame(0.1).light.is_empty());
    }

    #[test]
    fn test_every_light_param_has_a_key() {
        let mut input = InputState::default();
        input.on_key(KeyCode::Home, ElementState::Pressed);
        assert_eq!(input.take_frame(0.1).light, vec![(LightParam::Irradiance, Direction::Up)]);
        input.on_key(KeyCode::Home, ElementState::Released);
        input.on_key(KeyCode::End, ElementState::Pressed);
        assert_eq!(input.take_frame(0.1).light, vec![(LightParam::Irradiance, Direction::Down)]);

        for param in [LightParam::DirectionX, LightParam::DirectionY, LightParam::DirectionZ, LightParam::Irradiance] {
            for direction in [Direction::Down, Direction::Up] {
                assert!(LIGHT_KEYS.iter().any(|&(_, p, d)| p == param && d == direction));
            }
        }
    }
}
