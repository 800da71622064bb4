use std::collections::HashSet;

use glam::Vec2;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Cursor, button and key state folded from window events.
///
/// "Pressed" sets only hold what went down since the last [`begin_frame`](Self::begin_frame).
#[derive(Debug, Default)]
pub struct Input {
    keys_pressed: HashSet<KeyCode>,
    buttons_down: HashSet<MouseButton>,
    buttons_pressed: HashSet<MouseButton>,
    cursor_position: Vec2,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget presses from the previous frame.
    pub fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.buttons_pressed.clear();
    }

    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key
                    && event.state == ElementState::Pressed
                    && !event.repeat
                {
                    self.keys_pressed.insert(key);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => match state {
                ElementState::Pressed => self.press_button(*button),
                ElementState::Released => self.release_button(*button),
            },
            WindowEvent::CursorMoved { position, .. } => {
                self.move_cursor(Vec2::new(position.x as f32, position.y as f32));
            }
            _ => {}
        }
    }

    fn press_button(&mut self, button: MouseButton) {
        if self.buttons_down.insert(button) {
            self.buttons_pressed.insert(button);
        }
    }

    fn release_button(&mut self, button: MouseButton) {
        self.buttons_down.remove(&button);
    }

    fn move_cursor(&mut self, position: Vec2) {
        self.cursor_position = position;
    }

    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    pub fn mouse_pressed(&self, button: MouseButton) -> bool {
        self.buttons_pressed.contains(&button)
    }

    /// Cursor position in physical pixels from the window's top-left corner.
    pub fn cursor_position(&self) -> Vec2 {
        self.cursor_position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_lasts_one_frame() {
        let mut input = Input::new();
        input.press_button(MouseButton::Left);
        assert!(input.mouse_pressed(MouseButton::Left));

        input.begin_frame();
        assert!(!input.mouse_pressed(MouseButton::Left));
    }

    #[test]
    fn held_button_does_not_press_again() {
        let mut input = Input::new();
        input.press_button(MouseButton::Left);
        input.begin_frame();
        input.press_button(MouseButton::Left);
        assert!(!input.mouse_pressed(MouseButton::Left));

        input.release_button(MouseButton::Left);
        input.press_button(MouseButton::Left);
        assert!(input.mouse_pressed(MouseButton::Left));
    }

    #[test]
    fn cursor_survives_frames() {
        let mut input = Input::new();
        input.move_cursor(Vec2::new(120.0, 45.5));
        input.begin_frame();
        assert_eq!(input.cursor_position(), Vec2::new(120.0, 45.5));
    }
}
