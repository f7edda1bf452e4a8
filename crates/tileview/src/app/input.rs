//! Collects winit input between redraws and hands it to the view in
//! bottom-left screen space.

use tracing::debug;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::geometry::ScreenPoint;
use crate::view::{PanKeys, PointerButton, PointerEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum InputAction {
    PanUp,
    PanDown,
    PanLeft,
    PanRight,
    ZoomIn,
    ZoomOut,
    Quit,
}

const ACTION_COUNT: usize = 7;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::PanUp => 0,
            InputAction::PanDown => 1,
            InputAction::PanLeft => 2,
            InputAction::PanRight => 3,
            InputAction::ZoomIn => 4,
            InputAction::ZoomOut => 5,
            InputAction::Quit => 6,
        }
    }

    fn from_physical_key(key: PhysicalKey) -> Option<Self> {
        let PhysicalKey::Code(code) = key else {
            return None;
        };
        match code {
            KeyCode::KeyW | KeyCode::ArrowUp => Some(InputAction::PanUp),
            KeyCode::KeyS | KeyCode::ArrowDown => Some(InputAction::PanDown),
            KeyCode::KeyA | KeyCode::ArrowLeft => Some(InputAction::PanLeft),
            KeyCode::KeyD | KeyCode::ArrowRight => Some(InputAction::PanRight),
            KeyCode::Equal | KeyCode::NumpadAdd => Some(InputAction::ZoomIn),
            KeyCode::Minus | KeyCode::NumpadSubtract => Some(InputAction::ZoomOut),
            KeyCode::Escape => Some(InputAction::Quit),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct InputCollector {
    pub(crate) quit_requested: bool,
    action_states: ActionStates,
    /// Last cursor position in winit's top-left physical pixels.
    cursor_position_px: Option<(f32, f32)>,
    held_buttons: Vec<PointerButton>,
    pending_pointer_events: Vec<PointerEvent>,
    window_height: u32,
}

impl InputCollector {
    pub(crate) fn new(window_height: u32) -> Self {
        Self {
            window_height,
            ..Self::default()
        }
    }

    pub(crate) fn mark_quit_requested(&mut self) {
        self.quit_requested = true;
    }

    /// Needed to flip cursor rows into bottom-left screen space.
    pub(crate) fn set_window_height(&mut self, height: u32) {
        self.window_height = height;
    }

    pub(crate) fn handle_keyboard_input(&mut self, key_event: &KeyEvent) {
        let is_pressed = key_event.state == ElementState::Pressed;
        if !key_event.repeat {
            let state = if is_pressed { "key_down" } else { "key_up" };
            debug!(key = ?key_event.physical_key, state, "key_event");
        }
        self.update_action_state_from_physical_key(key_event.physical_key, is_pressed);
    }

    fn update_action_state_from_physical_key(&mut self, key: PhysicalKey, is_pressed: bool) {
        let Some(action) = InputAction::from_physical_key(key) else {
            return;
        };
        let was_down = self.action_states.is_down(action);
        self.action_states.set(action, is_pressed);
        if !is_pressed || was_down {
            return;
        }
        match action {
            InputAction::ZoomIn => self.push_scroll(1),
            InputAction::ZoomOut => self.push_scroll(-1),
            InputAction::Quit => self.mark_quit_requested(),
            _ => {}
        }
    }

    pub(crate) fn set_cursor_position_px(&mut self, x: f32, y: f32) {
        self.cursor_position_px = Some((x, y));
        let point = self.to_screen_point(x, y);
        let event = if self.held_buttons.is_empty() {
            PointerEvent::Moved { point }
        } else {
            PointerEvent::Dragged { point }
        };
        self.pending_pointer_events.push(event);
    }

    pub(crate) fn clear_cursor_position(&mut self) {
        self.cursor_position_px = None;
    }

    /// Presses and releases at the last cursor position. Ignored while the
    /// cursor is outside the window; repeated presses of a held button are
    /// dropped.
    pub(crate) fn handle_mouse_input(&mut self, button: MouseButton, state: ElementState) {
        let button = pointer_button(button);
        let Some((x, y)) = self.cursor_position_px else {
            if state == ElementState::Released {
                self.held_buttons.retain(|held| *held != button);
            }
            return;
        };
        let point = self.to_screen_point(x, y);
        match state {
            ElementState::Pressed => {
                if self.held_buttons.contains(&button) {
                    return;
                }
                self.held_buttons.push(button);
                self.pending_pointer_events
                    .push(PointerEvent::Down { point, button });
            }
            ElementState::Released => {
                if !self.held_buttons.contains(&button) {
                    return;
                }
                self.held_buttons.retain(|held| *held != button);
                self.pending_pointer_events
                    .push(PointerEvent::Up { point, button });
            }
        }
    }

    pub(crate) fn handle_mouse_wheel(&mut self, delta: MouseScrollDelta) {
        self.push_scroll(zoom_steps_from_scroll_delta(delta));
    }

    /// Pointer events gathered since the previous call, oldest first.
    pub(crate) fn take_pointer_events(&mut self) -> Vec<PointerEvent> {
        std::mem::take(&mut self.pending_pointer_events)
    }

    pub(crate) fn pan_keys(&self) -> PanKeys {
        PanKeys {
            up: self.action_states.is_down(InputAction::PanUp),
            down: self.action_states.is_down(InputAction::PanDown),
            left: self.action_states.is_down(InputAction::PanLeft),
            right: self.action_states.is_down(InputAction::PanRight),
        }
    }

    fn push_scroll(&mut self, steps: i32) {
        if steps != 0 {
            self.pending_pointer_events
                .push(PointerEvent::Scrolled { steps });
        }
    }

    fn to_screen_point(&self, x: f32, y: f32) -> ScreenPoint {
        ScreenPoint::new(x, self.window_height as f32 - y)
    }
}

fn pointer_button(button: MouseButton) -> PointerButton {
    match button {
        MouseButton::Left => PointerButton::Primary,
        MouseButton::Right => PointerButton::Secondary,
        MouseButton::Middle => PointerButton::Middle,
        _ => PointerButton::Other,
    }
}

fn zoom_steps_from_scroll_delta(delta: MouseScrollDelta) -> i32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y.round() as i32,
        MouseScrollDelta::PixelDelta(position) => {
            if position.y > 0.0 {
                1
            } else if position.y < 0.0 {
                -1
            } else {
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_moves_are_flipped_to_bottom_left_origin() {
        let mut input = InputCollector::new(600);
        input.set_cursor_position_px(10.0, 100.0);
        assert_eq!(
            input.take_pointer_events(),
            vec![PointerEvent::Moved {
                point: ScreenPoint::new(10.0, 500.0)
            }]
        );
        assert!(input.take_pointer_events().is_empty());
    }

    #[test]
    fn moves_while_a_button_is_held_become_drags() {
        let mut input = InputCollector::new(600);
        input.set_cursor_position_px(0.0, 600.0);
        input.handle_mouse_input(MouseButton::Middle, ElementState::Pressed);
        input.set_cursor_position_px(5.0, 590.0);
        input.handle_mouse_input(MouseButton::Middle, ElementState::Released);
        input.set_cursor_position_px(6.0, 590.0);

        assert_eq!(
            input.take_pointer_events(),
            vec![
                PointerEvent::Moved {
                    point: ScreenPoint::new(0.0, 0.0)
                },
                PointerEvent::Down {
                    point: ScreenPoint::new(0.0, 0.0),
                    button: PointerButton::Middle
                },
                PointerEvent::Dragged {
                    point: ScreenPoint::new(5.0, 10.0)
                },
                PointerEvent::Up {
                    point: ScreenPoint::new(5.0, 10.0),
                    button: PointerButton::Middle
                },
                PointerEvent::Moved {
                    point: ScreenPoint::new(6.0, 10.0)
                },
            ]
        );
    }

    #[test]
    fn held_button_does_not_repeat_down_events() {
        let mut input = InputCollector::new(100);
        input.set_cursor_position_px(1.0, 1.0);
        input.take_pointer_events();
        input.handle_mouse_input(MouseButton::Left, ElementState::Pressed);
        input.handle_mouse_input(MouseButton::Left, ElementState::Pressed);
        input.handle_mouse_input(MouseButton::Left, ElementState::Released);
        input.handle_mouse_input(MouseButton::Left, ElementState::Released);
        let events = input.take_pointer_events();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[0],
            PointerEvent::Down {
                button: PointerButton::Primary,
                ..
            }
        ));
        assert!(matches!(
            events[1],
            PointerEvent::Up {
                button: PointerButton::Primary,
                ..
            }
        ));
    }

    #[test]
    fn clicks_without_a_cursor_are_ignored() {
        let mut input = InputCollector::new(100);
        input.handle_mouse_input(MouseButton::Right, ElementState::Pressed);
        input.handle_mouse_input(MouseButton::Right, ElementState::Released);
        assert!(input.take_pointer_events().is_empty());
    }

    #[test]
    fn wasd_and_arrow_keys_map_to_pan_keys() {
        let mut input = InputCollector::default();
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::KeyW), true);
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::ArrowLeft), true);
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::ArrowDown), true);

        let keys = input.pan_keys();
        assert!(keys.up && keys.down && keys.left && !keys.right);
    }

    #[test]
    fn key_release_clears_pan_state() {
        let mut input = InputCollector::default();
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::KeyD), true);
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::KeyD), false);
        assert_eq!(input.pan_keys(), PanKeys::default());
    }

    #[test]
    fn zoom_keys_are_edge_triggered() {
        let mut input = InputCollector::default();
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::Equal), true);
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::Equal), true);
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::Equal), false);
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::Minus), true);
        assert_eq!(
            input.take_pointer_events(),
            vec![
                PointerEvent::Scrolled { steps: 1 },
                PointerEvent::Scrolled { steps: -1 }
            ]
        );
    }

    #[test]
    fn escape_requests_quit() {
        let mut input = InputCollector::default();
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::Escape), true);
        assert!(input.quit_requested);
    }

    #[test]
    fn mouse_wheel_queues_scroll_steps() {
        let mut input = InputCollector::new(100);
        input.handle_mouse_wheel(MouseScrollDelta::LineDelta(0.0, 2.0));
        input.handle_mouse_wheel(MouseScrollDelta::LineDelta(0.0, 0.2));
        assert_eq!(
            input.take_pointer_events(),
            vec![PointerEvent::Scrolled { steps: 2 }]
        );
    }

    #[test]
    fn pixel_wheel_delta_maps_to_single_discrete_step_direction() {
        let positive = zoom_steps_from_scroll_delta(MouseScrollDelta::PixelDelta(
            winit::dpi::PhysicalPosition::new(0.0, 3.0),
        ));
        let negative = zoom_steps_from_scroll_delta(MouseScrollDelta::PixelDelta(
            winit::dpi::PhysicalPosition::new(0.0, -5.0),
        ));
        let none = zoom_steps_from_scroll_delta(MouseScrollDelta::PixelDelta(
            winit::dpi::PhysicalPosition::new(0.0, 0.0),
        ));

        assert_eq!(positive, 1);
        assert_eq!(negative, -1);
        assert_eq!(none, 0);
    }

    #[test]
    fn mouse_buttons_map_to_pointer_buttons() {
        assert_eq!(pointer_button(MouseButton::Left), PointerButton::Primary);
        assert_eq!(pointer_button(MouseButton::Right), PointerButton::Secondary);
        assert_eq!(pointer_button(MouseButton::Middle), PointerButton::Middle);
        assert_eq!(pointer_button(MouseButton::Back), PointerButton::Other);
    }
}
