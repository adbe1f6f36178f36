use std::collections::HashSet;

use super::frame::InputFrame;
use super::types::{InputEvent, Key, KeyState, MouseButton, MouseButtonState};

/// Current input state for a single window.
///
/// Holds "is down" information and current pointer position.
/// Per-frame transitions and motion are recorded into an `InputFrame`.
#[derive(Debug, Default)]
pub struct InputState {
    /// Whether the window is focused.
    pub focused: bool,

    /// Pointer position in logical pixels.
    pub pointer_pos: Option<(f32, f32)>,

    /// Set of currently held keys.
    pub keys_down: HashSet<Key>,

    /// Set of currently held mouse buttons.
    pub buttons_down: HashSet<MouseButton>,
}

impl InputState {
    /// Applies a platform-agnostic input event to the current state and writes deltas to `frame`.
    pub fn apply_event(&mut self, frame: &mut InputFrame, ev: InputEvent) {
        match &ev {
            InputEvent::Focused(f) => {
                self.focused = *f;
                if !*f {
                    // Avoids stuck keys/buttons (and runaway drags) when focus changes mid-press.
                    self.keys_down.clear();
                    self.buttons_down.clear();
                }
            }

            InputEvent::PointerMoved { x, y } => {
                // The first position after entering has no predecessor to diff against.
                if let Some((px, py)) = self.pointer_pos {
                    frame.pointer_delta.0 += x - px;
                    frame.pointer_delta.1 += y - py;
                }
                self.pointer_pos = Some((*x, *y));
            }

            InputEvent::PointerLeft => {
                self.pointer_pos = None;
            }

            InputEvent::Key { key, state, repeat } => match state {
                KeyState::Pressed => {
                    let inserted = self.keys_down.insert(*key);
                    if inserted && !*repeat {
                        frame.keys_pressed.insert(*key);
                    }
                }
                KeyState::Released => {
                    self.keys_down.remove(key);
                }
            },

            InputEvent::PointerButton { button, state } => match state {
                MouseButtonState::Pressed => {
                    if self.buttons_down.insert(*button) {
                        frame.buttons_pressed.insert(*button);
                    }
                }
                MouseButtonState::Released => {
                    if self.buttons_down.remove(button) {
                        frame.buttons_released.insert(*button);
                    }
                }
            },

            InputEvent::MouseWheel(delta) => {
                frame.scroll_lines += delta.lines_y();
            }
        }

        frame.push_event(ev);
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    pub fn button_down(&self, btn: MouseButton) -> bool {
        self.buttons_down.contains(&btn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::MouseWheelDelta;

    fn apply(state: &mut InputState, frame: &mut InputFrame, ev: InputEvent) {
        state.apply_event(frame, ev);
    }

    #[test]
    fn pointer_motion_accumulates_within_frame() {
        let mut st = InputState::default();
        let mut fr = InputFrame::default();
        apply(&mut st, &mut fr, InputEvent::PointerMoved { x: 10.0, y: 10.0 });
        apply(&mut st, &mut fr, InputEvent::PointerMoved { x: 15.0, y: 8.0 });
        apply(&mut st, &mut fr, InputEvent::PointerMoved { x: 20.0, y: 4.0 });
        assert_eq!(fr.pointer_delta, (10.0, -6.0));
        assert_eq!(st.pointer_pos, Some((20.0, 4.0)));
    }

    #[test]
    fn re_entering_pointer_does_not_jump() {
        let mut st = InputState::default();
        let mut fr = InputFrame::default();
        apply(&mut st, &mut fr, InputEvent::PointerMoved { x: 10.0, y: 10.0 });
        apply(&mut st, &mut fr, InputEvent::PointerLeft);
        apply(&mut st, &mut fr, InputEvent::PointerMoved { x: 500.0, y: 300.0 });
        assert_eq!(fr.pointer_delta, (0.0, 0.0));
    }

    #[test]
    fn clear_resets_deltas_but_not_state() {
        let mut st = InputState::default();
        let mut fr = InputFrame::default();
        apply(&mut st, &mut fr, InputEvent::PointerButton {
            button: MouseButton::Left,
            state: MouseButtonState::Pressed,
        });
        apply(&mut st, &mut fr, InputEvent::MouseWheel(MouseWheelDelta::Line { x: 0.0, y: 2.0 }));
        assert!(fr.buttons_pressed.contains(&MouseButton::Left));
        assert_eq!(fr.scroll_lines, 2.0);

        fr.clear();
        assert!(fr.buttons_pressed.is_empty());
        assert_eq!(fr.scroll_lines, 0.0);
        assert!(st.button_down(MouseButton::Left));
    }

    #[test]
    fn key_repeat_is_not_a_fresh_press() {
        let mut st = InputState::default();
        let mut fr = InputFrame::default();
        apply(&mut st, &mut fr, InputEvent::Key { key: Key::Space, state: KeyState::Pressed, repeat: false });
        fr.clear();
        apply(&mut st, &mut fr, InputEvent::Key { key: Key::Space, state: KeyState::Pressed, repeat: true });
        assert!(!fr.key_pressed(Key::Space));
        assert!(st.key_down(Key::Space));
    }

    #[test]
    fn focus_loss_releases_everything() {
        let mut st = InputState::default();
        let mut fr = InputFrame::default();
        apply(&mut st, &mut fr, InputEvent::PointerButton {
            button: MouseButton::Left,
            state: MouseButtonState::Pressed,
        });
        apply(&mut st, &mut fr, InputEvent::Key { key: Key::R, state: KeyState::Pressed, repeat: false });
        apply(&mut st, &mut fr, InputEvent::Focused(false));
        assert!(!st.button_down(MouseButton::Left));
        assert!(!st.key_down(Key::R));
    }
}
