//! Polled input state
//!
//! [`Input`] is fed from window events and read by components during the
//! input and update phases. Held state persists until the matching release;
//! edge state (`pressed`/`released`) and motion deltas clear at the end of
//! every tick.

use std::collections::HashSet;

use crate::application::AppEvent;
use crate::foundation::math::Vec2;

/// Key codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A key
    A,
    /// B key
    B,
    /// C key
    C,
    /// D key
    D,
    /// E key
    E,
    /// F key
    F,
    /// G key
    G,
    /// H key
    H,
    /// I key
    I,
    /// J key
    J,
    /// K key
    K,
    /// L key
    L,
    /// M key
    M,
    /// N key
    N,
    /// O key
    O,
    /// P key
    P,
    /// Q key
    Q,
    /// R key
    R,
    /// S key
    S,
    /// T key
    T,
    /// U key
    U,
    /// V key
    V,
    /// W key
    W,
    /// X key
    X,
    /// Y key
    Y,
    /// Z key
    Z,
    /// Space key
    Space,
    /// Enter key
    Enter,
    /// Escape key
    Escape,
    /// Up arrow
    Up,
    /// Down arrow
    Down,
    /// Left arrow
    Left,
    /// Right arrow
    Right,
}

/// Mouse buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Left mouse button
    Left,
    /// Right mouse button
    Right,
    /// Middle mouse button
    Middle,
}

/// Held and edge state for a set of buttons
#[derive(Debug)]
struct ButtonState<T> {
    down: HashSet<T>,
    pressed: HashSet<T>,
    released: HashSet<T>,
}

impl<T> Default for ButtonState<T> {
    fn default() -> Self {
        Self {
            down: HashSet::new(),
            pressed: HashSet::new(),
            released: HashSet::new(),
        }
    }
}

impl<T: Copy + Eq + std::hash::Hash> ButtonState<T> {
    fn set(&mut self, button: T, pressed: bool) {
        if pressed {
            if self.down.insert(button) {
                self.pressed.insert(button);
            }
        } else if self.down.remove(&button) {
            self.released.insert(button);
        }
    }

    fn end_frame(&mut self) {
        self.pressed.clear();
        self.released.clear();
    }
}

/// Input snapshot for the current tick
#[derive(Debug, Default)]
pub struct Input {
    keys: ButtonState<KeyCode>,
    buttons: ButtonState<MouseButton>,
    mouse_position: Option<Vec2>,
    mouse_delta: Vec2,
    scroll_delta: Vec2,
    cursor_locked: bool,
}

impl Input {
    /// Empty input state
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a window event. Returns whether the event was an input event.
    pub fn handle_event(&mut self, event: &AppEvent) -> bool {
        match *event {
            AppEvent::KeyPressed(key) => self.handle_key(key, true),
            AppEvent::KeyReleased(key) => self.handle_key(key, false),
            AppEvent::KeyInput { key, pressed } => self.handle_key(key, pressed),
            AppEvent::MouseButton { button, pressed } => self.handle_mouse_button(button, pressed),
            AppEvent::MouseMoved { x, y } => self.handle_mouse_move(x, y),
            AppEvent::MouseWheel { delta_x, delta_y } => self.handle_scroll(delta_x, delta_y),
            _ => return false,
        }
        true
    }

    /// Key transition
    pub fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        self.keys.set(key, pressed);
    }

    /// Mouse button transition
    pub fn handle_mouse_button(&mut self, button: MouseButton, pressed: bool) {
        self.buttons.set(button, pressed);
    }

    /// Cursor moved to window coordinates `(x, y)`
    pub fn handle_mouse_move(&mut self, x: f64, y: f64) {
        let position = Vec2::new(x as f32, y as f32);
        if let Some(previous) = self.mouse_position {
            self.mouse_delta += position - previous;
        }
        self.mouse_position = Some(position);
    }

    /// Scroll wheel moved
    pub fn handle_scroll(&mut self, delta_x: f64, delta_y: f64) {
        self.scroll_delta += Vec2::new(delta_x as f32, delta_y as f32);
    }

    /// Clear edge state and deltas; called after every tick
    pub fn end_frame(&mut self) {
        self.keys.end_frame();
        self.buttons.end_frame();
        self.mouse_delta = Vec2::zeros();
        self.scroll_delta = Vec2::zeros();
    }

    /// Key is held
    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.keys.down.contains(&key)
    }

    /// Key went down this tick
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys.pressed.contains(&key)
    }

    /// Key went up this tick
    pub fn is_key_released(&self, key: KeyCode) -> bool {
        self.keys.released.contains(&key)
    }

    /// Button is held
    pub fn is_mouse_down(&self, button: MouseButton) -> bool {
        self.buttons.down.contains(&button)
    }

    /// Button went down this tick
    pub fn is_mouse_pressed(&self, button: MouseButton) -> bool {
        self.buttons.pressed.contains(&button)
    }

    /// Button went up this tick
    pub fn is_mouse_released(&self, button: MouseButton) -> bool {
        self.buttons.released.contains(&button)
    }

    /// Last known cursor position; the origin before any motion
    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position.unwrap_or_else(Vec2::zeros)
    }

    /// Cursor motion accumulated this tick
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    /// Scroll accumulated this tick
    pub fn scroll_delta(&self) -> Vec2 {
        self.scroll_delta
    }

    /// Request cursor capture; the engine forwards it to the window
    pub fn set_cursor_locked(&mut self, locked: bool) {
        self.cursor_locked = locked;
    }

    /// Whether cursor capture is requested
    pub fn is_cursor_locked(&self) -> bool {
        self.cursor_locked
    }
}
