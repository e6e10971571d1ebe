//! Window seam
//!
//! The engine never talks to a windowing library directly. A [`Window`]
//! hands over the events of the last frame and presents finished frames;
//! [`HeadlessWindow`] plays back a script of events for tests and demos.

use std::collections::VecDeque;

use crate::application::AppEvent;

/// Event source and presentation target
pub trait Window {
    /// Events received since the previous call
    fn poll_events(&mut self) -> Vec<AppEvent>;

    /// Present the frame just rendered
    fn swap_buffers(&mut self);

    /// Framebuffer size in pixels
    fn size(&self) -> (u32, u32);

    /// Capture or release the cursor
    fn set_cursor_locked(&mut self, locked: bool);

    /// Whether the window asked to close
    fn should_close(&self) -> bool;

    /// Ask the window to close
    fn set_should_close(&mut self, close: bool);
}

/// Window without a display
///
/// Each call to [`Window::poll_events`] yields the next scripted batch, or
/// nothing once the script runs out. The window closes on a scripted
/// [`AppEvent::WindowCloseRequested`] or after presenting its frame budget.
#[derive(Debug)]
pub struct HeadlessWindow {
    size: (u32, u32),
    script: VecDeque<Vec<AppEvent>>,
    frame_budget: Option<u64>,
    frames_presented: u64,
    cursor_locked: bool,
    close_requested: bool,
}

impl HeadlessWindow {
    /// Window of the given size with an empty script and no frame budget
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            script: VecDeque::new(),
            frame_budget: None,
            frames_presented: 0,
            cursor_locked: false,
            close_requested: false,
        }
    }

    /// Close after presenting `frames` frames
    pub fn with_frame_budget(mut self, frames: u64) -> Self {
        self.frame_budget = Some(frames);
        self
    }

    /// Queue the events delivered by one future poll
    pub fn push_frame(&mut self, events: Vec<AppEvent>) -> &mut Self {
        self.script.push_back(events);
        self
    }

    /// Frames presented so far
    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// Whether the cursor is captured
    pub fn is_cursor_locked(&self) -> bool {
        self.cursor_locked
    }
}

impl Window for HeadlessWindow {
    fn poll_events(&mut self) -> Vec<AppEvent> {
        let events = self.script.pop_front().unwrap_or_default();
        for event in &events {
            match event {
                AppEvent::WindowCloseRequested => self.close_requested = true,
                AppEvent::WindowResized { width, height } => self.size = (*width, *height),
                _ => {}
            }
        }
        events
    }

    fn swap_buffers(&mut self) {
        self.frames_presented += 1;
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn set_cursor_locked(&mut self, locked: bool) {
        self.cursor_locked = locked;
    }

    fn should_close(&self) -> bool {
        self.close_requested || self.frame_budget.is_some_and(|budget| self.frames_presented >= budget)
    }

    fn set_should_close(&mut self, close: bool) {
        self.close_requested = close;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::KeyCode;

    #[test]
    fn test_script_plays_back_in_order() {
        let mut window = HeadlessWindow::new(640, 480);
        window
            .push_frame(vec![AppEvent::KeyPressed(KeyCode::W)])
            .push_frame(vec![AppEvent::WindowResized { width: 800, height: 600 }]);

        assert_eq!(window.poll_events().len(), 1);
        assert_eq!(window.poll_events().len(), 1);
        assert_eq!(window.size(), (800, 600));
        assert!(window.poll_events().is_empty());
    }

    #[test]
    fn test_closes_after_frame_budget() {
        let mut window = HeadlessWindow::new(1, 1).with_frame_budget(2);
        window.swap_buffers();
        assert!(!window.should_close());
        window.swap_buffers();
        assert!(window.should_close());
    }

    #[test]
    fn test_close_request_event() {
        let mut window = HeadlessWindow::new(1, 1);
        window.push_frame(vec![AppEvent::WindowCloseRequested]);
        window.poll_events();
        assert!(window.should_close());
    }
}
