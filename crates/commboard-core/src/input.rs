//! Pointer state for the page canvas.

use kurbo::{Point, Vec2};

// Use web_time for WASM compatibility
#[cfg(target_arch = "wasm32")]
use web_time::Instant;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Pointer event in physical screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { position: Point, button: MouseButton },
    Up { position: Point, button: MouseButton },
    Move { position: Point },
    Left,
}

/// Double-click detection constants.
const DOUBLE_CLICK_TIME_MS: u128 = 500;
const DOUBLE_CLICK_DISTANCE: f64 = 5.0;

/// Tracks the primary pointer across frames.
#[derive(Debug, Clone)]
pub struct InputState {
    /// Current pointer position, `None` while outside the window.
    pub pointer_position: Option<Point>,
    /// Whether the primary button is held.
    primary_down: bool,
    /// Primary button went down this frame.
    just_pressed: bool,
    /// Primary button went up this frame.
    just_released: bool,
    /// Where the current press started.
    pub press_start: Option<Point>,
    /// Last click time for double-click detection.
    last_click_time: Option<Instant>,
    /// Last click position for double-click detection.
    last_click_position: Option<Point>,
    /// Whether a double-click was detected this frame.
    double_click_detected: bool,
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

impl InputState {
    /// Create a new input state.
    pub fn new() -> Self {
        Self {
            pointer_position: None,
            primary_down: false,
            just_pressed: false,
            just_released: false,
            press_start: None,
            last_click_time: None,
            last_click_position: None,
            double_click_detected: false,
        }
    }

    /// Call at the start of each frame to reset per-frame state.
    pub fn begin_frame(&mut self) {
        self.just_pressed = false;
        self.just_released = false;
        self.double_click_detected = false;
    }

    /// Process a pointer event. Only the left button counts.
    pub fn handle_pointer_event(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down { position, button } => {
                self.pointer_position = Some(position);
                if button != MouseButton::Left {
                    return;
                }
                if !self.primary_down {
                    self.just_pressed = true;
                }
                self.primary_down = true;
                self.press_start = Some(position);
                self.detect_double_click(position, Instant::now());
            }
            PointerEvent::Up { position, button } => {
                self.pointer_position = Some(position);
                if button == MouseButton::Left && self.primary_down {
                    self.primary_down = false;
                    self.just_released = true;
                    self.press_start = None;
                }
            }
            PointerEvent::Move { position } => {
                self.pointer_position = Some(position);
            }
            PointerEvent::Left => {
                self.pointer_position = None;
            }
        }
    }

    fn detect_double_click(&mut self, position: Point, now: Instant) {
        let is_double = match (self.last_click_time, self.last_click_position) {
            (Some(last_time), Some(last_pos)) => {
                now.duration_since(last_time).as_millis() < DOUBLE_CLICK_TIME_MS
                    && last_pos.distance(position) < DOUBLE_CLICK_DISTANCE
            }
            _ => false,
        };

        if is_double {
            self.double_click_detected = true;
            // Reset so a triple click doesn't count twice
            self.last_click_time = None;
            self.last_click_position = None;
        } else {
            self.last_click_time = Some(now);
            self.last_click_position = Some(position);
        }
    }

    /// Check if the primary button is held.
    pub fn is_primary_down(&self) -> bool {
        self.primary_down
    }

    /// Check if the primary button went down this frame.
    pub fn is_just_pressed(&self) -> bool {
        self.just_pressed
    }

    /// Check if the primary button went up this frame.
    pub fn is_just_released(&self) -> bool {
        self.just_released
    }

    /// Check if a double-click was detected this frame.
    pub fn is_double_click(&self) -> bool {
        self.double_click_detected
    }

    /// Pointer travel since the press started.
    pub fn press_delta(&self) -> Option<Vec2> {
        match (self.press_start, self.pointer_position) {
            (Some(start), Some(current)) => Some(current - start),
            _ => None,
        }
    }
}
