//! Input sampling with direction debouncing and edge detection.
//!
//! Keys are polled once per render frame, but commands go upstream only on
//! state transitions: a direction message when movement starts or changes,
//! a stop message when it ends, a fire message on the press edge. Holding a
//! key steady emits nothing, which bounds upstream message volume.

use macroquad::prelude::*;
use shared::{Direction, InputAction};

/// Collapses raw key state into at most one direction.
///
/// The precedence order (left, right, up, down) is a deliberate tie-break
/// for simultaneous keys, not an oversight; it is tunable but not
/// load-bearing.
pub fn resolve_direction(left: bool, right: bool, up: bool, down: bool) -> Option<Direction> {
    if left {
        Some(Direction::Left)
    } else if right {
        Some(Direction::Right)
    } else if up {
        Some(Direction::Up)
    } else if down {
        Some(Direction::Down)
    } else {
        None
    }
}

/// Debounces per-frame direction samples into start/stop commands.
#[derive(Debug, Default)]
pub struct DirectionTracker {
    current: Option<Direction>,
}

impl DirectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Direction> {
        self.current
    }

    /// Feeds one frame's resolved direction and returns the commands the
    /// transition produces: nothing on steady state, a start on a new
    /// direction, a stop for the previous direction on release or change.
    pub fn transition(&mut self, held: Option<Direction>) -> Vec<InputAction> {
        if held == self.current {
            return Vec::new();
        }

        let mut actions = Vec::new();
        if let Some(previous) = self.current {
            actions.push(previous.stop_action());
        }
        if let Some(next) = held {
            actions.push(next.start_action());
        }
        self.current = held;
        actions
    }
}

/// Result of sampling one frame of input.
#[derive(Debug, Default)]
pub struct SampledInput {
    /// Commands to report upstream this frame, in order.
    pub actions: Vec<InputAction>,
    /// The direction currently held, for facing updates.
    pub direction: Option<Direction>,
    /// The player asked to reconnect.
    pub reconnect: bool,
    /// The player asked to quit.
    pub quit: bool,
}

/// Polls the key backend once per frame and debounces into commands.
pub struct InputSampler {
    tracker: DirectionTracker,

    // Previous frame key states for edge detection
    prev_fire: bool,
    prev_start: bool,
    prev_reconnect: bool,
}

impl InputSampler {
    pub fn new() -> Self {
        Self {
            tracker: DirectionTracker::new(),
            prev_fire: false,
            prev_start: false,
            prev_reconnect: false,
        }
    }

    pub fn sample(&mut self) -> SampledInput {
        // movement keys support both WASD and arrows
        let left = is_key_down(KeyCode::A) || is_key_down(KeyCode::Left);
        let right = is_key_down(KeyCode::D) || is_key_down(KeyCode::Right);
        let up = is_key_down(KeyCode::W) || is_key_down(KeyCode::Up);
        let down = is_key_down(KeyCode::S) || is_key_down(KeyCode::Down);

        let fire = is_key_down(KeyCode::Space);
        let start = is_key_down(KeyCode::Enter);
        let reconnect = is_key_down(KeyCode::R);
        let quit = is_key_down(KeyCode::Escape);

        let held = resolve_direction(left, right, up, down);
        let mut actions = self.tracker.transition(held);

        if fire && !self.prev_fire {
            actions.push(InputAction::Fire);
        }
        if start && !self.prev_start {
            actions.push(InputAction::Start);
        }
        let reconnect_pressed = reconnect && !self.prev_reconnect;

        self.prev_fire = fire;
        self.prev_start = start;
        self.prev_reconnect = reconnect;

        SampledInput {
            actions,
            direction: held,
            reconnect: reconnect_pressed,
            quit,
        }
    }
}

impl Default for InputSampler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_precedence_order() {
        assert_eq!(
            resolve_direction(true, true, true, true),
            Some(Direction::Left)
        );
        assert_eq!(
            resolve_direction(false, true, true, true),
            Some(Direction::Right)
        );
        assert_eq!(
            resolve_direction(false, false, true, true),
            Some(Direction::Up)
        );
        assert_eq!(
            resolve_direction(false, false, false, true),
            Some(Direction::Down)
        );
        assert_eq!(resolve_direction(false, false, false, false), None);
    }

    #[test]
    fn test_start_emitted_on_new_direction_only() {
        let mut tracker = DirectionTracker::new();

        assert_eq!(
            tracker.transition(Some(Direction::Left)),
            vec![InputAction::Left]
        );
        // held steady: nothing goes upstream
        assert!(tracker.transition(Some(Direction::Left)).is_empty());
        assert!(tracker.transition(Some(Direction::Left)).is_empty());
    }

    #[test]
    fn test_stop_emitted_on_release() {
        let mut tracker = DirectionTracker::new();
        tracker.transition(Some(Direction::Up));

        assert_eq!(tracker.transition(None), vec![InputAction::StopUp]);
        assert!(tracker.transition(None).is_empty());
    }

    #[test]
    fn test_direction_change_emits_stop_then_start() {
        let mut tracker = DirectionTracker::new();
        tracker.transition(Some(Direction::Left));

        assert_eq!(
            tracker.transition(Some(Direction::Right)),
            vec![InputAction::StopLeft, InputAction::Right]
        );
        assert_eq!(tracker.current(), Some(Direction::Right));
    }

    #[test]
    fn test_no_messages_before_first_press() {
        let mut tracker = DirectionTracker::new();
        assert!(tracker.transition(None).is_empty());
    }
}
