//! Input snapshots handed to the core
//!
//! The platform translates device events into [`InputEvent`]s, feeds them to
//! an [`InputRecorder`], and takes one [`Input`] snapshot per iteration.

/// Named buttons the core understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    ToneUp,
    ToneDown,
    ToggleWaveform,
}

impl Button {
    pub const COUNT: usize = 7;

    pub const ALL: [Button; Button::COUNT] = [
        Button::MoveLeft,
        Button::MoveRight,
        Button::MoveUp,
        Button::MoveDown,
        Button::ToneUp,
        Button::ToneDown,
        Button::ToggleWaveform,
    ];

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonState {
    /// Held right now
    pub is_down: bool,
    /// `is_down` differs from the previous snapshot
    pub changed: bool,
}

impl ButtonState {
    /// Went down since the previous snapshot
    #[inline]
    pub fn pressed(&self) -> bool {
        self.is_down && self.changed
    }
}

/// One iteration's worth of input. Read-only to the core.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Input {
    buttons: [ButtonState; Button::COUNT],
    /// Horizontal axis in [-1, 1], positive to the right
    pub x: f32,
    /// Vertical axis in [-1, 1], positive downwards
    pub y: f32,
}

impl Input {
    #[inline]
    pub fn button(&self, button: Button) -> ButtonState {
        self.buttons[button.index()]
    }

    #[inline]
    pub fn pressed(&self, button: Button) -> bool {
        self.button(button).pressed()
    }
}

/// Platform-independent events produced by a frontend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Quit,
    Button { button: Button, is_down: bool },
    /// Physical drawable size changed
    Resized { width: u32, height: u32 },
}

/// Accumulates button transitions between snapshots.
///
/// A press and release that both land between two snapshots cancel out:
/// edges are computed from the held state at snapshot time only.
#[derive(Debug, Clone, Default)]
pub struct InputRecorder {
    held: [bool; Button::COUNT],
    previous: [bool; Button::COUNT],
}

impl InputRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, button: Button, is_down: bool) {
        self.held[button.index()] = is_down;
    }

    /// Record a button event; other events are ignored
    pub fn handle(&mut self, event: &InputEvent) {
        if let InputEvent::Button { button, is_down } = *event {
            self.set(button, is_down);
        }
    }

    /// Snapshot the current state and start a new edge window
    pub fn snapshot(&mut self) -> Input {
        let mut buttons = [ButtonState::default(); Button::COUNT];
        for (i, state) in buttons.iter_mut().enumerate() {
            state.is_down = self.held[i];
            state.changed = self.held[i] != self.previous[i];
        }
        self.previous = self.held;

        let axis = |neg: Button, pos: Button| -> f32 {
            f32::from(i8::from(self.held[pos.index()]) - i8::from(self.held[neg.index()]))
        };

        Input {
            buttons,
            x: axis(Button::MoveLeft, Button::MoveRight),
            y: axis(Button::MoveUp, Button::MoveDown),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_covers_every_index() {
        for (i, button) in Button::ALL.iter().enumerate() {
            assert_eq!(button.index(), i);
        }
    }

    #[test]
    fn test_edge_only_on_transition() {
        let mut rec = InputRecorder::new();
        rec.handle(&InputEvent::Button {
            button: Button::ToneUp,
            is_down: true,
        });

        let first = rec.snapshot();
        assert_eq!(
            first.button(Button::ToneUp),
            ButtonState {
                is_down: true,
                changed: true
            }
        );

        let second = rec.snapshot();
        assert_eq!(
            second.button(Button::ToneUp),
            ButtonState {
                is_down: true,
                changed: false
            }
        );

        rec.set(Button::ToneUp, false);
        let third = rec.snapshot();
        assert!(third.button(Button::ToneUp).changed);
        assert!(!third.pressed(Button::ToneUp));
    }

    #[test]
    fn test_tap_within_one_window_is_invisible() {
        let mut rec = InputRecorder::new();
        rec.set(Button::ToggleWaveform, true);
        rec.set(Button::ToggleWaveform, false);
        let input = rec.snapshot();
        assert_eq!(input.button(Button::ToggleWaveform), ButtonState::default());
    }

    #[test]
    fn test_axes_from_direction_buttons() {
        let mut rec = InputRecorder::new();
        rec.set(Button::MoveRight, true);
        rec.set(Button::MoveUp, true);
        let input = rec.snapshot();
        assert_eq!(input.x, 1.0);
        assert_eq!(input.y, -1.0);

        rec.set(Button::MoveLeft, true);
        let input = rec.snapshot();
        assert_eq!(input.x, 0.0);
    }

    #[test]
    fn test_non_button_events_ignored() {
        let mut rec = InputRecorder::new();
        rec.handle(&InputEvent::Quit);
        rec.handle(&InputEvent::Resized {
            width: 10,
            height: 10,
        });
        assert_eq!(rec.snapshot(), Input::default());
    }
}
