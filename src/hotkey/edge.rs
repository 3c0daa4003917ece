//! Release-edge detection for the two hotkey buttons

use crate::core::dispatch::HotkeyAction;

/// Previous pressed state of the toggle and menu buttons
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EdgeState {
    was_toggle_pressed: bool,
    was_menu_pressed: bool,
}

/// Buttons that were released by the latest report
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Releases {
    pub toggle: bool,
    pub menu: bool,
}

impl Releases {
    /// Actions to fire, toggle first
    pub fn actions(self) -> impl Iterator<Item = HotkeyAction> {
        [
            (self.toggle, HotkeyAction::Toggle),
            (self.menu, HotkeyAction::Menu),
        ]
        .into_iter()
        .filter_map(|(released, action)| released.then_some(action))
    }
}

impl EdgeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the current pressed state; returns the falling edges.
    ///
    /// Holding a button across any number of reports never fires; only the
    /// pressed → released transition does.
    pub fn update(&mut self, toggle_pressed: bool, menu_pressed: bool) -> Releases {
        let releases = Releases {
            toggle: self.was_toggle_pressed && !toggle_pressed,
            menu: self.was_menu_pressed && !menu_pressed,
        };
        self.was_toggle_pressed = toggle_pressed;
        self.was_menu_pressed = menu_pressed;
        releases
    }

    /// Forget any held button, e.g. after resuming from pause
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
