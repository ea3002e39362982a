//! Focus mode: a distraction-free view that restores the previous layout

/// Zoom level of the normal view
pub const DEFAULT_ZOOM: f32 = 1.0;

/// Layout operations the focus session needs from the window host
pub trait ViewHost {
    /// Opaque snapshot of the pane arrangement
    type Layout;

    fn capture_layout(&self) -> Self::Layout;
    fn restore_layout(&mut self, layout: Self::Layout);
    fn collapse_to_single_pane(&mut self);
    fn pane_count(&self) -> usize;
    fn set_zoom_level(&mut self, level: f32);
    fn set_focused_presentation(&mut self, enabled: bool);
}

/// Focus state; the saved layout exists only while focused
#[derive(Debug, Clone, PartialEq)]
pub enum FocusState<L> {
    Normal,
    Focused { saved: L },
}

/// Result of a toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusTransition {
    Entered,
    /// `restored` is false when the panes were rearranged while focused
    Left { restored: bool },
}

/// Per-session focus mode state, owned by the editing session
#[derive(Debug, Clone)]
pub struct FocusSession<L> {
    state: FocusState<L>,
    zoom_level: f32,
}

impl<L> FocusSession<L> {
    /// Create an inactive session that zooms to `zoom_level` when focused
    pub fn new(zoom_level: f32) -> Self {
        Self {
            state: FocusState::Normal,
            zoom_level,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, FocusState::Focused { .. })
    }

    pub fn saved_layout(&self) -> Option<&L> {
        match &self.state {
            FocusState::Normal => None,
            FocusState::Focused { saved } => Some(saved),
        }
    }

    /// Enter focus mode, or leave it and put the previous layout back.
    ///
    /// The saved layout is only restored when the view is still a single
    /// pane; if the user split it while focused, their arrangement is kept.
    pub fn toggle<H>(&mut self, host: &mut H) -> FocusTransition
    where
        H: ViewHost<Layout = L>,
    {
        match std::mem::replace(&mut self.state, FocusState::Normal) {
            FocusState::Normal => {
                let saved = host.capture_layout();
                host.collapse_to_single_pane();
                host.set_zoom_level(self.zoom_level);
                host.set_focused_presentation(true);
                self.state = FocusState::Focused { saved };
                tracing::debug!(zoom = self.zoom_level, "Entered focus mode");
                FocusTransition::Entered
            }
            FocusState::Focused { saved } => {
                let restored = host.pane_count() == 1;
                if restored {
                    host.restore_layout(saved);
                }
                host.set_focused_presentation(false);
                host.set_zoom_level(DEFAULT_ZOOM);
                tracing::debug!(restored, "Left focus mode");
                FocusTransition::Left { restored }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct FakeHost {
        panes: Vec<&'static str>,
        zoom: f32,
        focused: bool,
        restores: usize,
    }

    impl FakeHost {
        fn new(panes: &[&'static str]) -> Self {
            Self {
                panes: panes.to_vec(),
                zoom: DEFAULT_ZOOM,
                focused: false,
                restores: 0,
            }
        }
    }

    impl ViewHost for FakeHost {
        type Layout = Vec<&'static str>;

        fn capture_layout(&self) -> Self::Layout {
            self.panes.clone()
        }

        fn restore_layout(&mut self, layout: Self::Layout) {
            self.panes = layout;
            self.restores += 1;
        }

        fn collapse_to_single_pane(&mut self) {
            self.panes.truncate(1);
        }

        fn pane_count(&self) -> usize {
            self.panes.len()
        }

        fn set_zoom_level(&mut self, level: f32) {
            self.zoom = level;
        }

        fn set_focused_presentation(&mut self, enabled: bool) {
            self.focused = enabled;
        }
    }

    #[test]
    fn test_enter_focus() {
        let mut host = FakeHost::new(&["editor", "preview", "outline"]);
        let mut session = FocusSession::new(1.5);

        assert_eq!(session.toggle(&mut host), FocusTransition::Entered);
        assert!(session.is_active());
        assert_eq!(session.saved_layout(), Some(&vec!["editor", "preview", "outline"]));
        assert_eq!(host.panes, vec!["editor"]);
        assert_eq!(host.zoom, 1.5);
        assert!(host.focused);
    }

    #[test]
    fn test_toggle_twice_restores_everything() {
        let mut host = FakeHost::new(&["editor", "preview"]);
        let mut session = FocusSession::new(1.25);

        session.toggle(&mut host);
        let transition = session.toggle(&mut host);

        assert_eq!(transition, FocusTransition::Left { restored: true });
        assert!(!session.is_active());
        assert_eq!(session.saved_layout(), None);
        assert_eq!(host.panes, vec!["editor", "preview"]);
        assert_eq!(host.zoom, DEFAULT_ZOOM);
        assert!(!host.focused);
    }

    #[test]
    fn test_manual_split_is_not_clobbered() {
        let mut host = FakeHost::new(&["editor", "preview", "outline"]);
        let mut session = FocusSession::new(1.25);

        session.toggle(&mut host);
        host.panes.push("scratch");
        let transition = session.toggle(&mut host);

        assert_eq!(transition, FocusTransition::Left { restored: false });
        assert_eq!(host.panes, vec!["editor", "scratch"]);
        assert_eq!(host.restores, 0);
        assert!(!session.is_active());
        assert_eq!(session.saved_layout(), None);
        assert_eq!(host.zoom, DEFAULT_ZOOM);
    }

    #[test]
    fn test_toggles_strictly_alternate() {
        let mut host = FakeHost::new(&["editor", "preview"]);
        let mut session = FocusSession::new(2.0);

        for round in 0..3 {
            assert_eq!(session.toggle(&mut host), FocusTransition::Entered, "round {round}");
            assert_eq!(
                session.toggle(&mut host),
                FocusTransition::Left { restored: true },
                "round {round}"
            );
        }
        assert_eq!(host.restores, 3);
        assert_eq!(host.panes, vec!["editor", "preview"]);
    }

    #[test]
    fn test_sessions_are_independent() {
        let mut host = FakeHost::new(&["a", "b"]);
        let mut first = FocusSession::new(1.25);
        let second: FocusSession<Vec<&'static str>> = FocusSession::new(1.25);

        first.toggle(&mut host);
        assert!(first.is_active());
        assert!(!second.is_active());
        assert_eq!(second.saved_layout(), None);
    }
}
