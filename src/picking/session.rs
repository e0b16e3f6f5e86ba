use crate::data::model::{Gather, TimeAxis};
use crate::error::Result;

use super::pick::{PickIndexMode, PickReport, PickSet, SampleIndex};

// ---------------------------------------------------------------------------
// Click events
// ---------------------------------------------------------------------------

/// Which pointer action triggered a click.
///
/// `Primary` picks, `Secondary` removes and `Tertiary` reports. On a mouse
/// these are the left, middle and right buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickKind {
    Primary,
    Secondary,
    Tertiary,
}

impl ClickKind {
    /// Map an egui pointer button to a click kind.
    pub fn from_pointer(button: eframe::egui::PointerButton) -> Option<Self> {
        use eframe::egui::PointerButton;
        match button {
            PointerButton::Primary => Some(ClickKind::Primary),
            PointerButton::Middle => Some(ClickKind::Secondary),
            PointerButton::Secondary => Some(ClickKind::Tertiary),
            PointerButton::Extra1 | PointerButton::Extra2 => None,
        }
    }
}

/// A click already converted to gather coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickEvent {
    pub kind: ClickKind,
    pub receiver: usize,
    pub time: f64,
}

// ---------------------------------------------------------------------------
// Renderer capability
// ---------------------------------------------------------------------------

/// Drawing surface the session talks to. The egui plot implements it; tests
/// use a recorder.
pub trait PickRenderer {
    /// Draw the gather, dropping any previous markers.
    fn render(&mut self, gather: &Gather);
    /// Draw (or move) the pick marker of receiver `r` at gather time `t`.
    fn draw_marker(&mut self, receiver: usize, time: f64);
    /// Erase the pick marker of receiver `r`.
    fn erase_marker(&mut self, receiver: usize);
}

// ---------------------------------------------------------------------------
// PickSession – the controller
// ---------------------------------------------------------------------------

/// Owns the loaded gather and its picks and turns clicks into pick edits.
pub struct PickSession<R: PickRenderer> {
    renderer: R,
    gather: Option<Gather>,
    picks: PickSet,
    index_mode: PickIndexMode,
}

impl<R: PickRenderer> PickSession<R> {
    pub fn new(renderer: R, index_mode: PickIndexMode) -> Self {
        Self {
            renderer,
            gather: None,
            picks: PickSet::new(),
            index_mode,
        }
    }

    /// Validate and render a gather, starting with no picks.
    pub fn load(&mut self, gather: Gather) -> Result<()> {
        self.load_with_picks(gather, PickSet::new())
    }

    /// Validate and render a gather, restoring previously saved picks.
    pub fn load_with_picks(&mut self, gather: Gather, mut picks: PickSet) -> Result<()> {
        gather.validate()?;
        picks.retain_receivers(gather.receiver_count());
        let axis = gather.time_axis();
        let picks: PickSet = picks.iter().map(|(r, t)| (r, axis.clamp(t))).collect();

        log::info!(
            "Loaded gather '{}': {} receivers x {} samples, {} picks",
            gather.label,
            gather.receiver_count(),
            gather.sample_count(),
            picks.len()
        );
        self.gather = Some(gather);
        self.picks = picks;
        self.redraw();
        Ok(())
    }

    /// Re-render the gather and every marker.
    pub fn redraw(&mut self) {
        let Some(gather) = &self.gather else {
            return;
        };
        self.renderer.render(gather);
        for (r, t) in self.picks.iter() {
            self.renderer.draw_marker(r, t);
        }
    }

    /// Pick receiver `receiver` at `time`, overwriting any previous pick.
    pub fn on_primary_click(&mut self, receiver: usize, time: f64) {
        let Some((receiver, axis)) = self.clamp_receiver(receiver) else {
            return;
        };
        let time = axis.clamp(time);
        self.picks.set(receiver, time);
        self.renderer.draw_marker(receiver, time);
        log::debug!("pick receiver {receiver} at {time}");
    }

    /// Remove the pick of `receiver` if there is one.
    pub fn on_secondary_click(&mut self, receiver: usize) {
        let Some((receiver, _)) = self.clamp_receiver(receiver) else {
            return;
        };
        if self.picks.remove(receiver).is_some() {
            self.renderer.erase_marker(receiver);
            log::debug!("removed pick of receiver {receiver}");
        }
    }

    /// Report the pick of `receiver`; `None` when it has no pick.
    pub fn on_tertiary_click(&self, receiver: usize) -> Option<PickReport> {
        let (receiver, axis) = self.clamp_receiver(receiver)?;
        let time = self.picks.get(receiver)?;
        Some(PickReport {
            receiver,
            index: SampleIndex::from_time(&axis, time, self.index_mode),
            time,
        })
    }

    /// Route a click to its handler. Returns the report of a tertiary click.
    pub fn dispatch(&mut self, event: ClickEvent) -> Option<PickReport> {
        match event.kind {
            ClickKind::Primary => {
                self.on_primary_click(event.receiver, event.time);
                None
            }
            ClickKind::Secondary => {
                self.on_secondary_click(event.receiver);
                None
            }
            ClickKind::Tertiary => self.on_tertiary_click(event.receiver),
        }
    }

    /// Reports for every pick, in receiver order.
    pub fn reports(&self) -> Vec<PickReport> {
        self.picks
            .iter()
            .filter_map(|(r, _)| self.on_tertiary_click(r))
            .collect()
    }

    /// Remove every pick.
    pub fn clear_picks(&mut self) {
        let receivers: Vec<usize> = self.picks.iter().map(|(r, _)| r).collect();
        for r in receivers {
            self.on_secondary_click(r);
        }
    }

    /// Hand the picks over (when leaving a file) and unload the gather.
    pub fn take_picks(&mut self) -> PickSet {
        self.gather = None;
        std::mem::take(&mut self.picks)
    }

    pub fn picks(&self) -> &PickSet {
        &self.picks
    }

    pub fn gather(&self) -> Option<&Gather> {
        self.gather.as_ref()
    }

    pub fn index_mode(&self) -> PickIndexMode {
        self.index_mode
    }

    pub fn set_index_mode(&mut self, mode: PickIndexMode) {
        self.index_mode = mode;
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    fn clamp_receiver(&self, receiver: usize) -> Option<(usize, TimeAxis)> {
        let gather = self.gather.as_ref()?;
        let last = gather.receiver_count().checked_sub(1)?;
        Some((receiver.min(last), gather.time_axis()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Trace;
    use crate::error::PickerError;

    #[derive(Debug, Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl PickRenderer for Recorder {
        fn render(&mut self, gather: &Gather) {
            self.calls.push(format!("render {}", gather.receiver_count()));
        }
        fn draw_marker(&mut self, receiver: usize, time: f64) {
            self.calls.push(format!("draw {receiver} {time}"));
        }
        fn erase_marker(&mut self, receiver: usize) {
            self.calls.push(format!("erase {receiver}"));
        }
    }

    /// 3 receivers, 100 samples each over [0, 1).
    fn loaded() -> PickSession<Recorder> {
        let gather = Gather::new(vec![Trace::new(vec![0.0; 100]); 3], 100.0);
        let mut session = PickSession::new(Recorder::default(), PickIndexMode::Nearest);
        session.load(gather).unwrap();
        session
    }

    #[test]
    fn load_renders_gather() {
        let session = loaded();
        assert_eq!(session.renderer().calls, vec!["render 3"]);
        assert!(session.picks().is_empty());
    }

    #[test]
    fn loading_empty_gather_fails() {
        let mut session = PickSession::new(Recorder::default(), PickIndexMode::Nearest);
        let err = session.load(Gather::new(Vec::new(), 100.0)).unwrap_err();
        assert!(matches!(err, PickerError::InvalidInput(_)));
        assert!(session.gather().is_none());
        assert!(session.renderer().calls.is_empty());
    }

    #[test]
    fn loading_ragged_gather_fails() {
        let gather = Gather::new(
            vec![Trace::new(vec![0.0; 10]), Trace::new(vec![0.0; 9])],
            100.0,
        );
        let mut session = PickSession::new(Recorder::default(), PickIndexMode::Nearest);
        assert!(matches!(
            session.load(gather),
            Err(PickerError::InvalidInput(_))
        ));
    }

    #[test]
    fn primary_click_overwrites() {
        let mut session = loaded();
        session.on_primary_click(1, 0.3);
        session.on_primary_click(1, 0.42);
        assert_eq!(session.picks().len(), 1);
        assert_eq!(session.picks().get(1), Some(0.42));
        assert_eq!(
            session.renderer().calls,
            vec!["render 3", "draw 1 0.3", "draw 1 0.42"]
        );
    }

    #[test]
    fn secondary_click_without_pick_is_noop() {
        let mut session = loaded();
        session.on_primary_click(0, 0.1);
        let before = session.picks().clone();
        session.on_secondary_click(2);
        assert_eq!(session.picks(), &before);
        assert!(!session.renderer().calls.iter().any(|c| c.starts_with("erase")));
    }

    #[test]
    fn secondary_click_removes_pick() {
        let mut session = loaded();
        session.on_primary_click(2, 0.5);
        session.on_secondary_click(2);
        assert_eq!(session.picks().get(2), None);
        assert_eq!(session.renderer().calls.last().unwrap(), "erase 2");
    }

    #[test]
    fn tertiary_click_without_pick_reports_nothing() {
        let session = loaded();
        assert_eq!(session.on_tertiary_click(1), None);
    }

    #[test]
    fn tertiary_click_reports_nearest_sample() {
        let mut session = loaded();
        session.on_primary_click(1, 0.42);
        assert_eq!(session.picks().iter().collect::<Vec<_>>(), vec![(1, 0.42)]);
        let report = session.on_tertiary_click(1).unwrap();
        assert_eq!(report.to_string(), "(1, 42, 0.42)");
    }

    #[test]
    fn interpolated_mode_reports_fraction() {
        let mut session = loaded();
        session.set_index_mode(PickIndexMode::Interpolated);
        session.on_primary_click(0, 0.425);
        let report = session.on_tertiary_click(0).unwrap();
        match report.index {
            SampleIndex::Interpolated(v) => assert!((v - 42.5).abs() < 1e-9),
            other => panic!("expected an interpolated index, got {other:?}"),
        }
    }

    #[test]
    fn out_of_range_receiver_and_time_are_clamped() {
        let mut session = loaded();
        session.on_primary_click(10, 7.0);
        assert_eq!(session.picks().len(), 1);
        let t = session.picks().get(2).unwrap();
        assert!((t - 0.99).abs() < 1e-12);
    }

    #[test]
    fn clicks_before_load_are_ignored() {
        let mut session = PickSession::new(Recorder::default(), PickIndexMode::Nearest);
        session.on_primary_click(0, 0.1);
        assert!(session.picks().is_empty());
        assert_eq!(session.on_tertiary_click(0), None);
    }

    #[test]
    fn dispatch_routes_by_kind() {
        let mut session = loaded();
        let click = |kind| ClickEvent {
            kind,
            receiver: 1,
            time: 0.2,
        };
        assert_eq!(session.dispatch(click(ClickKind::Primary)), None);
        assert_eq!(session.picks().get(1), Some(0.2));
        let report = session.dispatch(click(ClickKind::Tertiary)).unwrap();
        assert_eq!(report.receiver, 1);
        assert_eq!(session.dispatch(click(ClickKind::Secondary)), None);
        assert!(session.picks().is_empty());
    }

    #[test]
    fn pointer_buttons_map_to_click_kinds() {
        use eframe::egui::PointerButton;
        assert_eq!(ClickKind::from_pointer(PointerButton::Primary), Some(ClickKind::Primary));
        assert_eq!(ClickKind::from_pointer(PointerButton::Middle), Some(ClickKind::Secondary));
        assert_eq!(ClickKind::from_pointer(PointerButton::Secondary), Some(ClickKind::Tertiary));
        assert_eq!(ClickKind::from_pointer(PointerButton::Extra1), None);
    }

    #[test]
    fn restored_picks_are_redrawn_and_trimmed() {
        let gather = Gather::new(vec![Trace::new(vec![0.0; 100]); 3], 100.0);
        let saved: PickSet = [(0, 0.1), (5, 0.2)].into_iter().collect();
        let mut session = PickSession::new(Recorder::default(), PickIndexMode::Nearest);
        session.load_with_picks(gather, saved).unwrap();
        assert_eq!(session.picks().len(), 1);
        assert_eq!(session.renderer().calls, vec!["render 3", "draw 0 0.1"]);
    }

    #[test]
    fn take_picks_unloads_gather() {
        let mut session = loaded();
        session.on_primary_click(0, 0.1);
        let picks = session.take_picks();
        assert_eq!(picks.get(0), Some(0.1));
        assert!(session.picks().is_empty());
        assert!(session.gather().is_none());
    }
}
