// cl_multiview.rs — several player views on one screen
//
// The camera only talks to multiview through the Multiview trait: whether
// it is on, which player the main view shows, and per-view track slots.

pub const MV_VIEWS: usize = 4;

pub trait Multiview {
    fn enabled(&self) -> bool;

    /// Picture-in-picture: one main view plus one inset.
    fn inset_enabled(&self) -> bool;

    /// Player slot drawn in the main view.
    fn main_view(&self) -> Option<usize>;

    /// Player slot assigned to `view`.
    fn view_slot(&self, view: usize) -> Option<usize>;

    /// Assign `player` to `view` (the view being edited when None).
    /// A None player returns the view to its default.
    fn set_track_slot(&mut self, view: Option<usize>, player: Option<usize>);

    /// Jump/move-down while locked with views active.
    fn tracking_adjustment(&mut self, inc: i32);
}

/// Single view.
#[derive(Debug, Default)]
pub struct NoMultiview;

impl Multiview for NoMultiview {
    fn enabled(&self) -> bool {
        false
    }

    fn inset_enabled(&self) -> bool {
        false
    }

    fn main_view(&self) -> Option<usize> {
        None
    }

    fn view_slot(&self, _view: usize) -> Option<usize> {
        None
    }

    fn set_track_slot(&mut self, _view: Option<usize>, _player: Option<usize>) {}

    fn tracking_adjustment(&mut self, _inc: i32) {}
}

/// Up to MV_VIEWS views with per-view player assignment.
#[derive(Debug, Default, Clone)]
pub struct MultiviewSlots {
    /// Number of views drawn, 0 or 1 means multiview is off.
    pub views: usize,
    pub inset: bool,
    /// View edited when no view is named.
    pub current: usize,
    slots: [Option<usize>; MV_VIEWS],
}

impl MultiviewSlots {
    pub fn new(views: usize, inset: bool) -> Self {
        Self {
            views: views.min(MV_VIEWS),
            inset,
            ..Self::default()
        }
    }
}

impl Multiview for MultiviewSlots {
    fn enabled(&self) -> bool {
        self.views > 1
    }

    fn inset_enabled(&self) -> bool {
        self.enabled() && self.inset
    }

    fn main_view(&self) -> Option<usize> {
        self.slots[0]
    }

    fn view_slot(&self, view: usize) -> Option<usize> {
        self.slots.get(view).copied().flatten()
    }

    fn set_track_slot(&mut self, view: Option<usize>, player: Option<usize>) {
        let view = view.unwrap_or(self.current);
        if let Some(slot) = self.slots.get_mut(view) {
            *slot = player;
        }
    }

    fn tracking_adjustment(&mut self, inc: i32) {
        if !self.enabled() {
            return;
        }
        if self.inset {
            // swap main and inset
            self.slots.swap(0, 1);
            return;
        }
        let views = self.views as i32;
        self.current = (self.current as i32 + inc).rem_euclid(views) as usize;
    }
}
