//! Layout tracker.
//!
//! Lives on the hook thread. Holds the last observed layout and reports a
//! change only when the foreground layout actually differs.

use crate::platform::{KeyNotification, LayoutId, LayoutQuery};

pub struct LayoutTracker<Q: LayoutQuery> {
    query: Q,
    last_seen: Option<LayoutId>,
}

impl<Q: LayoutQuery> LayoutTracker<Q> {
    pub fn new(query: Q) -> Self {
        Self {
            query,
            last_seen: None,
        }
    }

    /// Records the current layout without reporting it.
    ///
    /// Returns the seeded layout, if one could be resolved.
    pub fn seed(&mut self) -> Option<LayoutId> {
        match self.query.foreground_layout() {
            Ok(id) if !id.is_unknown() => {
                self.last_seen = Some(id);
                Some(id)
            }
            Ok(_) => {
                log::debug!("No focused window at seed time");
                None
            }
            Err(e) => {
                log::warn!("{}", e);
                None
            }
        }
    }

    /// Re-queries the foreground layout.
    ///
    /// Returns the new layout when it differs from the last one seen.
    pub fn observe(&mut self, note: KeyNotification) -> Option<LayoutId> {
        let current = match self.query.foreground_layout() {
            Ok(id) if id.is_unknown() => {
                log::trace!("No focused window ({:?})", note);
                return None;
            }
            Ok(id) => id,
            Err(e) => {
                log::warn!("{}, skipping", e);
                return None;
            }
        };

        match self.last_seen {
            None => {
                log::debug!("Seeding layout from first event: {}", current);
                self.last_seen = Some(current);
                None
            }
            Some(last) if last == current => None,
            Some(last) => {
                log::debug!("Layout {} -> {} ({:?})", last, current, note);
                self.last_seen = Some(current);
                Some(current)
            }
        }
    }

    pub fn last_seen(&self) -> Option<LayoutId> {
        self.last_seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InputError;
    use crate::platform::fake::ScriptedLayouts;

    const NOTE: KeyNotification = KeyNotification::KeyUp { vk: 0x10 };

    fn tracker(ids: &[u64]) -> LayoutTracker<ScriptedLayouts> {
        let layouts = ScriptedLayouts::default();
        layouts.push_ids(ids);
        LayoutTracker::new(layouts)
    }

    #[test]
    fn seed_never_reports() {
        let mut tracker = tracker(&[0x409, 0x409]);
        assert_eq!(tracker.seed(), Some(LayoutId::new(0x409)));
        assert_eq!(tracker.observe(NOTE), None);
    }

    #[test]
    fn fires_only_on_difference() {
        let mut tracker = tracker(&[0x409, 0x409, 0x419, 0x419, 0x419, 0x409, 0x422]);
        tracker.seed();

        let fired: Vec<Option<LayoutId>> = (0..6).map(|_| tracker.observe(NOTE)).collect();
        assert_eq!(
            fired,
            vec![
                None,
                Some(LayoutId::new(0x419)),
                None,
                None,
                Some(LayoutId::new(0x409)),
                Some(LayoutId::new(0x422)),
            ]
        );
    }

    #[test]
    fn first_event_seeds_when_startup_seed_missing() {
        let mut tracker = tracker(&[0, 0x409, 0x419]);
        assert_eq!(tracker.seed(), None);
        assert_eq!(tracker.observe(NOTE), None);
        assert_eq!(tracker.last_seen(), Some(LayoutId::new(0x409)));
        assert_eq!(tracker.observe(NOTE), Some(LayoutId::new(0x419)));
    }

    #[test]
    fn failed_or_unknown_query_skips_cycle() {
        let layouts = ScriptedLayouts::default();
        layouts.push_ids(&[0x409]);
        layouts.push(Err(InputError::ForegroundQueryFailed("gone".into())));
        layouts.push_ids(&[0, 0x409, 0x419]);
        let mut tracker = LayoutTracker::new(layouts);
        tracker.seed();

        assert_eq!(tracker.observe(NOTE), None);
        assert_eq!(tracker.observe(NOTE), None);
        assert_eq!(tracker.last_seen(), Some(LayoutId::new(0x409)));
        assert_eq!(tracker.observe(NOTE), None);
        assert_eq!(
            tracker.observe(KeyNotification::ForegroundChanged),
            Some(LayoutId::new(0x419))
        );
    }
}
