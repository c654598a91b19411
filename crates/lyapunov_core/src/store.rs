//! Observable state container for dashboard-level selections.

use crate::bifurcation::BinningConfig;
use crate::poincare::SectionConfig;
use crate::sample::Axes;
use crate::settings::ResampleSettings;
use serde::{Deserialize, Serialize};

pub type SubscriptionId = u64;

type Listener<S> = Box<dyn FnMut(&S)>;

/// Holds a state value and notifies subscribers synchronously after every
/// change, in subscription order.
pub struct Store<S> {
    state: S,
    listeners: Vec<(SubscriptionId, Listener<S>)>,
    next_id: SubscriptionId,
}

impl<S: Default> Default for Store<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S> Store<S> {
    pub fn new(state: S) -> Self {
        Self {
            state,
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn update(&mut self, mutate: impl FnOnce(&mut S)) {
        mutate(&mut self.state);
        self.notify();
    }

    /// Applies a partial update; subscribers only run if something changed.
    pub fn patch<P: Patch<S>>(&mut self, patch: P) -> bool {
        let changed = patch.apply_to(&mut self.state);
        if changed {
            self.notify();
        }
        changed
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&S) + 'static) -> SubscriptionId {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }

    fn notify(&mut self) {
        let state = &self.state;
        for (_, listener) in &mut self.listeners {
            listener(state);
        }
    }
}

/// A partial update of some state type.
pub trait Patch<S> {
    /// Writes the present fields into `state`; returns whether anything
    /// actually changed.
    fn apply_to(self, state: &mut S) -> bool;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DashboardState {
    pub axes: Axes,
    pub axis_enabled: [bool; 3],
    pub resample: ResampleSettings,
    pub section: SectionConfig,
    pub binning: BinningConfig,
    pub capturing: bool,
    pub selected_recording: Option<String>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            axes: Axes::default(),
            axis_enabled: [true; 3],
            resample: ResampleSettings::default(),
            section: SectionConfig::default(),
            binning: BinningConfig::default(),
            capturing: false,
            selected_recording: None,
        }
    }
}

/// Field-wise optional update of [`DashboardState`]. `selected_recording`
/// uses a nested option so a patch can clear the selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DashboardPatch {
    pub axes: Option<Axes>,
    pub axis_enabled: Option<[bool; 3]>,
    pub resample: Option<ResampleSettings>,
    pub section: Option<SectionConfig>,
    pub binning: Option<BinningConfig>,
    pub capturing: Option<bool>,
    #[serde(with = "double_option")]
    pub selected_recording: Option<Option<String>>,
}

fn assign<T: PartialEq>(slot: &mut T, value: Option<T>) -> bool {
    match value {
        Some(v) if *slot != v => {
            *slot = v;
            true
        }
        _ => false,
    }
}

impl Patch<DashboardState> for DashboardPatch {
    fn apply_to(self, state: &mut DashboardState) -> bool {
        let mut changed = false;
        changed |= assign(&mut state.axes, self.axes);
        changed |= assign(&mut state.axis_enabled, self.axis_enabled);
        changed |= assign(&mut state.resample, self.resample);
        changed |= assign(&mut state.section, self.section);
        changed |= assign(&mut state.binning, self.binning);
        changed |= assign(&mut state.capturing, self.capturing);
        changed |= assign(&mut state.selected_recording, self.selected_recording);
        changed
    }
}

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`).
mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S, T>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::{DashboardPatch, DashboardState, Store};
    use crate::resample::ResampleMethod;
    use crate::sample::Axes;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn counting_store() -> (Store<DashboardState>, Rc<RefCell<Vec<bool>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut store = Store::<DashboardState>::default();
        let sink = Rc::clone(&seen);
        store.subscribe(move |state| sink.borrow_mut().push(state.capturing));
        (store, seen)
    }

    #[test]
    fn update_notifies_with_new_state() {
        let (mut store, seen) = counting_store();
        store.update(|s| s.capturing = true);
        store.update(|s| s.capturing = false);
        assert_eq!(*seen.borrow(), vec![true, false]);
    }

    #[test]
    fn patch_only_notifies_on_change() {
        let (mut store, seen) = counting_store();
        let noop = DashboardPatch {
            capturing: Some(false),
            ..DashboardPatch::default()
        };
        assert!(!store.patch(noop));
        assert!(seen.borrow().is_empty());

        let patch = DashboardPatch {
            axes: Some(Axes::new("y", "z", "x")),
            ..DashboardPatch::default()
        };
        assert!(store.patch(patch));
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(store.state().axes.x_key, "y");
        assert!(store.state().axis_enabled.iter().all(|&on| on));
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let (mut store, seen) = counting_store();
        let extra = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&extra);
        let id = store.subscribe(move |_| *counter.borrow_mut() += 1);
        store.update(|s| s.capturing = true);
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.update(|s| s.capturing = false);
        assert_eq!(*extra.borrow(), 1);
        assert_eq!(seen.borrow().len(), 2);
        assert_eq!(store.subscriber_count(), 1);
    }

    #[test]
    fn patch_parses_from_camel_case_json() {
        let patch: DashboardPatch = serde_json::from_str(
            r#"{"resample": {"method": "spline"}, "axisEnabled": [true, false, true]}"#,
        )
        .expect("patch");
        let mut store = Store::<DashboardState>::default();
        assert!(store.patch(patch));
        assert_eq!(store.state().resample.method, ResampleMethod::Spline);
        assert_eq!(store.state().resample.segments_per_edge, 4);
        assert_eq!(store.state().axis_enabled, [true, false, true]);
        assert_eq!(store.state().selected_recording, None);
    }

    #[test]
    fn selection_can_be_set_and_cleared() {
        let mut store = Store::<DashboardState>::default();
        let select: DashboardPatch =
            serde_json::from_str(r#"{"selectedRecording": "rec_1"}"#).expect("patch");
        assert!(store.patch(select));
        assert_eq!(store.state().selected_recording.as_deref(), Some("rec_1"));

        let untouched: DashboardPatch = serde_json::from_str(r#"{}"#).expect("patch");
        assert!(!store.patch(untouched));
        assert_eq!(store.state().selected_recording.as_deref(), Some("rec_1"));

        let clear: DashboardPatch =
            serde_json::from_str(r#"{"selectedRecording": null}"#).expect("patch");
        assert!(store.patch(clear));
        assert_eq!(store.state().selected_recording, None);
    }
}
