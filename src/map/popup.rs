use super::feature::Feature;

/// Zero-or-one feature highlighted for detail display.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PopupSelection {
  #[default]
  Closed,
  Open(Feature),
}

/// Small state machine behind the detail popup.
///
/// `select` re-targets directly from one open feature to another without
/// an intermediate close. Whenever the admitted feature set is replaced,
/// [`PopupController::retain_valid`] must run: a selection whose id no
/// longer exists is closed, one that survived is refreshed to the newly
/// derived feature.
#[derive(Debug, Default)]
pub struct PopupController {
  selection: PopupSelection,
}

impl PopupController {
  #[must_use]
  pub fn selection(&self) -> &PopupSelection {
    &self.selection
  }

  #[must_use]
  pub fn is_open(&self) -> bool {
    matches!(self.selection, PopupSelection::Open(_))
  }

  pub fn select(&mut self, feature: Feature) {
    self.selection = PopupSelection::Open(feature);
  }

  /// Selection callback from the rendering collaborator: open the popup
  /// for the feature with `id`. Returns whether the id was found.
  pub fn select_by_id(&mut self, features: &[Feature], id: u64) -> bool {
    match features.iter().find(|f| f.id == id) {
      Some(feature) => {
        self.select(feature.clone());
        true
      }
      None => false,
    }
  }

  pub fn close(&mut self) {
    self.selection = PopupSelection::Closed;
  }

  /// Stale-selection guard, applied on every projection pass.
  pub fn retain_valid(&mut self, features: &[Feature]) {
    if let PopupSelection::Open(selected) = &self.selection {
      match features.iter().find(|f| f.id == selected.id) {
        Some(current) => self.selection = PopupSelection::Open(current.clone()),
        None => self.selection = PopupSelection::Closed,
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::poi::record::{BreedingType, PoiRecord, ReturnStatus};
  use chrono::{TimeZone, Utc};

  fn feature(id: u64) -> Feature {
    Feature::from_record(&PoiRecord {
      id,
      latitude: -23.55,
      longitude: -46.63,
      breeding_type: BreedingType::Gutter,
      return_status: ReturnStatus::Pending,
      identified_at: Utc.with_ymd_and_hms(2024, 11, 3, 12, 0, 0).unwrap(),
      activity_id: None,
      notes: None,
      photo_url: None,
    })
  }

  #[test]
  fn select_opens_and_retargets_without_closing() {
    let mut popup = PopupController::default();
    assert_eq!(*popup.selection(), PopupSelection::Closed);

    popup.select(feature(1));
    assert_eq!(*popup.selection(), PopupSelection::Open(feature(1)));

    popup.select(feature(2));
    assert_eq!(*popup.selection(), PopupSelection::Open(feature(2)));

    popup.close();
    assert_eq!(*popup.selection(), PopupSelection::Closed);
  }

  #[test]
  fn select_by_id_only_hits_admitted_features() {
    let features = vec![feature(1), feature(2)];
    let mut popup = PopupController::default();
    assert!(popup.select_by_id(&features, 2));
    assert!(popup.is_open());
    assert!(!popup.select_by_id(&features, 99));
    // A miss leaves the current selection alone.
    assert_eq!(*popup.selection(), PopupSelection::Open(feature(2)));
  }

  #[test]
  fn removed_feature_forces_close() {
    let mut popup = PopupController::default();
    popup.select(feature(1));
    popup.retain_valid(&[feature(2), feature(3)]);
    assert_eq!(*popup.selection(), PopupSelection::Closed);
  }

  #[test]
  fn surviving_selection_is_refreshed() {
    let mut popup = PopupController::default();
    let mut stale = feature(1);
    stale.notes = Some("old".to_string());
    popup.select(stale);

    let mut fresh = feature(1);
    fresh.notes = Some("new".to_string());
    popup.retain_valid(std::slice::from_ref(&fresh));
    assert_eq!(*popup.selection(), PopupSelection::Open(fresh));
  }

  #[test]
  fn guard_is_a_no_op_when_closed() {
    let mut popup = PopupController::default();
    popup.retain_valid(&[feature(1)]);
    assert_eq!(*popup.selection(), PopupSelection::Closed);
  }
}
