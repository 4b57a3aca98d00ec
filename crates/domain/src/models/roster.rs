//! Roster domain models.
//!
//! A roster is the derived, presentation-ready view of every member in the
//! groups owned by the current identity. Entries are reference counted so a
//! push update replaces one entry and shares the rest with the previous list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use shared::distance::{round_km, Coordinates};
use shared::relative_time::{format_elapsed, Locale};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use super::{DevicePosition, MemberWithGroup, SafetyState, SafetyStatus};
use crate::error::LoadFailure;

/// One member as shown on the roster list and map.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub member_id: Uuid,
    pub group_id: Uuid,
    pub group_name: String,
    pub display_name: String,
    pub email: String,
    pub status: SafetyState,
    pub last_reported_at: Option<DateTime<Utc>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub distance_km: Option<f64>,
    pub formatted_elapsed: String,
}

impl RosterEntry {
    /// Joins a member with its latest status and the viewer's position.
    pub fn build(
        member: &MemberWithGroup,
        latest: Option<&SafetyStatus>,
        position: Option<&DevicePosition>,
        locale: Locale,
        now: DateTime<Utc>,
    ) -> Self {
        let coordinates = latest.and_then(SafetyStatus::coordinates);

        Self {
            member_id: member.member.id,
            group_id: member.member.group_id,
            group_name: member.group_name.clone(),
            display_name: member.member.display_name().to_string(),
            email: member.member.email.clone(),
            status: latest.map(|s| s.status).unwrap_or_default(),
            last_reported_at: latest.map(|s| s.reported_at),
            latitude: latest.and_then(|s| s.latitude),
            longitude: latest.and_then(|s| s.longitude),
            distance_km: distance_from(coordinates, position),
            formatted_elapsed: latest
                .map(|s| format_elapsed(s.reported_at, now, locale))
                .unwrap_or_default(),
        }
    }

    /// Returns a copy of this entry updated with a newer status report.
    ///
    /// When either side lacks coordinates the previous distance is kept.
    pub fn with_status(
        &self,
        status: &SafetyStatus,
        position: Option<&DevicePosition>,
        locale: Locale,
        now: DateTime<Utc>,
    ) -> Self {
        let distance_km = distance_from(status.coordinates(), position).or(self.distance_km);

        Self {
            status: status.status,
            last_reported_at: Some(status.reported_at),
            latitude: status.latitude,
            longitude: status.longitude,
            distance_km,
            formatted_elapsed: format_elapsed(status.reported_at, now, locale),
            ..self.clone()
        }
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.latitude, self.longitude)
    }

    pub fn has_location(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }

    /// Location rendered for display and search, e.g. `"31.77000, 35.21000"`.
    pub fn location_label(&self) -> Option<String> {
        self.coordinates()
            .map(|c| format!("{:.5}, {:.5}", c.latitude, c.longitude))
    }
}

fn distance_from(
    coordinates: Option<Coordinates>,
    position: Option<&DevicePosition>,
) -> Option<f64> {
    match (coordinates, position) {
        (Some(member), Some(device)) => {
            Some(round_km(member.distance_km_to(&device.coordinates())))
        }
        _ => None,
    }
}

/// An immutable, cheaply clonable list of roster entries.
#[derive(Clone, Default)]
pub struct Roster(Arc<Vec<Arc<RosterEntry>>>);

impl Roster {
    pub fn new(entries: Vec<RosterEntry>) -> Self {
        Self(Arc::new(entries.into_iter().map(Arc::new).collect()))
    }

    pub fn entries(&self) -> &[Arc<RosterEntry>] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, member_id: Uuid) -> Option<&Arc<RosterEntry>> {
        self.0.iter().find(|entry| entry.member_id == member_id)
    }

    /// True when both rosters share the same underlying list.
    pub fn ptr_eq(a: &Roster, b: &Roster) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// Returns a new roster with the entry for `member_id` replaced.
    ///
    /// Every other entry is shared with `self`. Returns `None` when the member
    /// is not part of this roster.
    pub fn replace_entry(&self, member_id: Uuid, entry: Arc<RosterEntry>) -> Option<Roster> {
        let index = self.0.iter().position(|e| e.member_id == member_id)?;
        let mut entries = Vec::clone(&self.0);
        if let Some(slot) = entries.get_mut(index) {
            *slot = entry;
        }
        Some(Roster(Arc::new(entries)))
    }

    pub fn with_location_count(&self) -> usize {
        self.0.iter().filter(|e| e.has_location()).count()
    }

    pub fn safe_count(&self) -> usize {
        self.0.iter().filter(|e| e.status.is_safe()).count()
    }
}

impl fmt::Debug for Roster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

impl Serialize for Roster {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter().map(|entry| entry.as_ref()))
    }
}

/// The roster cell as observed by consumers.
///
/// Published atomically; readers never see a partially built roster.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterSnapshot {
    pub entries: Roster,
    pub is_loading: bool,
    pub error: Option<LoadFailure>,
    /// True once any bulk load has succeeded.
    pub has_loaded: bool,
}

/// Which entries the presentation adapter keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DisplayMode {
    #[default]
    All,
    WithLocationOnly,
}

/// Health of the realtime subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionHealth {
    #[default]
    Connecting,
    Connected,
    Disconnected,
}

impl SubscriptionHealth {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionHealth::Connecting => "connecting",
            SubscriptionHealth::Connected => "connected",
            SubscriptionHealth::Disconnected => "disconnected",
        }
    }

    /// Allowed transitions: connecting to connected or disconnected, and
    /// connected to disconnected. Disconnected is terminal.
    pub fn can_transition_to(&self, next: SubscriptionHealth) -> bool {
        matches!(
            (self, next),
            (SubscriptionHealth::Connecting, SubscriptionHealth::Connected)
                | (SubscriptionHealth::Connecting, SubscriptionHealth::Disconnected)
                | (SubscriptionHealth::Connected, SubscriptionHealth::Disconnected)
        )
    }
}

impl fmt::Display for SubscriptionHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Member;
    use chrono::Duration;

    fn member_with_group(name: Option<&str>) -> MemberWithGroup {
        MemberWithGroup {
            member: Member {
                id: Uuid::new_v4(),
                group_id: Uuid::new_v4(),
                email: "mrshapron@gmail.com".to_string(),
                name: name.map(str::to_string),
                created_at: Utc::now(),
                linked_user_id: None,
            },
            group_name: "Family".to_string(),
        }
    }

    fn status(member_id: Uuid, lat: Option<f64>, lon: Option<f64>) -> SafetyStatus {
        SafetyStatus {
            id: 1,
            member_id,
            status: SafetyState::Safe,
            latitude: lat,
            longitude: lon,
            reported_at: Utc::now() - Duration::minutes(5),
        }
    }

    #[test]
    fn test_build_without_status() {
        let member = member_with_group(None);
        let entry = RosterEntry::build(&member, None, None, Locale::En, Utc::now());

        assert_eq!(entry.display_name, "mrshapron@gmail.com");
        assert_eq!(entry.status, SafetyState::Unknown);
        assert!(entry.last_reported_at.is_none());
        assert!(entry.distance_km.is_none());
        assert_eq!(entry.formatted_elapsed, "");
    }

    #[test]
    fn test_build_with_status_and_position() {
        let member = member_with_group(Some("Dana"));
        let latest = status(member.member.id, Some(31.0), Some(35.0));
        let position = DevicePosition::new(31.0, 34.0, 5.0);

        let entry = RosterEntry::build(
            &member,
            Some(&latest),
            Some(&position),
            Locale::En,
            Utc::now(),
        );

        assert_eq!(entry.display_name, "Dana");
        assert_eq!(entry.status, SafetyState::Safe);
        assert_eq!(entry.formatted_elapsed, "5 minutes ago");
        let distance = entry.distance_km.unwrap();
        assert!((distance - 95.31).abs() < 0.02, "got {}", distance);
        assert_eq!(distance, round_km(distance));
    }

    #[test]
    fn test_distance_requires_device_position() {
        let member = member_with_group(None);
        let latest = status(member.member.id, Some(31.0), Some(35.0));
        let entry = RosterEntry::build(&member, Some(&latest), None, Locale::En, Utc::now());
        assert!(entry.has_location());
        assert!(entry.distance_km.is_none());
    }

    #[test]
    fn test_with_status_preserves_distance_without_coordinates() {
        let member = member_with_group(None);
        let latest = status(member.member.id, Some(31.0), Some(35.0));
        let position = DevicePosition::new(31.0, 34.0, 5.0);
        let entry = RosterEntry::build(
            &member,
            Some(&latest),
            Some(&position),
            Locale::En,
            Utc::now(),
        );

        let update = status(member.member.id, None, None);
        let patched = entry.with_status(&update, Some(&position), Locale::En, Utc::now());

        assert_eq!(patched.distance_km, entry.distance_km);
        assert!(!patched.has_location());
        assert_eq!(patched.display_name, entry.display_name);
    }

    #[test]
    fn test_location_label() {
        let member = member_with_group(None);
        let latest = status(member.member.id, Some(31.77), Some(35.2137));
        let entry = RosterEntry::build(&member, Some(&latest), None, Locale::En, Utc::now());
        assert_eq!(entry.location_label().as_deref(), Some("31.77000, 35.21370"));
    }

    #[test]
    fn test_replace_entry_shares_other_entries() {
        let a = member_with_group(Some("A"));
        let b = member_with_group(Some("B"));
        let now = Utc::now();
        let roster = Roster::new(vec![
            RosterEntry::build(&a, None, None, Locale::En, now),
            RosterEntry::build(&b, None, None, Locale::En, now),
        ]);

        let replacement = Arc::new(RosterEntry::build(
            &a,
            Some(&status(a.member.id, None, None)),
            None,
            Locale::En,
            now,
        ));
        let patched = roster.replace_entry(a.member.id, replacement).unwrap();

        assert!(!Roster::ptr_eq(&roster, &patched));
        assert!(Arc::ptr_eq(&roster.entries()[1], &patched.entries()[1]));
        assert_eq!(patched.entries()[0].status, SafetyState::Safe);
        assert!(roster
            .replace_entry(Uuid::new_v4(), Arc::clone(&roster.entries()[0]))
            .is_none());
    }

    #[test]
    fn test_subscription_transitions() {
        use SubscriptionHealth::*;
        assert!(Connecting.can_transition_to(Connected));
        assert!(Connecting.can_transition_to(Disconnected));
        assert!(Connected.can_transition_to(Disconnected));
        assert!(!Disconnected.can_transition_to(Connected));
        assert!(!Connected.can_transition_to(Connecting));
        assert!(!Connected.can_transition_to(Connected));
    }

    #[test]
    fn test_roster_serializes_as_list() {
        let member = member_with_group(Some("Avi"));
        let roster = Roster::new(vec![RosterEntry::build(
            &member,
            None,
            None,
            Locale::En,
            Utc::now(),
        )]);
        let json = serde_json::to_value(&roster).unwrap();
        assert_eq!(json[0]["displayName"], "Avi");
        assert_eq!(json[0]["status"], "unknown");
    }
}
