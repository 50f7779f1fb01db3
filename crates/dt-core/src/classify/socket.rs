//! Cross-module correlation within one server.
//!
//! Two devices of the same server are correlated when their observation
//! windows intersect. Windows are closed intervals, so touching endpoints
//! count as overlap.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;
use dt_common::ServerId;

use crate::profile::DeviceFailureProfile;

/// Closed observation window of one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Window {
    pub fn of(profile: &DeviceFailureProfile) -> Self {
        Window {
            start: profile.first_seen(),
            end: profile.last_seen(),
        }
    }

    pub fn overlaps(&self, other: &Window) -> bool {
        self.start.max(other.start) <= self.end.min(other.end)
    }
}

/// Indices (into `profiles`) of candidates that overlap another module of
/// the same server.
pub fn overlapping_devices(
    profiles: &[DeviceFailureProfile],
    candidates: &[usize],
) -> BTreeSet<usize> {
    let mut by_server: BTreeMap<&ServerId, Vec<usize>> = BTreeMap::new();
    for &idx in candidates {
        by_server
            .entry(&profiles[idx].device().sid)
            .or_default()
            .push(idx);
    }

    let mut correlated = BTreeSet::new();
    for members in by_server.values().filter(|m| m.len() > 1) {
        let windows: Vec<Window> = members.iter().map(|&i| Window::of(&profiles[i])).collect();
        for a in 0..members.len() {
            for b in (a + 1)..members.len() {
                if windows[a].overlaps(&windows[b]) {
                    correlated.insert(members[a]);
                    correlated.insert(members[b]);
                }
            }
        }
    }
    correlated
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use dt_common::{DeviceId, ErrorKind, ErrorKindSet, FailingCell};

    fn t(h: i64) -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2020-03-01 00:00:00", "%Y-%m-%d %H:%M:%S").unwrap()
            + Duration::hours(h)
    }

    fn profile(sid: &str, mem: u32, from: i64, to: i64) -> DeviceFailureProfile {
        let device = DeviceId::new(sid, mem);
        let cell = |row: u32, ts: NaiveDateTime| FailingCell {
            device: device.clone(),
            rank: 0,
            bank: 0,
            row,
            col: 1,
            first_seen: ts,
            last_seen: ts,
            count: 1,
            kinds: ErrorKindSet::single(ErrorKind::Read),
        };
        DeviceFailureProfile::new(
            device.clone(),
            "A1",
            "M1",
            vec![cell(1, t(from)), cell(2, t(to))],
        )
        .unwrap()
    }

    #[test]
    fn overlapping_windows_are_correlated() {
        let profiles = vec![profile("s", 0, 0, 5), profile("s", 1, 2, 7)];
        let hits = overlapping_devices(&profiles, &[0, 1]);
        assert_eq!(hits.into_iter().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn disjoint_windows_are_not() {
        let profiles = vec![profile("s", 0, 0, 1), profile("s", 1, 5, 7)];
        assert!(overlapping_devices(&profiles, &[0, 1]).is_empty());
    }

    #[test]
    fn touching_endpoints_overlap() {
        let a = Window { start: t(0), end: t(3) };
        let b = Window { start: t(3), end: t(4) };
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn only_same_server_pairs_count() {
        let profiles = vec![
            profile("s1", 0, 0, 5),
            profile("s2", 0, 0, 5),
            profile("s2", 1, 10, 12),
        ];
        assert!(overlapping_devices(&profiles, &[0, 1, 2]).is_empty());
    }

    #[test]
    fn non_candidates_are_ignored() {
        let profiles = vec![profile("s", 0, 0, 5), profile("s", 1, 2, 7)];
        assert!(overlapping_devices(&profiles, &[0]).is_empty());
    }

    #[test]
    fn one_overlap_marks_only_its_pair() {
        let profiles = vec![
            profile("s", 0, 0, 5),
            profile("s", 1, 4, 6),
            profile("s", 2, 20, 30),
        ];
        let hits = overlapping_devices(&profiles, &[0, 1, 2]);
        assert_eq!(hits.into_iter().collect::<Vec<_>>(), vec![0, 1]);
    }
}
