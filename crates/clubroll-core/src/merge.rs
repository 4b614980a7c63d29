//! Snapshot merge engine.
//!
//! Clubs and leave records are replaced wholesale by the remote collection
//! when the remote sent one. Attendance records are merged by their
//! `(club_id, date)` key with whole-record last-writer-wins on `updated_at`;
//! ties keep the local record. Two devices editing different members of the
//! same roll call offline will lose one side's edits: that is the accepted
//! limitation of this model, and each such key is reported as a
//! [`MergeConflict`].

use std::collections::HashMap;

use serde::Serialize;

use crate::models::{
    AppState, AttendanceKey, AttendanceRecord, ConflictResolution, MergeConflict, Snapshot,
};

/// What a merge did to the attendance collection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Remote records whose key was new locally
    pub appended: usize,
    /// Local records replaced by a strictly newer remote record
    pub replaced: usize,
    /// Shared keys where the two sides differed and local was kept
    pub kept_local: usize,
    /// Every shared key whose records differed
    pub conflicts: Vec<MergeConflict>,
}

impl MergeReport {
    #[must_use]
    pub fn changed_attendance(&self) -> bool {
        self.appended > 0 || self.replaced > 0
    }
}

/// Result of [`merge`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub state: AppState,
    pub report: MergeReport,
}

/// Reconcile the local state with a remote snapshot.
///
/// Never drops an attendance record either side holds unless a record with
/// the same key replaces it. `merged_at` (Unix ms) becomes `last_synced_at`.
#[must_use]
pub fn merge(local: &AppState, remote: Snapshot, merged_at: i64) -> MergeOutcome {
    let mut report = MergeReport::default();
    let attendance_records = merge_attendance(
        &local.attendance_records,
        remote.attendance_records.unwrap_or_default(),
        merged_at,
        &mut report,
    );

    let state = AppState {
        clubs: remote.clubs.unwrap_or_else(|| local.clubs.clone()),
        attendance_records,
        leave_records: remote
            .leave_records
            .unwrap_or_else(|| local.leave_records.clone()),
        sync_code: local.sync_code.clone(),
        last_synced_at: Some(merged_at),
    };

    MergeOutcome { state, report }
}

fn merge_attendance(
    local: &[AttendanceRecord],
    remote: Vec<AttendanceRecord>,
    merged_at: i64,
    report: &mut MergeReport,
) -> Vec<AttendanceRecord> {
    let mut merged = local.to_vec();
    let mut index: HashMap<AttendanceKey, usize> = HashMap::with_capacity(merged.len());
    for (position, record) in merged.iter().enumerate() {
        index.entry(record.key()).or_insert(position);
    }

    for incoming in remote {
        let key = incoming.key();
        let Some(&position) = index.get(&key) else {
            index.insert(key, merged.len());
            merged.push(incoming);
            report.appended += 1;
            continue;
        };

        let existing = &merged[position];
        if *existing == incoming {
            continue;
        }

        let local_updated_at = existing.updated_at_or_zero();
        let incoming_updated_at = incoming.updated_at_or_zero();
        let resolution = if incoming_updated_at > local_updated_at {
            ConflictResolution::TookRemote
        } else {
            ConflictResolution::KeptLocal
        };

        report.conflicts.push(MergeConflict {
            club_id: key.club_id,
            date: key.date,
            local_updated_at,
            incoming_updated_at,
            resolved_at: merged_at,
            resolution,
        });

        match resolution {
            ConflictResolution::TookRemote => {
                merged[position] = incoming;
                report.replaced += 1;
            }
            ConflictResolution::KeptLocal => report.kept_local += 1,
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttendanceStatus, Club, LeaveRecord};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    fn day(raw: &str) -> NaiveDate {
        raw.parse().unwrap()
    }

    fn record(
        club_id: &str,
        date: &str,
        updated_at: Option<i64>,
        entries: &[(&str, AttendanceStatus)],
    ) -> AttendanceRecord {
        AttendanceRecord {
            id: format!("att-{club_id}-{date}-{}", updated_at.unwrap_or(0)),
            club_id: club_id.to_string(),
            date: day(date),
            records: entries
                .iter()
                .map(|(id, status)| ((*id).to_string(), *status))
                .collect(),
            notes: None,
            updated_at,
        }
    }

    fn club(id: &str) -> Club {
        Club {
            id: id.to_string(),
            name: format!("Club {id}"),
            description: String::new(),
            created_at: 0,
            members: Vec::new(),
        }
    }

    fn state_with(records: Vec<AttendanceRecord>) -> AppState {
        AppState {
            clubs: vec![club("1")],
            attendance_records: records,
            ..AppState::default()
        }
    }

    #[test]
    fn disjoint_keys_are_unioned_without_duplicates() {
        let local = state_with(vec![
            record("1", "2024-05-01", Some(1), &[]),
            record("2", "2024-05-01", Some(1), &[]),
        ]);
        let remote = state_with(vec![
            record("1", "2024-05-02", Some(1), &[]),
            record("3", "2024-05-01", None, &[]),
        ]);

        let outcome = merge(&local, remote.clone().into(), 99);
        let merged = &outcome.state.attendance_records;
        assert_eq!(merged.len(), 4);
        for original in local
            .attendance_records
            .iter()
            .chain(remote.attendance_records.iter())
        {
            assert!(merged.contains(original));
        }
        let keys = merged.iter().map(AttendanceRecord::key).collect::<HashSet<_>>();
        assert_eq!(keys.len(), merged.len());
        assert_eq!(outcome.report.appended, 2);
        assert!(outcome.report.conflicts.is_empty());
    }

    #[test]
    fn newer_remote_record_wins_exactly() {
        let local_record = record("1", "2024-05-01", Some(100), &[("m1", AttendanceStatus::Present)]);
        let remote_record = record("1", "2024-05-01", Some(200), &[("m1", AttendanceStatus::Absent)]);

        let outcome = merge(
            &state_with(vec![local_record]),
            state_with(vec![remote_record.clone()]).into(),
            300,
        );

        assert_eq!(outcome.state.attendance_records, vec![remote_record]);
        assert_eq!(outcome.report.replaced, 1);
        assert_eq!(
            outcome.report.conflicts,
            vec![MergeConflict {
                club_id: "1".to_string(),
                date: day("2024-05-01"),
                local_updated_at: 100,
                incoming_updated_at: 200,
                resolved_at: 300,
                resolution: ConflictResolution::TookRemote,
            }]
        );
    }

    #[test]
    fn older_or_tied_remote_record_keeps_local() {
        let local_record = record("1", "2024-05-01", Some(200), &[("m1", AttendanceStatus::Present)]);
        for remote_updated_at in [Some(200), Some(100), None] {
            let mut remote_record =
                record("1", "2024-05-01", remote_updated_at, &[("m1", AttendanceStatus::Absent)]);
            remote_record.id = "remote".to_string();

            let outcome = merge(
                &state_with(vec![local_record.clone()]),
                state_with(vec![remote_record]).into(),
                300,
            );
            assert_eq!(outcome.state.attendance_records, vec![local_record.clone()]);
            assert_eq!(outcome.report.kept_local, 1);
            assert_eq!(
                outcome.report.conflicts[0].resolution,
                ConflictResolution::KeptLocal
            );
        }
    }

    #[test]
    fn missing_timestamps_on_both_sides_keep_local() {
        let local_record = record("1", "2024-05-01", None, &[("m1", AttendanceStatus::Late)]);
        let remote_record = record("1", "2024-05-01", None, &[("m1", AttendanceStatus::Absent)]);
        let outcome = merge(
            &state_with(vec![local_record.clone()]),
            state_with(vec![remote_record]).into(),
            1,
        );
        assert_eq!(outcome.state.attendance_records, vec![local_record]);
    }

    #[test]
    fn merging_a_state_with_itself_only_touches_last_synced_at() {
        let mut state = state_with(vec![
            record("1", "2024-05-01", Some(5), &[("m1", AttendanceStatus::Present)]),
            record("1", "2024-05-02", None, &[]),
        ]);
        state.leave_records.push(LeaveRecord {
            id: "l1".to_string(),
            member_id: "m1".to_string(),
            student_name: "Ada".to_string(),
            date: day("2024-05-03"),
            reason: "trip".to_string(),
        });
        state.last_synced_at = Some(7);

        let outcome = merge(&state, state.clone().into(), 42);
        let mut expected = state.clone();
        expected.last_synced_at = Some(42);
        assert_eq!(outcome.state, expected);
        assert_eq!(outcome.report, MergeReport::default());
    }

    #[test]
    fn clubs_and_leaves_follow_remote_only_when_present() {
        let mut local = state_with(Vec::new());
        local.leave_records.push(LeaveRecord {
            id: "l1".to_string(),
            member_id: "m1".to_string(),
            student_name: "Ada".to_string(),
            date: day("2024-05-03"),
            reason: "trip".to_string(),
        });

        let absent = Snapshot {
            attendance_records: Some(Vec::new()),
            ..Snapshot::default()
        };
        let kept = merge(&local, absent, 1).state;
        assert_eq!(kept.clubs, local.clubs);
        assert_eq!(kept.leave_records, local.leave_records);

        let replaced = merge(
            &local,
            Snapshot {
                clubs: Some(vec![club("9")]),
                leave_records: Some(Vec::new()),
                ..Snapshot::default()
            },
            1,
        )
        .state;
        assert_eq!(replaced.clubs, vec![club("9")]);
        assert!(replaced.leave_records.is_empty());
    }

    #[test]
    fn duplicate_keys_inside_remote_resolve_against_each_other() {
        let remote = Snapshot {
            attendance_records: Some(vec![
                record("1", "2024-05-01", Some(10), &[("m1", AttendanceStatus::Late)]),
                record("1", "2024-05-01", Some(20), &[("m1", AttendanceStatus::Absent)]),
            ]),
            ..Snapshot::default()
        };
        let merged = merge(&state_with(Vec::new()), remote, 1).state;
        assert_eq!(merged.attendance_records.len(), 1);
        assert_eq!(merged.attendance_records[0].updated_at, Some(20));
    }
}
