//! State model operations.
//!
//! Every mutation validates first and only then touches the state, so a
//! rejected call leaves the [`AppState`] exactly as it was.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::{
    AppState, AttendanceRecord, AttendanceStatus, Club, LeaveRecord, Member, MemberUpdate,
};
use crate::util::normalize_text_option;

/// One row of the bulk roster editor: a member and the club it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterRow {
    pub club_id: String,
    pub member: Member,
}

/// Dashboard counters for one day
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DailySummary {
    pub clubs: usize,
    /// Clubs with a saved roll call for the day
    pub completed: usize,
    pub total_members: usize,
    pub absent: usize,
    pub excused: usize,
}

impl AppState {
    /// Add a club; its name must not be blank and its id must be new.
    pub fn create_club(&mut self, club: Club) -> Result<()> {
        if club.name.trim().is_empty() {
            return Err(Error::InvalidInput("club name must not be empty".to_string()));
        }
        if self.club(&club.id).is_some() {
            return Err(Error::DuplicateClub(club.id));
        }
        self.ensure_members_unique(club.members.iter().map(|member| member.id.as_str()))?;

        self.clubs.push(club);
        Ok(())
    }

    /// Rename a club and replace its description.
    pub fn update_club(&mut self, club_id: &str, name: &str, description: &str) -> Result<()> {
        let name = normalize_text_option(Some(name.to_string()))
            .ok_or_else(|| Error::InvalidInput("club name must not be empty".to_string()))?;
        let club = self
            .club_mut(club_id)
            .ok_or_else(|| Error::ClubNotFound(club_id.to_string()))?;

        club.name = name;
        club.description = description.trim().to_string();
        Ok(())
    }

    /// Remove an empty club together with all of its attendance records.
    pub fn delete_club(&mut self, club_id: &str) -> Result<Club> {
        let index = self
            .clubs
            .iter()
            .position(|club| club.id == club_id)
            .ok_or_else(|| Error::ClubNotFound(club_id.to_string()))?;

        let club = &self.clubs[index];
        if !club.members.is_empty() {
            return Err(Error::ClubHasMembers {
                name: club.name.clone(),
                count: club.members.len(),
            });
        }

        self.attendance_records
            .retain(|record| record.club_id != club_id);
        Ok(self.clubs.remove(index))
    }

    /// Append a member to a club's roster. Member ids are unique dataset-wide.
    pub fn add_member(&mut self, club_id: &str, member: Member) -> Result<()> {
        if member.name.trim().is_empty() {
            return Err(Error::InvalidInput("member name must not be empty".to_string()));
        }
        if self.club(club_id).is_none() {
            return Err(Error::ClubNotFound(club_id.to_string()));
        }
        if self.find_member(&member.id).is_some() {
            return Err(Error::DuplicateMember(member.id));
        }

        if let Some(club) = self.club_mut(club_id) {
            club.members.push(member);
        }
        Ok(())
    }

    /// Apply a partial update to one member of a club.
    pub fn update_member(
        &mut self,
        club_id: &str,
        member_id: &str,
        update: &MemberUpdate,
    ) -> Result<()> {
        if update
            .name
            .as_deref()
            .is_some_and(|name| name.trim().is_empty())
        {
            return Err(Error::InvalidInput("member name must not be empty".to_string()));
        }
        let club = self
            .club_mut(club_id)
            .ok_or_else(|| Error::ClubNotFound(club_id.to_string()))?;
        let member = club
            .members
            .iter_mut()
            .find(|member| member.id == member_id)
            .ok_or_else(|| Error::MemberNotFound(member_id.to_string()))?;

        update.apply_to(member);
        Ok(())
    }

    /// Remove a member from a club's roster; past roll calls keep their entries.
    pub fn delete_member(&mut self, club_id: &str, member_id: &str) -> Result<Member> {
        let club = self
            .club_mut(club_id)
            .ok_or_else(|| Error::ClubNotFound(club_id.to_string()))?;
        let index = club
            .members
            .iter()
            .position(|member| member.id == member_id)
            .ok_or_else(|| Error::MemberNotFound(member_id.to_string()))?;

        Ok(club.members.remove(index))
    }

    /// Replace every club's roster with the rows of the bulk editor.
    ///
    /// The rows are the complete roster: a club with no rows ends up empty.
    /// Club attributes are untouched.
    pub fn replace_roster(&mut self, rows: Vec<RosterRow>) -> Result<()> {
        let mut seen = HashSet::new();
        for row in &rows {
            if self.club(&row.club_id).is_none() {
                return Err(Error::ClubNotFound(row.club_id.clone()));
            }
            if row.member.name.trim().is_empty() {
                return Err(Error::InvalidInput(format!(
                    "member {} has an empty name",
                    row.member.id
                )));
            }
            if !seen.insert(row.member.id.as_str()) {
                return Err(Error::DuplicateMember(row.member.id.clone()));
            }
        }

        let mut rosters: BTreeMap<String, Vec<Member>> = BTreeMap::new();
        for row in rows {
            rosters.entry(row.club_id).or_default().push(row.member);
        }
        for club in &mut self.clubs {
            club.members = rosters.remove(&club.id).unwrap_or_default();
        }
        Ok(())
    }

    /// Store a roll call, replacing any record with the same `(club, date)`.
    ///
    /// Members on leave that day are written as EXCUSED whatever the caller
    /// submitted, and `updated_at` is stamped with `now_ms`.
    pub fn save_attendance(
        &mut self,
        mut record: AttendanceRecord,
        now_ms: i64,
    ) -> Result<AttendanceRecord> {
        let club = self
            .club(&record.club_id)
            .ok_or_else(|| Error::ClubNotFound(record.club_id.clone()))?;

        let excused = self
            .leave_records
            .iter()
            .filter(|leave| leave.date == record.date)
            .filter(|leave| {
                club.has_member(&leave.member_id) || record.records.contains_key(&leave.member_id)
            })
            .map(|leave| leave.member_id.clone())
            .collect::<Vec<_>>();
        for member_id in excused {
            record.records.insert(member_id, AttendanceStatus::Excused);
        }

        record.notes = normalize_text_option(record.notes);
        record.updated_at = Some(now_ms);

        let (club_id, date) = (record.club_id.clone(), record.date);
        self.attendance_records
            .retain(|existing| !existing.has_key(&club_id, date));
        self.attendance_records.insert(0, record.clone());
        Ok(record)
    }

    /// File a leave, replacing any leave for the same member and day.
    pub fn set_leave(&mut self, leave: LeaveRecord) -> Result<()> {
        if leave.member_id.trim().is_empty() {
            return Err(Error::InvalidInput("leave needs a member id".to_string()));
        }
        self.leave_records
            .retain(|existing| !existing.covers(&leave.member_id, leave.date));
        self.leave_records.push(leave);
        Ok(())
    }

    /// Revoke a leave.
    ///
    /// An existing roll call entry of EXCUSED for that member and day goes back
    /// to PRESENT (and the record is re-stamped so the change wins the next
    /// merge). No attendance record is created when none exists.
    pub fn cancel_leave(&mut self, leave_id: &str, now_ms: i64) -> Result<LeaveRecord> {
        let index = self
            .leave_records
            .iter()
            .position(|leave| leave.id == leave_id)
            .ok_or_else(|| Error::LeaveNotFound(leave_id.to_string()))?;
        let leave = self.leave_records.remove(index);

        for record in self
            .attendance_records
            .iter_mut()
            .filter(|record| record.date == leave.date)
        {
            if let Some(status) = record.records.get_mut(&leave.member_id) {
                if *status == AttendanceStatus::Excused {
                    *status = AttendanceStatus::Present;
                    record.updated_at = Some(now_ms);
                }
            }
        }
        Ok(leave)
    }

    /// The leave covering `member_id` on `date`, if one was filed.
    #[must_use]
    pub fn leave_for(&self, member_id: &str, date: NaiveDate) -> Option<&LeaveRecord> {
        self.leave_records
            .iter()
            .find(|leave| leave.covers(member_id, date))
    }

    #[must_use]
    pub fn attendance_for(&self, club_id: &str, date: NaiveDate) -> Option<&AttendanceRecord> {
        self.attendance_records
            .iter()
            .find(|record| record.has_key(club_id, date))
    }

    /// Status shown for a member: EXCUSED while a leave exists, otherwise
    /// whatever the roll call stored (if any).
    #[must_use]
    pub fn effective_status(
        &self,
        club_id: &str,
        member_id: &str,
        date: NaiveDate,
    ) -> Option<AttendanceStatus> {
        if self.leave_for(member_id, date).is_some() {
            return Some(AttendanceStatus::Excused);
        }
        self.attendance_for(club_id, date)
            .and_then(|record| record.records.get(member_id).copied())
    }

    /// Starting statuses for taking a roll call.
    pub fn roll_call_draft(
        &self,
        club_id: &str,
        date: NaiveDate,
    ) -> Result<BTreeMap<String, AttendanceStatus>> {
        let club = self
            .club(club_id)
            .ok_or_else(|| Error::ClubNotFound(club_id.to_string()))?;
        let existing = self.attendance_for(club_id, date);

        Ok(club
            .members
            .iter()
            .map(|member| {
                let status = if self.leave_for(&member.id, date).is_some() {
                    AttendanceStatus::Excused
                } else {
                    existing
                        .and_then(|record| record.records.get(&member.id).copied())
                        .unwrap_or(AttendanceStatus::Present)
                };
                (member.id.clone(), status)
            })
            .collect())
    }

    /// Dashboard counters for one day across every club.
    #[must_use]
    pub fn daily_summary(&self, date: NaiveDate) -> DailySummary {
        let todays = self
            .attendance_records
            .iter()
            .filter(|record| record.date == date)
            .collect::<Vec<_>>();

        DailySummary {
            clubs: self.clubs.len(),
            completed: todays.len(),
            total_members: self.total_members(),
            absent: todays
                .iter()
                .map(|record| record.count(AttendanceStatus::Absent))
                .sum(),
            excused: self
                .leave_records
                .iter()
                .filter(|leave| leave.date == date)
                .count(),
        }
    }

    fn ensure_members_unique<'a>(&self, ids: impl Iterator<Item = &'a str>) -> Result<()> {
        let mut seen = HashSet::new();
        for id in ids {
            if !seen.insert(id) || self.find_member(id).is_some() {
                return Err(Error::DuplicateMember(id.to_string()));
            }
        }
        Ok(())
    }
}
