//! Whole-dataset state and its wire snapshot

use serde::{Deserialize, Serialize};

use super::{AttendanceRecord, Club, LeaveRecord, Member};

/// The complete dataset of one client.
///
/// This is the unit of persistence and of synchronization: the whole graph is
/// serialized and exchanged at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    #[serde(default)]
    pub clubs: Vec<Club>,
    #[serde(default)]
    pub attendance_records: Vec<AttendanceRecord>,
    #[serde(default)]
    pub leave_records: Vec<LeaveRecord>,
    /// Carried for compatibility with older snapshots; the session's code wins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_code: Option<String>,
    /// Last successful pull or push (Unix ms)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_synced_at: Option<i64>,
}

impl AppState {
    #[must_use]
    pub fn club(&self, club_id: &str) -> Option<&Club> {
        self.clubs.iter().find(|club| club.id == club_id)
    }

    pub(crate) fn club_mut(&mut self, club_id: &str) -> Option<&mut Club> {
        self.clubs.iter_mut().find(|club| club.id == club_id)
    }

    /// Find a member anywhere in the dataset along with the owning club.
    #[must_use]
    pub fn find_member(&self, member_id: &str) -> Option<(&Club, &Member)> {
        self.clubs.iter().find_map(|club| {
            club.member(member_id).map(|member| (club, member))
        })
    }

    #[must_use]
    pub fn total_members(&self) -> usize {
        self.clubs.iter().map(|club| club.members.len()).sum()
    }
}

/// A remote snapshot as fetched from the sync endpoint.
///
/// Unlike [`AppState`], `clubs` and `leave_records` remember whether they
/// were present at all: the merge only replaces a collection the remote
/// actually sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub clubs: Option<Vec<Club>>,
    #[serde(default)]
    pub attendance_records: Option<Vec<AttendanceRecord>>,
    #[serde(default)]
    pub leave_records: Option<Vec<LeaveRecord>>,
    #[serde(default)]
    pub last_synced_at: Option<i64>,
}

impl From<AppState> for Snapshot {
    fn from(state: AppState) -> Self {
        Self {
            clubs: Some(state.clubs),
            attendance_records: Some(state.attendance_records),
            leave_records: Some(state.leave_records),
            last_synced_at: state.last_synced_at,
        }
    }
}

impl From<&AppState> for Snapshot {
    fn from(state: &AppState) -> Self {
        Self::from(state.clone())
    }
}

const SEED_NAMES: [&str; 10] = [
    "Wang Ming", "Li Hua", "Zhang Tong", "Chen Mei", "Zhou Jie", "Lin Shu", "Tsai Yi",
    "Chang Yu", "Liu Te", "Kuo Fu",
];

/// Built-in dataset used when there is no usable local state.
///
/// Three clubs with generated rosters. Generation is deterministic so two
/// fresh devices start from identical member ids.
#[must_use]
pub fn default_dataset() -> AppState {
    let now = chrono::Utc::now().timestamp_millis();
    let seed = [
        ("1", "Street Dance", "High-energy street dance crew", 20),
        ("2", "Guitar", "Music and talent under one roof", 15),
        ("3", "Basketball", "Sweat it out on the court", 25),
    ];

    AppState {
        clubs: seed
            .into_iter()
            .map(|(id, name, description, count)| Club {
                id: id.to_string(),
                name: name.to_string(),
                description: description.to_string(),
                created_at: now,
                members: seed_members(id, count),
            })
            .collect(),
        ..AppState::default()
    }
}

fn seed_members(club_id: &str, count: usize) -> Vec<Member> {
    let classes = seed_classes();
    let club_seed = club_id.bytes().map(usize::from).sum::<usize>();

    (0..count)
        .map(|index| Member {
            id: format!("m-{club_id}-{index}"),
            name: format!(
                "{}{}",
                SEED_NAMES[(index * 7 + club_seed) % SEED_NAMES.len()],
                index + 1
            ),
            student_id: Some(format!("S{club_id:0>2}{index:03}")),
            class_name: classes[(index * 13 + club_seed) % classes.len()].clone(),
        })
        .collect()
}

fn seed_classes() -> Vec<String> {
    (7..=9)
        .flat_map(|grade| (1..=20).map(move |room| format!("{grade}{room:02}")))
        .collect()
}
