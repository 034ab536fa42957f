use chrono::{DateTime, Utc};
use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// Final outcome of a match, also used for a participant's guess.
/// Wire encoding follows the classic 1X2 notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    #[serde(rename = "1")]
    Home,
    #[serde(rename = "X")]
    Draw,
    #[serde(rename = "2")]
    Away,
}

impl Outcome {
    /// Parses the 1X2 wire form used by the /result command.
    pub fn parse_wire(input: &str) -> Option<Outcome> {
        match input {
            "1" => Some(Outcome::Home),
            "X" | "x" => Some(Outcome::Draw),
            "2" => Some(Outcome::Away),
            _ => None,
        }
    }

    /// Parses the keypad form used by the /predict command:
    /// 1 = home, 2 = draw, 3 = away. "X" is accepted as draw too.
    pub fn parse_keypad(input: &str) -> Option<Outcome> {
        match input {
            "1" => Some(Outcome::Home),
            "2" | "X" | "x" => Some(Outcome::Draw),
            "3" => Some(Outcome::Away),
            _ => None,
        }
    }

    pub fn as_wire(&self) -> &'static str {
        match self {
            Outcome::Home => "1",
            Outcome::Draw => "X",
            Outcome::Away => "2",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    Scheduled,
    Locked,
    Finished,
}

// Main Match model - one fixture, stored in the `matches` collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    #[serde(rename = "matchId")]
    pub match_id: String,

    #[serde(rename = "teamA")]
    pub team_a: String,

    #[serde(rename = "teamB")]
    pub team_b: String,

    #[serde(rename = "kickoffTime")]
    pub kickoff_time: BsonDateTime,

    #[serde(rename = "status")]
    pub status: MatchStatus,

    #[serde(rename = "result", skip_serializing_if = "Option::is_none")]
    pub result: Option<Outcome>,

    #[serde(rename = "locked")]
    pub locked: bool,

    #[serde(rename = "lockedAt", skip_serializing_if = "Option::is_none")]
    pub locked_at: Option<BsonDateTime>,

    #[serde(rename = "pollMessageId", skip_serializing_if = "Option::is_none")]
    pub poll_message_id: Option<String>,

    #[serde(rename = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<BsonDateTime>,
}

impl Match {
    pub fn new(
        match_id: impl Into<String>,
        team_a: impl Into<String>,
        team_b: impl Into<String>,
        kickoff: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Match {
            id: None,
            match_id: match_id.into(),
            team_a: team_a.into(),
            team_b: team_b.into(),
            kickoff_time: BsonDateTime::from_chrono(kickoff),
            status: MatchStatus::Scheduled,
            result: None,
            locked: false,
            locked_at: None,
            poll_message_id: None,
            created_at: Some(BsonDateTime::from_chrono(created_at)),
        }
    }

    pub fn kickoff(&self) -> DateTime<Utc> {
        self.kickoff_time.to_chrono()
    }

    /// A match refuses new predictions once the lock flag is set or
    /// kickoff has passed, whichever comes first.
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.locked || now >= self.kickoff()
    }

    /// Records the final result. Keeps `result` and `status` in step:
    /// result is present iff the match is FINISHED.
    pub fn finish(&mut self, result: Outcome) {
        self.status = MatchStatus::Finished;
        self.result = Some(result);
    }

    /// Flips the lock flag. Idempotent: a second call leaves `lockedAt`
    /// untouched. Advances status SCHEDULED -> LOCKED, never off FINISHED.
    pub fn mark_locked(&mut self, at: DateTime<Utc>) {
        if self.locked {
            return;
        }
        self.locked = true;
        self.locked_at = Some(BsonDateTime::from_chrono(at));
        if self.status == MatchStatus::Scheduled {
            self.status = MatchStatus::Locked;
        }
    }
}

// For creating matches via the /match command
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateMatch {
    #[validate(length(min = 1, message = "Match ID is required"))]
    pub match_id: String,

    #[validate(length(min = 1, message = "Team A is required"))]
    pub team_a: String,

    #[validate(length(min = 1, message = "Team B is required"))]
    pub team_b: String,

    pub kickoff_time: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn kickoff() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 10, 20, 0, 0).unwrap()
    }

    #[test]
    fn result_is_set_iff_finished() {
        let mut m = Match::new("M1", "Raja", "Wydad", kickoff(), kickoff());
        assert_eq!(m.status, MatchStatus::Scheduled);
        assert!(m.result.is_none());

        m.finish(Outcome::Home);
        assert_eq!(m.status, MatchStatus::Finished);
        assert_eq!(m.result, Some(Outcome::Home));
    }

    #[test]
    fn kickoff_passing_locks_regardless_of_flag() {
        let m = Match::new("M1", "Raja", "Wydad", kickoff(), kickoff());
        assert!(!m.locked);
        assert!(!m.is_locked(kickoff() - chrono::Duration::minutes(1)));
        assert!(m.is_locked(kickoff()));
        assert!(m.is_locked(kickoff() + chrono::Duration::hours(1)));
    }

    #[test]
    fn mark_locked_is_idempotent_and_monotone() {
        let mut m = Match::new("M1", "Raja", "Wydad", kickoff(), kickoff());
        let first = kickoff() - chrono::Duration::minutes(14);
        m.mark_locked(first);
        assert!(m.locked);
        assert_eq!(m.status, MatchStatus::Locked);
        let recorded = m.locked_at;

        m.mark_locked(first + chrono::Duration::minutes(5));
        assert_eq!(m.locked_at, recorded);
    }

    #[test]
    fn locking_a_finished_match_keeps_finished_status() {
        let mut m = Match::new("M1", "Raja", "Wydad", kickoff(), kickoff());
        m.finish(Outcome::Draw);
        m.mark_locked(kickoff());
        assert!(m.locked);
        assert_eq!(m.status, MatchStatus::Finished);
        assert_eq!(m.result, Some(Outcome::Draw));
    }

    #[test]
    fn keypad_and_wire_parsing_differ_on_two() {
        assert_eq!(Outcome::parse_keypad("1"), Some(Outcome::Home));
        assert_eq!(Outcome::parse_keypad("2"), Some(Outcome::Draw));
        assert_eq!(Outcome::parse_keypad("3"), Some(Outcome::Away));
        assert_eq!(Outcome::parse_keypad("x"), Some(Outcome::Draw));
        assert_eq!(Outcome::parse_keypad("4"), None);

        assert_eq!(Outcome::parse_wire("1"), Some(Outcome::Home));
        assert_eq!(Outcome::parse_wire("X"), Some(Outcome::Draw));
        assert_eq!(Outcome::parse_wire("2"), Some(Outcome::Away));
        assert_eq!(Outcome::parse_wire("3"), None);
    }
}
