use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VoteType {
    Up,
    Down,
}

impl VoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteType::Up => "UP",
            VoteType::Down => "DOWN",
        }
    }
}

impl fmt::Display for VoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UP" => Ok(VoteType::Up),
            "DOWN" => Ok(VoteType::Down),
            other => Err(format!("Invalid vote type: {}", other)),
        }
    }
}

/// A user's vote on a post. One per (user, post).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub user_id: Uuid,
    pub post_id: Uuid,
    #[serde(rename = "type")]
    pub vote_type: VoteType,
}

/// A user's vote on a comment. One per (user, comment).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentVote {
    pub user_id: Uuid,
    pub comment_id: Uuid,
    #[serde(rename = "type")]
    pub vote_type: VoteType,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PostVoteRequest {
    pub post_id: Uuid,
    pub vote_type: VoteType,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CommentVoteRequest {
    pub comment_id: Uuid,
    pub vote_type: VoteType,
}

/// What a vote request did to the stored vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteOutcome {
    Created,
    Updated,
    Deleted,
}

impl VoteOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            VoteOutcome::Created => "Vote created",
            VoteOutcome::Updated => "Vote updated",
            VoteOutcome::Deleted => "Vote deleted",
        }
    }
}

/// Anything carrying a vote direction and the voter.
pub trait Ballot {
    fn vote_type(&self) -> VoteType;
    fn voter(&self) -> Uuid;
}

impl Ballot for Vote {
    fn vote_type(&self) -> VoteType {
        self.vote_type
    }

    fn voter(&self) -> Uuid {
        self.user_id
    }
}

impl Ballot for CommentVote {
    fn vote_type(&self) -> VoteType {
        self.vote_type
    }

    fn voter(&self) -> Uuid {
        self.user_id
    }
}

/// Signed score: +1 per up vote, -1 per anything else.
pub fn tally<'a, B, I>(votes: I) -> i64
where
    B: Ballot + 'a,
    I: IntoIterator<Item = &'a B>,
{
    votes.into_iter().fold(0, |acc, vote| match vote.vote_type() {
        VoteType::Up => acc + 1,
        VoteType::Down => acc - 1,
    })
}

/// The vote `viewer` cast among `votes`, if any.
pub fn current_vote<'a, B, I>(votes: I, viewer: Option<Uuid>) -> Option<VoteType>
where
    B: Ballot + 'a,
    I: IntoIterator<Item = &'a B>,
{
    let viewer = viewer?;
    votes
        .into_iter()
        .find(|vote| vote.voter() == viewer)
        .map(|vote| vote.vote_type())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post_vote(user_id: Uuid, vote_type: VoteType) -> Vote {
        Vote { user_id, post_id: Uuid::nil(), vote_type }
    }

    #[test]
    fn test_tally() {
        let none: Vec<Vote> = vec![];
        assert_eq!(tally(&none), 0);

        let votes = vec![
            post_vote(Uuid::new_v4(), VoteType::Up),
            post_vote(Uuid::new_v4(), VoteType::Up),
            post_vote(Uuid::new_v4(), VoteType::Down),
        ];
        assert_eq!(tally(&votes), 1);

        let downs = vec![
            post_vote(Uuid::new_v4(), VoteType::Down),
            post_vote(Uuid::new_v4(), VoteType::Down),
        ];
        assert_eq!(tally(&downs), -2);
    }

    #[test]
    fn test_current_vote() {
        let me = Uuid::new_v4();
        let votes = vec![
            post_vote(Uuid::new_v4(), VoteType::Up),
            post_vote(me, VoteType::Down),
        ];
        assert_eq!(current_vote(&votes, Some(me)), Some(VoteType::Down));
        assert_eq!(current_vote(&votes, Some(Uuid::new_v4())), None);
        assert_eq!(current_vote(&votes, None), None);
    }

    #[test]
    fn test_vote_type_wire_format() {
        assert_eq!(serde_json::to_string(&VoteType::Up).unwrap(), "\"UP\"");
        let parsed: VoteType = serde_json::from_str("\"DOWN\"").unwrap();
        assert_eq!(parsed, VoteType::Down);
        assert!("SIDEWAYS".parse::<VoteType>().is_err());
    }
}
