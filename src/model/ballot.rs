use rocket::FromForm;
use serde::{Deserialize, Serialize};

use super::voter::VoterId;

/// The submitted ballot form. The `vote` field is optional so that an absent
/// field reaches the handler, which rejects it with a client error instead
/// of Rocket's generic form failure.
#[derive(Debug, FromForm)]
pub struct BallotForm {
    pub vote: Option<String>,
}

/// The record appended to the shared queue: the cross-tier wire contract
/// with the tally worker. Exactly two string fields, no envelope metadata.
///
/// Records are built per submission and discarded once published; nothing is
/// retained on this tier.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub voter_id: VoterId,
    pub vote: String,
}

impl VoteRecord {
    /// Pair an identity with a choice. Performs no validation of the choice;
    /// the handler decides which values are acceptable before building.
    pub fn new(voter_id: VoterId, vote: String) -> Self {
        Self { voter_id, vote }
    }
}
