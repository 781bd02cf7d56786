use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{info, warn};

use super::lifecycle::phase;
use crate::error::{Error, Result};
use crate::model::{
    api::receipt::VoteReceipt, common::Phase, db::voter::RecordedVote, mongodb::Id,
};
use crate::storage::{ElectionBackend, VoterBackend};

/// Accepts votes, enforcing one vote per voter.
#[derive(Clone)]
pub struct BallotBox {
    voters: Arc<dyn VoterBackend>,
    elections: Arc<dyn ElectionBackend>,
}

impl BallotBox {
    pub fn new(voters: Arc<dyn VoterBackend>, elections: Arc<dyn ElectionBackend>) -> Self {
        Self { voters, elections }
    }

    /// Cast a vote for a candidate in the voter's election.
    pub async fn cast_vote(&self, voter_id: Id, candidate_id: Id) -> Result<VoteReceipt> {
        self.cast_vote_at(voter_id, candidate_id, Utc::now()).await
    }

    /// Cast a vote as of the given instant.
    ///
    /// Checks run in a fixed order, so a voter who has already voted is told
    /// so even if the election has since closed. Of any number of concurrent
    /// attempts by one voter, exactly one succeeds.
    pub async fn cast_vote_at(
        &self,
        voter_id: Id,
        candidate_id: Id,
        now: DateTime<Utc>,
    ) -> Result<VoteReceipt> {
        let voter = self
            .voters
            .find(voter_id)
            .await?
            .ok_or(Error::VoterNotFound(voter_id))?;
        if voter.has_voted() {
            warn!("Voter {} tried to vote again", voter_id);
            return Err(Error::AlreadyVoted(voter_id));
        }

        let election_id = voter.election_id;
        let election = self
            .elections
            .find(election_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("Election with ID '{}'", election_id)))?;
        if election.candidate(candidate_id).is_none() {
            return Err(Error::InvalidCandidate {
                election: election_id,
                candidate: candidate_id,
            });
        }
        let phase = phase(&election, now);
        if phase != Phase::Active {
            return Err(Error::ElectionNotOpen {
                election: election_id,
                phase,
            });
        }

        let vote = RecordedVote::new(candidate_id, now);
        if !self.voters.record_vote(voter_id, &vote).await? {
            // Someone else got there first: either a concurrent vote or a removal.
            return match self.voters.find(voter_id).await? {
                Some(_) => {
                    warn!("Voter {} lost a race to vote twice", voter_id);
                    Err(Error::AlreadyVoted(voter_id))
                }
                None => Err(Error::VoterNotFound(voter_id)),
            };
        }

        info!("Voter {} voted in election {}", voter_id, election_id);
        Ok(VoteReceipt::new(voter_id, &vote))
    }

    /// Re-issue the receipt for a vote already cast.
    pub async fn receipt(&self, voter_id: Id) -> Result<VoteReceipt> {
        let voter = self
            .voters
            .find(voter_id)
            .await?
            .ok_or(Error::VoterNotFound(voter_id))?;
        voter
            .vote
            .as_ref()
            .map(|vote| VoteReceipt::new(voter_id, vote))
            .ok_or(Error::NotVoted(voter_id))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use rocket::futures::future::join_all;

    use super::*;
    use crate::model::db::{
        election::{examples::now, Candidate, ElectionConfig},
        voter::examples::EXAMPLE_CREDENTIAL,
    };
    use crate::storage::Storage;

    struct Fixture {
        election_id: Id,
        alice: Id,
        bob: Id,
        voter_id: Id,
    }

    async fn setup(storage: &Storage, config: ElectionConfig) -> Fixture {
        let store = storage.election_store();
        let election_id = store
            .create(config.name, config.start_time, config.end_time)
            .await
            .unwrap();
        let alice = store
            .add_candidate(election_id, Candidate::example1())
            .await
            .unwrap();
        let bob = store
            .add_candidate(election_id, Candidate::example2())
            .await
            .unwrap();
        let voter_id = storage
            .voter_registry()
            .register(
                election_id,
                "Erin".to_string(),
                "erin@example.com".to_string(),
                EXAMPLE_CREDENTIAL,
            )
            .await
            .unwrap();
        Fixture {
            election_id,
            alice,
            bob,
            voter_id,
        }
    }

    #[backend_test]
    async fn vote_is_recorded_with_receipt(storage: Storage) {
        let fixture = setup(&storage, ElectionConfig::current_example()).await;
        let ballot_box = storage.ballot_box();
        let now = now();

        let receipt = ballot_box
            .cast_vote_at(fixture.voter_id, fixture.bob, now)
            .await
            .unwrap();
        assert_eq!(receipt.voter_id, fixture.voter_id);
        assert_eq!(receipt.candidate_id, fixture.bob);
        assert_eq!(receipt.timestamp, now);

        let voter = storage.voter_registry().get(fixture.voter_id).await.unwrap();
        assert_eq!(voter.voted_for(), Some(fixture.bob));
        assert_eq!(voter.vote_token(), Some(&receipt.vote_token));

        assert_eq!(ballot_box.receipt(fixture.voter_id).await.unwrap(), receipt);
    }

    #[backend_test]
    async fn second_vote_is_rejected(storage: Storage) {
        let fixture = setup(&storage, ElectionConfig::current_example()).await;
        let ballot_box = storage.ballot_box();

        let first = ballot_box
            .cast_vote(fixture.voter_id, fixture.alice)
            .await
            .unwrap();
        let result = ballot_box.cast_vote(fixture.voter_id, fixture.bob).await;
        assert!(matches!(result, Err(Error::AlreadyVoted(id)) if id == fixture.voter_id));

        // The first vote stands.
        assert_eq!(ballot_box.receipt(fixture.voter_id).await.unwrap(), first);
    }

    #[backend_test]
    async fn already_voted_is_checked_before_the_window(storage: Storage) {
        let fixture = setup(&storage, ElectionConfig::current_example()).await;
        let ballot_box = storage.ballot_box();
        ballot_box
            .cast_vote(fixture.voter_id, fixture.alice)
            .await
            .unwrap();

        let after_close = Utc::now() + Duration::days(1);
        let result = ballot_box
            .cast_vote_at(fixture.voter_id, Id::new(), after_close)
            .await;
        assert!(matches!(result, Err(Error::AlreadyVoted(_))));
    }

    #[backend_test]
    async fn unknown_voter(storage: Storage) {
        let fixture = setup(&storage, ElectionConfig::current_example()).await;
        let result = storage.ballot_box().cast_vote(Id::new(), fixture.alice).await;
        assert!(matches!(result, Err(Error::VoterNotFound(_))));
    }

    #[backend_test]
    async fn candidate_must_stand_in_the_voters_election(storage: Storage) {
        let fixture = setup(&storage, ElectionConfig::current_example()).await;
        let other = setup(&storage, ElectionConfig::current_example()).await;
        let ballot_box = storage.ballot_box();

        let result = ballot_box.cast_vote(fixture.voter_id, other.alice).await;
        assert!(matches!(
            result,
            Err(Error::InvalidCandidate { election, candidate })
                if election == fixture.election_id && candidate == other.alice
        ));
        assert!(!storage
            .voter_registry()
            .get(fixture.voter_id)
            .await
            .unwrap()
            .has_voted());
    }

    #[backend_test]
    async fn candidate_is_checked_before_the_window(storage: Storage) {
        let fixture = setup(&storage, ElectionConfig::future_example()).await;
        let result = storage
            .ballot_box()
            .cast_vote(fixture.voter_id, Id::new())
            .await;
        assert!(matches!(result, Err(Error::InvalidCandidate { .. })));
    }

    #[backend_test]
    async fn votes_only_while_active(storage: Storage) {
        let upcoming = setup(&storage, ElectionConfig::future_example()).await;
        let completed = setup(&storage, ElectionConfig::past_example()).await;
        let ballot_box = storage.ballot_box();

        let result = ballot_box.cast_vote(upcoming.voter_id, upcoming.alice).await;
        assert!(matches!(
            result,
            Err(Error::ElectionNotOpen {
                phase: Phase::Upcoming,
                ..
            })
        ));

        let result = ballot_box
            .cast_vote(completed.voter_id, completed.alice)
            .await;
        assert!(matches!(
            result,
            Err(Error::ElectionNotOpen {
                phase: Phase::Completed,
                ..
            })
        ));
    }

    #[backend_test]
    async fn window_ends_are_inclusive(storage: Storage) {
        let config = ElectionConfig::future_example();
        let (start, end) = (config.start_time, config.end_time);
        let fixture = setup(&storage, config).await;
        let registry = storage.voter_registry();
        let ballot_box = storage.ballot_box();

        ballot_box
            .cast_vote_at(fixture.voter_id, fixture.alice, start)
            .await
            .unwrap();

        let late_voter = registry
            .register(
                fixture.election_id,
                "Frank".to_string(),
                "frank@example.com".to_string(),
                EXAMPLE_CREDENTIAL,
            )
            .await
            .unwrap();
        ballot_box
            .cast_vote_at(late_voter, fixture.alice, end)
            .await
            .unwrap();

        let too_late = registry
            .register(
                fixture.election_id,
                "Grace".to_string(),
                "grace@example.com".to_string(),
                EXAMPLE_CREDENTIAL,
            )
            .await
            .unwrap();
        let result = ballot_box
            .cast_vote_at(too_late, fixture.alice, end + Duration::milliseconds(1))
            .await;
        assert!(matches!(result, Err(Error::ElectionNotOpen { .. })));
    }

    #[backend_test]
    async fn unconfigured_election_is_not_open(storage: Storage) {
        let election_id = storage.election_store().create_placeholder().await.unwrap();
        let alice = storage
            .election_store()
            .add_candidate(election_id, Candidate::example1())
            .await
            .unwrap();
        let voter_id = storage
            .voter_registry()
            .register(
                election_id,
                "Heidi".to_string(),
                "heidi@example.com".to_string(),
                EXAMPLE_CREDENTIAL,
            )
            .await
            .unwrap();

        let result = storage.ballot_box().cast_vote(voter_id, alice).await;
        assert!(matches!(
            result,
            Err(Error::ElectionNotOpen {
                phase: Phase::Unconfigured,
                ..
            })
        ));
    }

    #[backend_test]
    async fn concurrent_votes_record_exactly_one(storage: Storage) {
        let fixture = setup(&storage, ElectionConfig::current_example()).await;
        let ballot_box = storage.ballot_box();

        let attempts = (0..16).map(|n| {
            let ballot_box = ballot_box.clone();
            let candidate = if n % 2 == 0 { fixture.alice } else { fixture.bob };
            let voter_id = fixture.voter_id;
            rocket::tokio::spawn(async move { ballot_box.cast_vote(voter_id, candidate).await })
        });
        let results: Vec<_> = join_all(attempts)
            .await
            .into_iter()
            .map(|joined| joined.unwrap())
            .collect();

        let receipts: Vec<&VoteReceipt> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(receipts.len(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, Error::AlreadyVoted(_))));

        let voter = storage.voter_registry().get(fixture.voter_id).await.unwrap();
        assert_eq!(voter.voted_for(), Some(receipts[0].candidate_id));
        assert_eq!(voter.vote_token(), Some(&receipts[0].vote_token));
    }

    #[backend_test]
    async fn receipt_before_voting(storage: Storage) {
        let fixture = setup(&storage, ElectionConfig::current_example()).await;
        let ballot_box = storage.ballot_box();
        assert!(matches!(
            ballot_box.receipt(fixture.voter_id).await,
            Err(Error::NotVoted(_))
        ));
        assert!(matches!(
            ballot_box.receipt(Id::new()).await,
            Err(Error::VoterNotFound(_))
        ));
    }

    #[backend_test(mongodb)]
    async fn concurrent_votes_record_exactly_one_mongodb(storage: Storage) {
        let fixture = setup(&storage, ElectionConfig::current_example()).await;
        let ballot_box = storage.ballot_box();

        let attempts = (0..8).map(|_| {
            let ballot_box = ballot_box.clone();
            let (voter_id, candidate) = (fixture.voter_id, fixture.alice);
            rocket::tokio::spawn(async move { ballot_box.cast_vote(voter_id, candidate).await })
        });
        let successes = join_all(attempts)
            .await
            .into_iter()
            .filter(|joined| matches!(joined, Ok(Ok(_))))
            .count();
        assert_eq!(successes, 1);
    }
}
