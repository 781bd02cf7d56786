use chrono::Utc;
use rocket::{serde::json::Json, Route, State};

use crate::error::Result;
use crate::model::{api::election::ElectionDescription, mongodb::Id};
use crate::service::{lifecycle::order_for_display, ElectionStore, TallyEngine, TallyResult};

pub fn routes() -> Vec<Route> {
    routes![get_elections, get_election, get_results]
}

/// Every election with its current phase; open elections first.
#[get("/elections")]
async fn get_elections(store: &State<ElectionStore>) -> Result<Json<Vec<ElectionDescription>>> {
    let now = Utc::now();
    let elections = order_for_display(store.list().await?, now);
    Ok(Json(
        elections
            .into_iter()
            .map(|election| ElectionDescription::new(election, now))
            .collect(),
    ))
}

#[get("/elections/<election_id>")]
async fn get_election(
    election_id: Id,
    store: &State<ElectionStore>,
) -> Result<Json<ElectionDescription>> {
    let election = store.get(election_id).await?;
    Ok(Json(ElectionDescription::new(election, Utc::now())))
}

/// Live results. Available in every phase; nothing is stored.
#[get("/elections/<election_id>/results")]
async fn get_results(
    election_id: Id,
    tally: &State<TallyEngine>,
) -> Result<Json<TallyResult>> {
    Ok(Json(tally.tally(election_id).await?))
}

#[cfg(test)]
mod tests {
    use rocket::{http::Status, local::asynchronous::Client};

    use super::*;
    use crate::api::testing::json;
    use crate::model::{
        common::Phase,
        db::election::{Candidate, ElectionConfig},
    };
    use crate::storage::Storage;

    async fn create(storage: &Storage, config: ElectionConfig) -> Id {
        storage
            .election_store()
            .create(config.name, config.start_time, config.end_time)
            .await
            .unwrap()
    }

    #[backend_test]
    async fn list_is_display_ordered(client: Client, storage: Storage) {
        let completed = create(&storage, ElectionConfig::past_example()).await;
        let unconfigured = storage.election_store().create_placeholder().await.unwrap();
        let upcoming = create(&storage, ElectionConfig::future_example()).await;
        let active = create(&storage, ElectionConfig::current_example()).await;

        let response = client.get(uri!(get_elections)).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let listed: Vec<ElectionDescription> = json(response).await;

        let order: Vec<(Id, Phase)> = listed.iter().map(|e| (e.id, e.phase)).collect();
        assert_eq!(
            order,
            vec![
                (active, Phase::Active),
                (upcoming, Phase::Upcoming),
                (completed, Phase::Completed),
                (unconfigured, Phase::Unconfigured),
            ]
        );
        assert_eq!(listed[3].name, None);
    }

    #[backend_test]
    async fn get_single_election(client: Client, storage: Storage) {
        let election_id = create(&storage, ElectionConfig::future_example()).await;
        storage
            .election_store()
            .add_candidate(election_id, Candidate::example2())
            .await
            .unwrap();

        let response = client.get(uri!(get_election(election_id))).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let description: ElectionDescription = json(response).await;
        assert_eq!(description.phase, Phase::Upcoming);
        assert_eq!(description.candidates.len(), 1);
        assert_eq!(
            description.candidates[0].tagline.as_deref(),
            Some("Free coffee")
        );

        let response = client.get(uri!(get_election(Id::new()))).dispatch().await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test]
    async fn malformed_ids_match_no_route(client: Client) {
        let response = client.get("/elections/not-an-id").dispatch().await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test]
    async fn results_are_live(client: Client, storage: Storage) {
        let election_id = create(&storage, ElectionConfig::current_example()).await;
        let alice = storage
            .election_store()
            .add_candidate(election_id, Candidate::example1())
            .await
            .unwrap();
        let bob = storage
            .election_store()
            .add_candidate(election_id, Candidate::example2())
            .await
            .unwrap();

        let response = client.get(uri!(get_results(election_id))).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let result: TallyResult = json(response).await;
        assert_eq!(result.total_votes, 0);
        assert!(result.candidates.iter().all(|c| c.percentage == 0.0));

        let voter_id = storage
            .voter_registry()
            .register(
                election_id,
                "Ivan".to_string(),
                "ivan@example.com".to_string(),
                crate::model::db::voter::examples::EXAMPLE_CREDENTIAL,
            )
            .await
            .unwrap();
        storage.ballot_box().cast_vote(voter_id, bob).await.unwrap();

        let response = client.get(uri!(get_results(election_id))).dispatch().await;
        let result: TallyResult = json(response).await;
        assert_eq!(result.total_votes, 1);
        assert_eq!(result.candidates[0].candidate_id, bob);
        assert_eq!(result.candidates[0].percentage, 100.0);
        assert_eq!(result.candidates[1].candidate_id, alice);

        let response = client.get(uri!(get_results(Id::new()))).dispatch().await;
        assert_eq!(Status::NotFound, response.status());
    }
}
