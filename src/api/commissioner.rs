use chrono::Utc;
use rocket::{serde::json::Json, Route, State};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            auth::{AuthService, AuthToken, Commissioner},
            dashboard::Dashboard,
            election::{CandidateSpec, ElectionDescription, ElectionSpec},
            voter::{VoterDescription, VoterRegistration},
        },
        mongodb::Id,
    },
    service::{ElectionStore, VoterRegistry},
};

pub fn routes() -> Vec<Route> {
    routes![
        register_commissioner,
        configure_election,
        add_candidate,
        remove_candidate,
        register_voter,
        get_voters,
        remove_voter,
        get_dashboard,
    ]
}

/// Only the owner of an election may manage it.
fn ensure_owner(token: &AuthToken<Commissioner>, election_id: Id) -> Result<()> {
    if Commissioner::owns(token.id, election_id) {
        Ok(())
    } else {
        Err(Error::Forbidden(format!(
            "Election {} belongs to another commissioner",
            election_id
        )))
    }
}

/// Called by the authentication service when a commissioner signs up.
/// Returns the ID of the new, unconfigured election they will own.
#[post("/commissioners")]
async fn register_commissioner(
    _token: AuthToken<AuthService>,
    store: &State<ElectionStore>,
) -> Result<Json<Id>> {
    let election_id = store.create_placeholder().await?;
    Ok(Json(election_id))
}

#[put("/elections/<election_id>", data = "<spec>", format = "json")]
async fn configure_election(
    token: AuthToken<Commissioner>,
    election_id: Id,
    spec: Json<ElectionSpec>,
    store: &State<ElectionStore>,
) -> Result<Json<ElectionDescription>> {
    ensure_owner(&token, election_id)?;
    let election = store.configure(election_id, spec.0.try_into()?).await?;
    Ok(Json(ElectionDescription::new(election, Utc::now())))
}

#[post("/elections/<election_id>/candidates", data = "<spec>", format = "json")]
async fn add_candidate(
    token: AuthToken<Commissioner>,
    election_id: Id,
    spec: Json<CandidateSpec>,
    store: &State<ElectionStore>,
) -> Result<Json<Id>> {
    ensure_owner(&token, election_id)?;
    let candidate_id = store.add_candidate(election_id, spec.0.try_into()?).await?;
    Ok(Json(candidate_id))
}

#[delete("/elections/<election_id>/candidates/<candidate_id>")]
async fn remove_candidate(
    token: AuthToken<Commissioner>,
    election_id: Id,
    candidate_id: Id,
    store: &State<ElectionStore>,
) -> Result<()> {
    ensure_owner(&token, election_id)?;
    store.remove_candidate(election_id, candidate_id).await
}

#[post("/elections/<election_id>/voters", data = "<registration>", format = "json")]
async fn register_voter(
    token: AuthToken<Commissioner>,
    election_id: Id,
    registration: Json<VoterRegistration>,
    registry: &State<VoterRegistry>,
) -> Result<Json<Id>> {
    ensure_owner(&token, election_id)?;
    let VoterRegistration {
        name,
        email,
        credential,
    } = registration.0;
    let voter_id = registry
        .register(election_id, name, email, &credential)
        .await?;
    Ok(Json(voter_id))
}

#[get("/elections/<election_id>/voters")]
async fn get_voters(
    token: AuthToken<Commissioner>,
    election_id: Id,
    registry: &State<VoterRegistry>,
) -> Result<Json<Vec<VoterDescription>>> {
    ensure_owner(&token, election_id)?;
    let voters = registry.list_by_election(election_id).await?;
    Ok(Json(voters.into_iter().map(VoterDescription::from).collect()))
}

#[delete("/elections/<election_id>/voters/<voter_id>")]
async fn remove_voter(
    token: AuthToken<Commissioner>,
    election_id: Id,
    voter_id: Id,
    registry: &State<VoterRegistry>,
) -> Result<()> {
    ensure_owner(&token, election_id)?;
    // Commissioners may only see voters in their own election.
    let voter = registry.get(voter_id).await?;
    if voter.election_id != election_id {
        return Err(Error::VoterNotFound(voter_id));
    }
    registry.remove(voter_id).await
}

#[get("/elections/<election_id>/dashboard")]
async fn get_dashboard(
    token: AuthToken<Commissioner>,
    election_id: Id,
    store: &State<ElectionStore>,
    registry: &State<VoterRegistry>,
) -> Result<Json<Dashboard>> {
    ensure_owner(&token, election_id)?;
    let election = store.get(election_id).await?;
    let voters = registry.list_by_election(election_id).await?;
    Ok(Json(Dashboard::new(election, &voters, Utc::now())))
}
