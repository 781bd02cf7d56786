use rocket::{serde::json::Json, Route, State};

use crate::{
    error::Result,
    model::{
        api::{
            auth::AuthToken,
            receipt::{VoteReceipt, VoteRequest},
        },
        db::voter::Voter,
    },
    service::BallotBox,
};

pub fn routes() -> Vec<Route> {
    routes![cast_vote, get_receipt]
}

/// Cast the token holder's vote.
#[post("/voter/vote", data = "<request>", format = "json")]
async fn cast_vote(
    token: AuthToken<Voter>,
    request: Json<VoteRequest>,
    ballot_box: &State<BallotBox>,
) -> Result<Json<VoteReceipt>> {
    let receipt = ballot_box.cast_vote(token.id, request.candidate_id).await?;
    Ok(Json(receipt))
}

#[get("/voter/receipt")]
async fn get_receipt(
    token: AuthToken<Voter>,
    ballot_box: &State<BallotBox>,
) -> Result<Json<VoteReceipt>> {
    Ok(Json(ballot_box.receipt(token.id).await?))
}
