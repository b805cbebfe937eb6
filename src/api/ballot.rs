use rocket::{form::Form, http::CookieJar, serde::json::Json, Route, State};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::metrics::Metrics;
use crate::model::{
    ballot::{BallotForm, VoteRecord},
    voter::VoterId,
};
use crate::queue::VoteQueue;
use crate::Config;

pub fn routes() -> Vec<Route> {
    routes![index, submit]
}

/// Everything the rendering layer needs to draw the voting page: the two
/// option labels and the vote recorded by this request, if any.
#[derive(Debug, Serialize)]
struct BallotPage {
    option_a: String,
    option_b: String,
    vote: Option<String>,
}

impl BallotPage {
    fn new(config: &Config, vote: Option<String>) -> Self {
        Self {
            option_a: config.option_a().to_string(),
            option_b: config.option_b().to_string(),
            vote,
        }
    }
}

#[get("/")]
async fn index(
    voter: VoterId,
    cookies: &CookieJar<'_>,
    config: &State<Config>,
) -> Json<BallotPage> {
    info!("Displaying voting page for voter {voter}");
    cookies.add(voter.into_cookie());
    Json(BallotPage::new(config, None))
}

#[post("/", data = "<ballot>")]
async fn submit(
    voter: VoterId,
    ballot: Form<BallotForm>,
    cookies: &CookieJar<'_>,
    config: &State<Config>,
    queue: &State<VoteQueue>,
    metrics: &State<Metrics>,
) -> Result<Json<BallotPage>> {
    // The identity travels back even when the submission fails.
    cookies.add(voter.clone().into_cookie());

    let vote = ballot
        .into_inner()
        .vote
        .ok_or(Error::MissingField("vote"))?;
    if !config.is_option(&vote) {
        return Err(Error::UnknownOption(vote));
    }
    info!("Received vote for {vote} from voter {voter}");

    queue.publish(&VoteRecord::new(voter, vote.clone())).await?;
    info!("Vote stored in the shared queue");

    // Best-effort: a lost counter never fails the submission.
    metrics.vote_submitted(&vote);

    Ok(Json(BallotPage::new(config, Some(vote))))
}
