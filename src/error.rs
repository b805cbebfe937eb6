use rocket::{http::Status, response::Responder};
use thiserror::Error;

use crate::queue::StoreUnavailable;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Store(#[from] StoreUnavailable),
    #[error("Missing form field `{0}`")]
    MissingField(&'static str),
    #[error("`{0}` is not one of the configured options")]
    UnknownOption(String),
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, _: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        match &self {
            Self::Store(err) => error!("{err}"),
            _ => warn!("{self}"),
        }
        Err(match self {
            Self::MissingField(_) | Self::UnknownOption(_) => Status::BadRequest,
            Self::Store(_) => Status::InternalServerError,
        })
    }
}
