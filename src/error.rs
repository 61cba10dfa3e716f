use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum Error {
    #[error("failed to parse address")]
    ErrAddressParseFailed,
    #[error("candidate type is unspecified")]
    ErrUnspecifiedCandidateType,
    #[error("no candidate pair at the given index")]
    ErrUnknownCandidatePair,

    #[error("{0}")]
    Other(String),
}
