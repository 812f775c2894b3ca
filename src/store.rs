use serde::{de::DeserializeOwned, Serialize};
use std::path::PathBuf;

/// Storage failures, kept distinct so "nothing stored" and "stored but
/// unreadable" never collapse inside this layer. Readers usually treat
/// `NotFound` and `Corrupt` as the empty value; writers must not
/// swallow any of these.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("entry not found")]
    NotFound,
    #[error("entry corrupt: {0}")]
    Corrupt(serde_json::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(std::io::Error),
}

impl crate::AsResCode for Error {
    fn response_code(&self) -> hyper::StatusCode {
        match self {
            Error::NotFound => hyper::StatusCode::NOT_FOUND,
            _ => hyper::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn path(key: &str) -> PathBuf {
    PathBuf::from(format!("./data/{key}.json"))
}

/// Decode one entry from its serialized form.
pub fn decode<T: DeserializeOwned>(raw: &str) -> Result<T, Error> {
    serde_json::from_str(raw).map_err(Error::Corrupt)
}

/// Read the entry stored under `key`. Only used while loading the
/// manager instances on startup.
#[allow(dead_code)]
pub fn read_entry<T: DeserializeOwned>(key: &str) -> Result<T, Error> {
    let raw = match std::fs::read_to_string(path(key)) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Err(Error::NotFound),
        Err(err) => return Err(Error::Unavailable(err)),
    };
    decode(&raw)
}

/// Replace the entry under `key` with the serialized form of `value`.
#[allow(dead_code)]
pub async fn write_entry<T: Serialize>(key: &str, value: &T) -> Result<(), Error> {
    let raw = serde_json::to_vec(value).map_err(Error::Corrupt)?;
    tokio::fs::create_dir_all("./data")
        .await
        .map_err(Error::Unavailable)?;
    tokio::fs::write(path(key), raw)
        .await
        .map_err(Error::Unavailable)
}

/// Remove the entry under `key`. Removing an absent entry is not an
/// error.
#[allow(dead_code)]
pub async fn remove_entry(key: &str) -> Result<(), Error> {
    match tokio::fs::remove_file(path(key)).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(Error::Unavailable(err)),
    }
}
