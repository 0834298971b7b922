use crate::app_config::AppConfig;
use reqwest::Client;
use thiserror::Error;

pub fn new_client(config: &AppConfig) -> Result<Client, ClientError> {
    let client = Client::builder().timeout(config.device().request_timeout()).build()?;
    Ok(client)
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("could not build the http client: {0}")]
    Build(#[from] reqwest::Error),
}
