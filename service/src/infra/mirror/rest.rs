//! [`Rest`] [`Mirror`] implementation.

use std::time::Duration;

use common::operations::Update;
use derive_more::{Display, Error as StdError, From};
use tracerr::Traced;

use super::{Document, Mirror};

/// [`Mirror`] upserting [`Document`]s into a REST document store via
/// `PUT {endpoint}/{collection}/{id}` requests with JSON bodies.
#[derive(Clone, Debug)]
pub struct Rest {
    /// HTTP client performing requests.
    client: reqwest::Client,

    /// Base URL of the document store, without a trailing slash.
    endpoint: String,
}

impl Rest {
    /// Creates a new [`Rest`] mirror of the provided `endpoint`, giving up on
    /// requests lasting longer than the provided `timeout`.
    ///
    /// # Errors
    ///
    /// If failed to initialize an HTTP client.
    pub fn new(
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, Traced<Error>> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(tracerr::from_and_wrap!(=> Error))?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_owned(),
        })
    }

    /// Returns URL of the provided [`Document`] in the document store.
    fn url_of(&self, doc: &Document) -> String {
        format!("{}/{}/{}", self.endpoint, doc.collection, doc.id)
    }
}

impl Mirror<Update<Document>> for Rest {
    type Ok = ();
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Update(doc): Update<Document>,
    ) -> Result<Self::Ok, Self::Err> {
        self.client
            .put(self.url_of(&doc))
            .json(&doc.fields)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map(drop)
    }
}

/// [`Rest`] mirror error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// HTTP request failed or was answered with an error status.
    #[display("HTTP request failed: {_0}")]
    Request(reqwest::Error),
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use super::{Document, Rest};

    #[test]
    fn builds_document_url() {
        let mirror =
            Rest::new("http://store.local/db/", Duration::from_secs(1)).unwrap();
        let doc = Document {
            collection: "leases",
            id: "0190c8a4-4d6e-7f3a-9e2b-1c2d3e4f5a6b".into(),
            fields: serde_json::Map::new(),
        };

        assert_eq!(
            mirror.url_of(&doc),
            "http://store.local/db/leases/0190c8a4-4d6e-7f3a-9e2b-1c2d3e4f5a6b",
        );
    }
}
