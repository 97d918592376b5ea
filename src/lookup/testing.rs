//! In-memory browser for lookup tests

use crate::lookup::{Browser, FetchError, FetchedPage};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub(crate) const DETAIL_PAGE: &str = include_str!("../../tests/fixtures/detail_61_hours.html");

#[derive(Clone)]
enum Response {
    Page { final_url: String, body: Vec<u8> },
    Error(FetchError),
}

#[derive(Default)]
struct State {
    responses: HashMap<String, Response>,
    delays: HashMap<String, Duration>,
    requests: Vec<String>,
}

/// Browser serving canned responses and recording every requested URL
///
/// Clones share their state, so requests made by workers show up in the
/// original's log. Unknown URLs answer with `FetchError::NotFound`.
#[derive(Clone, Default)]
pub(crate) struct FakeBrowser {
    state: Arc<Mutex<State>>,
}

impl FakeBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: &str, body: &str) -> Self {
        self.with_redirect(url, url, body)
    }

    pub fn with_redirect(self, url: &str, final_url: &str, body: &str) -> Self {
        self.with_bytes(url, final_url, body.as_bytes().to_vec())
    }

    pub fn with_bytes(self, url: &str, final_url: &str, body: Vec<u8>) -> Self {
        self.state.lock().unwrap().responses.insert(
            url.to_string(),
            Response::Page {
                final_url: final_url.to_string(),
                body,
            },
        );
        self
    }

    pub fn with_error(self, url: &str, error: FetchError) -> Self {
        self.state
            .lock()
            .unwrap()
            .responses
            .insert(url.to_string(), Response::Error(error));
        self
    }

    pub fn with_delay(self, url: &str, delay: Duration) -> Self {
        self.state
            .lock()
            .unwrap()
            .delays
            .insert(url.to_string(), delay);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().requests.clone()
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn fetch(&self, url: &str, _timeout: Duration) -> Result<FetchedPage, FetchError> {
        let (response, delay) = {
            let mut state = self.state.lock().unwrap();
            state.requests.push(url.to_string());
            (
                state.responses.get(url).cloned(),
                state.delays.get(url).copied(),
            )
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match response {
            Some(Response::Page { final_url, body }) => Ok(FetchedPage {
                final_url,
                body,
            }),
            Some(Response::Error(error)) => Err(error),
            None => Err(FetchError::NotFound {
                url: url.to_string(),
            }),
        }
    }

    fn clone_browser(&self) -> Arc<dyn Browser> {
        Arc::new(self.clone())
    }
}
