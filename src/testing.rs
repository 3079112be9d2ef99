use crate::errors::AttemptError;
use crate::fetcher::JsonSource;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// In-memory [`JsonSource`] replaying queued replies per URL.
///
/// Once a URL's queue is empty every further request fails.
#[derive(Default)]
pub struct ScriptedSource {
    replies: Mutex<HashMap<String, VecDeque<Result<Value, AttemptError>>>>,
    hits: Mutex<HashMap<String, u32>>,
}

impl ScriptedSource {
    pub fn reply(&self, url: &str, reply: Result<Value, AttemptError>) {
        self.replies
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(reply);
    }

    pub fn hits(&self, url: &str) -> u32 {
        self.hits.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

impl JsonSource for ScriptedSource {
    async fn get_json(&self, url: &str) -> Result<Value, AttemptError> {
        *self.hits.lock().unwrap().entry(url.to_string()).or_default() += 1;
        self.replies
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Err(AttemptError::Transport("connection refused".to_string())))
    }
}
