//! In-memory stand-ins for the network and the process, shared by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use super::restart::ProcessControl;
use super::transport::{HttpResponse, Transport};
use crate::error::{Result, UpdateError};

#[derive(Default)]
pub struct FakeTransport {
    routes: Mutex<HashMap<String, HttpResponse>>,
    requests: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&self, url: &str, status: u16, body: impl Into<Vec<u8>>) {
        self.routes.lock().insert(
            url.to_string(),
            HttpResponse {
                status,
                body: body.into(),
            },
        );
    }

    pub fn release(&self, owner: &str, repo: &str, tag: &str, assets: &[(&str, &str)]) {
        let assets: Vec<serde_json::Value> = assets
            .iter()
            .map(|(name, url)| serde_json::json!({ "name": name, "browser_download_url": url }))
            .collect();
        let body = serde_json::json!({ "tag_name": tag, "assets": assets }).to_string();
        self.route(&latest_url(owner, repo), 200, body);
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

impl Transport for FakeTransport {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        self.requests.lock().push(url.to_string());
        self.routes
            .lock()
            .get(url)
            .cloned()
            .ok_or_else(|| UpdateError::Transport(format!("no route for {}", url)))
    }
}

pub fn latest_url(owner: &str, repo: &str) -> String {
    format!("https://api.github.com/repos/{}/{}/releases/latest", owner, repo)
}

#[derive(Default)]
pub struct FakeProcess {
    pub fail_spawn: bool,
    spawns: AtomicUsize,
    exits: AtomicUsize,
}

impl FakeProcess {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_spawn: true,
            ..Self::default()
        }
    }

    pub fn spawns(&self) -> usize {
        self.spawns.load(Ordering::SeqCst)
    }

    pub fn exits(&self) -> usize {
        self.exits.load(Ordering::SeqCst)
    }
}

impl ProcessControl for FakeProcess {
    fn spawn_replacement(&self) -> std::io::Result<()> {
        if self.fail_spawn {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "executable vanished",
            ));
        }
        self.spawns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn exit(&self) {
        self.exits.fetch_add(1, Ordering::SeqCst);
    }
}
