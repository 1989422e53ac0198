#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::io::{Cursor, Read};
use std::path::Path;
use std::time::Duration;

use flate2::{write::GzEncoder, Compression};

use dictsync_sync::error::RateLimitHints;
use dictsync_sync::{SyncConfig, Transport, TransportError};

pub const API_BASE: &str = "https://api.test";
pub const TOKEN: &str = "test-token";

/// Transport that replays canned API replies and serves files from memory.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: RefCell<VecDeque<Result<String, TransportError>>>,
    files: HashMap<String, Vec<u8>>,
    pub api_calls: Cell<usize>,
    pub requests: RefCell<Vec<(String, Vec<(String, String)>)>>,
    pub downloads: RefCell<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Result<String, TransportError>>) -> Self {
        Self {
            replies: RefCell::new(replies.into()),
            ..Self::default()
        }
    }

    pub fn with_file(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.files.insert(url.to_string(), bytes);
        self
    }

    pub fn push_reply(&self, reply: Result<String, TransportError>) {
        self.replies.borrow_mut().push_back(reply);
    }
}

impl Transport for ScriptedTransport {
    fn get_text(&self, url: &str, headers: &[(&str, &str)]) -> Result<String, TransportError> {
        self.api_calls.set(self.api_calls.get() + 1);
        self.requests.borrow_mut().push((
            url.to_string(),
            headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ));
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Network("script exhausted".into())))
    }

    fn open(&self, url: &str) -> Result<Box<dyn Read + Send>, TransportError> {
        self.downloads.borrow_mut().push(url.to_string());
        match self.files.get(url) {
            Some(bytes) => Ok(Box::new(Cursor::new(bytes.clone()))),
            None => Err(TransportError::Status {
                status: 404,
                rate_limit: RateLimitHints::default(),
            }),
        }
    }
}

pub fn rate_limited() -> Result<String, TransportError> {
    Err(TransportError::Status {
        status: 403,
        rate_limit: RateLimitHints {
            remaining: Some("0".into()),
            reset: Some("1735689600".into()),
        },
    })
}

pub fn status(code: u16) -> Result<String, TransportError> {
    Err(TransportError::Status {
        status: code,
        rate_limit: RateLimitHints::default(),
    })
}

pub fn network_down() -> Result<String, TransportError> {
    Err(TransportError::Network("connection refused".into()))
}

pub fn download_url(name: &str) -> String {
    format!("https://downloads.test/{name}")
}

/// Release API body listing `assets` with predictable download URLs.
pub fn release_json(tag: &str, assets: &[&str]) -> Result<String, TransportError> {
    let assets: Vec<_> = assets
        .iter()
        .map(|name| {
            serde_json::json!({
                "name": name,
                "browser_download_url": download_url(name),
            })
        })
        .collect();
    Ok(serde_json::json!({ "tag_name": tag, "assets": assets }).to_string())
}

/// In-memory `.tar.gz` with the given `(path, contents)` entries.
pub fn tar_gz(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (path, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, path, *data).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

/// Config with no retry delays, rooted at `root`.
pub fn fast_config(root: &Path) -> SyncConfig {
    let mut config = SyncConfig::new(root, TOKEN);
    config.api_base = API_BASE.to_string();
    config.retry.base_delay = Duration::ZERO;
    config
}

pub fn read_status(path: &Path) -> serde_json::Value {
    let raw = std::fs::read_to_string(path).expect("status file");
    serde_json::from_str(&raw).expect("status json")
}
