//! The raw incoming request, as handed over by the host entry point.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::parameter::FilePart;

/// Which entry point produced a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryPoint {
    /// The HTTP host.
    Http,
    /// The command-line host.
    Cli,
}

/// The caller's session: a shared string map surviving across requests.
///
/// The kernel reads and writes CSRF tokens here; hosts are free to store
/// whatever else their session layer carries.
#[derive(Debug, Clone, Default)]
pub struct Session {
    values: Arc<RwLock<HashMap<String, String>>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        self.values.read().await.get(key).cloned()
    }

    pub async fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.values.write().await.insert(key.into(), value.into());
    }

    pub async fn remove(&self, key: &str) -> Option<String> {
        self.values.write().await.remove(key)
    }
}

/// Everything the kernel may read about one incoming call.
///
/// Built once by the host entry point and treated as read-only for the rest
/// of the dispatch; all per-candidate state lives in the binding table.
#[derive(Debug, Clone)]
pub struct RawRequest {
    /// Correlation id for log lines, fresh per request.
    pub id: String,
    /// The raw path, possibly still carrying a `?query` part.
    pub path: String,
    /// Query-string key/value pairs.
    pub query: HashMap<String, String>,
    /// Form-encoded body fields.
    pub body: HashMap<String, String>,
    /// Uploaded files by field name.
    pub files: HashMap<String, FilePart>,
    /// Parsed command-line arguments (CLI entry only).
    pub cli_args: HashMap<String, String>,
    /// Selected transport headers, lowercase names.
    pub headers: HashMap<String, String>,
    /// The caller's session.
    pub session: Session,
    /// Which entry point produced this request.
    pub entry: EntryPoint,
}

impl RawRequest {
    fn new(path: impl Into<String>, entry: EntryPoint) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            path: path.into(),
            query: HashMap::new(),
            body: HashMap::new(),
            files: HashMap::new(),
            cli_args: HashMap::new(),
            headers: HashMap::new(),
            session: Session::new(),
            entry,
        }
    }

    /// A web-origin request for this path.
    pub fn http(path: impl Into<String>) -> Self {
        Self::new(path, EntryPoint::Http)
    }

    /// A command-line-origin request for this path.
    pub fn cli(path: impl Into<String>) -> Self {
        Self::new(path, EntryPoint::Cli)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn with_body_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.body.insert(key.into(), value.into());
        self
    }

    pub fn with_file(mut self, field: impl Into<String>, file: FilePart) -> Self {
        self.files.insert(field.into(), file);
        self
    }

    pub fn with_cli_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.cli_args.insert(key.into(), value.into());
        self
    }

    /// Header names are stored lowercase; lookups expect lowercase.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into().to_lowercase(), value.into());
        self
    }

    pub fn with_session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// The tokenized path of this request.
    pub fn tokens(&self) -> Vec<String> {
        tokenize_path(&self.path)
    }
}

/// Split a raw path into its tokens: strip any query part, trim leading and
/// trailing separators, split on `/`. The root path yields no tokens.
pub fn tokenize_path(path: &str) -> Vec<String> {
    let path = match path.split_once('?') {
        Some((before, _)) => before,
        None => path,
    };
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split('/').map(str::to_string).collect()
}
