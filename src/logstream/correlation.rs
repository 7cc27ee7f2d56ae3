//! "Only mine" request correlation
//!
//! While tracking is active, every REST request made by this tool carries an
//! `X-Request-ID` of the form `ac-ls-ce-<token>-<uuid>`. The platform echoes the
//! id into its request logs as `request_id="..."`, so lines produced by our own
//! traffic can be picked out with a regex built from the token.
//!
//! Traffic from a browser or `curl` is matched the same way once it sends the
//! header from [`CorrelationTagger::request_header`].

use crate::constants::{REQUEST_ID_HEADER, REQUEST_ID_PREFIX};
use parking_lot::RwLock;
use regex::Regex;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug)]
struct Activation {
    token: String,
    matcher: Regex,
    /// Id handed to the user for their own requests
    shared_id: String,
}

type Shared = Arc<RwLock<Option<Activation>>>;

/// Owner of the per-activation correlation token
#[derive(Debug, Default)]
pub struct CorrelationTagger {
    state: Shared,
}

/// Read-only, cloneable view used by the HTTP client to tag requests
#[derive(Debug, Clone, Default)]
pub struct RequestTagging {
    state: Shared,
}

impl CorrelationTagger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking with a fresh token, replacing any previous one
    pub fn activate(&mut self) -> String {
        let token = Uuid::new_v4().to_string();
        let matcher = build_matcher(&token);
        let shared_id = request_id(&token);
        *self.state.write() = Some(Activation {
            token: token.clone(),
            matcher,
            shared_id,
        });
        token
    }

    /// Stop tracking; the token and matcher are discarded
    pub fn deactivate(&mut self) {
        *self.state.write() = None;
    }

    pub fn is_active(&self) -> bool {
        self.state.read().is_some()
    }

    pub fn token(&self) -> Option<String> {
        self.state.read().as_ref().map(|a| a.token.clone())
    }

    /// Line matcher for the current token
    pub fn matcher(&self) -> Option<Regex> {
        self.state.read().as_ref().map(|a| a.matcher.clone())
    }

    /// Header value for the next outbound request, if tracking is on
    pub fn next_request_id(&self) -> Option<String> {
        next_request_id(&self.state)
    }

    /// `X-Request-ID: <id>` header line valid for the current token
    ///
    /// Stable for one activation, so it can be pasted into other clients.
    pub fn request_header(&self) -> Option<String> {
        self.state
            .read()
            .as_ref()
            .map(|a| format!("{}: {}", REQUEST_ID_HEADER, a.shared_id))
    }

    pub fn handle(&self) -> RequestTagging {
        RequestTagging {
            state: Arc::clone(&self.state),
        }
    }
}

impl RequestTagging {
    /// Header value for the next outbound request, if tracking is on
    pub fn next_request_id(&self) -> Option<String> {
        next_request_id(&self.state)
    }
}

fn next_request_id(state: &Shared) -> Option<String> {
    state.read().as_ref().map(|a| request_id(&a.token))
}

fn request_id(token: &str) -> String {
    format!("{}{}-{}", REQUEST_ID_PREFIX, token, Uuid::new_v4())
}

fn build_matcher(token: &str) -> Regex {
    let pattern = format!(
        r#"request_id="{}{}-[0-9a-f-]{{36}}"#,
        regex::escape(REQUEST_ID_PREFIX),
        regex::escape(token)
    );
    // The token is a hyphenated UUID and both parts are escaped.
    Regex::new(&pattern).unwrap_or_else(|_| unreachable!("escaped correlation pattern"))
}
