//! Blocking AT Protocol XRPC client.
//!
//! Speaks the handful of XRPC methods the autolike loop needs against a PDS
//! such as `https://bsky.social`. Everything after `createSession` carries
//! the session's access token as a bearer header.

use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde_json::{json, Value};
use tracing::debug;

use super::models::{parse_author_feed, FeedPost, FollowersPage, Session};
use super::{ClientError, SocialApi};

/// Request timeout for every XRPC call.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Collection that like records are written to.
const LIKE_COLLECTION: &str = "app.bsky.feed.like";

const CREATE_SESSION: &str = "com.atproto.server.createSession";
const RESOLVE_HANDLE: &str = "com.atproto.identity.resolveHandle";
const GET_FOLLOWERS: &str = "app.bsky.graph.getFollowers";
const GET_AUTHOR_FEED: &str = "app.bsky.feed.getAuthorFeed";
const CREATE_RECORD: &str = "com.atproto.repo.createRecord";

/// XRPC client bound to one service endpoint.
pub struct XrpcClient {
    http: Client,
    base_url: String,
    session: Option<Session>,
}

impl XrpcClient {
    /// Create a client for `service`, e.g. `https://bsky.social`.
    pub fn new(service: &str) -> Result<Self, ClientError> {
        let http = Client::builder()
            .user_agent(format!("bsky-autolike/{}", crate::VERSION))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            base_url: service.trim_end_matches('/').to_string(),
            session: None,
        })
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The active session, if logged in.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn endpoint(&self, nsid: &str) -> String {
        format!("{}/xrpc/{}", self.base_url, nsid)
    }

    fn authorised(&self, request: RequestBuilder) -> Result<RequestBuilder, ClientError> {
        let session = self.session.as_ref().ok_or(ClientError::NotAuthenticated)?;
        Ok(request.bearer_auth(&session.access_jwt))
    }

    fn query(&self, nsid: &str, params: &[(&str, String)]) -> Result<Value, ClientError> {
        debug!("GET {nsid} {params:?}");
        let request = self.authorised(self.http.get(self.endpoint(nsid)).query(params))?;
        read_body(nsid, request.send()?)
    }

    fn procedure(&self, nsid: &str, body: &Value) -> Result<Value, ClientError> {
        debug!("POST {nsid}");
        let request = self.authorised(self.http.post(self.endpoint(nsid)).json(body))?;
        read_body(nsid, request.send()?)
    }

    fn author_feed(
        &self,
        actor: &str,
        limit: u32,
        exclude_pins: bool,
    ) -> Result<Vec<FeedPost>, ClientError> {
        let mut params = vec![("actor", actor.to_string()), ("limit", limit.to_string())];
        if exclude_pins {
            params.push(("includePins", "false".to_string()));
        }
        let body = self.query(GET_AUTHOR_FEED, &params)?;
        parse_author_feed(body).map_err(|e| decode_error(GET_AUTHOR_FEED, e))
    }
}

impl SocialApi for XrpcClient {
    fn login(&mut self, identifier: &str, password: &str) -> Result<(), ClientError> {
        let response = self
            .http
            .post(self.endpoint(CREATE_SESSION))
            .json(&json!({ "identifier": identifier, "password": password }))
            .send()?;
        let body = read_body(CREATE_SESSION, response)?;
        let session: Session =
            serde_json::from_value(body).map_err(|e| decode_error(CREATE_SESSION, e))?;

        debug!("Logged in as {} ({})", session.handle, session.did);
        self.session = Some(session);
        Ok(())
    }

    fn resolve_handle(&self, handle: &str) -> Result<String, ClientError> {
        let response = self
            .http
            .get(self.endpoint(RESOLVE_HANDLE))
            .query(&[("handle", handle)])
            .send()?;
        let body = read_body(RESOLVE_HANDLE, response)?;

        body.get("did")
            .and_then(|v| v.as_str())
            .filter(|did| did.starts_with("did:"))
            .map(String::from)
            .ok_or_else(|| ClientError::Decode {
                endpoint: RESOLVE_HANDLE.to_string(),
                reason: format!("no DID in response: {body}"),
            })
    }

    fn get_followers(
        &self,
        actor: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<FollowersPage, ClientError> {
        let mut params = vec![("actor", actor.to_string()), ("limit", limit.to_string())];
        if let Some(cursor) = cursor {
            params.push(("cursor", cursor.to_string()));
        }
        let body = self.query(GET_FOLLOWERS, &params)?;
        Ok(FollowersPage::from_json_value(&body))
    }

    fn get_author_feed(&self, actor: &str, limit: u32) -> Result<Vec<FeedPost>, ClientError> {
        match self.author_feed(actor, limit, true) {
            // Older services reject the includePins parameter.
            Err(e) if e.status() == Some(400) => {
                debug!("{GET_AUTHOR_FEED} rejected includePins, retrying without: {e}");
                self.author_feed(actor, limit, false)
            }
            other => other,
        }
    }

    fn like(&self, uri: &str, cid: &str) -> Result<(), ClientError> {
        let repo = &self
            .session
            .as_ref()
            .ok_or(ClientError::NotAuthenticated)?
            .did;
        let body = json!({
            "repo": repo,
            "collection": LIKE_COLLECTION,
            "record": {
                "$type": LIKE_COLLECTION,
                "subject": { "uri": uri, "cid": cid },
                "createdAt": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            },
        });
        self.procedure(CREATE_RECORD, &body)?;
        Ok(())
    }
}

fn decode_error(endpoint: &str, e: serde_json::Error) -> ClientError {
    ClientError::Decode {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    }
}

/// Turn a response into its JSON body, mapping XRPC error bodies.
fn read_body(endpoint: &str, response: Response) -> Result<Value, ClientError> {
    let status = response.status();
    let text = response.text()?;

    if !status.is_success() {
        let error_body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);
        let field = |name: &str| {
            error_body
                .get(name)
                .and_then(|v| v.as_str())
                .map(String::from)
        };
        return Err(ClientError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            error: field("error"),
            message: field("message").unwrap_or(text),
        });
    }

    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text).map_err(|e| decode_error(endpoint, e))
}
