// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! OAuth 2.0 authorization code flow with PKCE for the Hue remote API.
//!
//! The user opens [`authorization_url`] in a browser; the Hue portal then
//! redirects to a local callback served by [`serve_callback`], which hands
//! the code to a token exchange.

use std::future::Future;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::{RngExt, rng};
use reqwest::Method;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use crate::Error;
use crate::error::{ApiError, ParseError, ProtocolError};
use crate::protocol::HttpClient;

/// Authorization endpoint.
pub const AUTHORIZE_URL: &str = "https://api.meethue.com/v2/oauth2/authorize";
/// Token endpoint path, relative to the API host.
pub const TOKEN_PATH: &str = "/v2/oauth2/token";
/// Default redirect URI registered for the app.
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:3000/callback";
/// Default callback port.
pub const DEFAULT_CALLBACK_PORT: u16 = 3000;
/// How long to wait for the browser to come back.
pub const CALLBACK_TIMEOUT: Duration = Duration::from_secs(5 * 60);

const MAX_REQUEST_HEAD: usize = 8 * 1024;
const REQUEST_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// PKCE verifier and its S256 challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pkce {
    /// Secret sent with the token exchange.
    pub verifier: String,
    /// `base64url(sha256(verifier))`, sent with the authorization request.
    pub challenge: String,
}

impl Pkce {
    /// Generates a verifier from 32 random bytes.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rng().fill(&mut bytes);
        Self::from_verifier(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Derives the challenge for a known verifier.
    ///
    /// # Examples
    ///
    /// ```
    /// use homeprobe::hue::Pkce;
    ///
    /// // RFC 7636, appendix B
    /// let pkce = Pkce::from_verifier("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk");
    /// assert_eq!(pkce.challenge, "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
    /// ```
    #[must_use]
    pub fn from_verifier(verifier: impl Into<String>) -> Self {
        let verifier = verifier.into();
        let challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));
        Self {
            verifier,
            challenge,
        }
    }
}

/// Builds the URL the user opens to grant access.
#[must_use]
pub fn authorization_url(client_id: &str, redirect_uri: &str, challenge: &str) -> String {
    let params = [
        ("client_id", client_id),
        ("response_type", "code"),
        ("redirect_uri", redirect_uri),
        ("code_challenge", challenge),
        ("code_challenge_method", "S256"),
        ("scope", "sensors"),
    ];
    let query = params
        .iter()
        .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    format!("{AUTHORIZE_URL}?{query}")
}

/// Tokens returned by the token endpoint.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TokenSet {
    /// Bearer token for API calls.
    pub access_token: String,
    /// Token used to obtain a new access token.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Usually `bearer`.
    #[serde(default)]
    pub token_type: Option<String>,
    /// Lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Parameters of the code-for-token exchange.
#[derive(Debug, Clone)]
pub struct TokenExchange<'a> {
    /// Authorization code from the callback.
    pub code: &'a str,
    /// PKCE verifier matching the challenge that was sent.
    pub verifier: &'a str,
    /// App client id.
    pub client_id: &'a str,
    /// App client secret.
    pub client_secret: &'a str,
    /// Redirect URI used in the authorization request.
    pub redirect_uri: &'a str,
}

/// Exchanges an authorization code for tokens.
///
/// `http` must point at the API host (`https://api.meethue.com`).
///
/// # Errors
///
/// Returns [`ApiError`] if the endpoint reports an OAuth error, or
/// [`ParseError::MissingField`] if no access token is returned.
pub async fn exchange_code(http: &HttpClient, exchange: &TokenExchange<'_>) -> crate::Result<TokenSet> {
    let request = http.request(Method::POST, TOKEN_PATH).form(&[
        ("grant_type", "authorization_code"),
        ("code", exchange.code),
        ("redirect_uri", exchange.redirect_uri),
        ("code_verifier", exchange.verifier),
        ("client_id", exchange.client_id),
        ("client_secret", exchange.client_secret),
    ]);

    let response: TokenResponse = http.send_json(request).await?;
    if let Some(error) = response.error {
        return Err(ApiError::new("Hue", error, response.error_description.unwrap_or_default()).into());
    }

    let access_token = response
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ParseError::MissingField("access_token".to_string()))?;
    let tokens = TokenSet {
        access_token,
        refresh_token: response.refresh_token.filter(|t| !t.is_empty()),
        token_type: response.token_type,
        expires_in: response.expires_in,
    };
    tracing::info!(expires_in = ?tokens.expires_in, "Obtained Hue access token");
    Ok(tokens)
}

// ============================================================================
// Callback server
// ============================================================================

/// What the callback server does with one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackRoute {
    /// `/favicon.ico`: answered with 204.
    Favicon,
    /// A callback after the first one.
    AlreadyProcessed,
    /// The portal reported an error.
    Denied(String),
    /// `/callback` without a code.
    MissingCode,
    /// `/callback` with a code.
    Code(String),
    /// Any other path.
    NotFound,
}

impl CallbackRoute {
    /// Routes a request target such as `/callback?code=abc`.
    ///
    /// `processed` is set once a callback has been consumed.
    #[must_use]
    pub fn resolve(target: &str, processed: &mut bool) -> Self {
        let (path, query) = target.split_once('?').unwrap_or((target, ""));

        match path {
            "/favicon.ico" => Self::Favicon,
            "/callback" if *processed => Self::AlreadyProcessed,
            "/callback" => {
                *processed = true;
                if let Some(error) = query_param(query, "error") {
                    Self::Denied(error)
                } else if let Some(code) = query_param(query, "code").filter(|c| !c.is_empty()) {
                    Self::Code(code)
                } else {
                    Self::MissingCode
                }
            }
            _ => Self::NotFound,
        }
    }
}

fn query_param(query: &str, name: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        (key == name).then(|| {
            let value = value.replace('+', " ");
            urlencoding::decode(&value).map_or(value.clone(), |v| v.into_owned())
        })
    })
}

/// Binds the callback listener on `127.0.0.1:port`.
///
/// # Errors
///
/// Returns [`ProtocolError::Io`] if the port is taken.
pub async fn bind_callback(port: u16) -> Result<TcpListener, ProtocolError> {
    let listener = TcpListener::bind(("127.0.0.1", port)).await?;
    tracing::info!(port, "Callback server listening");
    Ok(listener)
}

/// Serves the OAuth redirect until a code arrives, then runs `exchange`.
///
/// The browser receives a page describing the outcome. The server gives up
/// after `timeout`.
///
/// # Errors
///
/// Returns [`Error::Auth`] if the user denies access, the callback has no
/// code, or the timeout elapses, and the exchange's own error if it fails.
pub async fn serve_callback<F, Fut>(
    listener: TcpListener,
    timeout: Duration,
    exchange: F,
) -> crate::Result<TokenSet>
where
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = crate::Result<TokenSet>>,
{
    tokio::time::timeout(timeout, accept_callback(listener, exchange))
        .await
        .unwrap_or_else(|_| Err(Error::Auth(format!("no callback received after {timeout:?}"))))
}

async fn accept_callback<F, Fut>(listener: TcpListener, exchange: F) -> crate::Result<TokenSet>
where
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = crate::Result<TokenSet>>,
{
    // Connections are read concurrently; an idle one must not hold up the rest
    let (request_tx, mut requests) = mpsc::channel::<(TcpStream, String)>(8);
    let mut processed = false;

    loop {
        let (mut stream, target) = tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = accepted.map_err(ProtocolError::Io)?;
                let request_tx = request_tx.clone();
                tokio::spawn(async move {
                    let mut stream = stream;
                    match tokio::time::timeout(REQUEST_READ_TIMEOUT, read_request_target(&mut stream)).await {
                        Ok(Some(target)) => {
                            tracing::debug!(%peer, target = %target, "Callback request");
                            let _ = request_tx.send((stream, target)).await;
                        }
                        Ok(None) => {}
                        Err(_) => tracing::debug!(%peer, "Callback connection sent no request"),
                    }
                });
                continue;
            }
            Some(request) = requests.recv() => request,
        };

        match CallbackRoute::resolve(&target, &mut processed) {
            CallbackRoute::Favicon => respond(&mut stream, 204, "").await,
            CallbackRoute::NotFound => respond(&mut stream, 404, "<h1>Not Found</h1>").await,
            CallbackRoute::AlreadyProcessed => {
                respond(
                    &mut stream,
                    200,
                    "<h1>Already processed</h1><p>You can close this window.</p>",
                )
                .await;
            }
            CallbackRoute::Denied(error) => {
                let page = format!("<h1>Authorization Failed</h1><p>Error: {}</p>", escape(&error));
                respond(&mut stream, 400, &page).await;
                return Err(Error::Auth(format!("authorization denied: {error}")));
            }
            CallbackRoute::MissingCode => {
                respond(
                    &mut stream,
                    400,
                    "<h1>Missing Code</h1><p>No authorization code received</p>",
                )
                .await;
                return Err(Error::Auth("no authorization code in callback".to_string()));
            }
            CallbackRoute::Code(code) => {
                tracing::info!("Authorization code received, exchanging for tokens");
                return match exchange(code).await {
                    Ok(tokens) => {
                        respond(
                            &mut stream,
                            200,
                            "<h1>Authorization Complete</h1><p>You can close this window and return to the terminal.</p>",
                        )
                        .await;
                        Ok(tokens)
                    }
                    Err(e) => {
                        let page = format!("<h1>Token Exchange Failed</h1><p>{}</p>", escape(&e.to_string()));
                        respond(&mut stream, 500, &page).await;
                        Err(e)
                    }
                };
            }
        }
    }
}

/// Reads the request head and returns the request target.
async fn read_request_target(stream: &mut TcpStream) -> Option<String> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];

    while !buf.windows(4).any(|w| w == b"\r\n\r\n") && buf.len() < MAX_REQUEST_HEAD {
        match stream.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
            Err(e) => {
                tracing::debug!(error = %e, "Failed to read callback request");
                return None;
            }
        }
    }

    let head = String::from_utf8_lossy(&buf);
    let request_line = head.lines().next()?;
    let mut parts = request_line.split_whitespace();
    let _method = parts.next()?;
    parts.next().map(str::to_string)
}

async fn respond(stream: &mut TcpStream, status: u16, body: &str) {
    let reason = match status {
        200 => "OK",
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        _ => "Internal Server Error",
    };
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    if let Err(e) = stream.write_all(response.as_bytes()).await {
        tracing::debug!(error = %e, "Failed to answer callback request");
    }
    let _ = stream.shutdown().await;
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
