//! Blocking HTTP page fetcher.

use crate::error::{OrgFetchError, Result};
use crate::provider::link::next_link;
use crate::provider::page::{Page, PageFetcher};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderName, HeaderValue, LINK, USER_AGENT};

/// How the access token is attached to requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStyle {
    /// `Authorization: Bearer <token>` (GitHub).
    Bearer,
    /// `PRIVATE-TOKEN: <token>` (GitLab).
    PrivateToken,
}

/// Fetches pages over HTTP, reading the continuation from the `Link` header.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    headers: HeaderMap,
}

impl HttpFetcher {
    /// Creates a fetcher. An empty token sends no auth header.
    pub fn new(token: &str, auth: AuthStyle) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            headers: Self::headers(token, auth)?,
        })
    }

    fn headers(token: &str, auth: AuthStyle) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if !token.is_empty() {
            match auth {
                AuthStyle::Bearer => {
                    headers.insert(
                        AUTHORIZATION,
                        HeaderValue::from_str(&format!("Bearer {}", token))?,
                    );
                }
                AuthStyle::PrivateToken => {
                    headers.insert(
                        HeaderName::from_static("private-token"),
                        HeaderValue::from_str(token)?,
                    );
                }
            }
        }
        if auth == AuthStyle::Bearer {
            headers.insert(
                ACCEPT,
                HeaderValue::from_static("application/vnd.github+json"),
            );
            headers.insert(
                "x-github-api-version",
                HeaderValue::from_static("2022-11-28"),
            );
        }
        headers.insert(USER_AGENT, HeaderValue::from_static("org-fetch"));
        Ok(headers)
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, locator: &str) -> Result<Page> {
        let response = self
            .client
            .get(locator)
            .headers(self.headers.clone())
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(OrgFetchError::HttpStatus {
                url: locator.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let next = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(next_link);
        let body = response.bytes()?.to_vec();

        Ok(Page {
            locator: locator.to_string(),
            body,
            next,
        })
    }
}
