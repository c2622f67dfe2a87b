//! Live Reddit source: OAuth password grant, comment listing, and parent
//! identity resolution over the public JSON API.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Mutex;
use url::Url;

use super::{CommentEvent, CommentSource, ParentInfo};
use crate::config::Config;

pub struct RedditSource {
    client: Client,
    base: Url,
    auth_base: Url,
    user_agent: String,
    client_id: String,
    client_secret: String,
    username: String,
    password: String,
    // Bearer token, refreshed lazily; cleared on 401 so the next attempt
    // re-authenticates.
    token: Mutex<Option<String>>,
}

#[derive(Deserialize, Debug)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize, Debug)]
struct Listing<T> {
    data: ListingData<T>,
}

#[derive(Deserialize, Debug)]
struct ListingData<T> {
    children: Vec<Thing<T>>,
}

#[derive(Deserialize, Debug)]
struct Thing<T> {
    data: T,
}

#[derive(Deserialize, Debug)]
struct CommentData {
    id: String,
    body: Option<String>,
    parent_id: String,
    subreddit: Option<String>,
    author: Option<String>,
    created_utc: f64,
}

#[derive(Deserialize, Debug)]
struct ParentData {
    author: Option<String>,
}

#[derive(Deserialize, Debug)]
struct AboutResponse {
    data: AboutData,
}

#[derive(Deserialize, Debug)]
struct AboutData {
    link_karma: i64,
    comment_karma: i64,
}

impl RedditSource {
    pub fn new(cfg: Config) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            base: Url::parse(&cfg.feed_base)?,
            auth_base: Url::parse(&cfg.feed_auth_base)?,
            user_agent: cfg.user_agent,
            client_id: cfg.feed_client_id.ok_or_else(|| anyhow!("missing FEED_CLIENT_ID"))?,
            client_secret: cfg
                .feed_client_secret
                .ok_or_else(|| anyhow!("missing FEED_CLIENT_SECRET"))?,
            username: cfg.feed_username.ok_or_else(|| anyhow!("missing FEED_USERNAME"))?,
            password: cfg.feed_password.ok_or_else(|| anyhow!("missing FEED_PASSWORD"))?,
            token: Mutex::new(None),
        })
    }

    async fn fetch_token(&self) -> Result<String> {
        let basic = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", self.client_id, self.client_secret));
        let url = self.auth_base.join("/api/v1/access_token")?;
        let resp = self
            .client
            .post(url)
            .header("Authorization", format!("Basic {}", basic))
            .header("User-Agent", &self.user_agent)
            .form(&[
                ("grant_type", "password"),
                ("username", self.username.as_str()),
                ("password", self.password.as_str()),
            ])
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(anyhow!("token grant failed: {}", resp.status()));
        }
        let token: TokenResponse = resp.json().await?;
        Ok(token.access_token)
    }

    async fn token(&self) -> Result<String> {
        if let Some(token) = self.token.lock().unwrap().clone() {
            return Ok(token);
        }
        let token = self.fetch_token().await?;
        *self.token.lock().unwrap() = Some(token.clone());
        Ok(token)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T> {
        let token = self.token().await?;
        let resp = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", token))
            .header("User-Agent", &self.user_agent)
            .send()
            .await?;
        if resp.status().as_u16() == 401 {
            // Expired token: drop it and let the retry layer re-enter.
            *self.token.lock().unwrap() = None;
            return Err(anyhow!("unauthorized, token dropped"));
        }
        if !resp.status().is_success() {
            return Err(anyhow!("feed error: {}", resp.status()));
        }
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl CommentSource for RedditSource {
    async fn fetch_recent(&self, since: i64, limit: u32) -> Result<Vec<CommentEvent>> {
        let mut url = self.base.join("/r/all/comments")?;
        url.query_pairs_mut().append_pair("limit", &limit.to_string());
        let listing: Listing<CommentData> = self.get_json(url).await?;
        let events = listing
            .data
            .children
            .into_iter()
            .filter_map(|thing| {
                let c = thing.data;
                let created = c.created_utc as i64;
                if created < since {
                    return None;
                }
                Some(CommentEvent {
                    id: c.id,
                    body: c.body.unwrap_or_default(),
                    parent_id: c.parent_id,
                    subreddit: c.subreddit.filter(|s| !s.is_empty()),
                    author: c.author.unwrap_or_default(),
                    created_utc: created,
                })
            })
            .collect();
        Ok(events)
    }

    async fn resolve_parent(&self, parent_id: &str) -> Result<Option<ParentInfo>> {
        let mut url = self.base.join("/api/info")?;
        url.query_pairs_mut().append_pair("id", parent_id);
        let listing: Listing<ParentData> = self.get_json(url).await?;
        let author = match listing.data.children.into_iter().next().and_then(|t| t.data.author)
        {
            // Deleted accounts come back as "[deleted]"; nothing to credit.
            Some(author) if !author.is_empty() && author != "[deleted]" => author,
            _ => return Ok(None),
        };
        let about_url = self.base.join(&format!("/user/{}/about", author))?;
        let about: AboutResponse = match self.get_json(about_url).await {
            Ok(about) => about,
            // Suspended users have no about page; keep the vote, zero the
            // karma snapshot, as the original did.
            Err(_) => {
                return Ok(Some(ParentInfo { author, link_karma: 0, comment_karma: 0 }))
            }
        };
        Ok(Some(ParentInfo {
            author,
            link_karma: about.data.link_karma,
            comment_karma: about.data.comment_karma,
        }))
    }
}
