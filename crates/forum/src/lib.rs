//! Client for the forum that owns user identities.
//!
//! The only thing the ledger needs from it is the user's gamification score,
//! read once per login to seed or refresh the local account.

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForumError {
    #[error("invalid forum base url: {0}")]
    InvalidBaseUrl(String),
    #[error("forum request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("forum profile has no user object")]
    MissingUser,
}

/// Something able to report a user's external score.
#[async_trait]
pub trait ScoreSource: Send + Sync {
    /// Current score for `username`. Never fails: 0 when unavailable.
    async fn gamification_score(&self, username: &str) -> i64;
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ForumSettings {
    pub base_url: String,
    /// HTTP(S) proxy used for every forum request.
    pub proxy: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ForumSettings {
    fn default() -> Self {
        Self {
            base_url: "https://linux.do".to_string(),
            proxy: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Deserialize)]
struct Profile {
    user: Option<ProfileUser>,
}

#[derive(Deserialize)]
struct ProfileUser {
    gamification_score: Option<i64>,
}

#[derive(Clone, Debug)]
pub struct ForumClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ForumClient {
    pub fn new(settings: &ForumSettings) -> Result<Self, ForumError> {
        let base_url = Url::parse(&settings.base_url)
            .map_err(|err| ForumError::InvalidBaseUrl(err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ForumError::InvalidBaseUrl(settings.base_url.clone()));
        }

        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(concat!("doscores/", env!("CARGO_PKG_VERSION")));
        if let Some(proxy) = settings.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
            tracing::info!("forum requests go through proxy {proxy}");
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }

        Ok(Self {
            http: builder.build()?,
            base_url,
        })
    }

    fn profile_url(&self, username: &str) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base was rejected in `new`
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push("u")
                .push(&format!("{username}.json"));
        }
        url
    }

    /// Fetch the score, surfacing every failure.
    pub async fn fetch_score(&self, username: &str) -> Result<i64, ForumError> {
        let profile: Profile = self
            .http
            .get(self.profile_url(username))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let user = profile.user.ok_or(ForumError::MissingUser)?;
        Ok(user.gamification_score.unwrap_or(0))
    }
}

#[async_trait]
impl ScoreSource for ForumClient {
    async fn gamification_score(&self, username: &str) -> i64 {
        match self.fetch_score(username).await {
            Ok(score) => {
                tracing::debug!(username, score, "fetched forum score");
                score
            }
            Err(err) => {
                tracing::error!(username, "failed to fetch forum score: {err}");
                0
            }
        }
    }
}

/// Fixed scores keyed by username; unknown users score 0.
#[derive(Clone, Debug, Default)]
pub struct StaticScores {
    scores: HashMap<String, i64>,
}

impl StaticScores {
    #[must_use]
    pub fn with(mut self, username: impl Into<String>, score: i64) -> Self {
        self.scores.insert(username.into(), score);
        self
    }
}

#[async_trait]
impl ScoreSource for StaticScores {
    async fn gamification_score(&self, username: &str) -> i64 {
        self.scores.get(username).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> ForumClient {
        ForumClient::new(&ForumSettings {
            base_url: base_url.to_string(),
            ..ForumSettings::default()
        })
        .unwrap()
    }

    #[test]
    fn profile_url_appends_user_path() {
        assert_eq!(
            client("https://forum.example").profile_url("alice").as_str(),
            "https://forum.example/u/alice.json"
        );
        assert_eq!(
            client("https://forum.example/base/").profile_url("bob").as_str(),
            "https://forum.example/base/u/bob.json"
        );
    }

    #[test]
    fn rejects_non_base_urls() {
        let err = ForumClient::new(&ForumSettings {
            base_url: "mailto:admin@forum.example".to_string(),
            ..ForumSettings::default()
        })
        .unwrap_err();
        assert!(matches!(err, ForumError::InvalidBaseUrl(_)));
    }

    #[tokio::test]
    async fn static_scores_default_to_zero() {
        let scores = StaticScores::default().with("alice", 42);
        assert_eq!(scores.gamification_score("alice").await, 42);
        assert_eq!(scores.gamification_score("bob").await, 0);
    }
}
