//! Cross-site username presence probing.

use crate::module::{cache_key, ensure_supported, ModuleCategory, ModuleContext, OsintModule};
use async_trait::async_trait;
use scout_core::{Artifact, Entity, EntityKind, ModuleResult, ScoutError};
use scout_net::{HttpRequest, Method};
use std::time::Duration;

const DEFAULT_PACING: Duration = Duration::from_secs(1);

/// A site whose profile URL can be derived from a username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsernameSite {
    /// Display name, used as the artifact title
    pub name: String,
    /// Profile URL with a `{user}` placeholder
    pub url_template: String,
    /// Probe method
    pub method: Method,
    /// Delay after each probe of this site
    pub pacing: Duration,
}

impl UsernameSite {
    /// Site probed with `method` and the default one second pacing.
    #[must_use]
    pub fn new(name: impl Into<String>, url_template: impl Into<String>, method: Method) -> Self {
        Self {
            name: name.into(),
            url_template: url_template.into(),
            method,
            pacing: DEFAULT_PACING,
        }
    }

    /// Override the pacing delay.
    #[must_use]
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Profile URL for `username`.
    #[must_use]
    pub fn profile_url(&self, username: &str) -> String {
        self.url_template.replace("{user}", username)
    }

    fn request(&self, username: &str) -> HttpRequest {
        let url = self.profile_url(username);
        match self.method {
            Method::Head => HttpRequest::head(url),
            Method::Get => HttpRequest::get(url),
        }
    }
}

/// Built-in site list.
#[must_use]
pub fn default_sites() -> Vec<UsernameSite> {
    use Method::{Get, Head};
    vec![
        UsernameSite::new("GitHub", "https://github.com/{user}", Head),
        UsernameSite::new("GitLab", "https://gitlab.com/{user}", Head),
        UsernameSite::new("Twitter", "https://twitter.com/{user}", Get),
        UsernameSite::new("Reddit", "https://www.reddit.com/user/{user}", Head),
        UsernameSite::new("Medium", "https://medium.com/@{user}", Get),
        UsernameSite::new("DEV", "https://dev.to/{user}", Head),
        UsernameSite::new("StackOverflow", "https://stackoverflow.com/users/story/{user}", Get),
        UsernameSite::new("HackerNews", "https://news.ycombinator.com/user?id={user}", Get),
        UsernameSite::new("LinkedIn", "https://www.linkedin.com/in/{user}", Get),
        UsernameSite::new("Keybase", "https://keybase.io/{user}", Head),
    ]
}

/// Probes each site in turn and reports the ones answering with a
/// success or redirect status.
#[derive(Debug, Clone)]
pub struct UsernamePresenceModule {
    sites: Vec<UsernameSite>,
}

impl UsernamePresenceModule {
    const TTL: Duration = Duration::from_secs(60 * 60);

    /// Module over [`default_sites`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_sites(default_sites())
    }

    /// Module over a custom site list.
    #[must_use]
    pub fn with_sites(sites: Vec<UsernameSite>) -> Self {
        Self { sites }
    }

    /// Sites probed, in order.
    #[must_use]
    pub fn sites(&self) -> &[UsernameSite] {
        &self.sites
    }
}

impl Default for UsernamePresenceModule {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OsintModule for UsernamePresenceModule {
    fn id(&self) -> &'static str {
        "username.presence"
    }

    fn name(&self) -> &'static str {
        "Username Presence"
    }

    fn description(&self) -> &'static str {
        "Check which sites host a profile with this username"
    }

    fn category(&self) -> ModuleCategory {
        ModuleCategory::Username
    }

    fn supports(&self, entity: &Entity) -> bool {
        entity.kind() == EntityKind::Username
    }

    async fn run(&self, entity: &Entity, ctx: &ModuleContext) -> Result<ModuleResult, ScoutError> {
        ensure_supported(self, entity)?;
        let key = cache_key(self.id(), entity);
        if let Some(hit) = ctx.cached(&key, Self::TTL).await {
            return Ok(hit);
        }

        let username = entity.value();
        let mut result = ModuleResult::new(self.id(), self.name(), entity);

        for site in &self.sites {
            let request = site.request(username);
            // The fetcher only returns 2xx/3xx responses; anything else is an error.
            match ctx.fetch(&request).await {
                Ok(_) => {
                    result.push(Artifact::new(site.name.clone(), request.url.clone()));
                    result.add_link(request.url.clone());
                }
                Err(ScoutError::Cancelled) => return Err(ScoutError::Cancelled),
                Err(e) => tracing::debug!(site = %site.name, "Profile not found: {e}"),
            }
            ctx.pause(site.pacing).await?;
        }

        result.summary = if result.artifacts.is_empty() {
            "No profiles found".to_string()
        } else {
            format!("Found {} profiles", result.artifacts.len())
        };

        ctx.remember(&key, &result).await;
        Ok(result)
    }
}
