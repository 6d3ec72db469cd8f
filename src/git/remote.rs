//! Hosting platform detection from remote URLs.

use std::fmt;
use std::sync::LazyLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

/// `[user@]host:path`, the scp-like form git accepts for SSH remotes.
static SCP_REMOTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[^@/]+@)?([^:/]+):(.+)$").expect("scp remote pattern is valid")
});

/// Hosting platform behind a remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    GitHub,
    GitLab,
    Unknown,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::GitHub => write!(f, "GitHub"),
            Platform::GitLab => write!(f, "GitLab"),
            Platform::Unknown => write!(f, "unknown"),
        }
    }
}

/// A remote split into host and repository path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteLocation {
    pub host: String,
    pub owner: String,
    pub name: String,
}

impl RemoteLocation {
    pub fn platform(&self) -> Platform {
        platform_for_host(&self.host)
    }

    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// Parse SSH (`ssh://git@host/owner/repo`), scp-like (`git@host:owner/repo.git`),
/// and HTTP(S) remote URLs.
///
/// Returns `None` for local paths and URLs without an owner and name.
pub fn parse_remote(url: &str) -> Option<RemoteLocation> {
    let url = url.trim();

    let (host, path) = if let Some((_, rest)) = url.split_once("://") {
        let rest = rest.rsplit_once('@').map_or(rest, |(_, r)| r);
        let (host, path) = rest.split_once('/')?;
        // Drop any port.
        (host.split(':').next().unwrap_or(host), path)
    } else {
        let caps = SCP_REMOTE.captures(url)?;
        (caps.get(1)?.as_str(), caps.get(2)?.as_str())
    };

    let path = path.trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    let (owner, name) = path.rsplit_once('/')?;
    if host.is_empty() || owner.is_empty() || name.is_empty() {
        return None;
    }

    Some(RemoteLocation {
        host: host.to_lowercase(),
        owner: owner.to_string(),
        name: name.to_string(),
    })
}

/// Detect the hosting platform from a remote URL.
pub fn detect_platform(url: &str) -> Platform {
    parse_remote(url)
        .map(|r| r.platform())
        .unwrap_or(Platform::Unknown)
}

fn platform_for_host(host: &str) -> Platform {
    if host == "github.com" || host.ends_with(".github.com") {
        Platform::GitHub
    } else if host.contains("gitlab") {
        Platform::GitLab
    } else {
        Platform::Unknown
    }
}
