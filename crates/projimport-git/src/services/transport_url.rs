//! Parsing of git remote URLs and derivation of repository names

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::error::{GitError, GitResult};

/// A URL usable as a git remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportUrl {
    raw: String,
    name: String,
}

impl TransportUrl {
    pub fn parse(input: &str) -> GitResult<Self> {
        let raw = input.trim();
        if raw.is_empty() {
            return Err(invalid(raw, "URL is empty"));
        }
        if raw.chars().any(char::is_whitespace) {
            return Err(invalid(raw, "URL contains whitespace"));
        }

        let path = if raw.contains("://") {
            parse_scheme_url(raw)?
        } else if raw.starts_with('/') {
            raw.to_string()
        } else if let Some(path) = scp_like_path(raw) {
            path.to_string()
        } else {
            return Err(invalid(raw, "not a recognised git transport URL"));
        };

        let name = humanish_name(&path)
            .ok_or_else(|| invalid(raw, "URL path does not name a repository"))?;

        Ok(Self {
            raw: raw.to_string(),
            name,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Repository name derived from the last path segment, without `.git`.
    ///
    /// `https://example.com/group/proj.git` yields `proj`, and so does
    /// `/srv/repos/proj/.git`.
    pub fn humanish_name(&self) -> &str {
        &self.name
    }
}

impl FromStr for TransportUrl {
    type Err = GitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TransportUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn invalid(url: &str, reason: &str) -> GitError {
    GitError::InvalidUrl {
        url: url.to_string(),
        reason: reason.to_string(),
    }
}

/// Path of a `scheme://` URL with a git transport scheme
fn parse_scheme_url(raw: &str) -> GitResult<String> {
    let url = Url::parse(raw).map_err(|e| invalid(raw, &e.to_string()))?;

    let needs_host = match url.scheme() {
        "http" | "https" | "ssh" | "git+ssh" | "ssh+git" | "git" => true,
        "file" => false,
        other => return Err(invalid(raw, &format!("unsupported scheme '{}'", other))),
    };

    if needs_host && url.host_str().map_or(true, str::is_empty) {
        return Err(invalid(raw, "URL has no host"));
    }

    Ok(url.path().to_string())
}

/// Path part of an scp-like address, `None` when `raw` is not one.
fn scp_like_path(raw: &str) -> Option<&str> {
    let (host, path) = raw.split_once(':')?;
    let host = host.rsplit('@').next().unwrap_or(host);
    if host.is_empty() || host.contains('/') || path.is_empty() {
        return None;
    }
    Some(path)
}

fn humanish_name(path: &str) -> Option<String> {
    let mut segments: Vec<&str> = path
        .split(['/', '\\'])
        .filter(|segment| !segment.is_empty())
        .collect();

    if segments.last() == Some(&".git") {
        segments.pop();
    }

    let last = segments.last()?;
    let name = last.strip_suffix(".git").unwrap_or(last);
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_https_url_name_strips_git_suffix() {
        let url = TransportUrl::parse("https://example.com/group/proj.git").unwrap();
        assert_eq!(url.humanish_name(), "proj");
        assert_eq!(url.as_str(), "https://example.com/group/proj.git");
    }

    #[test]
    fn test_name_from_various_transports() {
        let cases = [
            ("https://gitlab.com/team/sub/service", "service"),
            ("https://gitlab.com/team/service/", "service"),
            ("ssh://git@example.com:2222/team/tool.git", "tool"),
            ("git://example.com/mirror.git", "mirror"),
            ("git@github.com:owner/widget.git", "widget"),
            ("example.com:widget", "widget"),
            ("file:///srv/git/local-repo.git", "local-repo"),
            ("/srv/git/checkout/.git", "checkout"),
        ];

        for (input, expected) in cases {
            let url = TransportUrl::parse(input)
                .unwrap_or_else(|e| panic!("{} should parse: {}", input, e));
            assert_eq!(url.humanish_name(), expected, "name of {}", input);
        }
    }

    #[test]
    fn test_rejects_non_git_urls() {
        for input in [
            "",
            "   ",
            "not a url",
            "just-a-word",
            "relative/path/repo",
            "git@github.com:",
            "ftp://example.com/repo.git",
            "https://example.com/",
            "https://example.com/.git",
            "http://",
        ] {
            let result = TransportUrl::parse(input);
            assert!(
                matches!(result, Err(GitError::InvalidUrl { .. })),
                "{:?} should be rejected, got {:?}",
                input,
                result
            );
        }
    }

    #[test]
    fn test_input_is_trimmed() {
        let url: TransportUrl = "  https://example.com/a/b.git \n".parse().unwrap();
        assert_eq!(url.to_string(), "https://example.com/a/b.git");
    }
}
