//! Image reference parsing.
//!
//! Accepts `[domain/]path[:tag][@digest]`. A first path component is a
//! domain when it contains `.` or `:` or is `localhost`; otherwise the
//! reference belongs to Docker Hub, where single-component names live
//! under `library/`.

use std::fmt;
use std::str::FromStr;

use crate::error::ResolveError;
use crate::registry::host::DOCKER_HUB_DOMAIN;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub domain: String,
    pub repository: String,
    pub tag: Option<String>,
    pub digest: Option<String>,
}

impl FromStr for Reference {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ResolveError::InvalidReference {
            reference: s.to_string(),
            reason: reason.to_string(),
        };

        let (name, digest) = match s.split_once('@') {
            Some((name, digest)) => {
                if !digest.contains(':') {
                    return Err(invalid("digest must be algorithm:hex"));
                }
                (name, Some(digest.to_string()))
            }
            None => (s, None),
        };

        let last_slash = name.rfind('/');
        let (name, tag) = match name.rfind(':') {
            Some(colon) if last_slash.map_or(true, |slash| colon > slash) => {
                (&name[..colon], Some(name[colon + 1..].to_string()))
            }
            _ => (name, None),
        };
        if tag.as_deref() == Some("") {
            return Err(invalid("empty tag"));
        }

        let (domain, repository) = match name.split_once('/') {
            Some((first, rest)) if first.contains('.') || first.contains(':') || first == "localhost" => {
                (first.to_string(), rest.to_string())
            }
            _ => (DOCKER_HUB_DOMAIN.to_string(), name.to_string()),
        };
        let domain = if domain == "index.docker.io" {
            DOCKER_HUB_DOMAIN.to_string()
        } else {
            domain
        };
        let repository = if domain == DOCKER_HUB_DOMAIN && !repository.contains('/') {
            format!("library/{repository}")
        } else {
            repository
        };

        if repository.is_empty() || repository.split('/').any(str::is_empty) {
            return Err(invalid("empty path component"));
        }
        if !repository
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "._-/".contains(c))
        {
            return Err(invalid("repository must be lowercase alphanumerics and separators"));
        }

        Ok(Self {
            domain,
            repository,
            tag,
            digest,
        })
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.domain, self.repository)?;
        if let Some(tag) = &self.tag {
            write!(f, ":{tag}")?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{digest}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_docker_hub_short_name() {
        let r: Reference = "alpine".parse().unwrap();
        assert_eq!(r.domain, "docker.io");
        assert_eq!(r.repository, "library/alpine");
        assert_eq!(r.tag, None);
        assert_eq!(r.to_string(), "docker.io/library/alpine");
    }

    #[test]
    fn test_registry_with_port_and_tag() {
        let r: Reference = "localhost:5000/team/app:v1".parse().unwrap();
        assert_eq!(r.domain, "localhost:5000");
        assert_eq!(r.repository, "team/app");
        assert_eq!(r.tag.as_deref(), Some("v1"));
    }

    #[test]
    fn test_digest() {
        let r: Reference = "ghcr.io/org/tool@sha256:abcd".parse().unwrap();
        assert_eq!(r.domain, "ghcr.io");
        assert_eq!(r.digest.as_deref(), Some("sha256:abcd"));
        assert_eq!(r.to_string(), "ghcr.io/org/tool@sha256:abcd");
    }

    #[test]
    fn test_index_docker_io_normalized() {
        let r: Reference = "index.docker.io/nginx:1.25".parse().unwrap();
        assert_eq!(r.domain, "docker.io");
        assert_eq!(r.repository, "library/nginx");
    }

    #[test]
    fn test_invalid() {
        assert!("".parse::<Reference>().is_err());
        assert!("Upper/Case".parse::<Reference>().is_err());
        assert!("alpine:".parse::<Reference>().is_err());
        assert!("alpine@nodigest".parse::<Reference>().is_err());
        assert!("ghcr.io//x".parse::<Reference>().is_err());
    }
}
