//! Route path normalization and pattern matching.
//!
//! Patterns use the keyMatch2 grammar: `:name` matches one path segment and
//! a trailing `/*` matches any suffix. Anything without those markers is an
//! exact path.
//!
//! Literal segments and parameter names are limited to ASCII letters,
//! digits, `-`, `_` and `~`. keyMatch2 compiles patterns into regexes
//! unescaped, so nothing else may reach it.
use crate::{AuthzError, AuthzResult};
use casbin::function_map::key_match2;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoutePattern {
    Exact(String),
    Param(String),
}

impl RoutePattern {
    pub fn parse(raw: &str) -> AuthzResult<Self> {
        let trimmed = raw.trim();
        if !trimmed.starts_with('/') {
            return Err(AuthzError::InvalidRoute(raw.to_string()));
        }
        let segments: Vec<&str> = trimmed[1..].split('/').collect();
        let last = segments.len() - 1;
        let mut is_param = false;
        for (index, segment) in segments.iter().enumerate() {
            let valid = match *segment {
                // Root, or a trailing slash that normalization drops.
                "" => index == last,
                "*" => {
                    is_param = true;
                    index == last
                }
                param if param.starts_with(':') => {
                    is_param = true;
                    is_segment_text(&param[1..])
                }
                literal => is_segment_text(literal),
            };
            if !valid {
                return Err(AuthzError::InvalidRoute(raw.to_string()));
            }
        }
        if is_param {
            Ok(RoutePattern::Param(trimmed.to_string()))
        } else {
            Ok(RoutePattern::Exact(normalize_path(trimmed)))
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RoutePattern::Exact(path) | RoutePattern::Param(path) => path,
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, RoutePattern::Exact(_))
    }

    /// Test a normalized request path against this pattern.
    pub fn matches(&self, path: &str) -> bool {
        match self {
            RoutePattern::Exact(exact) => exact == path,
            RoutePattern::Param(pattern) => key_match2(path, pattern),
        }
    }
}

fn is_segment_text(text: &str) -> bool {
    !text.is_empty()
        && text
            .bytes()
            .all(|byte| byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'~'))
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strip query/fragment and trailing slashes so `/perfil/` and `/perfil?x=1`
/// are looked up as `/perfil`. The root stays `/`.
pub fn normalize_path(raw: &str) -> String {
    let path = raw
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim();
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}
