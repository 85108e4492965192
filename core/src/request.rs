//! Turns an operation plus its parameters into a [`CallDescriptor`].

use serde::Serialize;
use url::Url;

use crate::config::CachePolicy;
use crate::error::ApiError;
use crate::http::{CallDescriptor, Operation};

const JSON: &str = "application/json";

/// Ordered query parameters with unique keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `key`, or replaces its value in place if already present.
    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        let key = key.into();
        let value = value.to_string();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((key, value)),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Builds descriptors against a fixed base URL.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    base: Url,
    cache_policy: CachePolicy,
}

impl RequestBuilder {
    pub fn new(base_url: &str, cache_policy: CachePolicy) -> Result<Self, ApiError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let base = Url::parse(trimmed)
            .map_err(|e| ApiError::InvalidRequest(format!("base URL `{base_url}`: {e}")))?;
        if !matches!(base.scheme(), "http" | "https") || base.cannot_be_a_base() {
            return Err(ApiError::InvalidRequest(format!(
                "base URL `{base_url}` must be an absolute http(s) URL"
            )));
        }
        if base.query().is_some() || base.fragment().is_some() {
            return Err(ApiError::InvalidRequest(format!(
                "base URL `{base_url}` must not carry a query or fragment"
            )));
        }
        Ok(Self { base, cache_policy })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// `path_params` fill the `{...}` placeholders of the operation's template
    /// in order. Parameters are never trimmed or rewritten, only encoded.
    pub fn build<B: Serialize>(
        &self,
        operation: Operation,
        path_params: &[&str],
        query: &QueryParams,
        body: Option<&B>,
    ) -> Result<CallDescriptor, ApiError> {
        let mut url = self.base.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                ApiError::InvalidRequest(format!("base URL `{}` cannot carry a path", self.base))
            })?;
            segments.pop_if_empty();

            let mut params = path_params.iter();
            for part in operation.path_template().split('/').filter(|s| !s.is_empty()) {
                if part.starts_with('{') && part.ends_with('}') {
                    let value = params.next().ok_or_else(|| {
                        ApiError::InvalidRequest(format!("{operation}: missing path parameter {part}"))
                    })?;
                    validate_segment(operation, part, value)?;
                    segments.push(value);
                } else {
                    segments.push(part);
                }
            }
            if params.next().is_some() {
                return Err(ApiError::InvalidRequest(format!(
                    "{operation}: too many path parameters"
                )));
            }
        }

        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query.iter() {
                pairs.append_pair(key, value);
            }
        }

        let mut headers = vec![("accept".to_string(), JSON.to_string())];
        let body = match body {
            Some(payload) => {
                let json = serde_json::to_string(payload).map_err(|e| {
                    ApiError::InvalidRequest(format!("{operation}: body serialization failed: {e}"))
                })?;
                headers.push(("content-type".to_string(), JSON.to_string()));
                Some(json)
            }
            None => None,
        };
        if self.cache_policy == CachePolicy::ReloadIgnoringCache {
            headers.push(("cache-control".to_string(), "no-cache".to_string()));
        }

        Ok(CallDescriptor {
            operation,
            method: operation.method(),
            url,
            headers,
            body,
        })
    }
}

fn validate_segment(operation: Operation, name: &str, value: &str) -> Result<(), ApiError> {
    let reason = if value.trim().is_empty() {
        Some("is empty")
    } else if value == "." || value == ".." {
        Some("is a relative path segment")
    } else if value.chars().any(char::is_control) {
        Some("contains control characters")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(ApiError::InvalidRequest(format!(
            "{operation}: path parameter {name} {reason}"
        ))),
        None => Ok(()),
    }
}
