//! HTTP request and response values exchanged with the transport.
//!
//! # Design
//! A `CallDescriptor` is built completely before any I/O happens: the URL is
//! already resolved, query parameters are already encoded and the body is
//! already serialized. The executor only ever sends it, so a descriptor that
//! exists is one that can be sent.

use std::fmt;

use url::Url;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => f.write_str("GET"),
            HttpMethod::Post => f.write_str("POST"),
        }
    }
}

/// Remote operation a descriptor belongs to. Doubles as the response schema tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CheckIn,
    ListStudents,
    ListCheckIns,
    SubmitReview,
    ListReviews,
    ListStudentReviews,
    Leaderboard,
}

impl Operation {
    pub fn method(self) -> HttpMethod {
        match self {
            Operation::CheckIn | Operation::SubmitReview => HttpMethod::Post,
            _ => HttpMethod::Get,
        }
    }

    /// Path template relative to the base URL. `{name}` marks a path parameter.
    pub fn path_template(self) -> &'static str {
        match self {
            Operation::CheckIn => "/api/auto/check-in",
            Operation::ListStudents => "/api/auto/students",
            Operation::ListCheckIns => "/api/auto/check-ins/{student_id}",
            Operation::SubmitReview => "/api/reviews",
            Operation::ListReviews => "/api/reviews",
            Operation::ListStudentReviews => "/api/reviews/{student_id}",
            Operation::Leaderboard => "/api/leaderboard",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Operation::CheckIn => "check_in",
            Operation::ListStudents => "list_students",
            Operation::ListCheckIns => "list_check_ins",
            Operation::SubmitReview => "submit_review",
            Operation::ListReviews => "list_reviews",
            Operation::ListStudentReviews => "list_student_reviews",
            Operation::Leaderboard => "leaderboard",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A fully specified outbound request.
///
/// Built by `RequestBuilder::build`; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct CallDescriptor {
    pub operation: Operation,
    pub method: HttpMethod,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl CallDescriptor {
    /// Lookup is case-insensitive, matching HTTP header semantics.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// An HTTP response as raw status and bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as text, replacing invalid UTF-8. Used for error context only.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_operations_are_the_ones_with_bodies() {
        assert_eq!(Operation::CheckIn.method(), HttpMethod::Post);
        assert_eq!(Operation::SubmitReview.method(), HttpMethod::Post);
        assert_eq!(Operation::Leaderboard.method(), HttpMethod::Get);
        assert_eq!(Operation::ListStudentReviews.method(), HttpMethod::Get);
    }

    #[test]
    fn success_is_the_2xx_class() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(199, "").is_success());
        assert!(!HttpResponse::new(301, "").is_success());
        assert!(!HttpResponse::new(500, "").is_success());
    }
}
