//! Domain DTOs for the Learnify API.
//!
//! # Design
//! These types mirror the service schema but are defined independently of the
//! mock-server crate. Integration tests catch schema drift between the two.
//! Timestamps stay as the strings the service sends.

use serde::{Deserialize, Serialize};

use crate::request::QueryParams;

/// Request payload for `POST /api/auto/check-in`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckInRequest {
    pub student_id: String,
    pub full_name: String,
}

/// Result of a successful check-in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckInReceipt {
    pub check_in_id: i64,
    pub student_id: String,
    pub student_name: String,
    pub checked_in_at: String,
    pub is_new_student: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Student {
    pub id: String,
    pub student_id: String,
    pub full_name: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StudentRoster {
    pub students: Vec<Student>,
    pub total: u64,
}

/// One entry in a student's check-in history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckIn {
    pub id: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckInHistory {
    pub check_ins: Vec<CheckIn>,
}

/// Request payload for `POST /api/reviews`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReviewRequest {
    pub student_id: String,
    pub mobile_app_name: String,
    pub review_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmittedReview {
    pub review_id: i64,
    pub student_id: String,
    pub student_name: String,
    pub mobile_app_name: String,
    pub review_text: String,
    pub submitted_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReviewAuthor {
    pub full_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Review {
    pub id: i64,
    pub student_id: String,
    pub mobile_app_name: String,
    pub review_text: String,
    pub created_at: String,
    /// Joined author record; absent when the service omits the join.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub students: Option<ReviewAuthor>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReviewWindow {
    pub limit: u32,
    pub offset: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_name_filter: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReviewPage {
    pub reviews: Vec<Review>,
    pub total_reviews: u64,
    pub showing: ReviewWindow,
}

/// Optional filters for the review listings. Absent fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewFilters {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub app_name: Option<String>,
}

impl ReviewFilters {
    pub fn to_query(&self) -> QueryParams {
        let mut query = QueryParams::new();
        if let Some(limit) = self.limit {
            query.insert("limit", limit);
        }
        if let Some(offset) = self.offset {
            query.insert("offset", offset);
        }
        if let Some(app_name) = &self.app_name {
            query.insert("app_name", app_name);
        }
        query
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub student_id: String,
    pub full_name: String,
    pub total_marks: i64,
    pub total_check_ins: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_check_in: Option<String>,
    pub rank: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeaderboardWindow {
    pub limit: u32,
    pub offset: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_page: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeaderboardPage {
    pub leaderboard: Vec<LeaderboardEntry>,
    pub total_students: u64,
    pub showing: LeaderboardWindow,
}

impl LeaderboardPage {
    pub const DEFAULT_LIMIT: u32 = 50;
}
