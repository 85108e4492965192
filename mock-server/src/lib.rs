use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

const MARKS_PER_CHECK_IN: i64 = 10;
const MARKS_PER_REVIEW: i64 = 5;
const DEFAULT_LIMIT: u32 = 50;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Student {
    pub id: Uuid,
    pub student_id: String,
    pub full_name: String,
    pub created_at: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckIn {
    pub id: i64,
    pub created_at: String,
}

#[derive(Clone, Debug)]
struct CheckInRow {
    id: i64,
    student_id: String,
    created_at: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReviewAuthor {
    pub full_name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub student_id: String,
    pub mobile_app_name: String,
    pub review_text: String,
    pub created_at: String,
    pub students: Option<ReviewAuthor>,
}

#[derive(Deserialize)]
pub struct CheckInRequest {
    pub student_id: String,
    pub full_name: String,
}

#[derive(Deserialize)]
pub struct ReviewRequest {
    pub student_id: String,
    pub mobile_app_name: String,
    pub review_text: String,
}

#[derive(Deserialize, Default)]
pub struct ReviewQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub app_name: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct PageQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Response wrapper shared by every endpoint.
#[derive(Serialize, Deserialize, Debug)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Default)]
pub struct Store {
    students: HashMap<String, Student>,
    check_ins: Vec<CheckInRow>,
    reviews: Vec<Review>,
    next_id: i64,
}

impl Store {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/api/auto/check-in", post(check_in))
        .route("/api/auto/students", get(list_students))
        .route("/api/auto/check-ins/{student_id}", get(list_check_ins))
        .route("/api/reviews", get(list_reviews).post(submit_review))
        .route("/api/reviews/{student_id}", get(list_student_reviews))
        .route("/api/leaderboard", get(leaderboard))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn success<T: Serialize>(status: StatusCode, data: T, message: Option<&str>) -> Response {
    let envelope = Envelope {
        success: true,
        data: Some(data),
        message: message.map(str::to_string),
    };
    (status, Json(envelope)).into_response()
}

fn failure(status: StatusCode, message: &str) -> Response {
    let envelope: Envelope<()> = Envelope {
        success: false,
        data: None,
        message: Some(message.to_string()),
    };
    (status, Json(envelope)).into_response()
}

async fn check_in(State(db): State<Db>, Json(input): Json<CheckInRequest>) -> Response {
    if input.student_id.trim().is_empty() || input.full_name.trim().is_empty() {
        return failure(StatusCode::BAD_REQUEST, "student_id and full_name are required");
    }

    let mut store = db.write().await;
    let existing = store
        .students
        .get(&input.student_id)
        .map(|s| s.full_name.clone());
    let is_new_student = existing.is_none();
    let student_name = match existing {
        Some(name) => name,
        None => {
            let student = Student {
                id: Uuid::new_v4(),
                student_id: input.student_id.clone(),
                full_name: input.full_name.clone(),
                created_at: now(),
            };
            store.students.insert(input.student_id.clone(), student);
            input.full_name.clone()
        }
    };

    let id = store.next_id();
    let checked_in_at = now();
    store.check_ins.push(CheckInRow {
        id,
        student_id: input.student_id.clone(),
        created_at: checked_in_at.clone(),
    });

    let data = serde_json::json!({
        "check_in_id": id,
        "student_id": input.student_id,
        "student_name": student_name,
        "checked_in_at": checked_in_at,
        "is_new_student": is_new_student,
    });
    success(StatusCode::CREATED, data, Some("Check-in successful"))
}

async fn list_students(State(db): State<Db>) -> Response {
    let store = db.read().await;
    let mut students: Vec<Student> = store.students.values().cloned().collect();
    students.sort_by(|a, b| a.student_id.cmp(&b.student_id));
    let data = serde_json::json!({ "total": students.len(), "students": students });
    success(StatusCode::OK, data, None)
}

async fn list_check_ins(State(db): State<Db>, Path(student_id): Path<String>) -> Response {
    let store = db.read().await;
    if !store.students.contains_key(&student_id) {
        return failure(StatusCode::NOT_FOUND, "Student not found");
    }
    let check_ins: Vec<CheckIn> = store
        .check_ins
        .iter()
        .filter(|row| row.student_id == student_id)
        .map(|row| CheckIn {
            id: row.id,
            created_at: row.created_at.clone(),
        })
        .collect();
    success(StatusCode::OK, serde_json::json!({ "check_ins": check_ins }), None)
}

async fn submit_review(State(db): State<Db>, Json(input): Json<ReviewRequest>) -> Response {
    if input.mobile_app_name.trim().is_empty() || input.review_text.trim().is_empty() {
        return failure(StatusCode::BAD_REQUEST, "mobile_app_name and review_text are required");
    }

    let mut store = db.write().await;
    let Some(student_name) = store
        .students
        .get(&input.student_id)
        .map(|s| s.full_name.clone())
    else {
        return failure(StatusCode::NOT_FOUND, "Student not found");
    };

    let id = store.next_id();
    let review = Review {
        id,
        student_id: input.student_id,
        mobile_app_name: input.mobile_app_name,
        review_text: input.review_text,
        created_at: now(),
        students: Some(ReviewAuthor {
            full_name: student_name.clone(),
        }),
    };
    store.reviews.push(review.clone());

    let data = serde_json::json!({
        "review_id": review.id,
        "student_id": review.student_id,
        "student_name": student_name,
        "mobile_app_name": review.mobile_app_name,
        "review_text": review.review_text,
        "submitted_at": review.created_at,
    });
    success(StatusCode::CREATED, data, Some("Review submitted successfully"))
}

fn review_page<'a>(reviews: impl Iterator<Item = &'a Review>, query: &ReviewQuery) -> serde_json::Value {
    let matching: Vec<&Review> = reviews
        .filter(|r| {
            query
                .app_name
                .as_deref()
                .map_or(true, |name| r.mobile_app_name.eq_ignore_ascii_case(name))
        })
        .collect();
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    let offset = query.offset.unwrap_or(0);
    let page: Vec<&Review> = matching
        .iter()
        .rev()
        .skip(offset as usize)
        .take(limit as usize)
        .copied()
        .collect();

    let mut showing = serde_json::json!({ "limit": limit, "offset": offset });
    if let Some(name) = &query.app_name {
        showing["app_name_filter"] = serde_json::Value::String(name.clone());
    }
    serde_json::json!({
        "reviews": page,
        "total_reviews": matching.len(),
        "showing": showing,
    })
}

async fn list_reviews(State(db): State<Db>, Query(query): Query<ReviewQuery>) -> Response {
    let store = db.read().await;
    success(StatusCode::OK, review_page(store.reviews.iter(), &query), None)
}

async fn list_student_reviews(
    State(db): State<Db>,
    Path(student_id): Path<String>,
    Query(query): Query<ReviewQuery>,
) -> Response {
    let store = db.read().await;
    if !store.students.contains_key(&student_id) {
        return failure(StatusCode::NOT_FOUND, "Student not found");
    }
    let reviews = store.reviews.iter().filter(|r| r.student_id == student_id);
    success(StatusCode::OK, review_page(reviews, &query), None)
}

async fn leaderboard(State(db): State<Db>, Query(query): Query<PageQuery>) -> Response {
    let store = db.read().await;
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).max(1);
    let offset = query.offset.unwrap_or(0);

    let mut rows: Vec<(i64, i64, Option<String>, &Student)> = store
        .students
        .values()
        .map(|student| {
            let check_ins: Vec<&CheckInRow> = store
                .check_ins
                .iter()
                .filter(|c| c.student_id == student.student_id)
                .collect();
            let reviews = store
                .reviews
                .iter()
                .filter(|r| r.student_id == student.student_id)
                .count() as i64;
            let total_check_ins = check_ins.len() as i64;
            let marks = total_check_ins * MARKS_PER_CHECK_IN + reviews * MARKS_PER_REVIEW;
            let latest = check_ins.iter().map(|c| c.created_at.clone()).max();
            (marks, total_check_ins, latest, student)
        })
        .collect();
    rows.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.3.student_id.cmp(&b.3.student_id)));

    let total_students = rows.len() as u32;
    let entries: Vec<serde_json::Value> = rows
        .iter()
        .enumerate()
        .skip(offset as usize)
        .take(limit as usize)
        .map(|(index, (marks, check_ins, latest, student))| {
            serde_json::json!({
                "student_id": student.student_id,
                "full_name": student.full_name,
                "total_marks": marks,
                "total_check_ins": check_ins,
                "latest_check_in": latest,
                "rank": index + 1,
            })
        })
        .collect();

    let data = serde_json::json!({
        "leaderboard": entries,
        "total_students": total_students,
        "showing": {
            "limit": limit,
            "offset": offset,
            "total_pages": total_students.div_ceil(limit),
            "current_page": offset / limit + 1,
        },
    });
    success(StatusCode::OK, data, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_envelope_omits_data() {
        let envelope: Envelope<()> = Envelope {
            success: false,
            data: None,
            message: Some("nope".to_string()),
        };
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json, serde_json::json!({"success": false, "message": "nope"}));
    }

    #[test]
    fn review_page_filters_by_app_name_case_insensitively() {
        let review = |id, app: &str| Review {
            id,
            student_id: "S001".to_string(),
            mobile_app_name: app.to_string(),
            review_text: "ok".to_string(),
            created_at: "2025-07-01T00:00:00Z".to_string(),
            students: None,
        };
        let reviews = vec![review(1, "Notes"), review(2, "Focus"), review(3, "notes")];
        let query = ReviewQuery {
            app_name: Some("NOTES".to_string()),
            ..ReviewQuery::default()
        };
        let page = review_page(reviews.iter(), &query);
        assert_eq!(page["total_reviews"], 2);
        assert_eq!(page["reviews"][0]["id"], 3);
        assert_eq!(page["showing"]["app_name_filter"], "NOTES");
        assert_eq!(page["showing"]["limit"], 50);
    }

    #[test]
    fn check_in_request_rejects_missing_name() {
        let result: Result<CheckInRequest, _> = serde_json::from_str(r#"{"student_id":"S001"}"#);
        assert!(result.is_err());
    }
}
