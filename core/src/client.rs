//! Domain client for the Learnify service.
//!
//! # Design
//! `LearnifyClient` is an explicitly constructed value; there is no global
//! instance. Every operation is split into a pure `build_*` method that
//! produces a `CallDescriptor` and an async method that runs that descriptor
//! through the `Executor` and decodes the envelope. The client carries no
//! mutable state, so clones can be used concurrently.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::config::ClientConfig;
use crate::decode::decode;
use crate::error::ApiError;
use crate::executor::{AttemptObserver, Executor, RetryPolicy};
use crate::http::{CallDescriptor, Operation};
use crate::request::{QueryParams, RequestBuilder};
use crate::transport::{Transport, UreqTransport};
use crate::types::{
    CheckInHistory, CheckInReceipt, CheckInRequest, LeaderboardPage, ReviewFilters, ReviewPage,
    ReviewRequest, StudentRoster, SubmittedReview,
};

/// Client for the attendance, review and leaderboard endpoints.
#[derive(Clone)]
pub struct LearnifyClient {
    requests: RequestBuilder,
    executor: Executor,
    cancel: CancellationToken,
}

impl LearnifyClient {
    /// Client over the ureq transport configured from `config`.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let transport = Arc::new(UreqTransport::new(&config.transport));
        Self::with_transport(config, transport)
    }

    pub fn with_transport(
        config: &ClientConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ApiError> {
        let requests = RequestBuilder::new(&config.base_url, config.transport.cache_policy)?;
        let executor = Executor::new(transport, RetryPolicy::from(&config.transport));
        Ok(Self {
            requests,
            executor,
            cancel: CancellationToken::new(),
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn AttemptObserver>) -> Self {
        self.executor = self.executor.with_observer(observer);
        self
    }

    /// A copy of this client whose calls end with `Cancelled` once `token` fires.
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            cancel: token,
            ..self.clone()
        }
    }

    pub fn base_url(&self) -> &str {
        self.requests.base_url().as_str()
    }

    pub fn build_check_in(&self, student_id: &str, full_name: &str) -> Result<CallDescriptor, ApiError> {
        let body = CheckInRequest {
            student_id: student_id.to_string(),
            full_name: full_name.to_string(),
        };
        self.requests
            .build(Operation::CheckIn, &[], &QueryParams::new(), Some(&body))
    }

    pub fn build_list_students(&self) -> Result<CallDescriptor, ApiError> {
        self.requests
            .build::<()>(Operation::ListStudents, &[], &QueryParams::new(), None)
    }

    pub fn build_list_check_ins(&self, student_id: &str) -> Result<CallDescriptor, ApiError> {
        self.requests
            .build::<()>(Operation::ListCheckIns, &[student_id], &QueryParams::new(), None)
    }

    pub fn build_submit_review(
        &self,
        student_id: &str,
        mobile_app_name: &str,
        review_text: &str,
    ) -> Result<CallDescriptor, ApiError> {
        let body = ReviewRequest {
            student_id: student_id.to_string(),
            mobile_app_name: mobile_app_name.to_string(),
            review_text: review_text.to_string(),
        };
        self.requests
            .build(Operation::SubmitReview, &[], &QueryParams::new(), Some(&body))
    }

    pub fn build_list_reviews(&self, filters: &ReviewFilters) -> Result<CallDescriptor, ApiError> {
        self.requests
            .build::<()>(Operation::ListReviews, &[], &filters.to_query(), None)
    }

    pub fn build_list_student_reviews(
        &self,
        student_id: &str,
        filters: &ReviewFilters,
    ) -> Result<CallDescriptor, ApiError> {
        self.requests.build::<()>(
            Operation::ListStudentReviews,
            &[student_id],
            &filters.to_query(),
            None,
        )
    }

    pub fn build_leaderboard(&self, limit: u32, offset: u32) -> Result<CallDescriptor, ApiError> {
        let query = QueryParams::new().with("limit", limit).with("offset", offset);
        self.requests
            .build::<()>(Operation::Leaderboard, &[], &query, None)
    }

    #[tracing::instrument(skip(self))]
    pub async fn check_in(&self, student_id: &str, full_name: &str) -> Result<CheckInReceipt, ApiError> {
        let call = self.build_check_in(student_id, full_name)?;
        self.run(&call).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_students(&self) -> Result<StudentRoster, ApiError> {
        let call = self.build_list_students()?;
        self.run(&call).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_check_ins(&self, student_id: &str) -> Result<CheckInHistory, ApiError> {
        let call = self.build_list_check_ins(student_id)?;
        self.run(&call).await
    }

    #[tracing::instrument(skip(self, review_text))]
    pub async fn submit_review(
        &self,
        student_id: &str,
        mobile_app_name: &str,
        review_text: &str,
    ) -> Result<SubmittedReview, ApiError> {
        let call = self.build_submit_review(student_id, mobile_app_name, review_text)?;
        self.run(&call).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_reviews(&self, filters: &ReviewFilters) -> Result<ReviewPage, ApiError> {
        let call = self.build_list_reviews(filters)?;
        self.run(&call).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_student_reviews(
        &self,
        student_id: &str,
        filters: &ReviewFilters,
    ) -> Result<ReviewPage, ApiError> {
        let call = self.build_list_student_reviews(student_id, filters)?;
        self.run(&call).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn leaderboard(&self, limit: u32, offset: u32) -> Result<LeaderboardPage, ApiError> {
        let call = self.build_leaderboard(limit, offset)?;
        self.run(&call).await
    }

    async fn run<T: DeserializeOwned>(&self, call: &CallDescriptor) -> Result<T, ApiError> {
        let response = self.executor.execute(call, &self.cancel).await?;
        decode(&response)
    }
}
