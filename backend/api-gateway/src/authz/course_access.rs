use crate::clients::proto::course::AccessCheckRequest;
use crate::clients::{with_correlation, ServiceClients};
use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("course access check failed: {0}")]
    Rpc(#[from] tonic::Status),
}

/// Remote relationship checks owned by the course service
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CourseAccess: Send + Sync {
    async fn is_teacher(
        &self,
        user_id: &str,
        course_id: &str,
        correlation_id: &str,
    ) -> Result<bool, AccessError>;

    async fn is_member(
        &self,
        user_id: &str,
        course_id: &str,
        correlation_id: &str,
    ) -> Result<bool, AccessError>;
}

#[derive(Clone)]
pub struct GrpcCourseAccess {
    clients: ServiceClients,
}

impl GrpcCourseAccess {
    pub fn new(clients: ServiceClients) -> Self {
        Self { clients }
    }

    fn request(
        user_id: &str,
        course_id: &str,
        correlation_id: &str,
    ) -> tonic::Request<AccessCheckRequest> {
        with_correlation(
            AccessCheckRequest {
                user_id: user_id.to_string(),
                course_id: course_id.to_string(),
            },
            correlation_id,
        )
    }
}

#[async_trait]
impl CourseAccess for GrpcCourseAccess {
    async fn is_teacher(
        &self,
        user_id: &str,
        course_id: &str,
        correlation_id: &str,
    ) -> Result<bool, AccessError> {
        let mut client = self.clients.course_client();
        let response = client
            .is_teacher(Self::request(user_id, course_id, correlation_id))
            .await?
            .into_inner();

        debug!(
            correlation_id = %correlation_id,
            user_id = %user_id,
            course_id = %course_id,
            allowed = response.allowed,
            "is_teacher answered by course service"
        );
        Ok(response.allowed)
    }

    async fn is_member(
        &self,
        user_id: &str,
        course_id: &str,
        correlation_id: &str,
    ) -> Result<bool, AccessError> {
        let mut client = self.clients.course_client();
        let response = client
            .is_member(Self::request(user_id, course_id, correlation_id))
            .await?
            .into_inner();

        debug!(
            correlation_id = %correlation_id,
            user_id = %user_id,
            course_id = %course_id,
            allowed = response.allowed,
            "is_member answered by course service"
        );
        Ok(response.allowed)
    }
}
