//! gRPC clients for the identity and course-access services
//!
//! Channels connect lazily and multiplex over HTTP/2, so one channel per
//! service is shared by every request. Per-call deadlines are applied by the
//! caller, not on the channel.

use resilience::Deadlines;
use std::time::Duration;
use thiserror::Error;
use tonic::metadata::MetadataValue;
use tonic::transport::{Channel, Endpoint};

pub mod proto {
    pub mod identity {
        tonic::include_proto!("campus.identity.v1");
    }

    pub mod course {
        tonic::include_proto!("campus.course.v1");
    }
}

use proto::course::course_access_service_client::CourseAccessServiceClient;
use proto::identity::auth_service_client::AuthServiceClient;

/// Wrap an RPC message, forwarding the caller's correlation id as metadata
pub fn with_correlation<T>(message: T, correlation_id: &str) -> tonic::Request<T> {
    let mut request = tonic::Request::new(message);
    if let Ok(value) = MetadataValue::try_from(correlation_id) {
        request.metadata_mut().insert("x-correlation-id", value);
    }
    request
}

#[derive(Debug, Error)]
#[error("invalid endpoint {endpoint}: {source}")]
pub struct EndpointError {
    endpoint: String,
    #[source]
    source: tonic::transport::Error,
}

#[derive(Clone)]
pub struct ServiceClients {
    identity_channel: Channel,
    course_channel: Channel,
}

impl ServiceClients {
    pub fn new(
        identity_endpoint: &str,
        course_endpoint: &str,
        deadlines: &Deadlines,
    ) -> Result<Self, EndpointError> {
        Ok(Self {
            identity_channel: Self::create_channel(identity_endpoint, deadlines.connect())?,
            course_channel: Self::create_channel(course_endpoint, deadlines.connect())?,
        })
    }

    fn create_channel(endpoint: &str, connect_timeout: Duration) -> Result<Channel, EndpointError> {
        let channel = Endpoint::from_shared(endpoint.to_string())
            .map_err(|source| EndpointError {
                endpoint: endpoint.to_string(),
                source,
            })?
            .connect_timeout(connect_timeout)
            .http2_keep_alive_interval(Duration::from_secs(60))
            .keep_alive_timeout(Duration::from_secs(20))
            .keep_alive_while_idle(true)
            .connect_lazy();

        Ok(channel)
    }

    pub fn identity_client(&self) -> AuthServiceClient<Channel> {
        AuthServiceClient::new(self.identity_channel.clone())
    }

    pub fn course_client(&self) -> CourseAccessServiceClient<Channel> {
        CourseAccessServiceClient::new(self.course_channel.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lazy_clients_build_without_a_server() {
        let clients = ServiceClients::new(
            "http://127.0.0.1:1",
            "http://127.0.0.1:2",
            &Deadlines::default(),
        );
        assert!(clients.is_ok());
    }

    #[tokio::test]
    async fn test_malformed_endpoint_is_an_error() {
        let err = ServiceClients::new("not a url", "http://127.0.0.1:2", &Deadlines::default())
            .err()
            .unwrap();
        assert!(err.to_string().contains("not a url"));
    }

    #[test]
    fn test_correlation_id_forwarded_as_metadata() {
        let request = with_correlation((), "corr-42");
        assert_eq!(
            request.metadata().get("x-correlation-id").unwrap(),
            "corr-42"
        );
    }
}
