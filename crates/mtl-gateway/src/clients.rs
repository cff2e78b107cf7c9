//! gRPC clients for the backend services.
//!
//! Channels connect lazily so the gateway starts even when a backend is
//! still coming up; the first call that needs it pays the connect.

use std::time::Duration;

use tonic::transport::{Channel, Endpoint};

use mtl_core::config::ServiceEndpoints;
use mtl_proto::v1::agent_service_client::AgentServiceClient;
use mtl_proto::v1::configuration_service_client::ConfigurationServiceClient;
use mtl_proto::v1::user_service_client::UserServiceClient;

#[derive(Clone)]
pub struct BackendClients {
    pub users: UserServiceClient<Channel>,
    pub configurations: ConfigurationServiceClient<Channel>,
    pub agents: AgentServiceClient<Channel>,
    /// Deadline for unary calls.
    pub request_timeout: Duration,
}

impl BackendClients {
    pub fn connect_lazy(
        endpoints: &ServiceEndpoints,
        request_timeout: Duration,
    ) -> Result<Self, tonic::transport::Error> {
        Ok(Self {
            users: UserServiceClient::new(unary_channel(&endpoints.user, request_timeout)?),
            configurations: ConfigurationServiceClient::new(unary_channel(
                &endpoints.configuration,
                request_timeout,
            )?),
            // No channel-wide timeout here: the relay stream lives for hours.
            agents: AgentServiceClient::new(
                Endpoint::from_shared(endpoints.agent.clone())?
                    .connect_timeout(request_timeout)
                    .connect_lazy(),
            ),
            request_timeout,
        })
    }

    /// Wrap a unary request with the configured deadline.
    pub fn request<T>(&self, message: T) -> tonic::Request<T> {
        let mut request = tonic::Request::new(message);
        request.set_timeout(self.request_timeout);
        request
    }
}

fn unary_channel(url: &str, timeout: Duration) -> Result<Channel, tonic::transport::Error> {
    Ok(Endpoint::from_shared(url.to_string())?
        .connect_timeout(timeout)
        .timeout(timeout)
        .connect_lazy())
}
