//! gRPC server implementations for the configuration service.

pub mod configuration_svc;


pub use configuration_svc::ConfigurationServiceImpl;
