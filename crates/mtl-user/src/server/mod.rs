//! gRPC server implementations for the user service.

pub mod user_svc;

#[cfg(test)]
mod user_svc_tests;

pub use user_svc::UserServiceImpl;
