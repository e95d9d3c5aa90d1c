pub mod capture_observer;
pub mod capture_pipeline;
pub mod device_provider;
pub mod event_source;
pub mod permission_provider;
