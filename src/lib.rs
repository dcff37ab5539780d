// Library for tests to access modules

pub mod bootstrap;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod models;
pub mod routes;
pub mod storage_repo;
pub mod stores;
pub mod telemetry;
pub mod transitions;
pub mod validate;
pub mod version;
pub mod worker;
