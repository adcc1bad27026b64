// Library for tests to access modules

pub mod aggregation;
pub mod config;
pub mod coordinator;
pub mod matcher;
pub mod models;
pub mod routes;
pub mod source;
pub mod statistics_repo;
pub mod url_query;
pub mod worker;
