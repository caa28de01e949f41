pub mod apps;
pub mod coordinator;
pub mod dispatcher;
