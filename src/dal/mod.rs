pub mod connector;
pub mod search_result_db;
