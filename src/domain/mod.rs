pub mod search_result;
