//! Contract tests for memory_manager

mod api_contract;
