pub mod inbox_api;
