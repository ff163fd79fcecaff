mod common;
mod lifecycle_tests;
mod soft_delete_tests;
