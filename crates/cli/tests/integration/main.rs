mod common;
mod maintenance_tests;
