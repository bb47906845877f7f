mod integration;
mod version_tests;
