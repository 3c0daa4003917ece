//! Integration tests driving the full listener thread with scripted devices

mod service_tests;
mod support;
