#![allow(dead_code)]

use httpmock::MockServer;
use pms_console::{ApiClient, Overrides, Settings};

pub fn settings_for(server: &MockServer) -> Settings {
    Settings::from_sources(
        None,
        Overrides {
            base_url: Some(server.base_url()),
            token: Some("test-token".to_string()),
            timeout_seconds: Some(5),
            format: None,
        },
    )
}

pub fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::new(&settings_for(server)).unwrap()
}
