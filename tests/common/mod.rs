use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{json, Value};
use tempfile::TempDir;

use smartmeal::config::ServiceConfig;
use smartmeal::service::ServiceClient;
use smartmeal::session::SessionStore;

#[allow(dead_code)]
pub fn client_for(base_url: &str) -> ServiceClient {
    let config = ServiceConfig {
        base_url: base_url.to_string(),
        timeout_seconds: Some(5),
        ..ServiceConfig::default()
    };
    ServiceClient::new(&config).expect("client should build")
}

#[allow(dead_code)]
pub fn client_with_token(base_url: &str, store: Arc<SessionStore>) -> ServiceClient {
    client_for(base_url).with_token_source(store)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

#[allow(dead_code)]
pub fn food(name: &str, calories: u32) -> Value {
    json!({
        "name": name,
        "calories": calories,
        "protein": 25,
        "carbs": 40,
        "fat": 10,
        "category": "main"
    })
}

/// Raw `generate-plan` body with the days in exactly the given order.
///
/// Built as text because `serde_json::Map` would sort the keys.
#[allow(dead_code)]
pub fn plan_body(days: &[(&str, u32)]) -> String {
    let entries: Vec<String> = days
        .iter()
        .map(|(day, total)| {
            let entry = json!({
                "total_calories": total,
                "breakfast": food("oatmeal", 350),
                "lunch": food("chicken_salad", 550),
                "dinner": food("salmon_with_rice", 750),
                "snacks": [food("greek_yogurt", 150)]
            });
            format!("{:?}: {}", day, entry)
        })
        .collect();
    format!("{{\"plan\": {{{}}}}}", entries.join(", "))
}
