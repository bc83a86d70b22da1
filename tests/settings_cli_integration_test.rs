//! `foreman settings set` persists through `generic_state` and is visible to
//! a freshly-loaded `Config` the way a separately-invoked daemon would see it
//! (spec.md §6 `PUT /settings`).

mod helpers;

use foreman::cli::commands::settings;
use foreman::domain::models::Config;
use foreman::services::settings as settings_service;

#[tokio::test]
async fn set_known_key_persists_and_refreshes() {
    let store = helpers::database::setup_test_store().await;

    settings::set(&store, "pipeline_max_agents".to_string(), "12".to_string(), false)
        .await
        .expect("setting a known tunable should succeed");

    let mut config = Config::default();
    settings_service::refresh(&*store.state, &mut config).await.unwrap();
    assert_eq!(config.pipeline_max_agents, 12);
}

#[tokio::test]
async fn set_unknown_key_errors_without_touching_state() {
    let store = helpers::database::setup_test_store().await;
    let err = settings::set(&store, "not_a_real_setting".to_string(), "1".to_string(), false).await;
    assert!(err.is_err());
}

#[tokio::test]
async fn set_model_is_a_plain_string_not_debug_quoted() {
    let store = helpers::database::setup_test_store().await;
    settings::set(&store, "model".to_string(), "claude-sonnet".to_string(), false).await.unwrap();

    let mut config = Config::default();
    settings_service::refresh(&*store.state, &mut config).await.unwrap();
    assert_eq!(config.model, "claude-sonnet");
}
