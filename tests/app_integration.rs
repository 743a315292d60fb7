use std::fs;
use std::path::Path;

mod test_utils {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub const USD_RATES: &str = r#"{
        "result": "success",
        "base_code": "USD",
        "rates": {
            "USD": 1.0,
            "INR": 83.50,
            "EUR": 0.85
        }
    }"#;

    pub async fn create_mock_server(base: &str, mock_response: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        let url_path = format!("/v6/latest/{base}");

        Mock::given(method("GET"))
            .and(path(&url_path))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        mock_server
    }

    pub fn write_config(dir: &std::path::Path, base_url: &str) -> std::path::PathBuf {
        let config_path = dir.join("config.yaml");
        let cache_dir = dir.join("cache");
        let config_content = format!(
            r#"
provider:
  base_url: "{base_url}"
major_currencies: ["USD"]
cache_dir: "{}"
"#,
            cache_dir.display()
        );
        std::fs::write(&config_path, config_content).expect("Failed to write config file");
        config_path
    }
}

#[test_log::test(tokio::test)]
async fn test_refresh_then_convert_from_persisted_cache() {
    let mock_server = test_utils::create_mock_server("USD", test_utils::USD_RATES).await;
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = test_utils::write_config(dir.path(), &mock_server.uri());
    let config_str = config_path.to_str().unwrap();

    let result = fxq::run_command(fxq::AppCommand::Refresh, Some(config_str)).await;
    assert!(result.is_ok(), "Refresh failed with: {:?}", result.err());

    // Rate files landed on disk
    let rates_dir = dir.path().join("cache").join("rates");
    assert!(rates_dir.join("USDINR.json").exists());
    assert!(rates_dir.join("INRUSD.json").exists());

    // A fresh process serves the conversion from the persisted cache; the
    // single mounted mock received exactly the one refresh request.
    let requests = mock_server.received_requests().await.unwrap().len();
    let result = fxq::run_command(
        fxq::AppCommand::Convert {
            amount: "100".parse().unwrap(),
            from: "USD".to_string(),
            to: "INR".to_string(),
        },
        Some(config_str),
    )
    .await;
    assert!(result.is_ok(), "Convert failed with: {:?}", result.err());
    assert_eq!(
        mock_server.received_requests().await.unwrap().len(),
        requests,
        "Conversion should not have hit the network"
    );
}

#[test_log::test(tokio::test)]
async fn test_convert_fetches_when_cache_is_cold() {
    let mock_server = test_utils::create_mock_server("EUR", r#"{"rates": {"USD": 1.18}}"#).await;
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = test_utils::write_config(dir.path(), &mock_server.uri());

    let result = fxq::run_command(
        fxq::AppCommand::Convert {
            amount: "50".parse().unwrap(),
            from: "EUR".to_string(),
            to: "USD".to_string(),
        },
        config_path.to_str(),
    )
    .await;
    assert!(result.is_ok(), "Convert failed with: {:?}", result.err());
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 1);
}

#[test_log::test(tokio::test)]
async fn test_refresh_failure_is_surfaced() {
    let mock_server = wiremock::MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .respond_with(wiremock::ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = test_utils::write_config(dir.path(), &mock_server.uri());

    let result = fxq::run_command(fxq::AppCommand::Refresh, config_path.to_str()).await;
    assert!(result.is_err());
    let message = result.unwrap_err().to_string();
    assert!(message.contains("Refresh failed"), "got: {message}");
}

#[test_log::test(tokio::test)]
async fn test_clear_removes_cached_rates() {
    let mock_server = test_utils::create_mock_server("USD", test_utils::USD_RATES).await;
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = test_utils::write_config(dir.path(), &mock_server.uri());
    let config_str = config_path.to_str().unwrap();

    fxq::run_command(fxq::AppCommand::Refresh, Some(config_str))
        .await
        .expect("Refresh failed");
    assert!(has_rate_files(&dir.path().join("cache").join("rates")));

    fxq::run_command(fxq::AppCommand::Clear, Some(config_str))
        .await
        .expect("Clear failed");
    assert!(!has_rate_files(&dir.path().join("cache").join("rates")));

    // Rates listing still works on an empty cache
    let result = fxq::run_command(fxq::AppCommand::Rates, Some(config_str)).await;
    assert!(result.is_ok());
}

fn has_rate_files(dir: &Path) -> bool {
    fs::read_dir(dir)
        .map(|entries| entries.filter_map(Result::ok).count() > 0)
        .unwrap_or(false)
}
