use authscope_domain::config::Config;

#[test]
fn default_server_host_is_wildcard() {
    let config = Config::default();
    assert_eq!(config.server.host, "0.0.0.0");
}

#[test]
fn explicit_host_parses() {
    let toml_str = r#"
[server]
host = "127.0.0.1"
port = 9000
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 9000);
}

#[test]
fn default_broker_prefetch_is_one() {
    let config = Config::default();
    assert_eq!(config.worker.broker.prefetch, 1);
    config.validate().expect("default config validates");
}

#[test]
fn recognition_mode_parses_from_upper_case() {
    let toml_str = r#"
[recognition]
recognition_mode = "FAST"
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(
        config.recognition.recognition_mode,
        authscope_domain::config::RecognitionMode::Fast
    );
}

#[test]
fn paths_strategy_subdomains_default_to_empty_and_parse_from_toml() {
    let config = Config::default();
    assert!(config.login_page.paths_strategy_config.subdomains.is_empty());

    let toml_str = r#"
[login_page.paths_strategy_config]
paths = ["/login"]
subdomains = ["accounts", "login"]
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(
        config.login_page.paths_strategy_config.subdomains,
        vec!["accounts".to_string(), "login".to_string()]
    );
}

#[test]
fn default_metasearch_search_term_has_a_substitution_placeholder() {
    let config = Config::default();
    assert!(config.login_page.metasearch_strategy_config.search_term.contains("%s"));
}
