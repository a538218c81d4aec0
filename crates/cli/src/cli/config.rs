//! `authscope config validate` / `authscope config show`.

use authscope_domain::config::Config;

/// Validates `config` and prints the result. Returns `true` when valid, so
/// `main` can translate a failure into a non-zero exit code.
pub fn validate(config: &Config, path: &std::path::Path) -> bool {
    match config.validate() {
        Ok(()) => {
            println!("{}: OK", path.display());
            true
        }
        Err(e) => {
            eprintln!("{}: {e}", path.display());
            false
        }
    }
}

/// Pretty-prints the effective config as TOML.
pub fn show(config: &Config) {
    match toml::to_string_pretty(config) {
        Ok(text) => println!("{text}"),
        Err(e) => eprintln!("failed to serialize config: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_the_default_config() {
        let config = Config::default();
        assert!(validate(&config, std::path::Path::new("config.toml")));
    }

    #[test]
    fn validate_rejects_a_bad_prefetch_setting() {
        let mut config = Config::default();
        config.worker.broker.prefetch = 4;
        assert!(!validate(&config, std::path::Path::new("config.toml")));
    }
}
