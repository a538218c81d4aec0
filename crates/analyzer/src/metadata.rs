//! Stage 5: metadata probing (§4.7). GET a fixed list of well-known
//! endpoints against the resolved origin; each carries its own expected
//! status and MIME so one unexpected probe never poisons the others.

use std::collections::HashMap;
use std::time::Duration;

use authscope_domain::config::MetadataConfig;

struct WellKnownProbe {
    key: &'static str,
    path: &'static str,
    expected_status: u16,
    expected_mime: &'static str,
    json: bool,
}

const PROBES: &[WellKnownProbe] = &[
    WellKnownProbe { key: "robots_txt", path: "/robots.txt", expected_status: 200, expected_mime: "text/plain", json: false },
    WellKnownProbe { key: "security_txt", path: "/.well-known/security.txt", expected_status: 200, expected_mime: "text/plain", json: false },
    WellKnownProbe { key: "openid_configuration", path: "/.well-known/openid-configuration", expected_status: 200, expected_mime: "application/json", json: true },
    WellKnownProbe { key: "oauth_authorization_server", path: "/.well-known/oauth-authorization-server", expected_status: 200, expected_mime: "application/json", json: true },
    WellKnownProbe { key: "webfinger", path: "/.well-known/webfinger?resource=acct:user@example.com", expected_status: 200, expected_mime: "application/jrd+json", json: true },
    WellKnownProbe { key: "jwks", path: "/.well-known/jwks.json", expected_status: 200, expected_mime: "application/json", json: true },
    WellKnownProbe { key: "passkey_endpoints", path: "/.well-known/passkey-endpoints", expected_status: 200, expected_mime: "application/json", json: true },
    WellKnownProbe { key: "assetlinks", path: "/.well-known/assetlinks.json", expected_status: 200, expected_mime: "application/json", json: true },
    WellKnownProbe { key: "apple_app_site_association", path: "/.well-known/apple-app-site-association", expected_status: 200, expected_mime: "application/json", json: true },
    WellKnownProbe { key: "fido_configuration", path: "/.well-known/fido-configuration", expected_status: 200, expected_mime: "application/json", json: true },
    WellKnownProbe { key: "uma2_configuration", path: "/.well-known/uma2-configuration", expected_status: 200, expected_mime: "application/json", json: true },
    WellKnownProbe { key: "browserid", path: "/.well-known/browserid", expected_status: 200, expected_mime: "application/json", json: true },
    WellKnownProbe { key: "web_identity", path: "/.well-known/web-identity", expected_status: 200, expected_mime: "application/json", json: true },
];

pub struct MetadataOutput {
    pub metadata_data: HashMap<String, serde_json::Value>,
    pub metadata_available: HashMap<String, bool>,
}

pub async fn fetch_all(client: &reqwest::Client, origin: &str, cfg: &MetadataConfig) -> MetadataOutput {
    let mut metadata_data = HashMap::new();
    let mut metadata_available = HashMap::new();
    let timeout = Duration::from_millis(cfg.request_timeout_ms);

    for probe in PROBES {
        let url = format!("{}{}", origin.trim_end_matches('/'), probe.path);
        let outcome = tokio::time::timeout(timeout, client.get(&url).send()).await;

        let available = match outcome {
            Ok(Ok(resp)) if resp.status().as_u16() == probe.expected_status => {
                let content_type = resp
                    .headers()
                    .get(reqwest::header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                let mime_ok = content_type.is_empty() || content_type.contains(probe.expected_mime);

                match resp.text().await {
                    Ok(body) if mime_ok => {
                        let value = if probe.json {
                            serde_json::from_str(&body).unwrap_or(serde_json::Value::String(body))
                        } else {
                            serde_json::Value::String(body)
                        };
                        metadata_data.insert(probe.key.to_string(), value);
                        true
                    }
                    _ => false,
                }
            }
            _ => false,
        };

        metadata_available.insert(probe.key.to_string(), available);
    }

    MetadataOutput { metadata_data, metadata_available }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_table_covers_every_named_endpoint() {
        let keys: Vec<&str> = PROBES.iter().map(|p| p.key).collect();
        for expected in [
            "robots_txt",
            "security_txt",
            "openid_configuration",
            "oauth_authorization_server",
            "webfinger",
            "jwks",
            "passkey_endpoints",
            "assetlinks",
            "apple_app_site_association",
            "fido_configuration",
            "uma2_configuration",
            "browserid",
            "web_identity",
        ] {
            assert!(keys.contains(&expected), "missing probe for {expected}");
        }
    }
}
