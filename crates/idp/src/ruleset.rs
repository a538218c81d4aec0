//! IdpRuleset loading and hot-swap (§3 "IdpRuleset", §9 "global IdP ruleset
//! process-wide read-only state"). Built-in definitions are grounded on the
//! original `idp_rules.py` table; operators can point `load_from_path` at a
//! JSON override for site-specific rulesets without a rebuild.

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;

use authscope_domain::error::{Error, Result};
use authscope_domain::model::{IdpDefinition, IdpRuleset, LoginRequestRule, LoginRequestRuleParam, SdkRule};

/// Holds the process-wide ruleset behind a lock so `reload` can atomically
/// replace it; reads never block on a writer that outlives them because the
/// lock only protects the `Arc` swap, not ruleset traversal.
pub struct RulesetHandle {
    inner: RwLock<Arc<IdpRuleset>>,
}

impl RulesetHandle {
    pub fn new(ruleset: IdpRuleset) -> Self {
        Self { inner: RwLock::new(Arc::new(ruleset)) }
    }

    pub fn current(&self) -> Arc<IdpRuleset> {
        self.inner.read().clone()
    }

    pub fn reload(&self, ruleset: IdpRuleset) {
        *self.inner.write() = Arc::new(ruleset);
    }
}

/// Load a ruleset from a JSON file, falling back to the built-in defaults
/// when `path` is `None`.
pub fn load(path: Option<&Path>) -> Result<IdpRuleset> {
    match path {
        Some(p) => {
            let text = std::fs::read_to_string(p)?;
            serde_json::from_str(&text).map_err(|e| Error::Config(format!("invalid idp ruleset: {e}")))
        }
        None => Ok(builtin()),
    }
}

fn rule(domain: &str, path: Option<&str>, params: &[(&str, &str)]) -> LoginRequestRule {
    LoginRequestRule {
        domain: domain.to_string(),
        path: path.map(str::to_string),
        params: params
            .iter()
            .map(|(n, v)| LoginRequestRuleParam { name: n.to_string(), value: v.to_string() })
            .collect(),
    }
}

fn custom_sdk() -> SdkRule {
    SdkRule {
        name: "CUSTOM".into(),
        login_request_rule: rule(".*", Some(".*"), &[]),
    }
}

/// Built-in IdP definitions for the four providers in the default
/// `idp_scope` (§6 `idp.idp_scope` default).
pub fn builtin() -> IdpRuleset {
    IdpRuleset {
        idps: vec![
            IdpDefinition {
                name: "GOOGLE".into(),
                keywords: vec!["google".into(), "gmail".into(), "gplus".into()],
                logos: vec!["google.png".into()],
                login_request_rule: rule(
                    r"^accounts\.google\.com$",
                    Some(r"^(?!.*/iframerpc).*(/auth/authorize|/gsi/select|/oauth2)"),
                    &[("^client_id$", ".*")],
                ),
                passive_login_request_rule: Some(rule(
                    r"^accounts\.google\.com$",
                    Some(r"^(/gsi/status|/gsi/iframe/select)"),
                    &[("^client_id$", ".*")],
                )),
                sdks: vec![
                    SdkRule {
                        name: "SIGN_IN_WITH_GOOGLE".into(),
                        login_request_rule: rule(r"^accounts\.google\.com$", Some(r"^/gsi/select"), &[("^client_id$", ".*")]),
                    },
                    SdkRule {
                        name: "GOOGLE_ONE_TAP".into(),
                        login_request_rule: rule(
                            r"^accounts\.google\.com$",
                            Some(r"^(/gsi/status|/gsi/iframe/select)"),
                            &[("^client_id$", ".*")],
                        ),
                    },
                    custom_sdk(),
                ],
            },
            IdpDefinition {
                name: "APPLE".into(),
                keywords: vec!["apple".into()],
                logos: vec!["apple.png".into()],
                login_request_rule: rule(r"^appleid\.apple\.com$", Some(r"^/auth/authorize"), &[("^client_id$", ".*")]),
                passive_login_request_rule: None,
                sdks: vec![
                    SdkRule {
                        name: "SIGN_IN_WITH_APPLE".into(),
                        login_request_rule: rule(
                            r"^appleid\.apple\.com$",
                            Some(r"^/auth/authorize"),
                            &[("^client_id$", ".*"), ("^frame_id$", ".*")],
                        ),
                    },
                    custom_sdk(),
                ],
            },
            IdpDefinition {
                name: "FACEBOOK".into(),
                keywords: vec!["facebook".into()],
                logos: vec!["facebook.png".into()],
                login_request_rule: rule(r"facebook\.com$", Some(r"/dialog/oauth"), &[("^(client_id|app_id)$", ".*")]),
                passive_login_request_rule: None,
                sdks: vec![
                    SdkRule {
                        name: "FACEBOOK_LOGIN".into(),
                        login_request_rule: rule(
                            r"facebook\.com$",
                            Some(r"/dialog/oauth"),
                            &[("^app_id$", ".*"), ("^channel_url$", r"^https://staticxx\.facebook\.com/x/connect/xd_arbiter/")],
                        ),
                    },
                    custom_sdk(),
                ],
            },
            IdpDefinition {
                name: "MICROSOFT".into(),
                keywords: vec!["microsoft".into(), "xbox".into(), "azure".into()],
                logos: vec!["microsoft.png".into()],
                login_request_rule: rule(
                    r"^(login\.live\.com|login\.microsoftonline\.com)$",
                    Some(r"/oauth"),
                    &[("^client_id$", ".*")],
                ),
                passive_login_request_rule: None,
                sdks: vec![custom_sdk()],
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_covers_default_idp_scope() {
        let ruleset = builtin();
        for name in ["GOOGLE", "APPLE", "FACEBOOK", "MICROSOFT"] {
            assert!(ruleset.get(name).is_some(), "missing builtin rule for {name}");
        }
    }

    #[test]
    fn every_idp_has_a_custom_sdk_fallback() {
        for idp in builtin().idps {
            assert!(idp.sdks.iter().any(|s| s.name == "CUSTOM"));
        }
    }
}
