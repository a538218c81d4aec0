//! Stage 4: IdP detection (§4.7). Every reachable candidate is paired with
//! every IdP in scope; each pair gets a freshly opened, isolated context so
//! one IdP's cookies/local-storage never leak into the next pair's run.
//!
//! Which IdPs remain in scope for a given candidate shrinks as the scan
//! progresses, governed by `recognition_mode` (§4.7, §6): FAST assumes one
//! SSO button per site and abandons every other candidate the moment any
//! IdP is found anywhere; NORMAL removes a found IdP from every candidate's
//! remaining scope and, once anything is found, gives up on candidates that
//! never hit; EXTENSIVE only narrows the candidate the IdP was actually
//! found on, leaving the rest of the scan maximally thorough.

use std::collections::HashMap;

use authscope_domain::config::{Config, RecognitionMode};
use authscope_domain::error::Result;
use authscope_domain::model::{IdentityProviderDetection, IdpRuleset, LoginPageCandidate};

use authscope_browser::{BrowserDriver, ChromiumDriver};

/// Per-scan scope tracker: which IdPs are still worth trying on which
/// candidate. Ported from the recognition-mode pruning rules the landscape
/// worker applies while walking its login page candidates.
#[derive(Debug, Default)]
pub struct RecognitionScope {
    remaining: HashMap<String, Vec<String>>,
}

impl RecognitionScope {
    /// Seeds every candidate url with the full `idp_scope`. Mirrors the
    /// Python helper's "fill login pages with all idps" step, which only
    /// ever runs once per scan since it's guarded by the map being empty.
    pub fn seed(candidate_urls: impl IntoIterator<Item = String>, idp_scope: &[String]) -> Self {
        let remaining = candidate_urls
            .into_iter()
            .map(|url| (url, idp_scope.to_vec()))
            .collect();
        Self { remaining }
    }

    /// Re-narrows the scope from IdPs found so far, then returns the scope
    /// left for `candidate_url`. Call once per candidate, right before
    /// scanning it, with everything recognized up to that point — mirrors
    /// the `is_update = true` re-entrant call `sso_button.py` makes at the
    /// top of each login page's loop iteration.
    pub fn narrow_for(
        &mut self,
        candidate_url: &str,
        recognized: &[IdentityProviderDetection],
        mode: RecognitionMode,
    ) -> Vec<String> {
        self.apply(recognized, mode, true);
        self.remaining.get(candidate_url).cloned().unwrap_or_default()
    }

    fn apply(&mut self, recognized: &[IdentityProviderDetection], mode: RecognitionMode, is_update: bool) {
        for hit in recognized {
            match mode {
                RecognitionMode::Fast => {
                    for (lp, idps) in self.remaining.iter_mut() {
                        if lp != &hit.login_page_url {
                            idps.clear();
                        } else {
                            idps.retain(|idp| idp != &hit.idp_name);
                        }
                    }
                }
                RecognitionMode::Normal => {
                    for idps in self.remaining.values_mut() {
                        idps.retain(|idp| idp != &hit.idp_name);
                    }
                }
                RecognitionMode::Extensive => {
                    if let Some(idps) = self.remaining.get_mut(&hit.login_page_url) {
                        idps.retain(|idp| idp != &hit.idp_name);
                    }
                }
            }
        }

        if mode == RecognitionMode::Normal && !recognized.is_empty() && !is_update {
            let hit_urls: std::collections::HashSet<&str> =
                recognized.iter().map(|r| r.login_page_url.as_str()).collect();
            for (lp, idps) in self.remaining.iter_mut() {
                if !hit_urls.contains(lp.as_str()) {
                    idps.clear();
                }
            }
        }
    }
}

#[cfg(test)]
mod scope_tests {
    use super::*;
    use authscope_domain::model::{ElementCoordinates, IdpFrame, RecognitionStrategy};

    fn hit(login_page_url: &str, idp_name: &str) -> IdentityProviderDetection {
        IdentityProviderDetection {
            idp_name: idp_name.into(),
            idp_integration: "CUSTOM".into(),
            idp_frame: IdpFrame::Topmost,
            login_page_url: login_page_url.into(),
            element_coordinates: ElementCoordinates { x: 0.0, y: 0.0, width: 0.0, height: 0.0 },
            element_inner_text: String::new(),
            element_outer_html: String::new(),
            element_tree: Vec::new(),
            recognition_strategy: RecognitionStrategy::Keyword,
            keyword_matched: None,
            keyword_validity_tier: None,
            logo_match_score: None,
            idp_login_request: None,
            idp_screenshot: None,
        }
    }

    #[test]
    fn fast_mode_abandons_every_other_candidate_once_anything_is_found() {
        let urls = ["https://a.example/login".to_string(), "https://b.example/login".to_string()];
        let scope_list = vec!["GOOGLE".to_string(), "APPLE".to_string()];
        let mut scope = RecognitionScope::seed(urls.clone(), &scope_list);

        let recognized = vec![hit("https://a.example/login", "GOOGLE")];
        let for_a = scope.narrow_for("https://a.example/login", &recognized, RecognitionMode::Fast);
        assert_eq!(for_a, vec!["APPLE".to_string()]);
        let for_b = scope.narrow_for("https://b.example/login", &recognized, RecognitionMode::Fast);
        assert!(for_b.is_empty());
    }

    #[test]
    fn normal_mode_removes_a_found_idp_everywhere_but_keeps_scanning_other_candidates() {
        let urls = ["https://a.example/login".to_string(), "https://b.example/login".to_string()];
        let scope_list = vec!["GOOGLE".to_string(), "APPLE".to_string()];
        let mut scope = RecognitionScope::seed(urls.clone(), &scope_list);

        let recognized = vec![hit("https://a.example/login", "GOOGLE")];
        let for_a = scope.narrow_for("https://a.example/login", &recognized, RecognitionMode::Normal);
        assert_eq!(for_a, vec!["APPLE".to_string()]);
        let for_b = scope.narrow_for("https://b.example/login", &recognized, RecognitionMode::Normal);
        assert_eq!(for_b, vec!["APPLE".to_string()]);
    }

    #[test]
    fn extensive_mode_only_narrows_the_candidate_the_idp_was_found_on() {
        let urls = ["https://a.example/login".to_string(), "https://b.example/login".to_string()];
        let scope_list = vec!["GOOGLE".to_string(), "APPLE".to_string()];
        let mut scope = RecognitionScope::seed(urls.clone(), &scope_list);

        let recognized = vec![hit("https://a.example/login", "GOOGLE")];
        let for_a = scope.narrow_for("https://a.example/login", &recognized, RecognitionMode::Extensive);
        assert_eq!(for_a, vec!["APPLE".to_string()]);
        let for_b = scope.narrow_for("https://b.example/login", &recognized, RecognitionMode::Extensive);
        assert_eq!(for_b, scope_list);
    }
}

pub async fn scan_candidate(
    cfg: &Config,
    ruleset: &IdpRuleset,
    idp_scope: &[String],
    candidate: &LoginPageCandidate,
) -> Result<Vec<IdentityProviderDetection>> {
    let mut detections = Vec::new();
    let driver = ChromiumDriver::new();

    for idp_name in idp_scope {
        let Some(idp) = ruleset.get(idp_name) else {
            tracing::warn!(idp = idp_name.as_str(), "idp_scope names an idp with no ruleset entry");
            continue;
        };

        let ctx = driver.open(&cfg.browser).await?;
        if driver.navigate(&ctx, &candidate.url).await.is_err() {
            let _ = ctx.close().await;
            continue;
        }
        driver.wait_for_load(&ctx, &cfg.browser).await;

        let logo_template = load_logo_template(cfg, idp);
        let params = authscope_idp::RunParams {
            login_page_url: &candidate.url,
            idp,
            recognition: &cfg.recognition,
            keyword_cfg: &cfg.keyword_recognition,
            logo_cfg: &cfg.logo_recognition,
            logo_template_png: logo_template.as_deref(),
        };
        match authscope_idp::run(&ctx, params).await {
            Ok(mut found) => detections.append(&mut found),
            Err(e) => tracing::warn!(idp = idp_name.as_str(), error = %e, "idp recognition failed"),
        }
        let _ = ctx.close().await;
    }

    Ok(detections)
}

fn load_logo_template(cfg: &Config, idp: &authscope_domain::model::IdpDefinition) -> Option<Vec<u8>> {
    if !cfg.recognition.recognition_strategy_scope.iter().any(|s| s == "LOGO") {
        return None;
    }
    let file_name = idp.logos.first()?;
    let path = std::path::Path::new(&cfg.logo_recognition.assets_dir).join(file_name);
    match std::fs::read(&path) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "logo template unavailable, skipping LOGO strategy for this idp");
            None
        }
    }
}
