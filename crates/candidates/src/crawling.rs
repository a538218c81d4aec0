//! CRAWLING strategy: load the homepage, collect anchors whose href matches
//! a priority rule, and click generic sign-in keyword elements that aren't
//! anchors, following whichever popup or same-tab navigation results
//! (§4.3).

use authscope_browser::BrowserContext;
use authscope_domain::config::LoginPageConfig;
use authscope_domain::error::Result;
use authscope_domain::model::{CandidateStrategy, LoginPageCandidate};
use authscope_locators::css;

use crate::url_util::{is_same_etld1, normalize, prio_of_url};

#[derive(Debug, serde::Deserialize)]
struct AnchorCandidate {
    href_absolute: String,
    inner_text: String,
}

pub async fn candidates(ctx: &BrowserContext, resolved_url: &str, cfg: &LoginPageConfig) -> Result<Vec<LoginPageCandidate>> {
    let mut anchors = anchor_candidates(ctx, resolved_url, cfg).await?;
    let elements = element_candidates(ctx, resolved_url, cfg).await?;
    anchors.extend(elements);
    anchors.sort_by(|a, b| b.priority.priority.cmp(&a.priority.priority));
    anchors.truncate(cfg.crawling_strategy_config.max_elements_to_click as usize * 2);
    Ok(anchors)
}

async fn anchor_candidates(
    ctx: &BrowserContext,
    resolved_url: &str,
    cfg: &LoginPageConfig,
) -> Result<Vec<LoginPageCandidate>> {
    let script = r#"(() => {
      const out = [];
      for (const a of document.querySelectorAll('a[href]')) {
        out.push({ href_absolute: a.href, inner_text: (a.textContent || '').trim().slice(0, 200) });
        if (out.length >= 500) break;
      }
      return out;
    })()"#;

    let anchors: Vec<AnchorCandidate> = ctx
        .page
        .evaluate(script)
        .await
        .map_err(|e| authscope_domain::error::Error::Browser(format!("anchor scan failed: {e}")))?
        .into_value()
        .unwrap_or_default();

    let mut out = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for anchor in anchors {
        let priority = prio_of_url(&anchor.href_absolute, &cfg.login_page_url_regexes);
        if priority.priority <= 0 {
            continue;
        }
        if !is_same_etld1(resolved_url, &anchor.href_absolute) {
            continue;
        }
        let normalized = normalize(&anchor.href_absolute);
        if !seen.insert(normalized.clone()) {
            continue;
        }
        out.push(LoginPageCandidate {
            url: normalized,
            strategy: CandidateStrategy::Crawling,
            priority,
            resolved: None,
            info: serde_json::json!({ "locator_mode": "ANCHOR", "inner_text": anchor.inner_text }),
        });
    }
    out.sort_by(|a, b| b.priority.priority.cmp(&a.priority.priority));
    Ok(out)
}

async fn element_candidates(
    ctx: &BrowserContext,
    resolved_url: &str,
    cfg: &LoginPageConfig,
) -> Result<Vec<LoginPageCandidate>> {
    let keywords = &cfg.crawling_strategy_config.login_keywords;
    if keywords.is_empty() {
        return Ok(Vec::new());
    }
    let (_, elements) = css::locate(ctx, keywords, &[]).await?;

    let mut out = Vec::new();
    let mut seen = std::collections::HashSet::new();
    let max_clicks = cfg.crawling_strategy_config.max_elements_to_click as usize;

    for element in elements.into_iter().take(max_clicks) {
        let pre_click_url = current_url(ctx).await;
        let cx = element.x + element.width / 2.0;
        let cy = element.y + element.height / 2.0;

        let click_script = format!(
            "(() => {{ const el = document.elementFromPoint({cx}, {cy}); if (el) el.click(); return true; }})()"
        );
        let _ = ctx.page.evaluate(click_script).await;
        tokio::time::sleep(std::time::Duration::from_millis(500)).await;

        let (post_click_url, frame) = detect_navigation(ctx, &pre_click_url).await;
        restore(ctx, &pre_click_url).await;

        let Some(post_click_url) = post_click_url else { continue };
        if post_click_url == pre_click_url {
            continue;
        }
        if !is_same_etld1(&pre_click_url, &post_click_url) {
            continue;
        }
        let normalized = normalize(&post_click_url);
        if !seen.insert(normalized.clone()) {
            continue;
        }
        let priority = prio_of_url(&post_click_url, &cfg.login_page_url_regexes);
        out.push(LoginPageCandidate {
            url: normalized,
            strategy: CandidateStrategy::Crawling,
            priority,
            resolved: None,
            info: serde_json::json!({
                "locator_mode": "ELEMENT",
                "inner_text": element.inner_text,
                "login_page_frame": frame,
            }),
        });
    }
    let _ = resolved_url;
    Ok(out)
}

async fn current_url(ctx: &BrowserContext) -> String {
    ctx.page.url().await.ok().flatten().unwrap_or_default()
}

/// Wait up to 2s for either a new popup page or a same-tab navigation,
/// mirroring the `expect_popup` race in the Playwright original.
async fn detect_navigation(ctx: &BrowserContext, pre_click_url: &str) -> (Option<String>, &'static str) {
    let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(2);
    while tokio::time::Instant::now() < deadline {
        if let Ok(pages) = ctx.browser.pages().await {
            for page in &pages {
                if let Ok(Some(url)) = page.url().await {
                    if url != pre_click_url && url != "about:blank" && page.target_id() != ctx.page.target_id() {
                        let _ = page.close().await;
                        return (Some(url), "POPUP");
                    }
                }
            }
        }
        let current = current_url(ctx).await;
        if current != pre_click_url {
            return (Some(current), "TOPMOST");
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }
    (None, "TOPMOST")
}

async fn restore(ctx: &BrowserContext, pre_click_url: &str) {
    let current = current_url(ctx).await;
    if current != pre_click_url && !pre_click_url.is_empty() {
        let _ = ctx.page.goto(pre_click_url).await;
    }
}
