//! Stage 1: resolve (§4.7). Try `https://` then `http://`; the final
//! redirected URL/host becomes the task's resolved origin for every later
//! stage.

use authscope_domain::model::ResolvedDomain;

pub async fn resolve(client: &reqwest::Client, domain: &str) -> ResolvedDomain {
    let mut last_error: Option<String> = None;

    for scheme in ["https", "http"] {
        let url = format!("{scheme}://{domain}");
        match client.get(&url).send().await {
            Ok(resp) => {
                let status = resp.status().as_u16();
                if authscope_browser::failure::is_reachable_status(status) {
                    let final_url = resp.url().to_string();
                    let final_host = resp
                        .url()
                        .host_str()
                        .map(str::to_string)
                        .unwrap_or_else(|| domain.to_string());
                    return ResolvedDomain {
                        reachable: true,
                        domain: Some(final_host),
                        url: Some(final_url),
                        error_msg: None,
                    };
                }
                last_error = Some(format!("{scheme}:// returned HTTP {status}"));
            }
            Err(e) => {
                last_error = Some(format!("{scheme}:// {e}"));
            }
        }
    }

    ResolvedDomain {
        reachable: false,
        domain: None,
        url: None,
        error_msg: last_error,
    }
}

#[cfg(test)]
mod tests {
    use authscope_browser::failure::is_reachable_status;

    #[test]
    fn reachability_boundary_matches_spec() {
        assert!(is_reachable_status(200));
        assert!(is_reachable_status(399));
        assert!(!is_reachable_status(400));
        assert!(!is_reachable_status(199));
    }
}
