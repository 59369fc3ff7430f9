// src/matching/url.rs - Registrable domain extraction for account websites
use url::Url as StdUrl;

/// Registrable domain label of a website, e.g. "https://www.example.co.uk/x"
/// gives "example". Anything that does not parse as a host gives "".
pub fn extract_domain(url_s: Option<&str>) -> String {
    url_s.and_then(registrable_label).unwrap_or_default()
}

fn registrable_label(url_s: &str) -> Option<String> {
    let trimmed_url = url_s.trim();
    if trimmed_url.is_empty()
        || trimmed_url.starts_with("mailto:")
        || trimmed_url.starts_with("tel:")
    {
        return None;
    }

    let url_with_scheme = if !trimmed_url.contains("://") {
        format!("https://{}", trimmed_url)
    } else {
        trimmed_url.to_string()
    };

    let parsed_url = StdUrl::parse(&url_with_scheme).ok()?;
    let host = parsed_url.host_str()?.trim_end_matches('.').to_lowercase();
    if host.is_empty() || is_ip_address(&host) {
        return None;
    }

    if host.split('.').any(str::is_empty) {
        return None;
    }
    if !host.contains('.') {
        return Some(host);
    }

    // unlisted TLDs count as one-label suffixes
    let suffix = psl::suffix_str(&host)?;
    let registrable = host.strip_suffix(suffix)?.strip_suffix('.')?;
    registrable.rsplit('.').next().map(str::to_string)
}

pub fn is_ip_address(domain_candidate: &str) -> bool {
    if domain_candidate.split('.').count() == 4
        && domain_candidate
            .split('.')
            .all(|part| part.parse::<u8>().is_ok())
    {
        return true;
    }
    domain_candidate.contains(':') || domain_candidate.starts_with('[')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_second_level_label() {
        assert_eq!(extract_domain(Some("https://www.example.co.uk/path")), "example");
        assert_eq!(extract_domain(Some("http://shop.acme.com")), "acme");
        assert_eq!(extract_domain(Some("acme.com")), "acme");
        assert_eq!(extract_domain(Some("WWW.GLOBEX.IO/about?x=1")), "globex");
        assert_eq!(extract_domain(Some("https://user@portal.initech.com.au:8443/")), "initech");
    }

    #[test]
    fn test_malformed_input_gives_empty() {
        assert_eq!(extract_domain(None), "");
        assert_eq!(extract_domain(Some("not a url")), "");
        assert_eq!(extract_domain(Some("")), "");
        assert_eq!(extract_domain(Some("mailto:sales@acme.com")), "");
        assert_eq!(extract_domain(Some("http://192.168.0.1/admin")), "");
        assert_eq!(extract_domain(Some("https://co.uk")), "");
    }

    #[test]
    fn test_public_suffix_list_covers_deeper_suffixes() {
        assert_eq!(extract_domain(Some("https://foo.gc.ca")), "foo");
        assert_eq!(extract_domain(Some("portal.acme.com.br")), "acme");
        assert_eq!(extract_domain(Some("https://gc.ca")), "");
    }

    #[test]
    fn test_single_label_host_is_its_own_domain() {
        assert_eq!(extract_domain(Some("intranet")), "intranet");
    }

    #[test]
    fn test_is_ip_address() {
        assert!(is_ip_address("10.0.0.1"));
        assert!(!is_ip_address("10.0.0.example"));
    }
}
