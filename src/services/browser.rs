/// Coarse User-Agent capability sniff backing the browser gate. In-app
/// webviews and legacy engines cannot host the embedded player, so they are
/// bounced to the browser-check page unless a bypass cookie is set.
const BLOCKED_MARKERS: [&str; 7] = [
    "MSIE",
    "Trident/",
    "; wv)",
    "FBAN",
    "FBAV",
    "Instagram",
    " Line/",
];

pub fn supported_browser(user_agent: &str) -> bool {
    if user_agent.trim().is_empty() {
        return false;
    }
    !BLOCKED_MARKERS.iter().any(|m| user_agent.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mainstream_browsers_pass() {
        assert!(supported_browser(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36"
        ));
        assert!(supported_browser(
            "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0"
        ));
        assert!(supported_browser(
            "Mozilla/5.0 (iPhone; CPU iPhone OS 17_5 like Mac OS X) \
             AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Mobile/15E148 Safari/604.1"
        ));
    }

    #[test]
    fn test_webviews_and_legacy_engines_blocked() {
        assert!(!supported_browser(
            "Mozilla/5.0 (Linux; Android 14; Pixel 8 Build/UD1A; wv) AppleWebKit/537.36"
        ));
        assert!(!supported_browser(
            "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) [FBAN/FBIOS;FBAV/400.0]"
        ));
        assert!(!supported_browser(
            "Mozilla/5.0 (compatible; MSIE 10.0; Windows NT 6.1; Trident/6.0)"
        ));
        assert!(!supported_browser("Mozilla/5.0 (iPhone) Instagram 300.0"));
    }

    #[test]
    fn test_missing_user_agent_blocked() {
        assert!(!supported_browser(""));
        assert!(!supported_browser("   "));
    }
}
