//! Coarse labels for user agents and referrers.
//!
//! Each classifier is an ordered rule table: the first rule with a marker
//! contained in the input wins, so rule order is part of the behaviour
//! (Edge and Opera user agents also say "Chrome", iOS ones say "Mac OS").

use url::Url;

use crate::models::visit::DIRECT_REFERRER;

pub struct Rule {
    pub markers: &'static [&'static str],
    pub label: &'static str,
}

impl Rule {
    pub const fn new(label: &'static str, markers: &'static [&'static str]) -> Self {
        Self { markers, label }
    }

    fn matches(&self, input: &str) -> bool {
        self.markers.iter().any(|marker| input.contains(marker))
    }
}

pub const BROWSER_RULES: &[Rule] = &[
    Rule::new("Edge", &["Edg"]),
    Rule::new("Opera", &["OPR/", "Opera"]),
    Rule::new("Samsung Internet", &["SamsungBrowser"]),
    Rule::new("Chrome", &["Chrome", "CriOS"]),
    Rule::new("Firefox", &["Firefox", "FxiOS"]),
    Rule::new("Safari", &["Safari"]),
];

pub const OS_RULES: &[Rule] = &[
    Rule::new("Windows", &["Windows"]),
    Rule::new("Android", &["Android"]),
    Rule::new("iOS", &["iPhone", "iPad", "iPod"]),
    Rule::new("macOS", &["Macintosh", "Mac OS"]),
    Rule::new("ChromeOS", &["CrOS"]),
    Rule::new("Linux", &["Linux"]),
];

pub const DEVICE_RULES: &[Rule] = &[Rule::new(
    "Mobile",
    &["Mobi", "Android", "iPhone", "iPad", "iPod"],
)];

// Matched against the lowercased referrer
pub const SOURCE_RULES: &[Rule] = &[
    Rule::new("Google", &["google"]),
    Rule::new("LinkedIn", &["linkedin"]),
    Rule::new("Instagram", &["instagram"]),
];

pub fn first_match(rules: &[Rule], input: &str) -> Option<&'static str> {
    rules.iter().find(|rule| rule.matches(input)).map(|rule| rule.label)
}

pub fn classify_browser(user_agent: &str) -> &'static str {
    first_match(BROWSER_RULES, user_agent).unwrap_or("Other")
}

pub fn classify_os(user_agent: &str) -> &'static str {
    first_match(OS_RULES, user_agent).unwrap_or("Unknown")
}

pub fn classify_device_type(user_agent: &str) -> &'static str {
    first_match(DEVICE_RULES, user_agent).unwrap_or("Desktop")
}

/// Map a raw referrer to a traffic source tag
pub fn classify_source(referrer: &str) -> String {
    let referrer = referrer.trim();
    if referrer.is_empty() || referrer == DIRECT_REFERRER {
        return "Direct".to_string();
    }

    if let Some(label) = first_match(SOURCE_RULES, &referrer.to_lowercase()) {
        return label.to_string();
    }

    match Url::parse(referrer) {
        Ok(url) => match url.host_str() {
            Some(host) => host.strip_prefix("www.").unwrap_or(host).to_string(),
            None => "Other".to_string(),
        },
        Err(_) => "Other".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_WINDOWS: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    const EDGE_WINDOWS: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0";
    const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_1 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Mobile/15E148 Safari/604.1";
    const CHROME_ANDROID: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36";
    const FIREFOX_LINUX: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0";
    const SAFARI_MAC: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_1) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15";

    #[test]
    fn browser_cascade_respects_order() {
        assert_eq!(classify_browser(CHROME_WINDOWS), "Chrome");
        assert_eq!(classify_browser(EDGE_WINDOWS), "Edge");
        assert_eq!(classify_browser(SAFARI_IPHONE), "Safari");
        assert_eq!(classify_browser(FIREFOX_LINUX), "Firefox");
        assert_eq!(classify_browser("curl/8.4.0"), "Other");
        assert_eq!(classify_browser(""), "Other");
    }

    #[test]
    fn os_cascade_respects_order() {
        assert_eq!(classify_os(CHROME_ANDROID), "Android");
        assert_eq!(classify_os(SAFARI_IPHONE), "iOS");
        assert_eq!(classify_os(SAFARI_MAC), "macOS");
        assert_eq!(classify_os(FIREFOX_LINUX), "Linux");
        assert_eq!(classify_os(EDGE_WINDOWS), "Windows");
        assert_eq!(classify_os(""), "Unknown");
    }

    #[test]
    fn android_is_a_mobile_device() {
        assert_eq!(classify_os("Mozilla/5.0 (Linux; Android 14)"), "Android");
        assert_eq!(classify_device_type("Mozilla/5.0 (Linux; Android 14)"), "Mobile");
        assert_eq!(classify_device_type(SAFARI_IPHONE), "Mobile");
        assert_eq!(classify_device_type(CHROME_WINDOWS), "Desktop");
        assert_eq!(classify_device_type(""), "Desktop");
    }

    #[test]
    fn sources() {
        assert_eq!(classify_source("https://www.google.com/search?q=x"), "Google");
        assert_eq!(classify_source("https://www.linkedin.com/feed/"), "LinkedIn");
        assert_eq!(classify_source("https://l.instagram.com/?u=x"), "Instagram");
        assert_eq!(classify_source(""), "Direct");
        assert_eq!(classify_source(DIRECT_REFERRER), "Direct");
        assert_eq!(classify_source("https://example.org/page"), "example.org");
        assert_eq!(classify_source("https://www.example.org/"), "example.org");
        assert_eq!(classify_source("not a url"), "Other");
        assert_eq!(classify_source("mailto:someone@example.org"), "Other");
    }

    #[test]
    fn first_match_wins() {
        const RULES: &[Rule] = &[
            Rule::new("first", &["a"]),
            Rule::new("second", &["ab"]),
        ];
        assert_eq!(first_match(RULES, "ab"), Some("first"));
        assert_eq!(first_match(RULES, "zz"), None);
    }
}
