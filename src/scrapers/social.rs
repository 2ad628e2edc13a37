use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::models::{Platform, SocialLinks};

const ANCHOR: &str = "a[href]";

static ANCHOR_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(ANCHOR).expect("valid selector"));

/// How a platform's profile links look, and which of the review site's own
/// accounts to ignore. Exclusions are case-sensitive.
struct PlatformRule {
    platform: Platform,
    hosts: &'static [&'static str],
    /// Hosts short enough to hide inside other domains; these must start the
    /// URL or follow `/` or `.`.
    bounded_hosts: &'static [&'static str],
    exclude: &'static str,
}

const RULES: [PlatformRule; 5] = [
    PlatformRule {
        platform: Platform::Facebook,
        hosts: &["facebook.com/"],
        bounded_hosts: &[],
        exclude: "Trustpilot",
    },
    PlatformRule {
        platform: Platform::Twitter,
        hosts: &["twitter.com/"],
        bounded_hosts: &["x.com/"],
        exclude: "Trustpilot",
    },
    PlatformRule {
        platform: Platform::Instagram,
        hosts: &["instagram.com/"],
        bounded_hosts: &[],
        exclude: "trustpilot",
    },
    PlatformRule {
        platform: Platform::LinkedIn,
        hosts: &["linkedin.com/"],
        bounded_hosts: &[],
        exclude: "trustpilot",
    },
    PlatformRule {
        platform: Platform::YouTube,
        hosts: &["youtube.com/"],
        bounded_hosts: &[],
        exclude: "trustpilotreviews",
    },
];

impl PlatformRule {
    fn matches(&self, href: &str) -> bool {
        if href.contains(self.exclude) {
            return false;
        }
        self.hosts.iter().any(|host| href.contains(host))
            || self.bounded_hosts.iter().any(|host| contains_host(href, host))
    }
}

/// `host` must start the string or follow `/` or `.`, so `x.com/` doesn't
/// match inside `netflix.com/`.
fn contains_host(href: &str, host: &str) -> bool {
    href.match_indices(host).any(|(pos, _)| {
        pos == 0 || matches!(href.as_bytes()[pos - 1], b'/' | b'.')
    })
}

/// Anchors inside a `<footer>` or any element whose class mentions "footer"
/// belong to the site chrome, not the business.
fn in_footer(anchor: ElementRef<'_>) -> bool {
    anchor.ancestors().filter_map(ElementRef::wrap).any(|el| {
        el.value().name() == "footer"
            || el
                .value()
                .attr("class")
                .is_some_and(|class| class.contains("footer"))
    })
}

/// One pass over the non-footer anchors; first match per platform wins.
pub fn extract_social_links(document: &Html) -> SocialLinks {
    let mut found: [Option<String>; 5] = Default::default();

    for anchor in document.select(&ANCHOR_SEL) {
        if found.iter().all(Option::is_some) {
            break;
        }
        let Some(href) = anchor.value().attr("href").map(str::trim) else {
            continue;
        };
        if in_footer(anchor) {
            continue;
        }
        for (slot, rule) in found.iter_mut().zip(&RULES) {
            if slot.is_none() && rule.matches(href) {
                debug!("Found {} link: {}", rule.platform.name(), href);
                *slot = Some(href.to_string());
            }
        }
    }

    RULES
        .iter()
        .zip(found)
        .fold(SocialLinks::default(), |links, (rule, url)| match url {
            Some(url) => links.with(rule.platform, url),
            None => links,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(body: &str) -> Html {
        Html::parse_document(&format!("<html><body>{body}</body></html>"))
    }

    #[test]
    fn finds_first_link_per_platform() {
        let html = doc(r#"
            <section>
              <a href="https://www.facebook.com/acme">fb</a>
              <a href="https://www.facebook.com/acme-second">fb2</a>
              <a href="https://x.com/acme">x</a>
              <a href="https://instagram.com/acme">ig</a>
              <a href="https://www.linkedin.com/company/acme">li</a>
              <a href="https://www.youtube.com/@acme">yt</a>
            </section>
        "#);
        let links = extract_social_links(&html);
        assert_eq!(links.facebook, "https://www.facebook.com/acme");
        assert_eq!(links.twitter, "https://x.com/acme");
        assert_eq!(links.instagram, "https://instagram.com/acme");
        assert_eq!(links.linkedin, "https://www.linkedin.com/company/acme");
        assert_eq!(links.youtube, "https://www.youtube.com/@acme");
    }

    #[test]
    fn skips_footer_links_and_site_accounts() {
        let html = doc(r#"
            <a href="https://www.facebook.com/Trustpilot">site fb</a>
            <a href="https://twitter.com/Trustpilot">site tw</a>
            <a href="https://www.youtube.com/trustpilotreviews">site yt</a>
            <div class="styles_footer__x"><a href="https://www.linkedin.com/company/acme">li</a></div>
            <footer><a href="https://instagram.com/acme">ig</a></footer>
            <a href="https://twitter.com/acme">tw</a>
        "#);
        let links = extract_social_links(&html);
        assert_eq!(links.facebook, "");
        assert_eq!(links.twitter, "https://twitter.com/acme");
        assert_eq!(links.instagram, "");
        assert_eq!(links.linkedin, "");
        assert_eq!(links.youtube, "");
    }

    #[test]
    fn exclusion_is_case_sensitive() {
        // "trustpilot" in lower case only excludes instagram/linkedin, not facebook.
        let html = doc(r#"<a href="https://www.facebook.com/trustpilotfan">fb</a>"#);
        assert_eq!(extract_social_links(&html).facebook, "https://www.facebook.com/trustpilotfan");
    }

    #[test]
    fn x_host_must_be_a_real_host() {
        let html = doc(r#"<a href="https://netflix.com/title/1">n</a><a href="https://mobile.x.com/acme">x</a>"#);
        assert_eq!(extract_social_links(&html).twitter, "https://mobile.x.com/acme");
    }

    #[test]
    fn platform_hosts_match_anywhere_in_the_link() {
        let html = doc(r#"<a href="https://share.example/?u=facebook.com/acme">share</a>"#);
        assert_eq!(
            extract_social_links(&html).facebook,
            "https://share.example/?u=facebook.com/acme"
        );
    }

    #[test]
    fn no_links_gives_all_empty() {
        assert!(extract_social_links(&doc("<p>nothing</p>")).is_empty());
    }
}
