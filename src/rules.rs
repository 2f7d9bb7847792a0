//! Rule tables for the special cases of the migration. Extending or
//! dropping a rule means editing data here, not control flow elsewhere.

use std::sync::LazyLock;

use indexmap::IndexSet;
use regex::Regex;

use crate::formats::HubspotMeeting;

pub const FORMS_CALL: &str = "hbspt.forms.create";
pub const MEETINGS_CALL: &str = "hbspt.meetings.create";

/// External scripts kept in a compiled page. Everything else is dropped.
const TRUSTED_SCRIPT_SOURCES: &[&str] = &[
    // HubSpot forms embed (v2 loader).
    r"//js\.hsforms\.net/forms/(?:embed/)?v2\.js",
    // HubSpot forms embed (per-portal loader).
    r"//js\.hsforms\.net/forms/embed/[0-9]+\.js",
    // HubSpot meetings embed.
    r"//static\.hsappstatic\.net/MeetingsEmbed/ex/MeetingsEmbedCode\.js",
    // Swiper as bundled by Elementor.
    r"/wp-content/plugins/elementor/assets/lib/swiper/(?:v[0-9]+/)?swiper(?:\.min)?\.js",
];

static TRUSTED_SCRIPTS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    TRUSTED_SCRIPT_SOURCES
        .iter()
        .map(|pattern| Regex::new(pattern).expect("trusted script regex"))
        .collect()
});

/// Substrings marking stylesheets that never reach a compiled page.
const EXCLUDED_STYLESHEETS: &[&str] = &[
    "/wp-content/plugins/cookie-notice/",
    "/wp-includes/css/dist/block-library/",
    "fonts.googleapis.com",
];

/// Framework stylesheets placed ahead of page stylesheets in the bundle.
pub const BASE_STYLESHEETS: &[&str] = &[
    "/wp-content/uploads/elementor/google-fonts/css/poppins.css",
    "/wp-content/plugins/elementor/assets/css/conditionals/dialog.min.css",
    "/wp-content/plugins/elementor/assets/css/conditionals/lightbox.min.css",
    "/wp-content/plugins/elementor/assets/lib/swiper/v8/css/swiper.min.css",
];

pub struct ClassSwap {
    pub from: &'static str,
    pub to: &'static str,
}

/// Body classes rewritten because the page is rendered with JS enabled.
pub const BODY_CLASS_SWAPS: &[ClassSwap] = &[ClassSwap {
    from: "woocommerce-no-js",
    to: "woocommerce-js",
}];

pub struct MeetingFallback {
    pub marker: &'static str,
    pub selector: &'static str,
}

/// Meeting widgets embedded without an inline `hbspt.meetings.create`.
pub const MEETING_FALLBACKS: &[MeetingFallback] = &[MeetingFallback {
    marker: "meetings-iframe-container",
    selector: ".meetings-iframe-container",
}];

/// Look page tab labels and the preview key each one fills.
pub const PREVIEW_TABS: &[(&str, &str)] = &[
    ("website on desktop", "desktop"),
    ("website on mobile", "mobile"),
    ("print materials", "print"),
    ("promotional products", "promotional"),
    ("social media content", "social"),
];

pub fn is_trusted_script_src(src: &str) -> bool {
    TRUSTED_SCRIPTS.iter().any(|re| re.is_match(src))
}

pub fn has_hubspot_call(content: &str) -> bool {
    content.contains(FORMS_CALL) || content.contains(MEETINGS_CALL)
}

pub fn is_excluded_stylesheet(href: &str) -> bool {
    EXCLUDED_STYLESHEETS
        .iter()
        .any(|pattern| href.contains(pattern))
}

/// Applies [`BODY_CLASS_SWAPS`] and drops duplicate classes, keeping the
/// first occurrence.
pub fn normalize_body_class(raw: &str) -> String {
    let classes = raw
        .split_ascii_whitespace()
        .map(|class| {
            BODY_CLASS_SWAPS
                .iter()
                .find(|swap| swap.from == class)
                .map_or(class, |swap| swap.to)
        })
        .collect::<IndexSet<_>>();
    classes.into_iter().collect::<Vec<_>>().join(" ")
}

pub fn meeting_fallback(raw_html: &str) -> Option<HubspotMeeting> {
    MEETING_FALLBACKS
        .iter()
        .find(|rule| raw_html.contains(rule.marker))
        .map(|rule| HubspotMeeting {
            selector: rule.selector.to_owned(),
        })
}

pub fn preview_key(label: &str) -> Option<&'static str> {
    let label = label.trim();
    PREVIEW_TABS
        .iter()
        .find(|(tab, _)| tab.eq_ignore_ascii_case(label))
        .map(|(_, key)| *key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_class_flips_woocommerce_marker() {
        let out = normalize_body_class("woocommerce-no-js page-template page-template");
        assert_eq!(out, "woocommerce-js page-template");
        assert!(!out.split(' ').any(|c| c == "woocommerce-no-js"));
    }

    #[test]
    fn body_class_does_not_duplicate_existing_js_marker() {
        assert_eq!(
            normalize_body_class("woocommerce-js home woocommerce-no-js"),
            "woocommerce-js home"
        );
    }

    #[test]
    fn script_allow_list() {
        assert!(is_trusted_script_src("//js.hsforms.net/forms/embed/v2.js"));
        assert!(is_trusted_script_src("https://js.hsforms.net/forms/embed/4412345.js"));
        assert!(is_trusted_script_src(
            "https://static.hsappstatic.net/MeetingsEmbed/ex/MeetingsEmbedCode.js"
        ));
        assert!(is_trusted_script_src(
            "/wp-content/plugins/elementor/assets/lib/swiper/v8/swiper.min.js?ver=8.4.5"
        ));
        assert!(!is_trusted_script_src(
            "https://www.googletagmanager.com/gtag/js?id=G-1"
        ));
        assert!(!is_trusted_script_src("/wp-content/plugins/other/swiper.min.js"));
    }

    #[test]
    fn stylesheet_exclusions() {
        assert!(is_excluded_stylesheet(
            "/wp-content/plugins/cookie-notice/css/front.min.css"
        ));
        assert!(is_excluded_stylesheet(
            "/wp-includes/css/dist/block-library/style.min.css"
        ));
        assert!(is_excluded_stylesheet(
            "https://fonts.googleapis.com/css?family=Roboto"
        ));
        assert!(!is_excluded_stylesheet("/wp-content/themes/x/style.css"));
    }

    #[test]
    fn meeting_fallback_sniffs_container_class() {
        assert_eq!(
            meeting_fallback(r#"<div class="meetings-iframe-container" data-src="x"></div>"#),
            Some(HubspotMeeting {
                selector: ".meetings-iframe-container".to_owned()
            })
        );
        assert_eq!(meeting_fallback("<div></div>"), None);
    }

    #[test]
    fn preview_labels_map_to_keys() {
        assert_eq!(preview_key(" Website on desktop "), Some("desktop"));
        assert_eq!(preview_key("SOCIAL MEDIA CONTENT"), Some("social"));
        assert_eq!(preview_key("Email signatures"), None);
    }
}
