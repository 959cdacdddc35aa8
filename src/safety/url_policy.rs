//! Restricted-page policy. The browser refuses script injection on its own
//! pages, extension pages, devtools and the extension marketplace.
//!
//! Runs BEFORE any injection, so a rejected tab is never touched. Matching is
//! a case-sensitive prefix / substring check against the tab URL.

pub struct UrlCheck {
    pub allowed: bool,
    pub reason: Option<&'static str>,
}

static BLOCKED_PREFIXES: &[(&str, &str)] = &[
    ("chrome://", "Browser internal page"),
    ("chrome-extension://", "Extension internal page"),
    ("edge://", "Browser internal page"),
    ("about:", "Browser internal page"),
    ("devtools://", "Embedded developer tools"),
];

static BLOCKED_SUBSTRINGS: &[(&str, &str)] = &[
    ("chrome.google.com/webstore", "Extension marketplace"),
    ("chromewebstore.google.com", "Extension marketplace"),
];

/// Check whether a selection may be started on `url`.
///
/// Returns `UrlCheck { allowed: false, reason }` for restricted pages.
pub fn check_url(url: &str) -> UrlCheck {
    let blocked = BLOCKED_PREFIXES
        .iter()
        .find(|(prefix, _)| url.starts_with(prefix))
        .or_else(|| {
            BLOCKED_SUBSTRINGS
                .iter()
                .find(|(needle, _)| url.contains(needle))
        });

    if let Some((_, reason)) = blocked {
        log::warn!("[SAFETY] Blocked selection on '{}', reason: {}", url, reason);
        return UrlCheck {
            allowed: false,
            reason: Some(*reason),
        };
    }

    UrlCheck {
        allowed: true,
        reason: None,
    }
}
