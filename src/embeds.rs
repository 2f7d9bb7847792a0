//! HubSpot embeds and the script allow-list.
//!
//! Inline scripts calling `hbspt.forms.create` / `hbspt.meetings.create` are
//! turned into structured records when every call they contain can be
//! parsed. A script that only partially parses is kept verbatim.

use std::sync::LazyLock;

use regex::Regex;

use crate::formats::{HubspotForm, HubspotMeeting, ScriptRecord};
use crate::rules::{FORMS_CALL, MEETINGS_CALL};

static PORTAL_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"portalId\s*:\s*["']?([0-9]+)"#).expect("PORTAL_ID regex")
});

static FORM_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"formId\s*:\s*["']([^"']+)["']"#).expect("FORM_ID regex")
});

static TARGET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"target\s*:\s*["']([^"']+)["']"#).expect("TARGET regex")
});

static REGION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"region\s*:\s*["']([^"']+)["']"#).expect("REGION regex")
});

static MEETING_SELECTOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"hbspt\.meetings\.create\(\s*["']([^"']+)["']"#).expect("MEETING_SELECTOR regex")
});

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Embeds {
    pub forms: Vec<HubspotForm>,
    pub meetings: Vec<HubspotMeeting>,
    /// Scripts that survived extraction and the allow-list.
    pub scripts: Vec<ScriptRecord>,
}

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
}

pub fn parse_form(call: &str) -> Option<HubspotForm> {
    Some(HubspotForm {
        portal_id: capture(&PORTAL_ID, call)?,
        form_id: capture(&FORM_ID, call)?,
        target: capture(&TARGET, call)?,
        region: capture(&REGION, call),
    })
}

pub fn parse_meeting(call: &str) -> Option<HubspotMeeting> {
    capture(&MEETING_SELECTOR, call).map(|selector| HubspotMeeting { selector })
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum HubspotCall {
    Form(HubspotForm),
    Meeting(HubspotMeeting),
}

/// Splits `content` at each HubSpot call; every piece starts with one.
fn call_segments(content: &str) -> Vec<&str> {
    let mut starts = content
        .match_indices(FORMS_CALL)
        .chain(content.match_indices(MEETINGS_CALL))
        .map(|(start, _)| start)
        .collect::<Vec<_>>();
    starts.sort_unstable();
    starts
        .iter()
        .enumerate()
        .map(|(idx, &start)| {
            let end = starts.get(idx + 1).copied().unwrap_or(content.len());
            &content[start..end]
        })
        .collect()
}

/// Every call in `content`, or `None` when any of them fails to parse.
fn parse_calls(content: &str) -> Option<Vec<HubspotCall>> {
    call_segments(content)
        .into_iter()
        .map(|call| {
            if call.starts_with(FORMS_CALL) {
                parse_form(call).map(HubspotCall::Form)
            } else {
                parse_meeting(call).map(HubspotCall::Meeting)
            }
        })
        .collect()
}

/// Pulls HubSpot records out of `scripts`, applies the meeting container
/// fallback against `raw_html` (the page before script extraction) and
/// filters what remains through the allow-list.
pub fn extract_embeds(scripts: Vec<ScriptRecord>, raw_html: &str) -> Embeds {
    let mut embeds = Embeds::default();
    let mut remaining = Vec::with_capacity(scripts.len());

    for script in scripts {
        let Some(content) = script.content.as_deref() else {
            remaining.push(script);
            continue;
        };
        if !crate::rules::has_hubspot_call(content) {
            remaining.push(script);
            continue;
        }

        let Some(calls) = parse_calls(content) else {
            tracing::debug!("keeping hubspot script that did not fully parse");
            remaining.push(script);
            continue;
        };
        for call in calls {
            match call {
                HubspotCall::Form(form) => embeds.forms.push(form),
                HubspotCall::Meeting(meeting) => embeds.meetings.push(meeting),
            }
        }
    }

    if embeds.meetings.is_empty()
        && let Some(meeting) = crate::rules::meeting_fallback(raw_html)
    {
        embeds.meetings.push(meeting);
    }

    embeds.scripts = filter_scripts(remaining);
    embeds
}

/// Keeps allow-listed external scripts and inline scripts that still call
/// HubSpot. Everything else is dropped.
pub fn filter_scripts(scripts: Vec<ScriptRecord>) -> Vec<ScriptRecord> {
    scripts
        .into_iter()
        .filter(|script| match (&script.src, &script.content) {
            (Some(src), _) => crate::rules::is_trusted_script_src(src),
            (None, Some(content)) => crate::rules::has_hubspot_call(content),
            (None, None) => false,
        })
        .collect()
}
