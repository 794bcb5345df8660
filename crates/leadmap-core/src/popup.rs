// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::lead::Lead;
use html_escape::{encode_double_quoted_attribute, encode_text};

/// Popup markup for a marker. Lead data is untrusted (discovery results are scraped),
/// so every interpolated value goes through `html_escape`.
pub fn popup_html(lead: &Lead, feature_id: &str) -> String {
    let mut html = String::from("<div class=\"lead-popup\">");

    html.push_str(&format!(
        "<strong>{}</strong>",
        encode_text(lead.company.as_deref().unwrap_or("Unnamed lead"))
    ));

    let rows: [(&str, Option<String>); 8] = [
        ("Status", lead.status.clone()),
        ("City", lead.city.clone()),
        ("Address", lead.address.clone()),
        ("Phone", lead.phone.clone()),
        ("Email", lead.email.clone()),
        ("Source", lead.source.clone()),
        ("Rating", lead.rating.map(|r| format!("{:.1}", r))),
        ("Value", lead.value.map(|v| format!("{:.0}", v))),
    ];
    for (label, value) in rows {
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            html.push_str(&format!("<div>{}: {}</div>", label, encode_text(&value)));
        }
    }

    if let Some(website) = lead.website.as_deref().filter(|w| !w.trim().is_empty()) {
        let href = safe_href(website.trim());
        html.push_str(&format!(
            "<div><a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">{}</a></div>",
            encode_double_quoted_attribute(&href),
            encode_text(website)
        ));
    }

    html.push_str(&format!(
        "<div class=\"lead-popup-id\">{}</div></div>",
        encode_text(feature_id)
    ));
    html
}

// Only http(s) links; anything else (javascript:, data:) is treated as a bare host.
fn safe_href(website: &str) -> String {
    let lower = website.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        website.to_string()
    } else {
        let host = website.split_once(':').map_or(website, |(_, rest)| rest);
        format!("https://{}", host.trim_start_matches('/'))
    }
}
