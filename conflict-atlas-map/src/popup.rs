//! Popup content for clicked map features.
//!
//! Property values come straight from tiles or the API and are escaped before
//! they end up in HTML.

use std::fmt::Write as _;

use chrono::{DateTime, Datelike as _, NaiveDate};
use geojson::{JsonObject, JsonValue};

use crate::style::Category;

/// Escape text for use inside HTML element content or attribute values.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Format an event date as `month/day/year` without zero padding.
///
/// Accepts `2024-01-05` and RFC 3339 timestamps, anything else is returned unchanged.
#[must_use]
pub fn format_event_date(raw: &str) -> String {
    let raw = raw.trim();
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|d| d.date_naive()));
    match date {
        Some(date) => format!("{}/{}/{}", date.month(), date.day(), date.year()),
        None => raw.to_string(),
    }
}

fn text(properties: &JsonObject, key: &str) -> Option<String> {
    match properties.get(key)? {
        JsonValue::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Fields shown when an event is clicked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventPopup {
    pub location: Option<String>,
    pub event_type: String,
    pub date: Option<String>,
    pub fatalities: Option<String>,
    pub actors: Vec<String>,
}

impl EventPopup {
    /// Read popup fields from the properties of a feature in `category`'s layer.
    #[must_use]
    pub fn from_properties(category: Category, properties: &JsonObject) -> Self {
        let event_type = text(properties, "event_type")
            .or_else(|| text(properties, "sub_event_type"))
            .unwrap_or_else(|| category.label().to_string());
        Self {
            location: text(properties, "location"),
            event_type,
            date: text(properties, "event_date").map(|d| format_event_date(&d)),
            fatalities: text(properties, "fatalities"),
            actors: ["actor1", "actor2"]
                .into_iter()
                .filter_map(|key| text(properties, key))
                .collect(),
        }
    }

    #[must_use]
    pub fn to_html(&self) -> String {
        let mut html = String::from(r#"<div class="event-popup">"#);
        let _ = write!(html, "<h3>{}</h3>", escape_html(&self.event_type));
        let location = self.location.as_deref().unwrap_or("Unknown location");
        let _ = write!(html, "<p><b>Location:</b> {}</p>", escape_html(location));
        if let Some(date) = &self.date {
            let _ = write!(html, "<p><b>Date:</b> {}</p>", escape_html(date));
        }
        if let Some(fatalities) = &self.fatalities {
            let _ = write!(html, "<p><b>Fatalities:</b> {}</p>", escape_html(fatalities));
        }
        if !self.actors.is_empty() {
            let actors: Vec<_> = self.actors.iter().map(|a| escape_html(a)).collect();
            let _ = write!(html, "<p><b>Actors:</b> {}</p>", actors.join(" vs "));
        }
        html.push_str("</div>");
        html
    }
}

/// Popup for a world polygon: its `name`, or nothing for unnamed features.
#[must_use]
pub fn name_popup(properties: &JsonObject) -> Option<String> {
    text(properties, "name").map(|name| format!("<b>{}</b>", escape_html(&name)))
}

/// Popup for the country base layer. Unnamed countries show as `Unknown`.
#[must_use]
pub fn country_popup(properties: &JsonObject) -> String {
    let name = text(properties, "name").unwrap_or_else(|| "Unknown".to_string());
    format!("<b>Country:</b> {}", escape_html(&name))
}
