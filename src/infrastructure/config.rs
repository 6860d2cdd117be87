use std::env;

use crate::services::scope_filter::{DEFAULT_DATE_NOTE_TAGS, DEFAULT_DATE_SUBFIELDS, ScopePolicy};

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub institution_code: Option<String>,
    pub scope: ScopePolicy,
}

impl Config {
    pub fn from_env() -> Self {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://catalog_ingest.db?mode=rwc".to_string());

        let date_note_tags = env::var("SCOPE_DATE_NOTE_TAGS")
            .ok()
            .map(|s| parse_tag_list(&s))
            .unwrap_or_else(|| DEFAULT_DATE_NOTE_TAGS.iter().map(|t| t.to_string()).collect());

        let date_subfields = env::var("SCOPE_DATE_SUBFIELDS")
            .ok()
            .map(|s| parse_subfield_pairs(&s))
            .unwrap_or_else(|| {
                DEFAULT_DATE_SUBFIELDS
                    .iter()
                    .map(|(tag, code)| (tag.to_string(), code.to_string()))
                    .collect()
            });

        let scope = ScopePolicy {
            date_from: env::var("SCOPE_DATE_FROM")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(i32::MIN),
            date_to: env::var("SCOPE_DATE_TO")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(i32::MAX),
            languages: env::var("SCOPE_LANGUAGES")
                .ok()
                .map(|s| parse_list(&s))
                .unwrap_or_default(),
            places: env::var("SCOPE_PLACES")
                .ok()
                .map(|s| parse_list(&s))
                .unwrap_or_default(),
            liberal: env::var("SCOPE_LIBERAL")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            date_note_tags,
            date_subfields,
        };

        Self {
            database_url,
            institution_code: env::var("INSTITUTION_CODE")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            scope,
        }
    }
}

/// Comma separated values, trimmed, empties dropped
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Tags, where `590-599` expands to every tag in the range
pub fn parse_tag_list(value: &str) -> Vec<String> {
    let mut tags = Vec::new();
    for item in parse_list(value) {
        match item.split_once('-') {
            Some((from, to)) => match (from.trim().parse::<u16>(), to.trim().parse::<u16>()) {
                (Ok(from), Ok(to)) if from <= to => {
                    tags.extend((from..=to).map(|t| format!("{:03}", t)));
                }
                _ => tracing::warn!("Ignoring malformed tag range '{}'", item),
            },
            None => tags.push(item),
        }
    }
    tags
}

/// `(tag, code)` pairs written as `260c` or `260$c`
pub fn parse_subfield_pairs(value: &str) -> Vec<(String, String)> {
    parse_list(value)
        .into_iter()
        .filter_map(|item| {
            let item = item.replace('$', "");
            if item.len() == 4 && item.is_char_boundary(3) {
                let (tag, code) = item.split_at(3);
                Some((tag.to_string(), code.to_string()))
            } else {
                tracing::warn!("Ignoring malformed subfield pair '{}'", item);
                None
            }
        })
        .collect()
}
