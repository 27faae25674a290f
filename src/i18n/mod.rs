//! # Internationalization
//!
//! Message keys (`auth.errors.invalidCredentials`) are translated at the HTTP
//! boundary, never inside services. Catalogs are nested JSON files embedded at
//! compile time and flattened into dotted keys.
//!
//! - [`Lang`]: supported languages and request language detection
//! - [`Translator`]: key lookup with fallback to the default language, then the key
//! - [`filter::translate_errors`]: the global error filter middleware

pub mod filter;

use axum::http::{header, HeaderMap};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

use crate::core::error::{GatewayError, GatewayResult};

const EN_CATALOG: &str = include_str!("../../locales/en.json");
const VI_CATALOG: &str = include_str!("../../locales/vi.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lang {
    #[default]
    En,
    Vi,
}

impl Lang {
    pub const ALL: [Lang; 2] = [Lang::En, Lang::Vi];

    /// Parse a language tag such as `vi`, `vi-VN` or `EN_us`
    pub fn parse(tag: &str) -> Option<Self> {
        let primary = tag.trim().split(['-', '_']).next()?.to_ascii_lowercase();
        match primary.as_str() {
            "en" => Some(Self::En),
            "vi" => Some(Self::Vi),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Vi => "vi",
        }
    }

    /// Pick the request language: `?lang=`, then `x-lang`, then `Accept-Language`
    pub fn detect(headers: &HeaderMap, query: Option<&str>, fallback: Lang) -> Lang {
        let from_query = query.and_then(|query| {
            url::form_urlencoded::parse(query.as_bytes())
                .find(|(key, _)| key == "lang")
                .and_then(|(_, value)| Lang::parse(&value))
        });
        if let Some(lang) = from_query {
            return lang;
        }

        let from_header = headers
            .get("x-lang")
            .and_then(|value| value.to_str().ok())
            .and_then(Lang::parse);
        if let Some(lang) = from_header {
            return lang;
        }

        headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_accept_language)
            .unwrap_or(fallback)
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First supported language in an `Accept-Language` header, by descending quality
fn parse_accept_language(value: &str) -> Option<Lang> {
    let mut candidates: Vec<(f32, Lang)> = value
        .split(',')
        .filter_map(|part| {
            let mut pieces = part.split(';');
            let lang = Lang::parse(pieces.next()?)?;
            let quality = pieces
                .find_map(|piece| piece.trim().strip_prefix("q="))
                .and_then(|q| q.parse::<f32>().ok())
                .unwrap_or(1.0);
            Some((quality, lang))
        })
        .collect();
    // stable sort keeps header order for equal weights
    candidates.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    candidates.first().map(|(_, lang)| *lang)
}

pub struct Translator {
    catalogs: HashMap<Lang, HashMap<String, String>>,
    default_lang: Lang,
}

impl Translator {
    /// Load the catalogs compiled into the binary
    pub fn embedded(default_lang: Lang) -> GatewayResult<Self> {
        let mut catalogs = HashMap::new();
        for (lang, source) in [(Lang::En, EN_CATALOG), (Lang::Vi, VI_CATALOG)] {
            let tree: Value = serde_json::from_str(source)
                .map_err(|e| GatewayError::config(format!("Invalid {} catalog: {}", lang, e)))?;
            let mut flat = HashMap::new();
            flatten("", &tree, &mut flat);
            catalogs.insert(lang, flat);
        }
        Ok(Self { catalogs, default_lang })
    }

    pub fn default_lang(&self) -> Lang {
        self.default_lang
    }

    /// Translate `key`, falling back to the default language and then to the key
    pub fn translate(&self, lang: Lang, key: &str) -> String {
        self.lookup(lang, key)
            .or_else(|| self.lookup(self.default_lang, key))
            .map(str::to_string)
            .unwrap_or_else(|| key.to_string())
    }

    pub fn contains(&self, lang: Lang, key: &str) -> bool {
        self.lookup(lang, key).is_some()
    }

    fn lookup(&self, lang: Lang, key: &str) -> Option<&str> {
        self.catalogs.get(&lang)?.get(key).map(String::as_str)
    }

    /// Keys present in one catalog, for consistency checks
    pub fn keys(&self, lang: Lang) -> Vec<&str> {
        self.catalogs
            .get(&lang)
            .map(|catalog| catalog.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

fn flatten(prefix: &str, node: &Value, out: &mut HashMap<String, String>) {
    match node {
        Value::Object(children) => {
            for (key, child) in children {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten(&path, child, out);
            }
        }
        Value::String(text) => {
            out.insert(prefix.to_string(), text.clone());
        }
        other => {
            out.insert(prefix.to_string(), other.to_string());
        }
    }
}
