use serde::Deserialize;
use std::path::Path;

/// Options that shape how a query is parsed and compiled.
///
/// The same value is handed, unchanged, to every step of a compile pass.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SelectConfig {
    /// Exact-case matching for string and regex literals.
    #[serde(alias = "caseSensitive", alias = "casesensitive")]
    pub case_sensitive: bool,
    /// Bare atoms used as values compile to regexes instead of strings.
    #[serde(alias = "preferRegex", alias = "preferregex")]
    pub prefer_regex: bool,
    /// Record field read by `before:` and `after:` selections.
    #[serde(alias = "dateKey", alias = "datekey")]
    pub date_key: String,
}

impl Default for SelectConfig {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            prefer_regex: false,
            date_key: "date".to_string(),
        }
    }
}

impl SelectConfig {
    /// Load from an optional config file, then `RECSIFT_*` environment variables.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path));
        }
        let settings = builder
            .add_source(::config::Environment::with_prefix("RECSIFT").try_parsing(true))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn with_prefer_regex(mut self, prefer_regex: bool) -> Self {
        self.prefer_regex = prefer_regex;
        self
    }

    pub fn with_date_key(mut self, date_key: impl Into<String>) -> Self {
        self.date_key = date_key.into();
        self
    }
}
