use std::collections::HashMap;

use crate::errors::CustomError;

const FALLBACK_LANGUAGE: &str = "en";

const BUNDLED: [(&str, &str); 2] = [
    ("en", include_str!("../../locales/en.json")),
    ("es", include_str!("../../locales/es.json")),
];

type Table = HashMap<String, String>;

/// The bundled translation tables. Immutable once loaded; each request picks
/// its language through [`I18n::locale`].
pub struct I18n {
    tables: HashMap<String, Table>,
    default_language: String,
}

impl I18n {
    pub fn new(default_language: &str) -> Result<Self, CustomError> {
        let mut tables = HashMap::new();
        for (language, raw) in BUNDLED {
            let table: Table = serde_json::from_str(raw).map_err(|e| {
                CustomError::ConfigError(format!("locale {} is malformed: {}", language, e))
            })?;
            tables.insert(language.to_string(), table);
        }

        if !tables.contains_key(default_language) {
            return Err(CustomError::ConfigError(format!(
                "unsupported default language: {}",
                default_language
            )));
        }
        Ok(Self {
            tables,
            default_language: default_language.to_string(),
        })
    }

    pub fn is_supported(&self, language: &str) -> bool {
        self.tables.contains_key(language)
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// First supported language among `preferences`, else the default.
    /// Region subtags are ignored, so `es-AR` selects `es`.
    pub fn locale<'a, I, S>(&'a self, preferences: I) -> Locale<'a>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tables = &self.tables;
        let language = preferences
            .into_iter()
            .find_map(move |preference| {
                let tag = preference.as_ref().trim().to_ascii_lowercase();
                let primary = tag.split(['-', '_']).next().unwrap_or_default();
                tables
                    .get_key_value(primary)
                    .map(|(language, _)| language.as_str())
            })
            .unwrap_or(self.default_language.as_str());
        Locale {
            i18n: self,
            language,
        }
    }

    pub fn languages(&self) -> Vec<String> {
        let mut languages: Vec<String> = self.tables.keys().cloned().collect();
        languages.sort();
        languages
    }

    fn lookup(&self, language: &str, key: &str) -> Option<&str> {
        [language, FALLBACK_LANGUAGE]
            .iter()
            .find_map(|lang| self.tables.get(*lang).and_then(|table| table.get(key)))
            .map(String::as_str)
    }
}

/// Key based string lookup in one language, with `{{name}}` interpolation.
/// Missing keys fall back to English, then to the key itself.
#[derive(Clone, Copy)]
pub struct Locale<'a> {
    i18n: &'a I18n,
    language: &'a str,
}

impl<'a> Locale<'a> {
    pub fn language(&self) -> &'a str {
        self.language
    }

    pub fn languages(&self) -> Vec<String> {
        self.i18n.languages()
    }

    pub fn t(&self, key: &str) -> String {
        self.t_with(key, &[])
    }

    pub fn t_with(&self, key: &str, args: &[(&str, &str)]) -> String {
        let template = self.i18n.lookup(self.language, key).unwrap_or(key);
        args.iter().fold(template.to_string(), |text, (name, value)| {
            text.replace(&format!("{{{{{}}}}}", name), value)
        })
    }
}
