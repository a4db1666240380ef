//! Notification messages in the supported languages.

use std::{fmt, str::FromStr};

use serde::Deserialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum Locale {
    #[default]
    En,
    It,
}

#[derive(Debug, thiserror::Error)]
#[error("unsupported locale: {0}")]
pub struct UnknownLocale(String);

impl FromStr for Locale {
    type Err = UnknownLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept region-qualified tags such as `it-IT`
        let language = s.split(['-', '_']).next().unwrap_or_default();
        match language.to_ascii_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "it" => Ok(Locale::It),
            _ => Err(UnknownLocale(s.to_string())),
        }
    }
}

impl TryFrom<String> for Locale {
    type Error = UnknownLocale;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageKey {
    UpdateSuccess,
    UpdateError,
    InsertSuccess,
    InsertError,
    DeleteSuccess,
    DeleteError,
    ImportSuccess,
    ImportError,
    InvalidFileType,
}

impl MessageKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKey::UpdateSuccess => "members.updateSuccess",
            MessageKey::UpdateError => "members.updateError",
            MessageKey::InsertSuccess => "members.insertSuccess",
            MessageKey::InsertError => "members.insertError",
            MessageKey::DeleteSuccess => "members.deleteSuccess",
            MessageKey::DeleteError => "members.deleteError",
            MessageKey::ImportSuccess => "cards.importSuccess",
            MessageKey::ImportError => "cards.importError",
            MessageKey::InvalidFileType => "cards.invalidFileType",
        }
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn template(locale: Locale, key: MessageKey) -> &'static str {
    use MessageKey::*;
    match (locale, key) {
        (Locale::En, UpdateSuccess) => "{{name}} updated successfully",
        (Locale::En, UpdateError) => "Could not update {{name}}",
        (Locale::En, InsertSuccess) => "{{name}} added successfully",
        (Locale::En, InsertError) => "Could not add {{name}}",
        (Locale::En, DeleteSuccess) => "{{name}} deleted",
        (Locale::En, DeleteError) => "Could not delete {{name}}",
        (Locale::En, ImportSuccess) => "Card numbers imported successfully",
        (Locale::En, ImportError) => "Card import failed: {{error}}",
        (Locale::En, InvalidFileType) => "Please select an Excel file (.xlsx or .xls)",
        (Locale::It, UpdateSuccess) => "{{name}} aggiornato con successo",
        (Locale::It, UpdateError) => "Impossibile aggiornare {{name}}",
        (Locale::It, InsertSuccess) => "{{name}} aggiunto con successo",
        (Locale::It, InsertError) => "Impossibile aggiungere {{name}}",
        (Locale::It, DeleteSuccess) => "{{name}} eliminato",
        (Locale::It, DeleteError) => "Impossibile eliminare {{name}}",
        (Locale::It, ImportSuccess) => "Numeri tessera importati con successo",
        (Locale::It, ImportError) => "Importazione tessere non riuscita: {{error}}",
        (Locale::It, InvalidFileType) => "Seleziona un file Excel (.xlsx o .xls)",
    }
}

/// Message catalog for one locale
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Catalog {
    locale: Locale,
}

impl Catalog {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Render `key`, replacing `{{placeholder}}` occurrences with the matching argument
    ///
    /// Placeholders without an argument are left as they are.
    pub fn message(&self, key: MessageKey, args: &[(&str, &str)]) -> String {
        args.iter()
            .fold(template(self.locale, key).to_string(), |text, (name, value)| {
                text.replace(&format!("{{{{{name}}}}}"), value)
            })
    }
}
