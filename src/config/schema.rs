use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;

use crate::sequence::UploadOrder;

/// Settings read from `~/.youtubegenrc`.
///
/// File format: INI
///
/// ```ini
/// [Login]
/// email = me@example.com
/// pass = secret
/// developer_key = AI39si...
///
/// [Settings]
/// keywords = punk, hardcore
/// always_playlist = true
/// skip_description = true
/// upload_order = sequenced
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileSettings {
    #[serde(alias = "Login")]
    pub login: LoginSection,
    #[serde(alias = "Settings")]
    pub settings: SettingsSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginSection {
    pub email: Option<String>,
    pub pass: Option<String>,
    pub developer_key: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SettingsSection {
    /// Keywords attached to every uploaded video.
    pub keywords: Option<String>,
    /// Group videos into a playlist even without `--playlist`.
    #[serde(deserialize_with = "lenient_flag")]
    pub always_playlist: bool,
    /// Upload with an empty description instead of prompting for one. A
    /// bare `skip_description =` counts as set.
    #[serde(deserialize_with = "presence_flag")]
    pub skip_description: bool,
    /// Overrides the default upload order.
    pub upload_order: Option<UploadOrder>,
}

const FALSE_WORDS: [&str; 4] = ["false", "no", "off", "0"];

/// Boolean read from free-form INI text. Only the usual "off" spellings are
/// false; `empty` is the value of a key with nothing after `=`.
struct FlagVisitor {
    empty: bool,
}

impl<'de> Visitor<'de> for FlagVisitor {
    type Value = bool;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a boolean or any text")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<bool, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<bool, E> {
        Ok(v != 0)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<bool, E> {
        Ok(v != 0)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<bool, E> {
        let v = v.trim();
        if v.is_empty() {
            return Ok(self.empty);
        }
        Ok(!FALSE_WORDS.iter().any(|word| v.eq_ignore_ascii_case(word)))
    }

    fn visit_unit<E: de::Error>(self) -> Result<bool, E> {
        Ok(self.empty)
    }

    fn visit_none<E: de::Error>(self) -> Result<bool, E> {
        Ok(self.empty)
    }
}

fn lenient_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    deserializer.deserialize_any(FlagVisitor { empty: false })
}

fn presence_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    deserializer.deserialize_any(FlagVisitor { empty: true })
}
