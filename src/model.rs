use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locale {
    En,
    No,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::En, Locale::No];
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Locale::En => "English",
            Locale::No => "Norwegian",
        })
    }
}

/// Raw program search responses, one bucket per locale. A locale that
/// failed to fetch is an empty object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramCatalog {
    #[serde(default = "empty_bucket")]
    pub en: Value,
    #[serde(default = "empty_bucket")]
    pub no: Value,
}

fn empty_bucket() -> Value {
    Value::Object(Map::new())
}

impl Default for ProgramCatalog {
    fn default() -> Self {
        Self {
            en: empty_bucket(),
            no: empty_bucket(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LocaleBucket {
    #[serde(default)]
    docs: Option<Vec<Program>>,
}

impl ProgramCatalog {
    pub fn bucket(&self, locale: Locale) -> &Value {
        match locale {
            Locale::En => &self.en,
            Locale::No => &self.no,
        }
    }

    pub fn set_bucket(&mut self, locale: Locale, value: Value) {
        match locale {
            Locale::En => self.en = value,
            Locale::No => self.no = value,
        }
    }

    /// Every document of `en` then `no`, in file order.
    pub fn programs(&self) -> Result<Vec<Program>> {
        let mut programs = Vec::new();

        for locale in Locale::ALL {
            let bucket = self.bucket(locale);
            if bucket.is_null() {
                continue;
            }
            let bucket = LocaleBucket::deserialize(bucket)
                .with_context(|| format!("Invalid {} program bucket", locale))?;
            programs.extend(bucket.docs.unwrap_or_default());
        }

        Ok(programs)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    #[serde(deserialize_with = "lenient::required_string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub studyprog_code: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub studyprog_name: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub studyprog_study_level: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub studyprog_study_level_code: Option<String>,
}

/// One timetable course. `_und` fields bound the teaching period, `_ex`
/// fields the examination period.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Course {
    #[serde(deserialize_with = "lenient::required_string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient::int")]
    pub ownerid: Option<i32>,
    #[serde(deserialize_with = "lenient::boolean")]
    pub showtype: Option<bool>,
    #[serde(deserialize_with = "lenient::string")]
    pub detailtype: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub name_en: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub name_nn: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub coursetype: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub tpsort: Option<String>,
    #[serde(deserialize_with = "lenient::boolean")]
    pub showdiscipline: Option<bool>,
    #[serde(deserialize_with = "lenient::string")]
    pub campusid: Option<String>,
    #[serde(deserialize_with = "lenient::int")]
    pub yearfrom_und: Option<i32>,
    #[serde(deserialize_with = "lenient::string")]
    pub seasonfrom_und: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub yearto_und: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub seasonto_und: Option<String>,
    #[serde(deserialize_with = "lenient::int")]
    pub yearfrom_ex: Option<i32>,
    #[serde(deserialize_with = "lenient::string")]
    pub seasonfrom_ex: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub yearto_ex: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub seasonto_ex: Option<String>,
    #[serde(deserialize_with = "lenient::int")]
    pub departmentid_secondary: Option<i32>,
    #[serde(deserialize_with = "lenient::boolean")]
    pub create_activity_zoom: Option<bool>,
    #[serde(deserialize_with = "lenient::string")]
    pub authorized_netgroups: Option<String>,
    #[serde(deserialize_with = "lenient::boolean")]
    pub tpn_copy_daytime: Option<bool>,
    #[serde(deserialize_with = "lenient::int")]
    pub nofterms: Option<i32>,
    #[serde(deserialize_with = "lenient::int")]
    pub terminnr: Option<i32>,
    #[serde(deserialize_with = "lenient::string")]
    pub fullname: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub fullname_en: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub fullname_nn: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub idtermin: Option<String>,
}

pub fn courses_from_values(values: &[Value]) -> Result<Vec<Course>> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            Course::deserialize(value).with_context(|| format!("Invalid course at index {}", index))
        })
        .collect()
}

// The upstream feeds mix numbers, numeric strings and 0/1 flags freely.
// Blank numeric and flag values store NULL; blank text is kept as is.
mod lenient {
    use serde::de::{Deserializer, Error};
    use serde::Deserialize;
    use serde_json::Value;

    pub fn required_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        match string(d)? {
            Some(s) if !s.is_empty() => Ok(s),
            _ => Err(D::Error::custom("identifier is null or empty")),
        }
    }

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            Value::Number(n) => Ok(Some(n.to_string())),
            Value::Bool(b) => Ok(Some(b.to_string())),
            other => Err(D::Error::custom(format!("expected string, found {}", other))),
        }
    }

    pub fn int<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i32>, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(None),
            Value::Number(n) => n
                .as_i64()
                .and_then(|v| i32::try_from(v).ok())
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("expected integer, found {}", n))),
            Value::String(s) if s.trim().is_empty() => Ok(None),
            Value::String(s) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("expected integer, found {:?}", s))),
            other => Err(D::Error::custom(format!("expected integer, found {}", other))),
        }
    }

    pub fn boolean<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(None),
            Value::Bool(b) => Ok(Some(b)),
            Value::Number(n) => match n.as_i64() {
                Some(0) => Ok(Some(false)),
                Some(1) => Ok(Some(true)),
                _ => Err(D::Error::custom(format!("expected boolean, found {}", n))),
            },
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "" => Ok(None),
                "1" | "t" | "true" => Ok(Some(true)),
                "0" | "f" | "false" => Ok(Some(false)),
                _ => Err(D::Error::custom(format!("expected boolean, found {:?}", s))),
            },
            other => Err(D::Error::custom(format!("expected boolean, found {}", other))),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use serde_json::{Value, json};

    pub fn program(id: &str, title: &str) -> Value {
        json!({
            "id": id,
            "title": title,
            "studyprogCode": id.split('_').next().unwrap_or(id),
            "studyprogName": title,
            "studyprogStudyLevel": "Master",
            "studyprogStudyLevelCode": "500"
        })
    }

    pub fn course(id: &str, name: &str) -> Value {
        json!({
            "id": id,
            "name": name,
            "ownerid": 194,
            "showtype": true,
            "detailtype": "",
            "name_en": name,
            "name_nn": "",
            "coursetype": "emne",
            "tpsort": id,
            "showdiscipline": false,
            "campusid": "gloshaugen",
            "yearfrom_und": 2024,
            "seasonfrom_und": "h",
            "yearto_und": "2025",
            "seasonto_und": "v",
            "yearfrom_ex": 2024,
            "seasonfrom_ex": "h",
            "yearto_ex": "2025",
            "seasonto_ex": "v",
            "departmentid_secondary": null,
            "create_activity_zoom": false,
            "authorized_netgroups": null,
            "tpn_copy_daytime": false,
            "nofterms": 1,
            "terminnr": 1,
            "fullname": format!("{} {}", id, name),
            "fullname_en": null,
            "fullname_nn": null,
            "idtermin": format!("{}-1", id)
        })
    }
}
