use crate::custom_value;
use crate::field::{BoxError, CustomValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Deref;

/// String to string map bound from a JSON object literal
///
/// ```text
/// labels: MapObject   #[config(r#"default={"team":"core"}"#)]
/// --labels '{"team":"edge","tier":"1"}'
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MapObject(pub BTreeMap<String, String>);

impl CustomValue for MapObject {
    fn render(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_default()
    }

    fn parse_str(&mut self, raw: &str) -> Result<(), BoxError> {
        if raw.trim().is_empty() {
            self.0.clear();
            return Ok(());
        }
        self.0 = serde_json::from_str(raw)?;
        Ok(())
    }

    fn type_tag(&self) -> &'static str {
        "mapObject"
    }
}

custom_value!(MapObject);

impl Deref for MapObject {
    type Target = BTreeMap<String, String>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapObject {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
