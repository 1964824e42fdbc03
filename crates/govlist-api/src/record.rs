use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

pub const FIELD_ID: &str = "id";
pub const FIELD_NAME: &str = "name";
pub const FIELD_ORGANIZATION: &str = "organizationName";
pub const FIELD_REGION: &str = "regionCode";
pub const FIELD_CATEGORY: &str = "categoryCode";

/// One listing record, kept exactly as the upstream sent it
///
/// The raw object is what gets serialized back out, so nulls, number-typed
/// codes and unknown fields all survive the trip. The typed fields are read
/// out of it once at decode time for filtering. Only `id` is required;
/// everything else reads leniently, so a `null` name or a numeric region code
/// doesn't sink the record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct ListingRecord {
    id: i64,
    name: String,
    organization_name: Option<String>,
    region_code: Option<String>,
    category_code: Option<String>,
    raw: Map<String, Value>,
}

impl ListingRecord {
    /// Bare record with just an id and a name, handy for fixtures
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        let name = name.into();
        let mut raw = Map::new();
        raw.insert(FIELD_ID.to_string(), Value::from(id));
        raw.insert(FIELD_NAME.to_string(), Value::String(name.clone()));

        Self {
            id,
            name,
            organization_name: None,
            region_code: None,
            category_code: None,
            raw,
        }
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        let organization = organization.into();
        self.raw.insert(
            FIELD_ORGANIZATION.to_string(),
            Value::String(organization.clone()),
        );
        self.organization_name = Some(organization);
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        let region = region.into();
        self.raw
            .insert(FIELD_REGION.to_string(), Value::String(region.clone()));
        self.region_code = Some(region);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        let category = category.into();
        self.raw
            .insert(FIELD_CATEGORY.to_string(), Value::String(category.clone()));
        self.category_code = Some(category);
        self
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn organization_name(&self) -> Option<&str> {
        self.organization_name.as_deref()
    }

    pub fn region_code(&self) -> Option<&str> {
        self.region_code.as_deref()
    }

    pub fn category_code(&self) -> Option<&str> {
        self.category_code.as_deref()
    }

    /// Any field, typed or not, as the upstream sent it
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }
}

impl TryFrom<Map<String, Value>> for ListingRecord {
    type Error = String;

    fn try_from(raw: Map<String, Value>) -> Result<Self, Self::Error> {
        let id = match raw.get(FIELD_ID) {
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
        .ok_or_else(|| format!("record has no numeric `{}`", FIELD_ID))?;

        Ok(Self {
            id,
            name: text_field(&raw, FIELD_NAME).unwrap_or_default(),
            organization_name: text_field(&raw, FIELD_ORGANIZATION),
            region_code: text_field(&raw, FIELD_REGION),
            category_code: text_field(&raw, FIELD_CATEGORY),
            raw,
        })
    }
}

impl Serialize for ListingRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

/// Strings as-is, numbers in their JSON spelling, anything else as absent
fn text_field(raw: &Map<String, Value>, key: &str) -> Option<String> {
    match raw.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
