//! Service definition: the resource hierarchy and access-type catalog a
//! policy is written against.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Definition of a service's resource kinds and access types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDef {
    pub name: String,

    #[serde(default)]
    pub resources: Vec<ResourceDef>,

    #[serde(default)]
    pub access_types: Vec<AccessTypeDef>,
}

/// A resource kind and its position in the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDef {
    pub name: String,

    /// 0 is the most general kind; larger levels are more specific.
    #[serde(default)]
    pub level: i32,
}

/// An access type supported by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTypeDef {
    pub name: String,
}

impl ServiceDef {
    /// Create a service definition with no resources or access types.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Decode a service definition from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::Json`](crate::VigilError::Json) if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Add a resource kind at the given hierarchy level.
    #[must_use]
    pub fn with_resource(mut self, name: impl Into<String>, level: i32) -> Self {
        self.resources.push(ResourceDef {
            name: name.into(),
            level,
        });
        self
    }

    /// Add access types to the catalog.
    #[must_use]
    pub fn with_access_types<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.access_types
            .extend(names.into_iter().map(|name| AccessTypeDef { name: name.into() }));
        self
    }

    /// Hierarchy level of a resource kind, if the service defines it.
    ///
    /// The first definition wins when a name is listed twice.
    #[must_use]
    pub fn resource_level(&self, name: &str) -> Option<i32> {
        self.resources
            .iter()
            .find(|def| def.name == name)
            .map(|def| def.level)
    }

    /// Iterate over the names in the access-type catalog.
    pub fn access_type_names(&self) -> impl Iterator<Item = &str> {
        self.access_types.iter().map(|def| def.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_level_lookup() {
        let def = ServiceDef::new("hive")
            .with_resource("database", 10)
            .with_resource("table", 20)
            .with_resource("table", 99);

        assert_eq!(def.resource_level("database"), Some(10));
        assert_eq!(def.resource_level("table"), Some(20));
        assert_eq!(def.resource_level("udf"), None);
    }

    #[test]
    fn test_from_json() {
        let def = ServiceDef::from_json(
            r#"{
                "name": "hdfs",
                "resources": [{"name": "path", "level": 10}],
                "accessTypes": [{"name": "read"}, {"name": "write"}, {"name": "execute"}]
            }"#,
        )
        .unwrap();

        assert_eq!(def.resource_level("path"), Some(10));
        assert_eq!(
            def.access_type_names().collect::<Vec<_>>(),
            vec!["read", "write", "execute"]
        );
    }
}
