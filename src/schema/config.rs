// src/schema/config.rs

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::Path};

use super::catalog;
use super::types::ColumnSchema;

/// Property key holding the comma-separated column names.
pub const LIST_COLUMNS: &str = "columns";
/// Property key holding the comma-separated column types.
pub const LIST_COLUMN_TYPES: &str = "columns.types";

/// The two declarations a decoder is configured with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchemaConfig {
    pub columns: String,
    #[serde(rename = "columns.types")]
    pub column_types: String,
}

impl SchemaConfig {
    /// Pull both keys out of a property map; either one missing is an error.
    pub fn from_properties(props: &HashMap<String, String>) -> Result<Self> {
        let columns = props
            .get(LIST_COLUMNS)
            .ok_or_else(|| anyhow!("missing property `{}`", LIST_COLUMNS))?;
        let column_types = props
            .get(LIST_COLUMN_TYPES)
            .ok_or_else(|| anyhow!("missing property `{}`", LIST_COLUMN_TYPES))?;
        Ok(Self {
            columns: columns.clone(),
            column_types: column_types.clone(),
        })
    }

    /// Load from a `.json`, `.yaml` or `.yml` file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading schema config {}", path.display()))?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("json") => serde_json::from_str(&text)
                .with_context(|| format!("parsing JSON schema config {}", path.display())),
            Some("yaml") | Some("yml") => serde_yaml::from_str(&text)
                .with_context(|| format!("parsing YAML schema config {}", path.display())),
            _ => Err(anyhow!(
                "unrecognised schema config extension for {} (expected .json, .yaml or .yml)",
                path.display()
            )),
        }
    }

    pub fn build_schema(&self) -> Result<ColumnSchema> {
        catalog::from_declarations(&self.columns, &self.column_types)
            .context("building column schema from config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PrimitiveType;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn from_properties_reads_both_keys() {
        let mut props = HashMap::new();
        props.insert("columns".to_string(), "a,b".to_string());
        props.insert("columns.types".to_string(), "int,string".to_string());

        let cfg = SchemaConfig::from_properties(&props).unwrap();
        let schema = cfg.build_schema().unwrap();
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.column(1).map(|c| c.ty), Some(PrimitiveType::String));
    }

    #[test]
    fn missing_property_is_an_error() {
        let mut props = HashMap::new();
        props.insert("columns".to_string(), "a".to_string());
        let err = SchemaConfig::from_properties(&props).unwrap_err();
        assert!(err.to_string().contains("columns.types"));
    }

    #[test]
    fn loads_json_and_yaml() -> Result<()> {
        let dir = tempdir()?;

        let json_path = dir.path().join("schema.json");
        let mut f = fs::File::create(&json_path)?;
        writeln!(f, r#"{{"columns": "id,name", "columns.types": "bigint,string"}}"#)?;

        let yaml_path = dir.path().join("schema.yaml");
        let mut f = fs::File::create(&yaml_path)?;
        writeln!(f, "columns: id,name")?;
        writeln!(f, "columns.types: bigint,string")?;

        let a = SchemaConfig::from_path(&json_path)?;
        let b = SchemaConfig::from_path(&yaml_path)?;
        assert_eq!(a, b);
        assert_eq!(a.build_schema()?.len(), 2);
        Ok(())
    }

    #[test]
    fn unknown_extension_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("schema.toml");
        fs::write(&path, "columns = 'a'")?;
        assert!(SchemaConfig::from_path(&path).is_err());
        Ok(())
    }

    #[test]
    fn mismatch_surfaces_through_config() {
        let cfg = SchemaConfig {
            columns: "a,b,c".into(),
            column_types: "int,int".into(),
        };
        let err = cfg.build_schema().unwrap_err();
        let root = err.downcast_ref::<crate::error::PgDumpError>();
        assert!(matches!(
            root,
            Some(crate::error::PgDumpError::SchemaMismatch { names: 3, types: 2 })
        ));
    }
}
