use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{GenError, GenResult};
use crate::items::Schema;

/// Parses a `{ "tables": [...] }` document.
pub fn parse_schema(json: &str) -> Result<Schema, serde_json::Error> {
    serde_json::from_str(json)
}

pub fn load_schema<P: AsRef<Path>>(path: P) -> GenResult<Schema> {
    let path = path.as_ref();
    let failed = |reason: String| GenError::DataSource {
        path: path.display().to_string(),
        reason,
    };

    let json = fs::read_to_string(path).map_err(|err| failed(err.to_string()))?;
    let schema = parse_schema(&json).map_err(|err| failed(err.to_string()))?;

    debug!(path = %path.display(), tables = schema.tables.len(), "loaded data source");
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::TableDefinition;

    #[test]
    fn reads_tables_in_order() {
        let schema = parse_schema(
            r#"{
                "tables": [
                    {
                        "name": "Orders",
                        "columns": [
                            { "name": "Id", "type": "int", "primary_key": true },
                            { "name": "ShippedAt", "type": "datetime", "nullable": true }
                        ]
                    },
                    { "name": "Empty" }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(
            schema.tables,
            vec![
                TableDefinition::new("Orders")
                    .primary_key("Id", "int")
                    .column("ShippedAt", "datetime", true),
                TableDefinition::new("Empty"),
            ]
        );
    }

    #[test]
    fn reports_bad_documents_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        fs::write(&path, r#"{ "tables": [ { "columns": [] } ] }"#).unwrap();

        let err = load_schema(&path).unwrap_err();
        assert!(matches!(err, GenError::DataSource { ref reason, .. } if reason.contains("name")));

        assert!(matches!(
            load_schema(dir.path().join("missing.json")),
            Err(GenError::DataSource { .. })
        ));
    }
}
