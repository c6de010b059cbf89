use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,

    // Database type as written in the schema, e.g. "nvarchar(50)"
    #[serde(rename = "type", alias = "data_type")]
    pub data_type: String,

    #[serde(default)]
    pub nullable: bool,

    #[serde(default)]
    pub primary_key: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TableDefinition {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<ColumnDefinition>,
}

impl TableDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: vec![],
        }
    }

    pub fn column(
        mut self,
        name: impl Into<String>,
        data_type: impl Into<String>,
        nullable: bool,
    ) -> Self {
        self.columns.push(ColumnDefinition {
            name: name.into(),
            data_type: data_type.into(),
            nullable,
            primary_key: false,
        });
        self
    }

    pub fn primary_key(mut self, name: impl Into<String>, data_type: impl Into<String>) -> Self {
        self.columns.push(ColumnDefinition {
            name: name.into(),
            data_type: data_type.into(),
            nullable: false,
            primary_key: true,
        });
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Schema {
    pub tables: Vec<TableDefinition>,
}
