pub mod converter;

use std::{any::Any, fs, path::Path, sync::Arc};

use ahash::RandomState;
use common::{DbError, DbResult};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use types::{SqlType, Value};

pub use converter::{AttributeConverter, EnumName, EnumToNameConverter, ValueConverter};

type Map<K, V> = HashMap<K, V, RandomState>;

/// Persistent set of table descriptors, keyed by table name.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Catalog {
    tables: Vec<TableDescriptor>,
    #[serde(skip)]
    #[serde(default)]
    table_name_index: Map<String, usize>,
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self {
            tables: Vec::new(),
            table_name_index: Map::default(),
        }
    }

    /// Load a catalog from disk, returning an empty catalog if the file does not exist.
    ///
    /// Converters are not persisted; attach them again with
    /// [`TableDescriptor::with_converter`] after loading.
    pub fn load(path: &Path) -> DbResult<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let data = fs::read_to_string(path)?;
        let mut catalog: Catalog = serde_json::from_str(&data)
            .map_err(|err| DbError::Catalog(format!("invalid catalog file: {err}")))?;
        for table in &catalog.tables {
            table.validate()?;
        }
        catalog.rebuild_indexes()?;
        Ok(catalog)
    }

    /// Persist the catalog contents as pretty JSON.
    pub fn save(&self, path: &Path) -> DbResult<()> {
        let data = serde_json::to_string_pretty(self)
            .map_err(|err| DbError::Catalog(format!("serialize failed: {err}")))?;
        fs::write(path, data)?;
        Ok(())
    }

    /// Returns an immutable reference to a table by name.
    pub fn table(&self, name: &str) -> DbResult<&TableDescriptor> {
        let idx = self
            .table_name_index
            .get(name)
            .copied()
            .ok_or_else(|| DbError::Catalog(format!("unknown table '{name}'")))?;
        self.tables
            .get(idx)
            .ok_or_else(|| DbError::Catalog(format!("unknown table '{name}'")))
    }

    /// Register a table descriptor.
    pub fn register(&mut self, table: TableDescriptor) -> DbResult<()> {
        if self.table_name_index.contains_key(table.name()) {
            return Err(DbError::Catalog(format!(
                "table '{}' already exists",
                table.name()
            )));
        }
        self.table_name_index
            .insert(table.name().to_string(), self.tables.len());
        self.tables.push(table);
        Ok(())
    }

    /// Remove a table descriptor.
    pub fn drop_table(&mut self, name: &str) -> DbResult<()> {
        let idx = self
            .table_name_index
            .get(name)
            .copied()
            .ok_or_else(|| DbError::Catalog(format!("unknown table '{name}'")))?;
        self.tables.remove(idx);
        self.rebuild_indexes()
    }

    /// Immutable iterator over all tables.
    pub fn tables(&self) -> impl Iterator<Item = &TableDescriptor> {
        self.tables.iter()
    }

    fn rebuild_indexes(&mut self) -> DbResult<()> {
        self.table_name_index.clear();
        for (idx, table) in self.tables.iter().enumerate() {
            if self
                .table_name_index
                .insert(table.name.clone(), idx)
                .is_some()
            {
                return Err(DbError::Catalog(format!(
                    "duplicate table '{}' in catalog",
                    table.name
                )));
            }
        }
        Ok(())
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Table name plus its ordered column layout.
///
/// Built once per table and reused by every builder session on that table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TableDescriptor {
    name: String,
    columns: Vec<ColumnSpec>,
}

impl TableDescriptor {
    pub fn try_new(name: impl Into<String>, columns: Vec<ColumnSpec>) -> DbResult<Self> {
        let table = Self {
            name: name.into(),
            columns,
        };
        table.validate()?;
        Ok(table)
    }

    fn validate(&self) -> DbResult<()> {
        if self.name.trim().is_empty() {
            return Err(DbError::Catalog("table name must not be blank".into()));
        }
        if self.columns.is_empty() {
            return Err(DbError::Catalog(format!(
                "table '{}' must contain at least one column",
                self.name
            )));
        }
        for (idx, column) in self.columns.iter().enumerate() {
            if self.columns[..idx].iter().any(|c| c.name == column.name) {
                return Err(DbError::Catalog(format!(
                    "duplicate column '{}' found while building table '{}'",
                    column.name, self.name
                )));
            }
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Like [`TableDescriptor::column`] but fails for unknown names.
    pub fn require_column(&self, name: &str) -> DbResult<&ColumnSpec> {
        self.column(name).ok_or_else(|| DbError::UnknownColumn {
            table: self.name.clone(),
            column: name.to_string(),
        })
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Attach a converter to an existing column.
    pub fn with_converter(
        mut self,
        column: &str,
        converter: impl ValueConverter + 'static,
    ) -> DbResult<Self> {
        let table = self.name.clone();
        let spec = self
            .columns
            .iter_mut()
            .find(|c| c.name == column)
            .ok_or_else(|| DbError::UnknownColumn {
                table,
                column: column.to_string(),
            })?;
        spec.converter = Some(Arc::new(converter));
        Ok(self)
    }
}

/// Describes one column: its name, declared type and optional converter.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub ty: SqlType,
    #[serde(skip)]
    #[serde(default)]
    converter: Option<Arc<dyn ValueConverter>>,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, ty: SqlType) -> Self {
        Self {
            name: name.into(),
            ty,
            converter: None,
        }
    }

    pub fn with_converter(mut self, converter: impl ValueConverter + 'static) -> Self {
        self.converter = Some(Arc::new(converter));
        self
    }

    pub fn converter(&self) -> Option<&dyn ValueConverter> {
        self.converter.as_deref()
    }

    /// Turns a value handed to a column setter into the stored scalar.
    ///
    /// With a converter the attribute must be of the converter's attribute
    /// type. Without one it must already be a [`Value`].
    pub fn to_column_value(&self, attribute: &dyn Any) -> DbResult<Value> {
        match &self.converter {
            Some(converter) => converter.convert(attribute),
            None => attribute.downcast_ref::<Value>().cloned().ok_or_else(|| {
                DbError::Conversion(format!(
                    "column '{}' has no converter and expects a plain value",
                    self.name
                ))
            }),
        }
    }
}

impl PartialEq for ColumnSpec {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.ty == other.ty
            && self.converter().map(|c| c.name()) == other.converter().map(|c| c.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    struct Level(u8);

    struct LevelConverter;

    impl AttributeConverter for LevelConverter {
        type Attribute = Level;

        fn to_column(&self, attribute: &Level) -> DbResult<Value> {
            Ok(Value::SmallInt(i16::from(attribute.0)))
        }

        fn to_attribute(&self, column: &Value) -> DbResult<Level> {
            Err(DbError::UnsupportedReverseConversion(format!("{column:?}")))
        }
    }

    fn sample_columns() -> Vec<ColumnSpec> {
        vec![
            ColumnSpec::new("id", SqlType::Int),
            ColumnSpec::new("name", SqlType::Text),
            ColumnSpec::new("level", SqlType::SmallInt),
        ]
    }

    #[test]
    fn register_and_lookup_table() {
        let mut catalog = Catalog::new();
        catalog
            .register(TableDescriptor::try_new("users", sample_columns()).unwrap())
            .unwrap();

        let table = catalog.table("users").unwrap();
        assert_eq!(table.name(), "users");
        assert_eq!(table.column("name").map(|c| c.ty), Some(SqlType::Text));
        assert_eq!(
            table.column_names().collect::<Vec<_>>(),
            vec!["id", "name", "level"]
        );
    }

    #[test]
    fn rejects_duplicate_tables() {
        let mut catalog = Catalog::new();
        let users = TableDescriptor::try_new("users", sample_columns()).unwrap();
        catalog.register(users.clone()).unwrap();
        let err = catalog.register(users).unwrap_err();

        assert!(matches!(err, DbError::Catalog(_)));
        assert!(format!("{err}").contains("already exists"));
    }

    #[test]
    fn rejects_duplicate_and_missing_columns() {
        let err = TableDescriptor::try_new(
            "bad",
            vec![
                ColumnSpec::new("id", SqlType::Int),
                ColumnSpec::new("id", SqlType::Int),
            ],
        )
        .unwrap_err();
        assert!(format!("{err}").contains("duplicate column"));

        let err = TableDescriptor::try_new("empty", vec![]).unwrap_err();
        assert!(format!("{err}").contains("at least one column"));
    }

    #[test]
    fn unknown_columns_are_reported() {
        let table = TableDescriptor::try_new("users", sample_columns()).unwrap();
        let err = table.require_column("missing").unwrap_err();
        assert!(matches!(err, DbError::UnknownColumn { .. }));

        let err = table
            .with_converter("missing", LevelConverter)
            .unwrap_err();
        assert!(format!("{err}").contains("unknown column 'missing'"));
    }

    #[test]
    fn column_value_goes_through_converter() {
        let table = TableDescriptor::try_new("users", sample_columns())
            .unwrap()
            .with_converter("level", LevelConverter)
            .unwrap();

        let level = table.column("level").unwrap();
        assert_eq!(
            level.to_column_value(&Level(3)).unwrap(),
            Value::SmallInt(3)
        );
        assert!(level.to_column_value(&Value::Int(3)).is_err());

        let id = table.column("id").unwrap();
        assert_eq!(id.to_column_value(&Value::Int(3)).unwrap(), Value::Int(3));
        assert!(id.to_column_value(&Level(3)).is_err());
    }

    #[test]
    fn persistence_round_trip() {
        let mut catalog = Catalog::new();
        catalog
            .register(TableDescriptor::try_new("users", sample_columns()).unwrap())
            .unwrap();

        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        catalog.save(&path).unwrap();

        let loaded = Catalog::load(&path).unwrap();
        let table = loaded.table("users").unwrap();
        assert_eq!(table.columns(), catalog.table("users").unwrap().columns());
    }

    #[test]
    fn loading_a_missing_file_yields_empty_catalog() {
        let dir = tempdir().unwrap();
        let catalog = Catalog::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(catalog.tables().count(), 0);
    }

    #[test]
    fn drop_table_removes_metadata() {
        let mut catalog = Catalog::new();
        for name in ["users", "orders"] {
            catalog
                .register(TableDescriptor::try_new(name, sample_columns()).unwrap())
                .unwrap();
        }

        catalog.drop_table("users").unwrap();
        assert!(catalog.table("users").is_err());
        assert_eq!(catalog.table("orders").unwrap().name(), "orders");
    }
}
