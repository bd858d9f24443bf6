//! Column catalog of a result set
//!
//! Columns are numbered from 1 in declaration order. Index 0 is the feature
//! pseudo-column, which yields the row's geometry; it can be looked up by
//! label but is not counted and has no metadata.

use crate::types::{ColumnType, FieldDescriptor};
use crate::{Result, ShapeError};
use ahash::AHashMap;

pub struct ColumnCatalog {
    table_name: String,
    shape_type_name: String,
    feature_label: String,
    fields: Vec<FieldDescriptor>,
    /// ASCII lower-cased label → 1-based index
    by_label: AHashMap<String, usize>,
}

impl ColumnCatalog {
    pub fn new(
        table_name: impl Into<String>,
        shape_type_name: impl Into<String>,
        feature_label: impl Into<String>,
        fields: Vec<FieldDescriptor>,
    ) -> Self {
        let mut by_label = AHashMap::with_capacity(fields.len());
        for (i, field) in fields.iter().enumerate() {
            // First declaration wins on duplicate names
            by_label.entry(field.name.to_ascii_lowercase()).or_insert(i + 1);
        }
        Self {
            table_name: table_name.into(),
            shape_type_name: shape_type_name.into(),
            feature_label: feature_label.into(),
            fields,
            by_label,
        }
    }

    /// Attribute columns, excluding the feature pseudo-column
    pub fn column_count(&self) -> usize {
        self.fields.len()
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn shape_type_name(&self) -> &str {
        &self.shape_type_name
    }

    pub fn feature_label(&self) -> &str {
        &self.feature_label
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Descriptor of column `index` (1-based)
    pub fn descriptor(&self, index: usize) -> Result<&FieldDescriptor> {
        index
            .checked_sub(1)
            .and_then(|i| self.fields.get(i))
            .ok_or(ShapeError::InvalidColumn {
                index,
                count: self.fields.len(),
            })
    }

    pub fn column_label(&self, index: usize) -> Result<&str> {
        Ok(&self.descriptor(index)?.name)
    }

    pub fn column_name(&self, index: usize) -> Result<&str> {
        self.column_label(index)
    }

    pub fn column_type(&self, index: usize) -> Result<ColumnType> {
        Ok(self.descriptor(index)?.column_type())
    }

    /// Declared dBase type code, e.g. `"C"` or `"N"`
    pub fn column_type_name(&self, index: usize) -> Result<String> {
        Ok(self.descriptor(index)?.field_type.code().to_string())
    }

    /// Value type of non-null cells; `None` for unclassified columns
    pub fn column_class_name(&self, index: usize) -> Result<Option<&'static str>> {
        Ok(self.column_type(index)?.class_name())
    }

    /// Declared width
    pub fn precision(&self, index: usize) -> Result<usize> {
        Ok(self.descriptor(index)?.length as usize)
    }

    /// Declared decimal digits
    pub fn scale(&self, index: usize) -> Result<usize> {
        Ok(self.descriptor(index)?.decimals as usize)
    }

    pub fn is_read_only(&self, index: usize) -> Result<bool> {
        self.descriptor(index).map(|_| true)
    }

    pub fn is_writable(&self, index: usize) -> Result<bool> {
        self.descriptor(index).map(|_| false)
    }

    /// Case-insensitive label lookup; the feature label resolves to 0
    pub fn find_column(&self, label: &str) -> Result<usize> {
        if label.eq_ignore_ascii_case(&self.feature_label) {
            return Ok(0);
        }
        self.by_label
            .get(&label.to_ascii_lowercase())
            .copied()
            .ok_or_else(|| ShapeError::ColumnNotFound(label.to_string()))
    }

    /// Label for `index`, including the feature pseudo-column at 0
    pub fn column_label_at(&self, index: usize) -> Result<&str> {
        if index == 0 {
            return Ok(&self.feature_label);
        }
        self.column_label(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldType;

    fn catalog() -> ColumnCatalog {
        ColumnCatalog::new(
            "rivers",
            "PolyLine",
            "GIS_FEATURE",
            vec![
                FieldDescriptor::new("NAME", FieldType::Char, 40, 0),
                FieldDescriptor::new("LENGTH", FieldType::Number, 12, 3),
                FieldDescriptor::new("RANK", FieldType::Number, 4, 0),
                FieldDescriptor::new("MEMO", FieldType::Other('M'), 10, 0),
            ],
        )
    }

    #[test]
    fn test_metadata() {
        let catalog = catalog();
        assert_eq!(catalog.column_count(), 4);
        assert_eq!(catalog.table_name(), "rivers");
        assert_eq!(catalog.shape_type_name(), "PolyLine");
        assert_eq!(catalog.column_label(1).unwrap(), "NAME");
        assert_eq!(catalog.column_name(2).unwrap(), "LENGTH");
        assert_eq!(catalog.column_type(2).unwrap(), ColumnType::Double);
        assert_eq!(catalog.column_type(3).unwrap(), ColumnType::Integer);
        assert_eq!(catalog.column_type_name(2).unwrap(), "N");
        assert_eq!(catalog.column_class_name(1).unwrap(), Some("String"));
        assert_eq!(catalog.column_class_name(4).unwrap(), None);
        assert_eq!(catalog.precision(2).unwrap(), 12);
        assert_eq!(catalog.scale(2).unwrap(), 3);
        assert!(catalog.is_read_only(1).unwrap());
        assert!(!catalog.is_writable(1).unwrap());
    }

    #[test]
    fn test_invalid_index() {
        let catalog = catalog();
        for index in [0, 5, 100] {
            match catalog.column_type(index) {
                Err(ShapeError::InvalidColumn { index: i, count }) => {
                    assert_eq!(i, index);
                    assert_eq!(count, 4);
                }
                other => panic!("expected InvalidColumn, got {:?}", other),
            }
        }
        assert!(catalog.is_read_only(0).is_err());
    }

    #[test]
    fn test_find_column() {
        let catalog = catalog();
        assert_eq!(catalog.find_column("GIS_FEATURE").unwrap(), 0);
        assert_eq!(catalog.find_column("gis_feature").unwrap(), 0);
        assert_eq!(catalog.find_column("rank").unwrap(), 3);
        assert!(matches!(
            catalog.find_column("DEPTH"),
            Err(ShapeError::ColumnNotFound(name)) if name == "DEPTH"
        ));
        assert_eq!(catalog.column_label_at(0).unwrap(), "GIS_FEATURE");
        assert_eq!(catalog.column_label_at(1).unwrap(), "NAME");
    }

    #[test]
    fn test_duplicate_names_resolve_to_first() {
        let catalog = ColumnCatalog::new(
            "dups",
            "Point",
            "GIS_FEATURE",
            vec![
                FieldDescriptor::new("ID", FieldType::Number, 4, 0),
                FieldDescriptor::new("id", FieldType::Char, 4, 0),
            ],
        );
        assert_eq!(catalog.find_column("Id").unwrap(), 1);
    }

    #[test]
    fn test_lookup_folds_ascii_only() {
        use crate::types::{AttributeRow, Value};

        let catalog = ColumnCatalog::new(
            "régions",
            "Polygon",
            "GIS_FEATURE",
            vec![FieldDescriptor::new("ÉTAT", FieldType::Char, 8, 0)],
        );
        let mut row = AttributeRow::new();
        row.insert("ÉTAT", Value::Text("actif".into()));

        // Non-ASCII letters must match exactly, the rest fold
        assert_eq!(catalog.find_column("État").unwrap(), 1);
        assert!(row.get("État").is_some());
        assert!(catalog.find_column("état").is_err());
        assert!(row.get("état").is_none());
    }
}
