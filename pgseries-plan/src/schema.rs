use pgseries_types::{AutoFieldKind, DefaultBounds, SeriesColumnType, ValueColumnType};
use rustc_hash::FxHashMap;

pub const ID_COLUMN: &str = "id";
pub const TERM_COLUMN: &str = "term";
pub const VALUE_COLUMN: &str = "value";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeriesColumnKind {
    Identity(AutoFieldKind),
    Term(SeriesColumnType),
    Value(ValueColumnType),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesColumn {
    pub name: String,
    pub kind: SeriesColumnKind,
    pub is_primary_key: bool,
    pub precision: Option<u8>,
    pub scale: Option<u8>,
    pub default_bounds: Option<DefaultBounds>,
}

impl SeriesColumn {
    pub fn new(name: &str, kind: SeriesColumnKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            is_primary_key: false,
            precision: None,
            scale: None,
            default_bounds: None,
        }
    }

    /// PostgreSQL type of the column, with precision and scale for numerics.
    pub fn sql_type(&self) -> String {
        let base = match self.kind {
            SeriesColumnKind::Identity(kind) => kind.pg_type(),
            SeriesColumnKind::Term(ty) => ty.pg_type(),
            SeriesColumnKind::Value(ty) => ty.pg_type(),
        };
        match (base, self.precision, self.scale) {
            ("numeric", Some(p), Some(s)) => format!("numeric({p}, {s})"),
            ("numeric", Some(p), None) => format!("numeric({p})"),
            _ => base.to_string(),
        }
    }

    pub fn is_range(&self) -> bool {
        matches!(self.kind, SeriesColumnKind::Term(ty) if ty.is_range())
    }
}

/// Memoized shape of a series relation: an optional `id` column, the `term`
/// column, and a `value` column when the series is composed.
#[derive(Debug, Clone)]
pub struct SeriesRelationDescriptor {
    pub name: String,
    /// snake_case form of `name`, used as the table alias in compiled SQL.
    pub alias: String,
    pub output_type: SeriesColumnType,
    pub columns: Vec<SeriesColumn>,
    pub name_to_index: FxHashMap<String, usize>,
}

impl SeriesRelationDescriptor {
    pub fn new(name: String, output_type: SeriesColumnType, columns: Vec<SeriesColumn>) -> Self {
        let mut name_to_index = FxHashMap::default();
        for (i, col) in columns.iter().enumerate() {
            name_to_index.insert(col.name.to_ascii_lowercase(), i);
        }
        let alias = snake_case(&name);
        Self {
            name,
            alias,
            output_type,
            columns,
            name_to_index,
        }
    }

    pub fn column_by_name(&self, name: &str) -> Option<&SeriesColumn> {
        self.name_to_index
            .get(&name.to_ascii_lowercase())
            .map(|&i| &self.columns[i])
    }

    pub fn has_id(&self) -> bool {
        self.name_to_index.contains_key(ID_COLUMN)
    }

    pub fn has_value(&self) -> bool {
        self.name_to_index.contains_key(VALUE_COLUMN)
    }

    pub fn term(&self) -> Option<&SeriesColumn> {
        self.column_by_name(TERM_COLUMN)
    }

    pub fn primary_key(&self) -> Option<&SeriesColumn> {
        self.columns.iter().find(|c| c.is_primary_key)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

/// `DecimalRangeSeriesIdMd9` -> `decimal_range_series_id_md9`.
pub fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 8);
    let mut prev: Option<char> = None;
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            if prev.is_some_and(|p| p.is_ascii_lowercase() || p.is_ascii_digit()) {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
        prev = Some(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_case_splits_on_case_changes() {
        assert_eq!(snake_case("IntegerSeries"), "integer_series");
        assert_eq!(
            snake_case("DecimalRangeSeriesIdMd9Dp2BdIE"),
            "decimal_range_series_id_md9_dp2_bd_ie"
        );
    }

    #[test]
    fn decimal_columns_render_precision() {
        let mut col = SeriesColumn::new(TERM_COLUMN, SeriesColumnKind::Term(SeriesColumnType::Decimal));
        col.precision = Some(9);
        col.scale = Some(2);
        assert_eq!(col.sql_type(), "numeric(9, 2)");
    }
}
