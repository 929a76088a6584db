//! Memoizing factory for series relation descriptors.
//!
//! Every distinct relation shape is built once per process and shared through
//! an `Arc`. Lookups take a read lock; a miss builds the descriptor outside
//! the lock and inserts it under the write lock, keeping whichever descriptor
//! was inserted first when two threads race on the same key.

use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use pgseries_result::{Error, Result};
use pgseries_types::{DefaultBounds, SeriesColumnType, ValueColumnType};
use rustc_hash::{FxHashMap, FxHasher};
use tracing::{debug, trace};

use crate::fragment::SqlParam;
use crate::params::CompositionSource;
use crate::registry;
use crate::schema::{
    ID_COLUMN, SeriesColumn, SeriesColumnKind, SeriesRelationDescriptor, TERM_COLUMN, VALUE_COLUMN,
};
use crate::settings::settings;
use crate::validation::ensure_decimal_shape;

/// Identity of a composition source within a shape key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompositionKey {
    /// Keyed by the address of the shared relation.
    Relation {
        address: usize,
        value_type: ValueColumnType,
    },
    /// Keyed by a fingerprint of the element literals.
    Iterable {
        fingerprint: u64,
        value_type: ValueColumnType,
    },
}

impl CompositionKey {
    pub fn from_source(source: &CompositionSource) -> Result<Self> {
        let value_type = registry::infer_composition_value_type(source)?;
        Ok(match source {
            CompositionSource::Relation(relation) => CompositionKey::Relation {
                address: Arc::as_ptr(relation) as *const () as usize,
                value_type,
            },
            CompositionSource::Iterable(values) => {
                let mut hasher = FxHasher::default();
                values.len().hash(&mut hasher);
                for value in values {
                    value.kind().name().hash(&mut hasher);
                    SqlParam::Value(value.clone()).to_literal()?.hash(&mut hasher);
                }
                CompositionKey::Iterable {
                    fingerprint: hasher.finish(),
                    value_type,
                }
            }
        })
    }

    pub fn value_type(&self) -> ValueColumnType {
        match self {
            CompositionKey::Relation { value_type, .. }
            | CompositionKey::Iterable { value_type, .. } => *value_type,
        }
    }

    fn name_suffix(&self) -> String {
        match self {
            CompositionKey::Relation { address, .. } => {
                let mut hasher = FxHasher::default();
                address.hash(&mut hasher);
                format!("Qs{:08x}", hasher.finish() as u32)
            }
            CompositionKey::Iterable { fingerprint, .. } => {
                format!("It{:08x}", *fingerprint as u32)
            }
        }
    }
}

/// Everything that determines the shape of a series relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeriesShapeKey {
    pub output_type: SeriesColumnType,
    pub include_id: bool,
    pub precision: Option<u8>,
    pub scale: Option<u8>,
    pub default_bounds: Option<DefaultBounds>,
    pub composition: Option<CompositionKey>,
}

impl SeriesShapeKey {
    /// Check the structural options and build the key. Default bounds are
    /// only accepted by continuous range types.
    pub fn new(
        output_type: SeriesColumnType,
        include_id: bool,
        precision: Option<u8>,
        scale: Option<u8>,
        default_bounds: Option<DefaultBounds>,
        composition: Option<&CompositionSource>,
    ) -> Result<Self> {
        ensure_decimal_shape(output_type, precision, scale)?;
        if let Some(bounds) = default_bounds
            && !output_type.supports_default_bounds()
        {
            return Err(Error::InvalidArgumentError(format!(
                "default_bounds '{bounds}' is not supported for {output_type} series"
            )));
        }
        let composition = composition.map(CompositionKey::from_source).transpose()?;
        Ok(Self {
            output_type,
            include_id,
            precision,
            scale,
            default_bounds,
            composition,
        })
    }

    /// `<OutputType>Series[Id][Md<p>][Dp<s>][Bd<bounds>][Qs<hash>|It<hash>]`
    pub fn relation_name(&self) -> String {
        let mut name = format!("{}Series", self.output_type.name());
        if self.include_id {
            name.push_str("Id");
        }
        if let Some(p) = self.precision {
            name.push_str(&format!("Md{p}"));
        }
        if let Some(s) = self.scale {
            name.push_str(&format!("Dp{s}"));
        }
        if let Some(bounds) = self.default_bounds {
            name.push_str("Bd");
            name.push_str(bounds.name_code());
        }
        if let Some(composition) = &self.composition {
            name.push_str(&composition.name_suffix());
        }
        name
    }
}

/// Cache of descriptors keyed by shape.
#[derive(Debug, Default)]
pub struct SeriesRelationFactory {
    cache: RwLock<FxHashMap<SeriesShapeKey, Arc<SeriesRelationDescriptor>>>,
}

impl SeriesRelationFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the descriptor for `key`, building it on first request.
    pub fn get_or_create(&self, key: &SeriesShapeKey) -> Result<Arc<SeriesRelationDescriptor>> {
        if let Some(found) = self.cached(key) {
            trace!(relation = %found.name, "series descriptor cache hit");
            return Ok(found);
        }

        let built = Arc::new(build_descriptor(key)?);
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        let entry = cache.entry(*key).or_insert_with(|| {
            debug!(relation = %built.name, "created series descriptor");
            Arc::clone(&built)
        });
        Ok(Arc::clone(entry))
    }

    #[inline]
    pub fn cached(&self, key: &SeriesShapeKey) -> Option<Arc<SeriesRelationDescriptor>> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The process-wide factory.
pub fn global_factory() -> &'static SeriesRelationFactory {
    static FACTORY: OnceLock<SeriesRelationFactory> = OnceLock::new();
    FACTORY.get_or_init(SeriesRelationFactory::new)
}

/// Fetch or build the descriptor for `key` from the process-wide factory.
pub fn get_or_create(key: &SeriesShapeKey) -> Result<Arc<SeriesRelationDescriptor>> {
    global_factory().get_or_create(key)
}

fn build_descriptor(key: &SeriesShapeKey) -> Result<SeriesRelationDescriptor> {
    let mut columns = Vec::with_capacity(3);

    if key.include_id {
        let kind = settings()?.default_auto_field;
        let mut id = SeriesColumn::new(ID_COLUMN, SeriesColumnKind::Identity(kind));
        id.is_primary_key = true;
        columns.push(id);
    }

    let mut term = SeriesColumn::new(TERM_COLUMN, SeriesColumnKind::Term(key.output_type));
    term.is_primary_key = !key.include_id;
    term.precision = key.precision;
    term.scale = key.scale;
    term.default_bounds = key.default_bounds;
    columns.push(term);

    if let Some(composition) = &key.composition {
        let value_type = composition.value_type();
        let mut value = SeriesColumn::new(VALUE_COLUMN, SeriesColumnKind::Value(value_type));
        if value_type == ValueColumnType::Decimal {
            value.precision = key.precision;
            value.scale = key.scale;
        }
        columns.push(value);
    }

    Ok(SeriesRelationDescriptor::new(
        key.relation_name(),
        key.output_type,
        columns,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pgseries_types::SeriesValue;
    use std::thread;

    fn key(output_type: SeriesColumnType, include_id: bool) -> SeriesShapeKey {
        SeriesShapeKey::new(output_type, include_id, None, None, None, None).unwrap()
    }

    #[test]
    fn identical_keys_share_one_descriptor() {
        let factory = SeriesRelationFactory::new();
        let a = factory.get_or_create(&key(SeriesColumnType::Integer, false)).unwrap();
        let b = factory.get_or_create(&key(SeriesColumnType::Integer, false)).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        let c = factory.get_or_create(&key(SeriesColumnType::Integer, true)).unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(factory.len(), 2);
    }

    #[test]
    fn term_is_primary_key_without_identity() {
        let factory = SeriesRelationFactory::new();
        let plain = factory.get_or_create(&key(SeriesColumnType::DateRange, false)).unwrap();
        assert_eq!(plain.primary_key().map(|c| c.name.as_str()), Some(TERM_COLUMN));
        assert!(!plain.has_id());

        let with_id = factory.get_or_create(&key(SeriesColumnType::DateRange, true)).unwrap();
        assert_eq!(with_id.primary_key().map(|c| c.name.as_str()), Some(ID_COLUMN));
        assert_eq!(with_id.name, "DateRangeSeriesId");
        assert_eq!(with_id.alias, "date_range_series_id");
    }

    #[test]
    fn names_encode_structure() {
        let key = SeriesShapeKey::new(
            SeriesColumnType::DecimalRange,
            true,
            Some(9),
            Some(2),
            Some(DefaultBounds::LowerInclusive),
            None,
        )
        .unwrap();
        assert_eq!(key.relation_name(), "DecimalRangeSeriesIdMd9Dp2BdIE");
    }

    #[test]
    fn bounds_on_discrete_types_are_rejected() {
        for output_type in [
            SeriesColumnType::IntegerRange,
            SeriesColumnType::BigIntegerRange,
            SeriesColumnType::DateRange,
            SeriesColumnType::Decimal,
        ] {
            let err = SeriesShapeKey::new(
                output_type,
                false,
                None,
                None,
                Some(DefaultBounds::Inclusive),
                None,
            )
            .unwrap_err();
            assert!(matches!(err, Error::InvalidArgumentError(msg) if msg.contains("default_bounds")));
        }
    }

    #[test]
    fn decimal_value_columns_inherit_precision() {
        let source = CompositionSource::Iterable(vec![SeriesValue::Decimal("1.5".parse().unwrap())]);
        let key = SeriesShapeKey::new(
            SeriesColumnType::Decimal,
            false,
            Some(9),
            Some(2),
            None,
            Some(&source),
        )
        .unwrap();
        let descriptor = SeriesRelationFactory::new().get_or_create(&key).unwrap();
        let value = descriptor.column_by_name(VALUE_COLUMN).expect("value column");
        assert_eq!(value.sql_type(), "numeric(9, 2)");
        assert!(descriptor.name.starts_with("DecimalSeriesMd9Dp2It"));
    }

    #[test]
    fn different_iterables_get_different_descriptors() {
        let factory = SeriesRelationFactory::new();
        let one = CompositionSource::Iterable(vec![SeriesValue::Integer(1)]);
        let two = CompositionSource::Iterable(vec![SeriesValue::Integer(2)]);
        let a = factory
            .get_or_create(
                &SeriesShapeKey::new(SeriesColumnType::Integer, false, None, None, None, Some(&one))
                    .unwrap(),
            )
            .unwrap();
        let b = factory
            .get_or_create(
                &SeriesShapeKey::new(SeriesColumnType::Integer, false, None, None, None, Some(&two))
                    .unwrap(),
            )
            .unwrap();
        assert_ne!(a.name, b.name);
    }

    #[test]
    fn concurrent_population_keeps_first_insert() {
        let factory = Arc::new(SeriesRelationFactory::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let factory = Arc::clone(&factory);
                thread::spawn(move || {
                    factory
                        .get_or_create(&key(SeriesColumnType::BigIntegerRange, false))
                        .unwrap()
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for descriptor in &results[1..] {
            assert!(Arc::ptr_eq(&results[0], descriptor));
        }
        assert_eq!(factory.len(), 1);
    }
}
