//! Matches objects of two snapshots and reports how they differ.

use chrono::Utc;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::catalog::{DatabaseObject, ObjectKey, ObjectRef};
use crate::config::filter::ObjectFilter;
use crate::diff::details::modified_details;
use crate::diff::normalize::normalize_definition;
use crate::diff::types::{
    CompareOptions, ComparisonMode, DetailKind, DiffType, DifferenceDetail, RiskLevel,
    SchemaComparison, SchemaDifference, meta,
};
use crate::snapshot::Snapshot;

/// Facts about an object the script generator needs besides its definition
pub fn object_metadata(object: &DatabaseObject) -> BTreeMap<String, Value> {
    let mut metadata = BTreeMap::new();
    metadata.insert(meta::QUALIFIED_NAME.to_string(), json!(object.qualified_name()));
    metadata.insert(meta::DATABASE.to_string(), json!(object.identity().database));

    if let Some(table) = object.table_name() {
        metadata.insert(meta::TABLE_NAME.to_string(), json!(table));
    }
    if let Some(signature) = object.signature() {
        metadata.insert(meta::SIGNATURE.to_string(), json!(signature));
    }

    match object {
        DatabaseObject::Partition(p) => {
            metadata.insert(
                meta::PARENT_TABLE.to_string(),
                json!(format!("{}.{}", p.parent_schema(), p.parent_table)),
            );
        }
        DatabaseObject::Extension(e) => {
            if let Some(version) = &e.ext_version {
                metadata.insert(meta::EXT_VERSION.to_string(), json!(version));
            }
        }
        DatabaseObject::Role(r) => {
            metadata.insert(meta::IS_SUPERUSER.to_string(), json!(r.is_superuser));
            metadata.insert(
                meta::CAN_CREATE_DATABASES.to_string(),
                json!(r.can_create_databases),
            );
            metadata.insert(meta::CAN_CREATE_ROLES.to_string(), json!(r.can_create_roles));
            metadata.insert(meta::CAN_LOGIN.to_string(), json!(r.can_login));
        }
        _ => {}
    }

    metadata
}

fn difference(
    diff_type: DiffType,
    object: &DatabaseObject,
    source: Option<&DatabaseObject>,
    target: Option<&DatabaseObject>,
    details: Vec<DifferenceDetail>,
) -> SchemaDifference {
    SchemaDifference {
        diff_type,
        object_type: object.object_type(),
        object_name: object.name().to_string(),
        schema: object.schema().to_string(),
        source_definition: source.map(DatabaseObject::definition),
        target_definition: target.map(DatabaseObject::definition),
        details,
        metadata: object_metadata(object),
        source: source.cloned(),
        target: target.cloned(),
        dependents: Vec::new(),
    }
}

fn object_ref(object: &DatabaseObject) -> ObjectRef {
    ObjectRef::new(object.schema(), object.name())
}

/// Objects in `unchanged` that need `object`, directly or through one
/// another, in discovery order. Data-bearing objects are never included.
fn dependents_of(object: &DatabaseObject, unchanged: &[&DatabaseObject]) -> Vec<DatabaseObject> {
    let mut needed = vec![object_ref(object)];
    let mut found: Vec<DatabaseObject> = Vec::new();

    loop {
        let next: Vec<&DatabaseObject> = unchanged
            .iter()
            .copied()
            .filter(|o| !o.object_type().holds_data())
            .filter(|o| !found.iter().any(|f| f.key() == o.key()))
            .filter(|o| o.dependencies().iter().any(|d| needed.contains(d)))
            .collect();
        if next.is_empty() {
            return found;
        }
        for o in next {
            needed.push(object_ref(o));
            found.push(o.clone());
        }
    }
}

fn sort_key(diff: &SchemaDifference) -> (usize, String, String, String, DiffType) {
    let qualifier = diff
        .metadata_str(meta::TABLE_NAME)
        .or_else(|| diff.metadata_str(meta::SIGNATURE))
        .unwrap_or_default()
        .to_string();
    (
        diff.object_type.create_rank(),
        diff.schema.clone(),
        diff.object_name.clone(),
        qualifier,
        diff.diff_type,
    )
}

pub struct SchemaComparer {
    mode: ComparisonMode,
    options: CompareOptions,
    filter: ObjectFilter,
}

impl SchemaComparer {
    pub fn new(mode: ComparisonMode, options: CompareOptions) -> Self {
        let filter = ObjectFilter::new(&options.ignore_schemas, options.include_system_objects);
        Self {
            mode,
            options,
            filter,
        }
    }

    pub fn mode(&self) -> ComparisonMode {
        self.mode
    }

    fn key_of(&self, object: &DatabaseObject) -> ObjectKey {
        if self.options.case_sensitive {
            object.key()
        } else {
            object.key().folded()
        }
    }

    fn normalized(&self, object: &DatabaseObject) -> String {
        normalize_definition(&object.definition(), self.mode)
    }

    fn index<'a>(
        &self,
        side: &str,
        objects: impl IntoIterator<Item = &'a DatabaseObject>,
    ) -> BTreeMap<ObjectKey, &'a DatabaseObject> {
        let mut map = BTreeMap::new();
        for object in objects {
            if let Some(previous) = map.insert(self.key_of(object), object) {
                warn!(
                    "Duplicate {} in {} snapshot: {} replaces {}",
                    object.object_type(),
                    side,
                    object.qualified_name(),
                    previous.qualified_name()
                );
            }
        }
        map
    }

    /// Differences turning `source` into `target`, sorted by object type
    /// then qualified name.
    ///
    /// Target objects are compared as if they lived in the source database,
    /// so snapshots of differently named databases line up.
    pub fn compare(
        &self,
        source: &[DatabaseObject],
        target: &[DatabaseObject],
    ) -> Vec<SchemaDifference> {
        info!(
            "Comparing {} source objects with {} target objects ({:?} mode)",
            source.len(),
            target.len(),
            self.mode
        );

        let source = self.filter.filter(source);
        let target = self.filter.filter(target);

        let database = source
            .first()
            .or(target.first())
            .map(|o| o.identity().database.clone())
            .unwrap_or_default();
        let target: Vec<DatabaseObject> = target.into_iter().map(|o| o.rebased(&database)).collect();

        let source_map = self.index("source", source.iter().copied());
        let target_map = self.index("target", target.iter());

        let mut differences = Vec::new();
        let mut removed = Vec::new();
        let mut unchanged = Vec::new();

        for (key, s) in &source_map {
            match target_map.get(key) {
                Some(t) => {
                    let (s, t) = (*s, *t);
                    if self.normalized(s) != self.normalized(t) {
                        debug!("Modified: {}", key);
                        let details = modified_details(s, t);
                        differences.push(difference(DiffType::Modified, t, Some(s), Some(t), details));
                    } else {
                        unchanged.push(t);
                    }
                }
                None => removed.push(*s),
            }
        }

        for diff in differences.iter_mut() {
            if let Some(t) = &diff.target
                && !t.object_type().holds_data()
            {
                diff.dependents = dependents_of(t, &unchanged);
            }
        }

        let added: Vec<&DatabaseObject> = target_map
            .iter()
            .filter(|(key, _)| !source_map.contains_key(*key))
            .map(|(_, t)| *t)
            .collect();
        let mut claimed = vec![false; added.len()];

        for s in removed {
            let pair_key = self.key_of(s).without_schema();
            let moved_to = added.iter().enumerate().position(|(i, t)| {
                !claimed[i]
                    && self.key_of(t).without_schema() == pair_key
                    && self.normalized(&s.with_schema(t.schema())) == self.normalized(t)
            });

            match moved_to {
                Some(i) => {
                    claimed[i] = true;
                    differences.push(self.moved(s, added[i]));
                }
                None => {
                    debug!("Removed: {}", s.key());
                    let object_type = s.object_type();
                    let detail = if object_type.holds_data() {
                        DifferenceDetail::data_loss(
                            DetailKind::ObjectDropped,
                            format!("Dropping {} {} discards its data", object_type, s.name()),
                        )
                    } else {
                        DifferenceDetail::new(
                            DetailKind::ObjectDropped,
                            format!("{} {} is dropped", object_type, s.name()),
                            RiskLevel::Low,
                        )
                    };
                    differences.push(difference(DiffType::Removed, s, Some(s), None, vec![detail]));
                }
            }
        }

        for (i, t) in added.iter().enumerate() {
            if !claimed[i] {
                debug!("Added: {}", t.key());
                differences.push(difference(DiffType::Added, t, None, Some(*t), Vec::new()));
            }
        }

        differences.sort_by_key(sort_key);
        info!("Found {} differences", differences.len());
        differences
    }

    fn moved(&self, source: &DatabaseObject, target: &DatabaseObject) -> SchemaDifference {
        debug!(
            "Moved: {} from {} to {}",
            target.name(),
            source.schema(),
            target.schema()
        );
        let detail = DifferenceDetail::new(
            DetailKind::AttributeChanged {
                attribute: "schema".to_string(),
                from: source.schema().to_string(),
                to: target.schema().to_string(),
            },
            format!("Moves from schema {} to {}", source.schema(), target.schema()),
            RiskLevel::Low,
        );

        let mut diff = difference(DiffType::Moved, target, Some(source), Some(target), vec![detail]);
        diff.metadata
            .insert(meta::SOURCE_SCHEMA.to_string(), json!(source.schema()));
        diff.metadata
            .insert(meta::TARGET_SCHEMA.to_string(), json!(target.schema()));
        diff
    }

    pub fn compare_snapshots(&self, source: &Snapshot, target: &Snapshot) -> SchemaComparison {
        SchemaComparison {
            id: Uuid::new_v4(),
            source: source.info(),
            target: target.info(),
            differences: self.compare(&source.objects, &target.objects),
            mode: self.mode,
            compared_at: Utc::now(),
        }
    }
}
