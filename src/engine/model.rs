//! Data model consumed from the analysis backend.
//!
//! Everything here is read-only per snapshot: a new analysis run replaces the
//! whole [`GraphSnapshot`] rather than patching it.

use std::collections::HashMap;
use std::fmt;

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier of an entity (graph node).
pub type EntityId = String;
/// Identifier of an edge.
pub type EdgeId = String;
/// Identifier of a structural gap.
pub type GapId = String;
/// Identifier of a computed cluster.
pub type ClusterId = i64;

/// Kind of a graph node. Parsed case-insensitively; anything unrecognised
/// becomes [`EntityType::Unknown`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntityType {
	/// A publication.
	Paper,
	/// A person.
	Author,
	/// An idea or topic.
	Concept,
	/// A technique.
	Method,
	/// Also accepts `result`.
	Finding,
	/// An open problem.
	Problem,
	/// A dataset.
	Dataset,
	/// An evaluation metric.
	Metric,
	/// A novel contribution.
	Innovation,
	/// A stated limitation.
	Limitation,
	/// Anything unrecognised.
	Unknown,
}

impl EntityType {
	/// Canonical wire name.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Paper => "Paper",
			Self::Author => "Author",
			Self::Concept => "Concept",
			Self::Method => "Method",
			Self::Finding => "Finding",
			Self::Problem => "Problem",
			Self::Dataset => "Dataset",
			Self::Metric => "Metric",
			Self::Innovation => "Innovation",
			Self::Limitation => "Limitation",
			Self::Unknown => "Unknown",
		}
	}
}

impl From<&str> for EntityType {
	fn from(s: &str) -> Self {
		match s.trim().to_ascii_lowercase().as_str() {
			"paper" => Self::Paper,
			"author" => Self::Author,
			"concept" => Self::Concept,
			"method" => Self::Method,
			"finding" | "result" => Self::Finding,
			"problem" => Self::Problem,
			"dataset" => Self::Dataset,
			"metric" => Self::Metric,
			"innovation" => Self::Innovation,
			"limitation" => Self::Limitation,
			_ => Self::Unknown,
		}
	}
}

impl From<String> for EntityType {
	fn from(s: String) -> Self {
		Self::from(s.as_str())
	}
}

impl From<EntityType> for String {
	fn from(t: EntityType) -> Self {
		t.as_str().to_string()
	}
}

impl fmt::Display for EntityType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Kind of an edge. Unrecognised kinds are preserved verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RelationshipType {
	/// Paper to paper.
	Cites,
	/// Paper to author.
	AuthoredBy,
	/// Also accepts `DISCUSSES_CONCEPT`.
	Discusses,
	/// Paper to method.
	UsesMethod,
	/// Generic association.
	RelatedTo,
	/// Also accepts `CO_OCCURS_WITH`.
	CoOccurs,
	/// Evidence for.
	Supports,
	/// Evidence against.
	Contradicts,
	/// Unrecognised kind, kept verbatim.
	Other(String),
}

impl From<String> for RelationshipType {
	fn from(s: String) -> Self {
		match s.trim().to_ascii_uppercase().as_str() {
			"CITES" => Self::Cites,
			"AUTHORED_BY" => Self::AuthoredBy,
			"DISCUSSES" | "DISCUSSES_CONCEPT" => Self::Discusses,
			"USES_METHOD" => Self::UsesMethod,
			"RELATED_TO" => Self::RelatedTo,
			"CO_OCCURS" | "CO_OCCURS_WITH" => Self::CoOccurs,
			"SUPPORTS" => Self::Supports,
			"CONTRADICTS" => Self::Contradicts,
			_ => Self::Other(s),
		}
	}
}

impl From<RelationshipType> for String {
	fn from(r: RelationshipType) -> Self {
		match r {
			RelationshipType::Cites => "CITES".into(),
			RelationshipType::AuthoredBy => "AUTHORED_BY".into(),
			RelationshipType::Discusses => "DISCUSSES".into(),
			RelationshipType::UsesMethod => "USES_METHOD".into(),
			RelationshipType::RelatedTo => "RELATED_TO".into(),
			RelationshipType::CoOccurs => "CO_OCCURS".into(),
			RelationshipType::Supports => "SUPPORTS".into(),
			RelationshipType::Contradicts => "CONTRADICTS".into(),
			RelationshipType::Other(s) => s,
		}
	}
}

/// A graph node: paper, concept, method, ...
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entity {
	/// Entity id.
	pub id: EntityId,
	/// Display name.
	pub name: String,
	/// Kind of entity.
	pub entity_type: EntityType,
	/// Loosely typed extras: `cluster_id`, `year`, `is_gap_bridge`, ...
	#[serde(default)]
	pub properties: Map<String, Value>,
}

impl Entity {
	/// Convenience constructor with empty properties.
	pub fn new(id: impl Into<String>, name: impl Into<String>, entity_type: EntityType) -> Self {
		Self {
			id: id.into(),
			name: name.into(),
			entity_type,
			properties: Map::new(),
		}
	}

	/// Builder-style property setter.
	pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
		self.properties.insert(key.to_string(), value.into());
		self
	}

	/// Cluster assignment carried on the entity itself.
	pub fn cluster_id(&self) -> Option<ClusterId> {
		self.properties.get("cluster_id").and_then(as_i64)
	}

	/// Whether the backend flagged this entity as bridging a gap.
	pub fn is_gap_bridge(&self) -> bool {
		match self.properties.get("is_gap_bridge") {
			Some(Value::Bool(b)) => *b,
			Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
			Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
			_ => false,
		}
	}

	/// Publication year, if any.
	pub fn year(&self) -> Option<i32> {
		self.properties
			.get("year")
			.and_then(as_i64)
			.and_then(|y| i32::try_from(y).ok())
	}
}

fn as_i64(value: &Value) -> Option<i64> {
	match value {
		Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
		Value::String(s) => s.trim().parse().ok(),
		_ => None,
	}
}

/// A directed (for display) relationship between two entities.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
	/// Edge id.
	pub id: EdgeId,
	/// Source entity id.
	#[serde(alias = "source_id")]
	pub source: EntityId,
	/// Target entity id.
	#[serde(alias = "target_id")]
	pub target: EntityId,
	/// Kind of relation.
	pub relationship_type: RelationshipType,
	/// Strength, scales the drawn width.
	#[serde(default)]
	pub weight: Option<f64>,
	/// Extra backend fields.
	#[serde(default)]
	pub properties: Option<Map<String, Value>>,
}

impl Edge {
	/// Convenience constructor for an unweighted edge.
	pub fn new(
		id: impl Into<String>,
		source: impl Into<String>,
		target: impl Into<String>,
		relationship_type: RelationshipType,
	) -> Self {
		Self {
			id: id.into(),
			source: source.into(),
			target: target.into(),
			relationship_type,
			weight: None,
			properties: None,
		}
	}
}

/// A computed grouping of concepts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
	/// Cluster id.
	pub cluster_id: ClusterId,
	/// Human-readable name, if the backend made one.
	#[serde(default)]
	pub label: Option<String>,
	/// Member entity ids.
	#[serde(default)]
	pub concepts: Vec<EntityId>,
	/// Member names, index-aligned with `concepts`.
	#[serde(default)]
	pub concept_names: Vec<String>,
	/// Member count reported by the backend.
	#[serde(default)]
	pub size: usize,
	/// Internal edge density.
	#[serde(default)]
	pub density: f64,
	/// Backend suggestion; the palette is used instead.
	#[serde(default)]
	pub color: Option<String>,
}

/// A candidate edge that would close a structural gap.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PotentialEdge {
	/// One end.
	pub source_id: EntityId,
	/// Other end.
	pub target_id: EntityId,
	/// Semantic similarity of the two ends.
	pub similarity: f64,
}

/// Weakly connected region between two clusters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StructuralGap {
	/// Gap id.
	pub id: GapId,
	/// First cluster.
	pub cluster_a_id: ClusterId,
	/// Second cluster; never equal to the first.
	pub cluster_b_id: ClusterId,
	/// Concepts on the first side.
	#[serde(default)]
	pub cluster_a_concepts: Vec<EntityId>,
	/// Concepts on the second side.
	#[serde(default)]
	pub cluster_b_concepts: Vec<EntityId>,
	/// Entities likely to connect both sides.
	#[serde(default)]
	pub bridge_candidates: Vec<EntityId>,
	/// Higher means a wider gap.
	#[serde(default)]
	pub gap_strength: f64,
	/// Questions the gap suggests.
	#[serde(default)]
	pub research_questions: Vec<String>,
	/// Candidate edges that would close the gap.
	#[serde(default)]
	pub potential_edges: Option<Vec<PotentialEdge>>,
}

/// Centrality record for one concept.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CentralityMetric {
	/// Concept the record belongs to.
	pub concept_id: EntityId,
	/// Betweenness in `[0, 1]`.
	#[serde(default)]
	pub betweenness_centrality: f64,
	/// Normalized degree.
	#[serde(default)]
	pub degree_centrality: Option<f64>,
	/// PageRank score.
	#[serde(default)]
	pub pagerank: Option<f64>,
}

/// One complete analysis result, replaced wholesale on re-analysis.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphSnapshot {
	/// Unique by id.
	pub entities: Vec<Entity>,
	/// All edges, dangling ones included.
	pub edges: Vec<Edge>,
	/// Unique by cluster id.
	pub clusters: Vec<Cluster>,
	/// Gaps between two distinct clusters.
	pub gaps: Vec<StructuralGap>,
	/// Centrality by concept id.
	pub centrality: HashMap<EntityId, CentralityMetric>,
	entity_index: HashMap<EntityId, usize>,
	membership: HashMap<EntityId, ClusterId>,
}

impl GraphSnapshot {
	/// Assemble a snapshot: repeated entity and cluster ids collapse to the
	/// later record, and gaps whose two sides name the same cluster are
	/// discarded.
	pub fn new(
		entities: Vec<Entity>,
		edges: Vec<Edge>,
		clusters: Vec<Cluster>,
		gaps: Vec<StructuralGap>,
		metrics: Vec<CentralityMetric>,
	) -> Self {
		// Node ids key the layout, so a repeated id keeps one entity: the
		// later record replaces the earlier one in place.
		let mut entity_index: HashMap<EntityId, usize> = HashMap::new();
		let mut unique: Vec<Entity> = Vec::with_capacity(entities.len());
		for entity in entities {
			match entity_index.get(&entity.id) {
				Some(&i) => {
					warn!("duplicate entity {}, keeping the later record", entity.id);
					unique[i] = entity;
				}
				None => {
					entity_index.insert(entity.id.clone(), unique.len());
					unique.push(entity);
				}
			}
		}
		let entities = unique;

		let mut cluster_index: HashMap<ClusterId, usize> = HashMap::new();
		let mut deduped: Vec<Cluster> = Vec::with_capacity(clusters.len());
		for cluster in clusters {
			match cluster_index.get(&cluster.cluster_id) {
				Some(&i) => {
					warn!("duplicate cluster {}, keeping the later record", cluster.cluster_id);
					deduped[i] = cluster;
				}
				None => {
					cluster_index.insert(cluster.cluster_id, deduped.len());
					deduped.push(cluster);
				}
			}
		}
		let clusters = deduped;

		let mut membership = HashMap::new();
		for cluster in &clusters {
			for concept in &cluster.concepts {
				membership.insert(concept.clone(), cluster.cluster_id);
			}
		}

		let gaps = gaps
			.into_iter()
			.filter(|gap| {
				let valid = gap.cluster_a_id != gap.cluster_b_id;
				if !valid {
					warn!("dropping gap {} that joins cluster {} to itself", gap.id, gap.cluster_a_id);
				}
				valid
			})
			.collect();

		// Later records win when the backend repeats a concept.
		let centrality = metrics
			.into_iter()
			.map(|m| (m.concept_id.clone(), m))
			.collect();

		Self {
			entities,
			edges,
			clusters,
			gaps,
			centrality,
			entity_index,
			membership,
		}
	}

	/// True when there is nothing to draw.
	pub fn is_empty(&self) -> bool {
		self.entities.is_empty()
	}

	/// Look up an entity by id.
	pub fn entity(&self, id: &str) -> Option<&Entity> {
		self.entity_index.get(id).map(|&i| &self.entities[i])
	}

	/// Whether `id` names an entity of this snapshot.
	pub fn contains(&self, id: &str) -> bool {
		self.entity_index.contains_key(id)
	}

	/// Look up a gap by id.
	pub fn gap(&self, id: &str) -> Option<&StructuralGap> {
		self.gaps.iter().find(|g| g.id == id)
	}

	/// Look up a cluster by id.
	pub fn cluster(&self, id: ClusterId) -> Option<&Cluster> {
		self.clusters.iter().find(|c| c.cluster_id == id)
	}

	/// Cluster of an entity: its own `cluster_id` property first, then
	/// membership through [`Cluster::concepts`].
	pub fn cluster_of(&self, entity: &Entity) -> Option<ClusterId> {
		entity
			.cluster_id()
			.or_else(|| self.membership.get(&entity.id).copied())
	}

	/// Centrality record of an entity, if the backend computed one.
	pub fn centrality_of(&self, id: &str) -> Option<&CentralityMetric> {
		self.centrality.get(id)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;
	use serde_json::json;

	#[test]
	fn entity_type_parses_case_insensitively() {
		let e: Entity = serde_json::from_value(json!({
			"id": "c1",
			"name": "Transformers",
			"entity_type": "concept",
		}))
		.unwrap();
		assert_eq!(e.entity_type, EntityType::Concept);
		assert!(e.properties.is_empty());
	}

	#[test]
	fn unknown_entity_type_degrades() {
		assert_eq!(EntityType::from("Spaceship"), EntityType::Unknown);
	}

	#[test]
	fn relationship_type_keeps_unknown_kinds() {
		let r = RelationshipType::from("MENTIONS".to_string());
		assert_eq!(r, RelationshipType::Other("MENTIONS".into()));
		assert_eq!(String::from(r), "MENTIONS");
		assert_eq!(RelationshipType::from("cites".to_string()), RelationshipType::Cites);
	}

	#[test]
	fn edge_accepts_source_id_aliases() {
		let edge: Edge = serde_json::from_value(json!({
			"id": "e1",
			"source_id": "a",
			"target_id": "b",
			"relationship_type": "RELATED_TO",
		}))
		.unwrap();
		assert_eq!(edge.source, "a");
		assert_eq!(edge.target, "b");
		assert_eq!(edge.weight, None);
	}

	#[test]
	fn property_accessors_tolerate_loose_types() {
		let e = Entity::new("p1", "Paper", EntityType::Paper)
			.with_property("cluster_id", "3")
			.with_property("year", 2019)
			.with_property("is_gap_bridge", true);
		assert_eq!(e.cluster_id(), Some(3));
		assert_eq!(e.year(), Some(2019));
		assert!(e.is_gap_bridge());

		let bare = Entity::new("p2", "Other", EntityType::Paper).with_property("year", "n/a");
		assert_eq!(bare.year(), None);
		assert!(!bare.is_gap_bridge());
	}

	#[test]
	fn snapshot_drops_self_gaps_and_indexes_membership() {
		let gap = |id: &str, a, b| StructuralGap {
			id: id.into(),
			cluster_a_id: a,
			cluster_b_id: b,
			cluster_a_concepts: vec![],
			cluster_b_concepts: vec![],
			bridge_candidates: vec![],
			gap_strength: 0.5,
			research_questions: vec![],
			potential_edges: None,
		};
		let cluster = Cluster {
			cluster_id: 7,
			label: None,
			concepts: vec!["x".into()],
			concept_names: vec!["X".into()],
			size: 1,
			density: 0.0,
			color: None,
		};
		let snapshot = GraphSnapshot::new(
			vec![Entity::new("x", "X", EntityType::Concept)],
			vec![],
			vec![cluster],
			vec![gap("ok", 1, 2), gap("bad", 3, 3)],
			vec![
				CentralityMetric {
					concept_id: "x".into(),
					betweenness_centrality: 0.1,
					..Default::default()
				},
				CentralityMetric {
					concept_id: "x".into(),
					betweenness_centrality: 0.9,
					..Default::default()
				},
			],
		);

		assert_eq!(snapshot.gaps.len(), 1);
		assert!(snapshot.gap("bad").is_none());
		let x = snapshot.entity("x").unwrap();
		assert_eq!(snapshot.cluster_of(x), Some(7));
		assert_eq!(snapshot.centrality_of("x").unwrap().betweenness_centrality, 0.9);
		assert!(!snapshot.contains("y"));
	}

	#[test]
	fn repeated_ids_collapse_to_the_later_record() {
		let cluster = |name: &str| Cluster {
			cluster_id: 1,
			label: Some(name.into()),
			concepts: vec!["a".into()],
			concept_names: vec!["A".into()],
			size: 1,
			density: 0.0,
			color: None,
		};
		let snapshot = GraphSnapshot::new(
			vec![
				Entity::new("a", "First", EntityType::Concept),
				Entity::new("b", "B", EntityType::Concept),
				Entity::new("a", "Second", EntityType::Concept),
			],
			vec![],
			vec![cluster("old"), cluster("new")],
			vec![],
			vec![],
		);

		let ids: Vec<&str> = snapshot.entities.iter().map(|e| e.id.as_str()).collect();
		assert_eq!(ids, vec!["a", "b"]);
		assert_eq!(snapshot.entity("a").map(|e| e.name.as_str()), Some("Second"));
		assert_eq!(snapshot.entity("b").map(|e| e.name.as_str()), Some("B"));
		assert_eq!(snapshot.clusters.len(), 1);
		assert_eq!(snapshot.cluster(1).and_then(|c| c.label.as_deref()), Some("new"));
	}
}
