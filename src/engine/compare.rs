//! Set comparisons between clusters and between whole project graphs.

use std::collections::HashSet;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use super::model::{Cluster, Entity};

/// Concept-name comparison of two clusters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterComparison {
	/// In both, in A's order.
	pub common: Vec<String>,
	/// Only in A, in A's order.
	pub unique_to_a: Vec<String>,
	/// Only in B, in B's order.
	pub unique_to_b: Vec<String>,
}

/// Overlap statistics of two project graphs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonData {
	/// Entities present in both graphs.
	pub common_entities: usize,
	/// Entities only in the first graph.
	pub unique_to_a: usize,
	/// Entities only in the second graph.
	pub unique_to_b: usize,
	/// `|A ∩ B| / |A ∪ B|`.
	pub jaccard_similarity: f64,
	/// `|A ∩ B| / min(|A|, |B|)`.
	pub overlap_coefficient: f64,
}

/// `|A∩B| / |A∪B|`, or 0 when both sets are empty.
pub fn jaccard<T: Eq + Hash>(a: &HashSet<T>, b: &HashSet<T>) -> f64 {
	let union = a.union(b).count();
	if union == 0 {
		return 0.0;
	}
	a.intersection(b).count() as f64 / union as f64
}

/// `|A∩B| / min(|A|, |B|)`, or 0 when either set is empty.
pub fn overlap_coefficient<T: Eq + Hash>(a: &HashSet<T>, b: &HashSet<T>) -> f64 {
	let smaller = a.len().min(b.len());
	if smaller == 0 {
		return 0.0;
	}
	a.intersection(b).count() as f64 / smaller as f64
}

fn dedup_in_order<'a>(items: impl IntoIterator<Item = &'a String>) -> Vec<&'a String> {
	let mut seen = HashSet::new();
	items.into_iter().filter(|s| seen.insert(*s)).collect()
}

/// Compare two clusters by concept name.
///
/// Names are the label space because ids differ between projects. Repeated
/// names count once, at their first position.
pub fn compare_clusters(a: &Cluster, b: &Cluster) -> ClusterComparison {
	let names_a = dedup_in_order(&a.concept_names);
	let names_b = dedup_in_order(&b.concept_names);
	let set_a: HashSet<&String> = names_a.iter().copied().collect();
	let set_b: HashSet<&String> = names_b.iter().copied().collect();

	let (common, unique_to_a): (Vec<&String>, Vec<&String>) =
		names_a.into_iter().partition(|name| set_b.contains(name));
	let unique_to_b = names_b
		.into_iter()
		.filter(|name| !set_a.contains(name))
		.cloned()
		.collect();

	ClusterComparison {
		common: common.into_iter().cloned().collect(),
		unique_to_a: unique_to_a.into_iter().cloned().collect(),
		unique_to_b,
	}
}

/// Key used to match entities across projects.
fn entity_key(entity: &Entity) -> String {
	entity.name.trim().to_lowercase()
}

/// Compare the entity sets of two graphs by normalized name.
pub fn compare_graphs(a: &[Entity], b: &[Entity]) -> ComparisonData {
	let set_a: HashSet<String> = a.iter().map(entity_key).collect();
	let set_b: HashSet<String> = b.iter().map(entity_key).collect();
	let common = set_a.intersection(&set_b).count();

	ComparisonData {
		common_entities: common,
		unique_to_a: set_a.len() - common,
		unique_to_b: set_b.len() - common,
		jaccard_similarity: jaccard(&set_a, &set_b),
		overlap_coefficient: overlap_coefficient(&set_a, &set_b),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::engine::model::EntityType;
	use pretty_assertions::assert_eq;
	use proptest::prelude::*;

	fn cluster(names: &[&str]) -> Cluster {
		Cluster {
			cluster_id: 0,
			label: None,
			concepts: names.iter().map(|n| format!("id-{n}")).collect(),
			concept_names: names.iter().map(|n| n.to_string()).collect(),
			size: names.len(),
			density: 0.0,
			color: None,
		}
	}

	fn entities(names: &[&str]) -> Vec<Entity> {
		names
			.iter()
			.enumerate()
			.map(|(i, n)| Entity::new(format!("e{i}"), *n, EntityType::Concept))
			.collect()
	}

	#[test]
	fn cluster_scenario() {
		let result = compare_clusters(&cluster(&["x", "y", "z"]), &cluster(&["y", "z", "w"]));
		assert_eq!(
			result,
			ClusterComparison {
				common: vec!["y".into(), "z".into()],
				unique_to_a: vec!["x".into()],
				unique_to_b: vec!["w".into()],
			}
		);
	}

	#[test]
	fn cluster_comparison_keeps_source_order() {
		let result = compare_clusters(&cluster(&["c", "a", "b"]), &cluster(&["b", "d", "a", "e"]));
		assert_eq!(result.common, vec!["a".to_string(), "b".to_string()]);
		assert_eq!(result.unique_to_b, vec!["d".to_string(), "e".to_string()]);
	}

	#[test]
	fn identical_graphs_score_one() {
		let a = entities(&["Graph", "Node"]);
		let b = entities(&[" graph ", "NODE"]);
		let data = compare_graphs(&a, &b);
		assert_eq!(data.common_entities, 2);
		assert_eq!(data.jaccard_similarity, 1.0);
		assert_eq!(data.overlap_coefficient, 1.0);
	}

	#[test]
	fn disjoint_graphs_score_zero() {
		let data = compare_graphs(&entities(&["a", "b"]), &entities(&["c"]));
		assert_eq!(data.common_entities, 0);
		assert_eq!(data.unique_to_a, 2);
		assert_eq!(data.unique_to_b, 1);
		assert_eq!(data.jaccard_similarity, 0.0);
		assert_eq!(data.overlap_coefficient, 0.0);
	}

	#[test]
	fn empty_graphs_do_not_divide_by_zero() {
		let data = compare_graphs(&[], &[]);
		assert_eq!(data, ComparisonData::default());
		let one_sided = compare_graphs(&entities(&["a"]), &[]);
		assert_eq!(one_sided.jaccard_similarity, 0.0);
		assert_eq!(one_sided.overlap_coefficient, 0.0);
	}

	#[test]
	fn overlap_uses_the_smaller_set() {
		let data = compare_graphs(&entities(&["a", "b", "c", "d"]), &entities(&["a", "b"]));
		assert_eq!(data.overlap_coefficient, 1.0);
		assert_eq!(data.jaccard_similarity, 0.5);
	}

	proptest! {
		#[test]
		fn cluster_partition_sizes_add_up(
			a in proptest::collection::vec("[a-f]", 0..8),
			b in proptest::collection::vec("[a-f]", 0..8),
		) {
			let to_cluster = |names: &[String]| Cluster {
				cluster_id: 0,
				label: None,
				concepts: names.to_vec(),
				concept_names: names.to_vec(),
				size: names.len(),
				density: 0.0,
				color: None,
			};
			let distinct_a: HashSet<&String> = a.iter().collect();
			let distinct_b: HashSet<&String> = b.iter().collect();
			let result = compare_clusters(&to_cluster(&a), &to_cluster(&b));
			prop_assert_eq!(result.unique_to_a.len() + result.common.len(), distinct_a.len());
			prop_assert_eq!(result.unique_to_b.len() + result.common.len(), distinct_b.len());
		}

		#[test]
		fn similarities_stay_in_unit_range(
			a in proptest::collection::hash_set(0u8..20, 0..10),
			b in proptest::collection::hash_set(0u8..20, 0..10),
		) {
			let j = jaccard(&a, &b);
			let o = overlap_coefficient(&a, &b);
			prop_assert!((0.0..=1.0).contains(&j));
			prop_assert!((0.0..=1.0).contains(&o));
			prop_assert!(j <= o || a.is_empty() || b.is_empty());
		}
	}
}
