//! Year-based filtering behind the timeline and temporal slider.

use super::model::{Entity, GraphSnapshot};

/// Inclusive range of years present in a snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct YearRange {
	/// Earliest year.
	pub min: i32,
	/// Latest year.
	pub max: i32,
}

impl YearRange {
	/// Range of `year` properties, `None` when no entity carries one.
	pub fn of(snapshot: &GraphSnapshot) -> Option<Self> {
		snapshot.entities.iter().filter_map(Entity::year).fold(None, |range, year| {
			Some(match range {
				None => Self { min: year, max: year },
				Some(r) => Self {
					min: r.min.min(year),
					max: r.max.max(year),
				},
			})
		})
	}

	/// `year` forced into the range.
	pub fn clamp(&self, year: i32) -> i32 {
		year.clamp(self.min, self.max)
	}
}

/// Shows only entities published up to a cutoff year.
///
/// Entities without a year are never hidden.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TemporalFilter {
	/// Last visible year; `None` shows everything.
	pub until: Option<i32>,
}

impl TemporalFilter {
	/// Hide entities published after `year`.
	pub fn until(year: i32) -> Self {
		Self { until: Some(year) }
	}

	/// Whether anything can be hidden.
	pub fn is_active(&self) -> bool {
		self.until.is_some()
	}

	/// Whether `entity` stays visible.
	pub fn admits(&self, entity: &Entity) -> bool {
		match (self.until, entity.year()) {
			(Some(cutoff), Some(year)) => year <= cutoff,
			_ => true,
		}
	}

	/// Number of entities per year, ascending, for the timeline histogram.
	pub fn histogram(snapshot: &GraphSnapshot) -> Vec<(i32, usize)> {
		let mut counts = std::collections::BTreeMap::new();
		for year in snapshot.entities.iter().filter_map(Entity::year) {
			*counts.entry(year).or_insert(0usize) += 1;
		}
		counts.into_iter().collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::engine::model::EntityType;
	use pretty_assertions::assert_eq;

	fn snapshot() -> GraphSnapshot {
		GraphSnapshot::new(
			vec![
				Entity::new("p1", "Old", EntityType::Paper).with_property("year", 2001),
				Entity::new("p2", "New", EntityType::Paper).with_property("year", 2020),
				Entity::new("p3", "Also new", EntityType::Paper).with_property("year", 2020),
				Entity::new("c1", "Timeless", EntityType::Concept),
			],
			vec![],
			vec![],
			vec![],
			vec![],
		)
	}

	#[test]
	fn range_spans_all_years() {
		let range = YearRange::of(&snapshot()).unwrap();
		assert_eq!(range, YearRange { min: 2001, max: 2020 });
		assert_eq!(range.clamp(1990), 2001);
		assert_eq!(YearRange::of(&GraphSnapshot::default()), None);
	}

	#[test]
	fn filter_hides_later_entities_only() {
		let s = snapshot();
		let filter = TemporalFilter::until(2010);
		let visible: Vec<&str> = s
			.entities
			.iter()
			.filter(|e| filter.admits(e))
			.map(|e| e.id.as_str())
			.collect();
		assert_eq!(visible, vec!["p1", "c1"]);
		assert!(TemporalFilter::default().admits(&s.entities[1]));
	}

	#[test]
	fn histogram_counts_per_year() {
		assert_eq!(TemporalFilter::histogram(&snapshot()), vec![(2001, 1), (2020, 2)]);
	}
}
