//! Client for the analysis backend.
//!
//! The backend computes everything (centrality, clusters, gaps, bridge
//! hypotheses); this client only fetches and decodes.

use futures::try_join;
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::engine::build::BuildStatus;
use crate::engine::compare::{ComparisonData, compare_graphs};
use crate::engine::model::{CentralityMetric, Cluster, Edge, Entity, GraphSnapshot, StructuralGap};
use crate::error::{GraphError, GraphResult};

/// One generated research hypothesis for a gap.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hypothesis {
	/// Short headline.
	pub title: String,
	/// What the hypothesis claims.
	pub description: String,
	/// How it could be tested.
	#[serde(default)]
	pub methodology: String,
	/// Concepts that link the two sides.
	#[serde(default)]
	pub connecting_concepts: Vec<String>,
	/// Backend confidence in `[0, 1]`.
	#[serde(default)]
	pub confidence: f64,
}

/// Response of `generate-bridge`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BridgeHypotheses {
	/// Kind of bridge the backend proposes.
	pub bridge_type: String,
	/// One-sentence summary.
	pub key_insight: String,
	/// Generated hypotheses, best first.
	#[serde(default)]
	pub hypotheses: Vec<Hypothesis>,
}

/// Response of a cluster recomputation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecomputeResult {
	/// Cluster count the backend settled on.
	pub optimal_k: usize,
}

#[derive(Serialize)]
struct RecomputeRequest {
	cluster_count: usize,
}

/// HTTP client for one analysis backend.
#[derive(Clone, Debug)]
pub struct ApiClient {
	base_url: String,
	http: reqwest::Client,
}

impl ApiClient {
	/// Client for `base_url`; a trailing slash is ignored.
	pub fn new(base_url: &str) -> Self {
		Self {
			base_url: base_url.trim_end_matches('/').to_string(),
			http: reqwest::Client::new(),
		}
	}

	fn url(&self, path: &str) -> String {
		format!("{}{}", self.base_url, path)
	}

	fn project_path(project_id: &str, rest: &str) -> String {
		format!("/projects/{project_id}{rest}")
	}

	async fn decode<T: DeserializeOwned>(url: String, response: reqwest::Response) -> GraphResult<T> {
		let status = response.status();
		if !status.is_success() {
			return Err(GraphError::Http {
				status: status.as_u16(),
				url,
			});
		}
		response.json::<T>().await.map_err(|e| GraphError::Decode(e.to_string()))
	}

	async fn get<T: DeserializeOwned>(&self, path: &str) -> GraphResult<T> {
		let url = self.url(path);
		debug!("GET {url}");
		let response = self.http.get(&url).send().await?;
		Self::decode(url, response).await
	}

	async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> GraphResult<T> {
		let url = self.url(path);
		debug!("POST {url}");
		let response = self.http.post(&url).json(body).send().await?;
		Self::decode(url, response).await
	}

	/// Fetch all five collections concurrently and assemble a snapshot.
	/// An empty entity list is reported as [`GraphError::DataUnavailable`].
	pub async fn fetch_snapshot(&self, project_id: &str) -> GraphResult<GraphSnapshot> {
		let entities_path = Self::project_path(project_id, "/entities");
		let edges_path = Self::project_path(project_id, "/edges");
		let clusters_path = Self::project_path(project_id, "/clusters");
		let centrality_path = Self::project_path(project_id, "/centrality");
		let gaps_path = Self::project_path(project_id, "/gaps");

		let (entities, edges, clusters, metrics, gaps) = try_join!(
			self.get::<Vec<Entity>>(&entities_path),
			self.get::<Vec<Edge>>(&edges_path),
			self.get::<Vec<Cluster>>(&clusters_path),
			self.get::<Vec<CentralityMetric>>(&centrality_path),
			self.get::<Vec<StructuralGap>>(&gaps_path),
		)?;

		if entities.is_empty() {
			return Err(GraphError::DataUnavailable(format!(
				"project {project_id} has no entities yet"
			)));
		}
		info!(
			"loaded project {project_id}: {} entities, {} edges, {} clusters, {} gaps",
			entities.len(),
			edges.len(),
			clusters.len(),
			gaps.len()
		);
		Ok(GraphSnapshot::new(entities, edges, clusters, gaps, metrics))
	}

	pub async fn generate_bridge(&self, project_id: &str, gap_id: &str) -> GraphResult<BridgeHypotheses> {
		let path = Self::project_path(project_id, &format!("/gaps/{gap_id}/generate-bridge"));
		self.post(&path, &serde_json::json!({})).await
	}

	pub async fn recompute_clusters(&self, project_id: &str, cluster_count: usize) -> GraphResult<RecomputeResult> {
		let path = Self::project_path(project_id, "/clusters/recompute");
		self.post(&path, &RecomputeRequest { cluster_count }).await
	}

	pub async fn start_citation_build(&self, project_id: &str) -> GraphResult<BuildStatus> {
		let path = Self::project_path(project_id, "/citation-network/build");
		self.post(&path, &serde_json::json!({})).await
	}

	pub async fn citation_build_status(&self, project_id: &str) -> GraphResult<BuildStatus> {
		self.get(&Self::project_path(project_id, "/citation-network/status")).await
	}

	pub async fn compare(&self, project_a: &str, project_b: &str) -> GraphResult<ComparisonData> {
		let url = self.url("/compare");
		debug!("GET {url} a={project_a} b={project_b}");
		let response = self
			.http
			.get(&url)
			.query(&[("a", project_a), ("b", project_b)])
			.send()
			.await?;
		Self::decode(url, response).await
	}

	/// Backend comparison, or a local comparison of both snapshots when the
	/// backend has no comparison endpoint.
	pub async fn compare_projects(&self, project_a: &str, project_b: &str) -> GraphResult<ComparisonData> {
		match self.compare(project_a, project_b).await {
			Err(GraphError::Http { status: 404, .. }) => {
				debug!("no compare endpoint, comparing {project_a} and {project_b} locally");
				let (a, b) = try_join!(self.fetch_snapshot(project_a), self.fetch_snapshot(project_b))?;
				Ok(compare_graphs(&a.entities, &b.entities))
			}
			other => other,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	#[test]
	fn urls_are_joined_without_double_slashes() {
		let client = ApiClient::new("http://localhost:8000/api/");
		assert_eq!(
			client.url(&ApiClient::project_path("p1", "/entities")),
			"http://localhost:8000/api/projects/p1/entities"
		);
	}

	#[test]
	fn bridge_hypotheses_tolerate_missing_fields() {
		let parsed: BridgeHypotheses = serde_json::from_str(
			r#"{
				"bridge_type": "methodological",
				"key_insight": "shared evaluation protocol",
				"hypotheses": [{"title": "T", "description": "D", "confidence": 0.8}]
			}"#,
		)
		.unwrap();
		assert_eq!(parsed.hypotheses.len(), 1);
		assert_eq!(parsed.hypotheses[0].connecting_concepts, Vec::<String>::new());
		assert_eq!(parsed.hypotheses[0].confidence, 0.8);
	}

	#[test]
	fn comparison_payload_decodes() {
		let data: ComparisonData = serde_json::from_str(
			r#"{"common_entities":3,"unique_to_a":1,"unique_to_b":2,"jaccard_similarity":0.5,"overlap_coefficient":0.75}"#,
		)
		.unwrap();
		assert_eq!(data.common_entities, 3);
		assert_eq!(data.overlap_coefficient, 0.75);
	}
}
