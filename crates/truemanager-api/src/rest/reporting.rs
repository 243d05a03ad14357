// Reporting endpoints

use super::client::RestClient;
use super::types::{GraphData, GraphDataRequest, GraphQuery, ReportingGraph, ReportingQuery};
use crate::error::Error;

impl RestClient {
    /// Every graph the reporting backend knows about.
    pub async fn list_graphs(&self) -> Result<Vec<ReportingGraph>, Error> {
        self.get("reporting/netdata_graphs").await
    }

    /// Series for `graphs` over the window described by `query`.
    pub async fn graph_data(
        &self,
        graphs: &[GraphQuery],
        query: &ReportingQuery,
    ) -> Result<Vec<GraphData>, Error> {
        self.post(
            "reporting/netdata_get_data",
            &GraphDataRequest {
                graphs,
                reporting_query: query,
            },
        )
        .await
    }
}
