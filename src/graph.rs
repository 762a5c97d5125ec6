//! Aggregation of event records into a node/link graph document.
//!
//! The output shape feeds a force-directed graph: one node per country, one
//! per event type, and one weighted link per (country, event type) pair.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;

use crate::error::EtlError;
use crate::parser::{EventRecord, week_year};

/// Window width for time-filtered aggregation, inclusive of the newest year.
pub const WINDOW_YEARS: i32 = 10;

/// Which side of the bipartite graph a node belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeGroup {
    Country,
    EventType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub group: NodeGroup,
}

/// A weighted edge from a country node to an event-type node.
/// Only emitted when `value > 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphLink {
    pub source: String,
    pub target: String,
    pub value: u64,
}

/// The root document serialized for the visualization.
#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct GraphDocument {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

/// Inclusive year range retained by the time window, reported on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
}

/// Builds a [`GraphDocument`] from a flat event table.
///
/// With `last_ten_years` set, only records whose `WEEK` year falls within
/// `[max_year - 9, max_year]` are aggregated, and the resolved range is
/// returned alongside the document. Counts are summed per
/// (country, event type) pair; zero-sum pairs produce no link.
///
/// Nodes and links are ordered by sorted id, so the same input always yields
/// a byte-identical document.
///
/// # Errors
///
/// - [`EtlError::Schema`] if time filtering is requested and a record has no
///   `WEEK` value.
/// - [`EtlError::Parse`] if a `WEEK` value is not a valid date.
/// - [`EtlError::NodeCollision`] if a country name equals an event-type name,
///   which would break node-id uniqueness.
pub fn build_graph(
    records: &[EventRecord],
    last_ten_years: bool,
) -> Result<(GraphDocument, Option<YearRange>), EtlError> {
    let mut retained: Vec<&EventRecord> = Vec::new();
    let mut range = None;

    if last_ten_years {
        let mut years = Vec::with_capacity(records.len());
        for record in records {
            let week = record.week.as_deref().ok_or_else(|| EtlError::Schema {
                column: "WEEK".to_string(),
            })?;
            years.push(week_year(week)?);
        }

        if let Some(&max_year) = years.iter().max() {
            let min_year = max_year - (WINDOW_YEARS - 1);
            retained = records
                .iter()
                .zip(&years)
                .filter(|&(_, &year)| year >= min_year)
                .map(|(record, _)| record)
                .collect();
            range = Some(YearRange {
                min: min_year,
                max: max_year,
            });
        }
    } else {
        retained = records.iter().collect();
    }

    debug!(
        input_rows = records.len(),
        retained_rows = retained.len(),
        "Aggregating event records"
    );

    let mut totals: BTreeMap<(String, String), u64> = BTreeMap::new();
    for record in retained {
        *totals
            .entry((record.country.clone(), record.event_type.clone()))
            .or_default() += record.events;
    }

    let countries: BTreeSet<&str> = totals.keys().map(|(c, _)| c.as_str()).collect();
    let event_types: BTreeSet<&str> = totals.keys().map(|(_, e)| e.as_str()).collect();

    // Country and event-type vocabularies must be disjoint for node ids to
    // stay unique.
    if let Some(id) = countries.intersection(&event_types).next() {
        return Err(EtlError::NodeCollision { id: id.to_string() });
    }

    let mut nodes = Vec::with_capacity(countries.len() + event_types.len());
    nodes.extend(countries.iter().map(|&id| GraphNode {
        id: id.to_string(),
        group: NodeGroup::Country,
    }));
    nodes.extend(event_types.iter().map(|&id| GraphNode {
        id: id.to_string(),
        group: NodeGroup::EventType,
    }));

    let links = totals
        .iter()
        .filter(|&(_, &value)| value > 0)
        .map(|((country, event_type), &value)| GraphLink {
            source: country.clone(),
            target: event_type.clone(),
            value,
        })
        .collect();

    Ok((GraphDocument { nodes, links }, range))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(country: &str, event_type: &str, events: u64, week: Option<&str>) -> EventRecord {
        EventRecord {
            country: country.to_string(),
            event_type: event_type.to_string(),
            events,
            week: week.map(str::to_string),
        }
    }

    #[test]
    fn test_empty_input_yields_empty_document() {
        let (doc, range) = build_graph(&[], false).unwrap();
        assert!(doc.nodes.is_empty());
        assert!(doc.links.is_empty());
        assert!(range.is_none());
    }

    #[test]
    fn test_empty_input_with_window() {
        let (doc, range) = build_graph(&[], true).unwrap();
        assert_eq!(doc, GraphDocument::default());
        assert!(range.is_none());
    }

    #[test]
    fn test_aggregates_and_drops_zero_links() {
        let records = vec![
            rec("Jordan", "Protest", 3, None),
            rec("Jordan", "Protest", 2, None),
            rec("Syria", "Riot", 0, None),
        ];
        let (doc, _) = build_graph(&records, false).unwrap();

        assert_eq!(
            doc.nodes,
            vec![
                GraphNode {
                    id: "Jordan".to_string(),
                    group: NodeGroup::Country,
                },
                GraphNode {
                    id: "Syria".to_string(),
                    group: NodeGroup::Country,
                },
                GraphNode {
                    id: "Protest".to_string(),
                    group: NodeGroup::EventType,
                },
                GraphNode {
                    id: "Riot".to_string(),
                    group: NodeGroup::EventType,
                },
            ]
        );
        assert_eq!(
            doc.links,
            vec![GraphLink {
                source: "Jordan".to_string(),
                target: "Protest".to_string(),
                value: 5,
            }]
        );
    }

    #[test]
    fn test_total_count_is_conserved() {
        let records = vec![
            rec("Jordan", "Protest", 3, None),
            rec("Jordan", "Riot", 4, None),
            rec("Syria", "Protest", 5, None),
            rec("Syria", "Protest", 1, None),
        ];
        let (doc, _) = build_graph(&records, false).unwrap();

        let link_total: u64 = doc.links.iter().map(|l| l.value).sum();
        let record_total: u64 = records.iter().map(|r| r.events).sum();
        assert_eq!(link_total, record_total);
    }

    #[test]
    fn test_link_endpoints_are_nodes() {
        let records = vec![
            rec("Jordan", "Protest", 3, None),
            rec("Syria", "Riot", 2, None),
            rec("Iraq", "Protest", 7, None),
        ];
        let (doc, _) = build_graph(&records, false).unwrap();

        for link in &doc.links {
            assert!(link.value > 0);
            assert!(doc.nodes.iter().any(|n| n.id == link.source && n.group == NodeGroup::Country));
            assert!(
                doc.nodes
                    .iter()
                    .any(|n| n.id == link.target && n.group == NodeGroup::EventType)
            );
        }
    }

    #[test]
    fn test_deterministic_output() {
        let records = vec![
            rec("Syria", "Riot", 2, None),
            rec("Jordan", "Protest", 3, None),
            rec("Iraq", "Battle", 1, None),
        ];
        let (first, _) = build_graph(&records, false).unwrap();
        let (second, _) = build_graph(&records, false).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_window_keeps_last_ten_years() {
        let records: Vec<EventRecord> = (2010..=2023)
            .map(|year| {
                let week = format!("01-January-{year}");
                rec("Jordan", "Protest", 1, Some(week.as_str()))
            })
            .collect();
        let (doc, range) = build_graph(&records, true).unwrap();

        let range = range.unwrap();
        assert_eq!(range.min, 2014);
        assert_eq!(range.max, 2023);
        // 2014..=2023 inclusive, one event per year
        assert_eq!(doc.links.len(), 1);
        assert_eq!(doc.links[0].value, 10);
    }

    #[test]
    fn test_window_without_week_value() {
        let records = vec![rec("Jordan", "Protest", 3, None)];
        let err = build_graph(&records, true).unwrap_err();
        assert!(matches!(err, EtlError::Schema { column } if column == "WEEK"));
    }

    #[test]
    fn test_window_with_malformed_week() {
        let records = vec![rec("Jordan", "Protest", 3, Some("garbage"))];
        let err = build_graph(&records, true).unwrap_err();
        assert!(matches!(err, EtlError::Parse { .. }));
    }

    #[test]
    fn test_node_collision_rejected() {
        // "Protest" used both as a country and an event type
        let records = vec![
            rec("Jordan", "Protest", 3, None),
            rec("Protest", "Riot", 2, None),
        ];
        let err = build_graph(&records, false).unwrap_err();
        assert!(matches!(err, EtlError::NodeCollision { id } if id == "Protest"));
    }

    #[test]
    fn test_all_zero_counts_still_emit_nodes() {
        let records = vec![rec("Syria", "Riot", 0, None)];
        let (doc, _) = build_graph(&records, false).unwrap();

        assert_eq!(doc.nodes.len(), 2);
        assert!(doc.links.is_empty());
    }
}
