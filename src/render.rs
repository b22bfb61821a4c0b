use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;

use crate::error::{Result, SocialMapError};
use crate::export::{clusters, GraphExport};
use crate::graph::{User, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    /// `{"users": [...], "edges": [...]}` dump
    Json,
    /// Graphviz text, one cluster per first endpoint
    Dot,
    /// Edge list with both names
    Csv,
}

#[derive(Debug, Serialize)]
struct EdgeRow<'a> {
    a: UserId,
    a_name: &'a str,
    b: UserId,
    b_name: &'a str,
}

pub fn render<W: Write>(graph: &GraphExport, format: Format, out: W) -> Result<()> {
    match format {
        Format::Json => write_json(graph, out),
        Format::Dot => write_dot(graph, out),
        Format::Csv => write_csv(graph, out),
    }
}

pub fn write_json<W: Write>(graph: &GraphExport, mut out: W) -> Result<()> {
    serde_json::to_writer(&mut out, graph).map_err(|e| SocialMapError::Output(e.into()))?;
    out.flush().map_err(SocialMapError::Output)
}

pub fn write_dot<W: Write>(graph: &GraphExport, mut out: W) -> Result<()> {
    let names = name_index(&graph.users);

    writeln!(out, "graph contacts {{").map_err(SocialMapError::Output)?;
    for (cluster, run) in clusters(&graph.edges) {
        writeln!(out, "subgraph cluster_{} {{", cluster).map_err(SocialMapError::Output)?;
        for edge in run {
            writeln!(
                out,
                "\t\"{}\" -- \"{}\"",
                escape(names.get(&edge.a).copied().unwrap_or_default()),
                escape(names.get(&edge.b).copied().unwrap_or_default()),
            )
            .map_err(SocialMapError::Output)?;
        }
        writeln!(out, "}}").map_err(SocialMapError::Output)?;
    }
    writeln!(out, "}}").map_err(SocialMapError::Output)?;
    out.flush().map_err(SocialMapError::Output)
}

pub fn write_csv<W: Write>(graph: &GraphExport, out: W) -> Result<()> {
    let names = name_index(&graph.users);
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(out);

    // header goes out even when there are no rows
    writer.write_record(["a", "a_name", "b", "b_name"])?;
    for edge in &graph.edges {
        writer.serialize(EdgeRow {
            a: edge.a,
            a_name: names.get(&edge.a).copied().unwrap_or_default(),
            b: edge.b,
            b_name: names.get(&edge.b).copied().unwrap_or_default(),
        })?;
    }
    writer.flush().map_err(SocialMapError::Output)
}

fn name_index(users: &[User]) -> HashMap<UserId, &str> {
    users.iter().map(|u| (u.id, u.name.as_str())).collect()
}

fn escape(name: &str) -> String {
    name.replace('\\', "\\\\").replace('"', "\\\"")
}
