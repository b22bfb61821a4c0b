mod contacts;
mod error;
mod export;
mod graph;
mod prune;
mod render;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::contacts::{discover, records, DEFAULT_PATTERN};
use crate::export::{export, neighborhood};
use crate::graph::{EdgePolicy, GraphBuilder, UserId};
use crate::prune::{prune, prune_self_loops};
use crate::render::{render, Format};

const PROGRESS_EVERY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Policy {
    /// Link the owner of a list to every contact on it
    Star,
    /// Also link every pair of contacts within one list
    Clique,
}

impl From<Policy> for EdgePolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Star => EdgePolicy::Star,
            Policy::Clique => EdgePolicy::Clique,
        }
    }
}

/// Builds an undirected social graph from a tree of per-user contact lists.
#[derive(Debug, Parser)]
#[command(name = "socialmap", version)]
struct Cli {
    /// Root directory of the contact-list dump
    root: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// How a contact list turns into edges
    #[arg(long, value_enum, default_value_t = Policy::Star)]
    policy: Policy,

    /// File name suffix that marks a contact list
    #[arg(long, default_value = DEFAULT_PATTERN)]
    pattern: String,

    /// Remove edges from a user to themselves
    #[arg(long)]
    drop_self_loops: bool,

    /// Skip unreadable or malformed files instead of aborting
    #[arg(long)]
    keep_going: bool,

    /// Only emit the neighborhood of this user
    #[arg(long)]
    focus: Option<UserId>,

    /// Hops from the focus user
    #[arg(long, default_value_t = 2, requires = "focus")]
    depth: usize,

    /// Write the graph here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    NoInput,
    Emitted {
        users: usize,
        edges: usize,
        skipped: usize,
    },
}

fn init_tracing(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet);

    let Some(root) = cli.root.as_deref() else {
        Cli::command().print_help()?;
        return Ok(());
    };

    run(&cli, root, io::stdout().lock())?;
    Ok(())
}

/// Scans `root`, builds the graph and writes it to `--output` or `out`.
fn run<W: Write>(cli: &Cli, root: &Path, out: W) -> Result<Outcome> {
    let found = discover(root, &cli.pattern, cli.keep_going)
        .with_context(|| format!("scanning {}", root.display()))?;
    if found.names.is_empty() {
        println!("No contact files found under {}, aborting", root.display());
        return Ok(Outcome::NoInput);
    }
    let names = found.names;

    let mut builder = GraphBuilder::new(cli.policy.into());
    let mut skipped = found.skipped;

    for (index, record) in records(&names).enumerate() {
        if index % PROGRESS_EVERY == 0 {
            info!("processing record {} of {}", index, names.len());
        }

        match record {
            Ok((owner, contacts)) => {
                builder.observe(owner, &contacts);
            }
            Err(e) if cli.keep_going && e.is_per_file() => {
                warn!("skipping: {}", e);
                skipped += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    let report = prune(&builder.users, &mut builder.edges);
    info!(
        "{} edges pruned because of {} missing users: {:?}",
        report.pruned,
        report.missing.len(),
        report.missing
    );
    if cli.drop_self_loops {
        info!("{} self-loops dropped", prune_self_loops(&mut builder.edges));
    }

    let stats = &builder.stats;
    info!(
        "done! - {} users, {} edges, {} files skipped",
        builder.users.len(),
        builder.edges.len(),
        skipped
    );
    info!("user hit: {}, miss: {}", stats.user_hit, stats.user_miss);
    info!("edge hit: {}, miss: {}", stats.edge_hit, stats.edge_miss);
    info!("distribution of contacts per user: {:?}", stats.contacts_per_file);

    let mut graph = export(&builder.users, &builder.edges);
    if let Some(focus) = cli.focus {
        graph = neighborhood(&graph, focus, cli.depth)?;
        info!(
            "neighborhood of #{}: {} users, {} edges",
            focus,
            graph.users.len(),
            graph.edges.len()
        );
    }

    match &cli.output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
            render(&graph, cli.format, BufWriter::new(file))?;
        }
        None => render(&graph, cli.format, out)?,
    }

    Ok(Outcome::Emitted {
        users: graph.users.len(),
        edges: graph.edges.len(),
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SocialMapError;
    use std::fs;
    use tempfile::TempDir;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("socialmap").chain(args.iter().copied())).unwrap()
    }

    fn dump(files: &[(&str, &str)]) -> TempDir {
        let d = tempfile::tempdir().unwrap();
        for (name, body) in files {
            let path = d.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, body).unwrap();
        }
        d
    }

    fn run_on(d: &TempDir, args: &[&str]) -> (Result<Outcome>, String) {
        let mut buf = Vec::new();
        let outcome = run(&cli(args), d.path(), &mut buf);
        (outcome, String::from_utf8(buf).unwrap())
    }

    const FILE_1: (&str, &str) = (
        "x/1.contacts.json",
        r#"[{"userId":2,"userName":"B"},{"userId":3,"userName":"C"}]"#,
    );
    const FILE_2: (&str, &str) = ("x/y/2.contacts.json", r#"[{"userId":1,"userName":"A"}]"#);

    #[test]
    fn test_cli_root_is_optional() {
        let cli = cli(&[]);
        assert!(cli.root.is_none());
        assert_eq!(cli.format, Format::Json);
        assert_eq!(EdgePolicy::from(cli.policy), EdgePolicy::Star);
        assert_eq!(cli.pattern, DEFAULT_PATTERN);
    }

    #[test]
    fn test_cli_depth_needs_focus() {
        assert!(Cli::try_parse_from(["socialmap", "dump", "--depth", "3"]).is_err());
        let cli = cli(&["dump", "--focus", "4", "--format", "dot", "--policy", "clique"]);
        assert_eq!(cli.focus, Some(4));
        assert_eq!(cli.depth, 2);
        assert_eq!(cli.format, Format::Dot);
        assert_eq!(EdgePolicy::from(cli.policy), EdgePolicy::Clique);
    }

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_two_file_example() {
        let d = dump(&[FILE_1, FILE_2]);
        let (outcome, text) = run_on(&d, &[]);

        assert_eq!(
            outcome.unwrap(),
            Outcome::Emitted {
                users: 3,
                edges: 2,
                skipped: 0
            }
        );
        assert_eq!(
            text,
            concat!(
                r#"{"users":[{"userId":1,"userName":"A","title":""},"#,
                r#"{"userId":2,"userName":"B","title":""},"#,
                r#"{"userId":3,"userName":"C","title":""}],"#,
                r#""edges":[{"A":1,"B":2},{"A":1,"B":3}]}"#
            )
        );
    }

    #[test]
    fn test_run_empty_dir_emits_nothing() {
        let d = dump(&[("notes.txt", "nothing here")]);
        let (outcome, text) = run_on(&d, &[]);

        assert_eq!(outcome.unwrap(), Outcome::NoInput);
        assert!(text.is_empty());
    }

    #[test]
    fn test_run_malformed_file_aborts() {
        let d = dump(&[FILE_1, FILE_2, ("x/3.contacts.json", "[{")]);
        let (outcome, text) = run_on(&d, &[]);

        let err = outcome.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SocialMapError>(),
            Some(SocialMapError::Parse { .. })
        ));
        assert!(text.is_empty());
    }

    #[test]
    fn test_run_bad_owner_id_aborts() {
        let d = dump(&[FILE_1, ("x/bob.contacts.json", "[]")]);
        let (outcome, _) = run_on(&d, &[]);

        assert!(matches!(
            outcome.unwrap_err().downcast_ref::<SocialMapError>(),
            Some(SocialMapError::OwnerId { .. })
        ));
    }

    #[test]
    fn test_run_keep_going_skips_bad_files() {
        let d = dump(&[
            FILE_1,
            FILE_2,
            ("x/3.contacts.json", "[{"),
            ("x/bob.contacts.json", "[]"),
        ]);
        let (outcome, text) = run_on(&d, &["--keep-going"]);

        assert_eq!(
            outcome.unwrap(),
            Outcome::Emitted {
                users: 3,
                edges: 2,
                skipped: 2
            }
        );
        assert!(text.ends_with(r#""edges":[{"A":1,"B":2},{"A":1,"B":3}]}"#));
    }

    #[test]
    fn test_run_drop_self_loops() {
        let d = dump(&[(
            "7.contacts.json",
            r#"[{"userId":7,"userName":"G"},{"userId":1,"userName":"A"}]"#,
        )]);

        let (kept, text) = run_on(&d, &["--format", "csv"]);
        assert_eq!(
            kept.unwrap(),
            Outcome::Emitted {
                users: 2,
                edges: 2,
                skipped: 0
            }
        );
        assert!(text.contains("7,G,7,G"));

        let (dropped, text) = run_on(&d, &["--format", "csv", "--drop-self-loops"]);
        assert_eq!(
            dropped.unwrap(),
            Outcome::Emitted {
                users: 2,
                edges: 1,
                skipped: 0
            }
        );
        assert_eq!(text, "a,a_name,b,b_name\n1,A,7,G\n");
    }

    #[test]
    fn test_run_focus_limits_output() {
        // 1 - 2 - 3 - 4
        let d = dump(&[
            ("1.contacts.json", r#"[{"userId":2,"userName":"B"}]"#),
            ("2.contacts.json", r#"[{"userId":1,"userName":"A"},{"userId":3,"userName":"C"}]"#),
            ("3.contacts.json", r#"[{"userId":4,"userName":"D"},{"userId":2,"userName":"B"}]"#),
        ]);

        let (outcome, text) = run_on(&d, &["--focus", "1", "--depth", "1", "--format", "dot"]);
        assert_eq!(
            outcome.unwrap(),
            Outcome::Emitted {
                users: 2,
                edges: 1,
                skipped: 0
            }
        );
        assert_eq!(text, "graph contacts {\nsubgraph cluster_1 {\n\t\"A\" -- \"B\"\n}\n}\n");

        let (outcome, _) = run_on(&d, &["--focus", "42"]);
        assert!(matches!(
            outcome.unwrap_err().downcast_ref::<SocialMapError>(),
            Some(SocialMapError::UnknownUser(42))
        ));
    }

    #[test]
    fn test_run_writes_output_file() {
        let d = dump(&[FILE_1, FILE_2]);
        let target = d.path().join("graph.dot");
        let (outcome, text) = run_on(&d, &["--format", "dot", "-o", target.to_str().unwrap()]);

        assert!(outcome.is_ok());
        assert!(text.is_empty());
        assert!(fs::read_to_string(&target).unwrap().starts_with("graph contacts {\nsubgraph cluster_1 {\n"));
    }
}
