use crate::cli::{Args, Command};
use anyhow::{bail, Context};
use clap::Parser;
use rdf_weave::engine::{BgpEngine, EngineOptions};
use rdf_weave::io::{collect_statistics, load_from_reader, parser_for, RdfFormat};
use rdf_weave::logical::bgp::collect_basic_patterns;
use rdf_weave::logical::ReorderSelector;
use rdf_weave::model::Query;
use rdf_weave::physical::join::{JoinConfig, SortednessPolicy};
use rdf_weave::storage::MemQuadStore;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, stdin, stdout, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;

pub fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let matches = Args::parse();
    match matches.command {
        Command::Stats { file, format, base } => {
            let format = if let Some(format) = format {
                rdf_format_from_name(&format)?
            } else if let Some(file) = &file {
                rdf_format_from_path(file)?
            } else {
                bail!("The --format option must be set when reading from stdin")
            };
            let parser = parser_for(format, base.as_deref())?;
            let stats = if let Some(file) = file {
                let reader = BufReader::new(
                    File::open(&file)
                        .with_context(|| format!("Failed to open {}", file.display()))?,
                );
                collect_statistics(parser, reader)?
            } else {
                collect_statistics(parser, stdin().lock())?
            };
            let mut stdout = stdout().lock();
            write!(stdout, "{stats}")?;
            stdout.flush()?;
            Ok(())
        }
        Command::Reorder {
            query,
            optimizer,
            location,
        } => {
            let query = read_query(&query)?;
            let reorder = reorder_selector(&optimizer, location).build()?;
            let mut stdout = BufWriter::new(stdout().lock());
            for bgp in collect_basic_patterns(&query) {
                writeln!(stdout, "{}", reorder.explain(&bgp))?;
            }
            stdout.flush()?;
            Ok(())
        }
        Command::Query {
            file,
            format,
            base,
            query,
            optimizer,
            location,
            sort_unsorted_inputs,
            check_sorted,
        } => {
            let format = match format {
                Some(format) => rdf_format_from_name(&format)?,
                None => rdf_format_from_path(&file)?,
            };
            let query = read_query(&query)?;

            let mut store = MemQuadStore::new();
            let reader = BufReader::new(
                File::open(&file).with_context(|| format!("Failed to open {}", file.display()))?,
            );
            let parser = parser_for(format, base.as_deref())?;
            let loaded = load_from_reader(&mut store, parser, reader)?;
            info!(loaded, file = %file.display(), "Loaded file");

            let options = EngineOptions::default()
                .with_reorder(reorder_selector(&optimizer, location))
                .with_join(join_config(check_sorted))
                .with_sort_unsorted_inputs(sort_unsorted_inputs);
            let engine = BgpEngine::new(Arc::new(store), options)?;

            let mut stdout = BufWriter::new(stdout().lock());
            for (index, bgp) in collect_basic_patterns(&query).iter().enumerate() {
                if index > 0 {
                    writeln!(stdout)?;
                }
                let result = engine.execute(bgp)?;
                let variables = result.variables().iter().cloned().collect::<Vec<_>>();
                let header = variables
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>();
                writeln!(stdout, "{}", header.join("\t"))?;
                for row in result.into_rows()? {
                    let terms = engine
                        .decode_row(&row, &variables)?
                        .into_iter()
                        .map(|term| term.map(|term| term.to_string()).unwrap_or_default())
                        .collect::<Vec<_>>();
                    writeln!(stdout, "{}", terms.join("\t"))?;
                }
            }
            stdout.flush()?;
            Ok(())
        }
    }
}

fn reorder_selector(optimizer: &str, location: Option<PathBuf>) -> ReorderSelector {
    match location {
        Some(location) => ReorderSelector::Discover(location),
        None => ReorderSelector::from_key(optimizer),
    }
}

/// Merge join inputs are only checked for sortedness by default in debug builds.
fn join_config(check_sorted: Option<bool>) -> JoinConfig {
    let config = JoinConfig::default().with_sortedness(SortednessPolicy::Fail);
    match check_sorted {
        Some(check_sorted) => config.with_check_sorted(check_sorted),
        None => config,
    }
}

fn read_query(path: &Path) -> anyhow::Result<Query> {
    let text = if path == Path::new("-") {
        let mut text = String::new();
        stdin()
            .lock()
            .read_to_string(&mut text)
            .context("Failed to read the query from stdin")?;
        text
    } else {
        fs::read_to_string(path)
            .with_context(|| format!("Failed to read the query from {}", path.display()))?
    };
    Query::parse(&text, None).context("Invalid SPARQL query")
}

fn format_from_path<T>(
    path: &Path,
    from_extension: impl FnOnce(&str) -> anyhow::Result<T>,
) -> anyhow::Result<T> {
    if let Some(ext) = path.extension().and_then(OsStr::to_str) {
        from_extension(ext).map_err(|e| {
            e.context(format!(
                "Not able to guess the file format from file name extension '{ext}'"
            ))
        })
    } else {
        bail!(
            "The path {} has no extension to guess a file format from",
            path.display()
        )
    }
}

fn rdf_format_from_path(path: &Path) -> anyhow::Result<RdfFormat> {
    format_from_path(path, |ext| {
        RdfFormat::from_extension(ext)
            .with_context(|| format!("The file extension '{ext}' is unknown"))
    })
}

fn rdf_format_from_name(name: &str) -> anyhow::Result<RdfFormat> {
    if let Some(t) = RdfFormat::from_extension(name) {
        return Ok(t);
    }
    if let Some(t) = RdfFormat::from_media_type(name) {
        return Ok(t);
    }
    bail!("The file format '{name}' is unknown")
}

#[cfg(test)]
mod tests {
    use super::join_config;
    use anyhow::Result;
    use assert_cmd::Command;
    use rdf_weave::physical::join::JoinConfig;
    use assert_fs::prelude::*;
    use assert_fs::{NamedTempFile, TempDir};
    use predicates::prelude::*;

    const DATA: &str = r#"
@prefix ex: <http://example.com/> .

ex:alice ex:knows ex:bob ; ex:name "Alice" .
ex:carol ex:knows ex:bob .
"#;

    const QUERY: &str =
        r#"SELECT * WHERE { ?s ?p ?o . ?s <http://example.com/name> "Alice" }"#;

    fn cli_command() -> Command {
        Command::cargo_bin("rdf-weave").unwrap()
    }

    fn data_file() -> Result<NamedTempFile> {
        let file = NamedTempFile::new("data.ttl")?;
        file.write_str(DATA)?;
        Ok(file)
    }

    #[test]
    fn cli_help() {
        cli_command()
            .assert()
            .failure()
            .stdout("")
            .stderr(predicate::str::contains("Usage"));
    }

    #[test]
    fn cli_stats_file() -> Result<()> {
        let data = data_file()?;
        cli_command()
            .arg("stats")
            .arg("--file")
            .arg(data.path())
            .assert()
            .success()
            .stdout(predicate::str::starts_with("# Pattern statistics\ncount 3\n"))
            .stdout(predicate::str::contains("\n<http://example.com/knows> 2\n"))
            .stdout(predicate::str::contains(
                "\nVAR <http://example.com/knows> TERM 2\n",
            ));
        Ok(())
    }

    #[test]
    fn cli_stats_stdin_requires_format() {
        cli_command()
            .arg("stats")
            .write_stdin(DATA)
            .assert()
            .failure();
        cli_command()
            .arg("stats")
            .arg("--format")
            .arg("ttl")
            .write_stdin(DATA)
            .assert()
            .success()
            .stdout(predicate::str::contains("count 3"));
    }

    #[test]
    fn cli_reorder_stdin() {
        cli_command()
            .arg("reorder")
            .arg("--query")
            .arg("-")
            .write_stdin(QUERY)
            .assert()
            .success()
            .stdout(concat!(
                "Reorder (fixed)\n",
                "  0: #1 (?s <http://example.com/name> \"Alice\") [weight=10000]\n",
                "  1: #0 (?s ?p ?o) [weight=100]\n",
            ));
    }

    #[test]
    fn cli_reorder_with_statistics() -> Result<()> {
        let stats = NamedTempFile::new("stats.opt")?;
        stats.write_str("VAR VAR VAR 1\nVAR <http://example.com/name> TERM 5\n")?;
        cli_command()
            .arg("reorder")
            .arg("--query")
            .arg("-")
            .arg("--optimizer")
            .arg(stats.path())
            .write_stdin(QUERY)
            .assert()
            .success()
            .stdout(predicate::str::starts_with(
                "Reorder (weighted)\n  0: #0 (?s ?p ?o) [weight=1]\n",
            ));
        Ok(())
    }

    #[test]
    fn cli_reorder_missing_statistics() {
        cli_command()
            .arg("reorder")
            .arg("--query")
            .arg("-")
            .arg("--optimizer")
            .arg("does-not-exist.opt")
            .write_stdin(QUERY)
            .assert()
            .failure()
            .stderr(predicate::str::contains(
                "The statistics file does-not-exist.opt does not exist",
            ));
    }

    #[test]
    fn cli_reorder_discovers_optimizer() -> Result<()> {
        let location = TempDir::new()?;
        location.child("none.opt").touch()?;
        cli_command()
            .arg("reorder")
            .arg("--query")
            .arg("-")
            .arg("--location")
            .arg(location.path())
            .write_stdin(QUERY)
            .assert()
            .success()
            .stdout(predicate::str::starts_with("Reorder (none)\n  0: #0 (?s ?p ?o)\n"));
        Ok(())
    }

    #[test]
    fn cli_reorder_rejects_invalid_query() {
        cli_command()
            .arg("reorder")
            .arg("--query")
            .arg("-")
            .write_stdin("SELECT WHERE")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid SPARQL query"));
    }

    #[test]
    fn cli_query() -> Result<()> {
        let data = data_file()?;
        let query = NamedTempFile::new("query.rq")?;
        query.write_str(
            "SELECT ?s WHERE { ?s <http://example.com/knows> <http://example.com/bob> }",
        )?;
        cli_command()
            .arg("query")
            .arg("--file")
            .arg(data.path())
            .arg("--query")
            .arg(query.path())
            .assert()
            .success()
            .stdout("?s\n<http://example.com/alice>\n<http://example.com/carol>\n");
        Ok(())
    }

    #[test]
    fn check_sorted_defaults_to_build_profile() {
        assert_eq!(join_config(None), JoinConfig::default());
        assert_eq!(join_config(None).check_sorted, cfg!(debug_assertions));
        assert!(join_config(Some(true)).check_sorted);
        assert!(!join_config(Some(false)).check_sorted);
    }

    #[test]
    fn cli_query_accepts_check_sorted_value() -> Result<()> {
        let data = data_file()?;
        for value in ["false", "true"] {
            cli_command()
                .arg("query")
                .arg("--file")
                .arg(data.path())
                .arg("--query")
                .arg("-")
                .arg("--check-sorted")
                .arg(value)
                .write_stdin(QUERY)
                .assert()
                .success()
                .stdout(predicate::str::starts_with("?o\t?p\t?s\n"));
        }
        Ok(())
    }

    #[test]
    fn cli_query_joins_patterns() -> Result<()> {
        let data = data_file()?;
        cli_command()
            .arg("query")
            .arg("--file")
            .arg(data.path())
            .arg("--query")
            .arg("-")
            .arg("--sort-unsorted-inputs")
            .arg("--check-sorted")
            .write_stdin(QUERY)
            .assert()
            .success()
            .stdout(predicate::str::starts_with("?o\t?p\t?s\n"))
            .stdout(predicate::str::contains(
                "<http://example.com/bob>\t<http://example.com/knows>\t<http://example.com/alice>\n",
            ))
            .stdout(predicate::str::contains(
                "\"Alice\"\t<http://example.com/name>\t<http://example.com/alice>\n",
            ));
        Ok(())
    }
}
