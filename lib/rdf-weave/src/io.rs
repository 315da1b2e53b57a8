//! Reading RDF files into a [MemQuadStore] or into statistics.

use crate::error::LoaderError;
use rdf_weave_logical::{StatsCollector, StatsTable};
use rdf_weave_storage::MemQuadStore;
use std::io::Read;
use tracing::debug;

pub use oxrdfio::{RdfFormat, RdfParseError, RdfParser, RdfSyntaxError};

/// Loads a graph file (i.e. triples) or a dataset file (i.e. quads) into `store`.
///
/// Blank nodes are renamed, so loading the same file twice inserts two distinct copies of its
/// blank nodes. Returns the number of quads that were not yet part of the store.
///
/// Usage example:
/// ```
/// use rdf_weave::io::{load_from_reader, RdfFormat};
/// use rdf_weave::storage::MemQuadStore;
///
/// let mut store = MemQuadStore::new();
/// let file = b"<http://example.com> <http://example.com> <http://example.com> <http://example.com/g> .";
/// let inserted = load_from_reader(&mut store, RdfFormat::NQuads, file.as_ref())?;
/// assert_eq!(inserted, 1);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
pub fn load_from_reader(
    store: &mut MemQuadStore,
    parser: impl Into<RdfParser>,
    reader: impl Read,
) -> Result<usize, LoaderError> {
    let quads = parser
        .into()
        .rename_blank_nodes()
        .for_reader(reader)
        .collect::<Result<Vec<_>, _>>()?;
    let inserted = store.extend(quads)?;
    debug!(inserted, total = store.len(), "Loaded quads");
    Ok(inserted)
}

/// Collects the pattern statistics of a graph or dataset file without storing its quads.
pub fn collect_statistics(
    parser: impl Into<RdfParser>,
    reader: impl Read,
) -> Result<StatsTable, LoaderError> {
    let mut collector = StatsCollector::new();
    for quad in parser.into().for_reader(reader) {
        collector.add(quad?.as_ref());
    }
    debug!(count = collector.count(), "Collected statistics");
    Ok(collector.finish())
}

/// Creates a parser for `format` that resolves relative IRIs against `base_iri`.
pub fn parser_for(format: RdfFormat, base_iri: Option<&str>) -> Result<RdfParser, LoaderError> {
    let parser = RdfParser::from_format(format);
    match base_iri {
        Some(iri) => parser
            .with_base_iri(iri)
            .map_err(|error| LoaderError::InvalidBaseIri {
                iri: iri.to_owned(),
                error,
            }),
        None => Ok(parser),
    }
}
