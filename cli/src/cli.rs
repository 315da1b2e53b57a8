use clap::{Parser, Subcommand, ValueHint};
use std::path::PathBuf;

#[derive(Parser)]
#[command(about, version, name = "rdf-weave")]
/// RDF Weave command line tool to collect pattern statistics, reorder and evaluate basic graph patterns
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Collect the pattern statistics of an RDF file and print them
    Stats {
        /// File to read the quads from
        ///
        /// If no file is given, stdin is read.
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
        /// The format of the file to read
        ///
        /// It can be an extension like "nt" or a MIME type like "application/n-triples".
        ///
        /// By default the format is guessed from the input file extension.
        #[arg(long, required_unless_present = "file")]
        format: Option<String>,
        /// Base IRI of the file to read
        #[arg(long, value_hint = ValueHint::Url)]
        base: Option<String>,
    },
    /// Print the basic graph patterns of a SPARQL query in evaluation order
    Reorder {
        /// File to read the SPARQL query from
        ///
        /// Use "-" to read the query from stdin.
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        query: PathBuf,
        /// The pattern optimizer: "none", "fixed", or the path of a statistics file
        #[arg(long, default_value = "fixed")]
        optimizer: String,
        /// Database directory to discover the optimizer from
        ///
        /// The marker files none.opt, stats.opt and fixed.opt are looked up in this directory.
        #[arg(long, conflicts_with = "optimizer", value_hint = ValueHint::DirPath)]
        location: Option<PathBuf>,
    },
    /// Evaluate the basic graph patterns of a SPARQL query over an RDF file
    ///
    /// The solutions of every basic graph pattern are printed as tab-separated terms.
    Query {
        /// File to read the quads from
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// The format of the file to read
        ///
        /// By default the format is guessed from the input file extension.
        #[arg(long)]
        format: Option<String>,
        /// Base IRI of the file to read
        #[arg(long, value_hint = ValueHint::Url)]
        base: Option<String>,
        /// File to read the SPARQL query from
        ///
        /// Use "-" to read the query from stdin.
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        query: PathBuf,
        /// The pattern optimizer: "none", "fixed", or the path of a statistics file
        #[arg(long, default_value = "fixed")]
        optimizer: String,
        /// Database directory to discover the optimizer from
        #[arg(long, conflicts_with = "optimizer", value_hint = ValueHint::DirPath)]
        location: Option<PathBuf>,
        /// Sort join inputs that are not sorted on their shared variables instead of hash joining them
        #[arg(long)]
        sort_unsorted_inputs: bool,
        /// Check that merge join inputs are sorted [default: true in debug builds, false otherwise]
        #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
        check_sorted: Option<bool>,
    },
}
