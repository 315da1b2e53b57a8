#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! RDF Weave evaluates the basic graph patterns of SPARQL queries.
//!
//! A [BgpEngine](engine::BgpEngine) reorders the patterns of a basic graph pattern with a
//! statistics-driven greedy reorderer, evaluates every pattern against a
//! [PatternSource](storage::PatternSource), and joins the results left-deep. Two results that are
//! sorted on their shared variables are combined with a streaming merge join, all others with a
//! hash join.
//!
//! Usage example:
//! ```
//! use rdf_weave::engine::{BgpEngine, EngineOptions};
//! use rdf_weave::logical::{AtomicPattern, BasicPattern};
//! use rdf_weave::model::{GraphName, NamedNode, Quad, Variable};
//! use rdf_weave::storage::MemQuadStore;
//! use std::sync::Arc;
//!
//! let ex = |name: &str| NamedNode::new_unchecked(format!("http://example.com/{name}"));
//! let mut store = MemQuadStore::new();
//! store.insert(&Quad::new(ex("alice"), ex("knows"), ex("bob"), GraphName::DefaultGraph))?;
//! store.insert(&Quad::new(ex("bob"), ex("knows"), ex("carol"), GraphName::DefaultGraph))?;
//!
//! let engine = BgpEngine::new(Arc::new(store), EngineOptions::default())?;
//! let x = Variable::new_unchecked("x");
//! let y = Variable::new_unchecked("y");
//! let z = Variable::new_unchecked("z");
//! let bgp = BasicPattern::new(vec![
//!     AtomicPattern::triple(x, ex("knows"), y.clone()),
//!     AtomicPattern::triple(y, ex("knows"), z),
//! ]);
//!
//! let rows = engine.execute(&bgp)?.into_rows()?;
//! assert_eq!(rows.len(), 1);
//! # Result::<_, Box<dyn std::error::Error>>::Ok(())
//! ```

pub mod engine;
pub mod error;
pub mod io;

pub mod model {
    pub use rdf_weave_model::*;
}

pub mod common {
    pub use rdf_weave_common::*;
}

pub mod logical {
    pub use rdf_weave_logical::*;
}

pub mod physical {
    pub use rdf_weave_physical::*;
}

pub mod storage {
    pub use rdf_weave_storage::*;
}
