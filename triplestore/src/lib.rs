// Life of a query:
// 1. A command (Query, AskQuery, ConstructQuery, Load) reaches a Connection
// 2. The connection hands it to its Session, which takes a Snapshot
// 3. The constraint tree is flattened (nested filters, filtered optional operands)
// 4. The resolver walks the tree bottom-up:
//     - leaf constraints are localized through the string pool and
//       scanned from the quad index
//     - conjunctions join, disjunctions append, filters wrap,
//       optional joins left-join, transitive constraints run to fixpoint
// 5. Sort, projection, distinct and slicing are applied
// 6. The Tuples are wrapped in an Answer, reset to before the first row,
//    and handed back. The caller closes it.
//
// System components:
//  - String pool (term <-> node id)
//  - Copy-on-write quad store with a single writer
//  - Tuples algebra and constraint resolver
//  - Sessions, commands, and the connection factory
//  - Content handlers (N-Triples)

pub mod config;
pub mod connection;
pub mod content;
pub mod logging;
pub mod query;
pub mod store;
pub mod string_pool;
pub mod tuples;
pub mod types;

#[cfg(test)]
mod e2e_tests;
#[cfg(test)]
mod testing;

pub use config::EngineConfig;
pub use connection::{Connection, ConnectionFactory, LocalSession, Session, SessionError};
pub use query::{Answer, AskQuery, BooleanAnswer, ConstructQuery, GraphAnswer, Query, QueryError};
pub use store::{Database, Snapshot, StoreError};
pub use tuples::{Tuples, TuplesError};
pub use types::{Literal, NodeId, Term, Triple, Variable};
