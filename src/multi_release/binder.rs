// Binds a newly registered version to its own compilation unit
use crate::error::Result;
use crate::graph::BuildGraph;
use crate::identifier::UnitIdentifier;

pub struct SourceUnitBinder;

impl SourceUnitBinder {
    /// Declare the unit `java<v>` rooted at `src/main/java<v>`.
    ///
    /// Returns `false` if an identical unit had already been declared on the graph.
    pub fn bind<G: BuildGraph + ?Sized>(graph: &mut G, id: &UnitIdentifier) -> Result<bool> {
        let created = graph.create_unit(id.unit_name(), &id.source_root())?;
        if !created {
            tracing::debug!(unit = %id.unit_name(), "Adopting unit declared outside the registry");
        }
        Ok(created)
    }
}
