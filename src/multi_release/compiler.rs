// Pins the release level of a versioned unit's compile task
use crate::error::Result;
use crate::graph::BuildGraph;
use crate::identifier::UnitIdentifier;

pub struct CompilerConfigurator;

impl CompilerConfigurator {
    /// Whether the running toolchain supports the release is left to the toolchain itself.
    pub fn configure<G: BuildGraph + ?Sized>(graph: &mut G, id: &UnitIdentifier) -> Result<()> {
        graph.set_release(&id.compile_task(), id.version().get())
    }
}
