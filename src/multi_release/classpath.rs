// Wires a versioned unit's compile classpath to the baseline unit
use crate::error::Result;
use crate::graph::{BuildGraph, ClasspathEntry};
use crate::identifier::{UnitIdentifier, MAIN_COMPILE_CLASSPATH, MAIN_UNIT};

pub struct ClasspathLinker;

impl ClasspathLinker {
    /// Adds the two edges every versioned unit gets:
    /// the baseline's compiled classes as a compile-only input, and the
    /// baseline's full compile classpath as a parent of the unit's classpath.
    pub fn link<G: BuildGraph + ?Sized>(graph: &mut G, id: &UnitIdentifier) -> Result<()> {
        graph.add_compile_only(
            id.unit_name(),
            ClasspathEntry::UnitOutput(MAIN_UNIT.to_string()),
        )?;
        graph.extend_classpath(id.unit_name(), MAIN_COMPILE_CLASSPATH)?;
        Ok(())
    }
}
