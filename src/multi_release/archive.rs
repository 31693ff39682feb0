// Places versioned unit output into the archive and marks it multi-release
use crate::error::Result;
use crate::graph::BuildGraph;
use crate::identifier::{UnitIdentifier, MULTI_RELEASE_ATTRIBUTE};

pub struct ArchiveAssembler;

impl ArchiveAssembler {
    pub fn assemble<G: BuildGraph + ?Sized>(graph: &mut G, id: &UnitIdentifier) -> Result<()> {
        // Setting the flag again is a no-op
        graph.set_manifest_attribute(MULTI_RELEASE_ATTRIBUTE, "true");
        graph.add_archive_content(id.unit_name(), &id.archive_path())
    }
}
