// Attaches a versioned unit's validation task to the aggregate check
use crate::error::{GraphError, Result};
use crate::graph::BuildGraph;
use crate::identifier::{UnitIdentifier, CHECK_TASK};

pub struct ValidationHook;

impl ValidationHook {
    pub fn attach<G: BuildGraph + ?Sized>(graph: &mut G, id: &UnitIdentifier) -> Result<()> {
        let validation = id.validation_task();
        if graph.task(&validation).is_none() {
            return Err(GraphError::UnknownTask {
                task: validation,
                suggestion: Some(format!(
                    "The validation collaborator must declare a check for unit '{}'",
                    id.unit_name()
                )),
            }
            .into());
        }
        graph.add_task_dependency(CHECK_TASK, &validation)
    }
}
