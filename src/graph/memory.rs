// In-memory build graph backed by petgraph
// Tasks are nodes, edges point from a prerequisite to the task that waits on it

use super::{
    ArchiveContent, ArchiveSpec, BuildGraph, ClasspathEntry, CompilationUnit, DependencySet, Task,
    TaskKind,
};
use crate::error::{GraphError, Result};
use crate::identifier::{
    compile_classpath_set_name, compile_only_set_name, compile_task_name, output_dir,
    validation_task_name, ARCHIVE_TASK, CHECK_TASK, MAIN_COMPILE_TASK, MAIN_UNIT,
};
use crate::project::ProjectLayout;
use petgraph::algo::{astar, tarjan_scc, toposort};
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::Direction;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct InMemoryBuildGraph {
    units: BTreeMap<String, CompilationUnit>,
    dependency_sets: BTreeMap<String, DependencySet>,
    tasks: StableDiGraph<Task, ()>,
    task_index: HashMap<String, NodeIndex>,
    archive: ArchiveSpec,
}

/// Order-independent view of a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskSnapshot {
    pub kind: TaskKind,
    pub unit: Option<String>,
    pub release: Option<u32>,
    pub depends_on: BTreeSet<String>,
}

/// Order-independent view of the whole graph; two graphs declaring the same
/// entities compare equal regardless of the order they were declared in
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphSnapshot {
    pub units: BTreeMap<String, CompilationUnit>,
    pub dependency_sets: BTreeMap<String, DependencySet>,
    pub tasks: BTreeMap<String, TaskSnapshot>,
    pub archive: ArchiveSpec,
}

impl GraphSnapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl InMemoryBuildGraph {
    /// Graph with the baseline unit, the aggregate check and the archive task declared
    pub fn new(layout: &ProjectLayout) -> Result<Self> {
        let mut graph = Self {
            units: BTreeMap::new(),
            dependency_sets: BTreeMap::new(),
            tasks: StableDiGraph::new(),
            task_index: HashMap::new(),
            archive: ArchiveSpec::new(ARCHIVE_TASK, layout.archive_name.clone()),
        };

        graph.create_unit(MAIN_UNIT, &PathBuf::from("src").join(MAIN_UNIT).join("java"))?;
        let classpath = compile_classpath_set_name(MAIN_UNIT);
        for library in &layout.dependencies {
            graph
                .set_mut(&classpath)?
                .entries
                .insert(ClasspathEntry::Library(library.clone()));
        }
        graph.set_release(MAIN_COMPILE_TASK, layout.baseline_release)?;

        graph.add_task(Task::new(CHECK_TASK, TaskKind::Aggregate));
        graph.add_task_dependency(CHECK_TASK, &validation_task_name(MAIN_UNIT))?;

        graph.add_task(Task::new(ARCHIVE_TASK, TaskKind::Archive));
        graph.add_archive_content(MAIN_UNIT, Path::new(""))?;
        if layout.archive_requires_validation {
            graph.add_task_dependency(ARCHIVE_TASK, CHECK_TASK)?;
        }

        Ok(graph)
    }

    pub fn units(&self) -> impl Iterator<Item = &CompilationUnit> {
        self.units.values()
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.node_weights()
    }

    /// Direct prerequisites of a task, sorted by name
    pub fn prerequisites(&self, task: &str) -> Result<Vec<String>> {
        let idx = self.index_of(task)?;
        let mut names: Vec<String> = self
            .tasks
            .neighbors_directed(idx, Direction::Incoming)
            .map(|n| self.tasks[n].name.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    /// Transitive closure of a dependency set over its `extends_from` parents
    pub fn resolve_classpath(&self, set: &str) -> Result<BTreeSet<ClasspathEntry>> {
        let mut resolved = BTreeSet::new();
        let mut visited = BTreeSet::new();
        let mut pending = vec![set.to_string()];

        while let Some(name) = pending.pop() {
            if !visited.insert(name.clone()) {
                continue;
            }
            let current = self
                .dependency_sets
                .get(&name)
                .ok_or_else(|| GraphError::UnknownDependencySet { name: name.clone() })?;
            resolved.extend(current.entries.iter().cloned());
            pending.extend(current.extends_from.iter().cloned());
        }

        Ok(resolved)
    }

    /// Group tasks into levels; every task only depends on tasks of earlier levels
    pub fn execution_levels(&self) -> Result<Vec<Vec<String>>> {
        let order = toposort(&self.tasks, None).map_err(|cycle| GraphError::CircularDependency {
            cycle: self.cycle_members(cycle.node_id()),
            suggested_fix: Some("Remove one of the task dependencies to break the cycle".to_string()),
        })?;

        let mut level_of: HashMap<NodeIndex, usize> = HashMap::new();
        let mut levels: Vec<Vec<String>> = Vec::new();
        for idx in order {
            let level = self
                .tasks
                .neighbors_directed(idx, Direction::Incoming)
                .filter_map(|pred| level_of.get(&pred))
                .map(|l| l + 1)
                .max()
                .unwrap_or(0);
            level_of.insert(idx, level);
            if levels.len() <= level {
                levels.resize_with(level + 1, Vec::new);
            }
            levels[level].push(self.tasks[idx].name.clone());
        }

        for level in &mut levels {
            level.sort();
        }
        Ok(levels)
    }

    // Names of the strongly connected component containing `start`, closed back onto its first member
    fn cycle_members(&self, start: NodeIndex) -> Vec<String> {
        let mut members: Vec<String> = tarjan_scc(&self.tasks)
            .into_iter()
            .find(|component| component.contains(&start))
            .unwrap_or_else(|| vec![start])
            .into_iter()
            .map(|idx| self.tasks[idx].name.clone())
            .collect();
        members.sort();
        if let Some(first) = members.first().cloned() {
            members.push(first);
        }
        members
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        let tasks = self
            .tasks
            .node_indices()
            .map(|idx| {
                let task = &self.tasks[idx];
                let depends_on = self
                    .tasks
                    .neighbors_directed(idx, Direction::Incoming)
                    .map(|n| self.tasks[n].name.clone())
                    .collect();
                (
                    task.name.clone(),
                    TaskSnapshot {
                        kind: task.kind,
                        unit: task.unit.clone(),
                        release: task.release,
                        depends_on,
                    },
                )
            })
            .collect();

        GraphSnapshot {
            units: self.units.clone(),
            dependency_sets: self.dependency_sets.clone(),
            tasks,
            archive: self.archive.clone(),
        }
    }

    fn add_task(&mut self, task: Task) -> NodeIndex {
        if let Some(&idx) = self.task_index.get(&task.name) {
            return idx;
        }
        let name = task.name.clone();
        let idx = self.tasks.add_node(task);
        self.task_index.insert(name, idx);
        idx
    }

    fn index_of(&self, task: &str) -> Result<NodeIndex> {
        self.task_index.get(task).copied().ok_or_else(|| {
            GraphError::UnknownTask {
                task: task.to_string(),
                suggestion: None,
            }
            .into()
        })
    }

    fn set_mut(&mut self, name: &str) -> Result<&mut DependencySet> {
        self.dependency_sets.get_mut(name).ok_or_else(|| {
            GraphError::UnknownDependencySet {
                name: name.to_string(),
            }
            .into()
        })
    }

    fn unit_or_err(&self, name: &str) -> Result<&CompilationUnit> {
        self.units.get(name).ok_or_else(|| {
            GraphError::UnknownUnit {
                unit: name.to_string(),
            }
            .into()
        })
    }
}

impl BuildGraph for InMemoryBuildGraph {
    fn create_unit(&mut self, name: &str, source_root: &Path) -> Result<bool> {
        if let Some(existing) = self.units.get(name) {
            if existing.source_root == source_root {
                return Ok(false);
            }
            return Err(GraphError::IdentifierCollision {
                unit: name.to_string(),
                existing_root: existing.source_root.clone(),
                requested_root: source_root.to_path_buf(),
            }
            .into());
        }

        let unit = CompilationUnit {
            name: name.to_string(),
            source_root: source_root.to_path_buf(),
            output_dir: output_dir(name),
            compile_task: compile_task_name(name),
            validation_task: validation_task_name(name),
            compile_only_set: compile_only_set_name(name),
            compile_classpath_set: compile_classpath_set_name(name),
        };

        let compile_only = DependencySet::new(&unit.compile_only_set);
        let mut classpath = DependencySet::new(&unit.compile_classpath_set);
        classpath.extends_from.insert(unit.compile_only_set.clone());
        self.dependency_sets
            .insert(compile_only.name.clone(), compile_only);
        self.dependency_sets.insert(classpath.name.clone(), classpath);

        self.add_task(Task::new(&unit.compile_task, TaskKind::Compile).for_unit(name));
        self.add_task(Task::new(&unit.validation_task, TaskKind::Validation).for_unit(name));

        tracing::trace!(unit = %name, root = %source_root.display(), "Declared compilation unit");
        self.units.insert(name.to_string(), unit);
        Ok(true)
    }

    fn unit(&self, name: &str) -> Option<&CompilationUnit> {
        self.units.get(name)
    }

    fn dependency_set(&self, name: &str) -> Option<&DependencySet> {
        self.dependency_sets.get(name)
    }

    fn add_compile_only(&mut self, unit: &str, entry: ClasspathEntry) -> Result<()> {
        let target = self.unit_or_err(unit)?.clone();

        // Compiling against another unit's output means compiling after it
        if let ClasspathEntry::UnitOutput(ref producer) = entry {
            let producer_task = self.unit_or_err(producer)?.compile_task.clone();
            self.add_task_dependency(&target.compile_task, &producer_task)?;
        }

        self.set_mut(&target.compile_only_set)?.entries.insert(entry);
        Ok(())
    }

    fn extend_classpath(&mut self, unit: &str, parent: &str) -> Result<()> {
        let classpath = self.unit_or_err(unit)?.compile_classpath_set.clone();
        if !self.dependency_sets.contains_key(parent) {
            return Err(GraphError::UnknownDependencySet {
                name: parent.to_string(),
            }
            .into());
        }

        // A set must never end up extending itself
        let mut reachable = BTreeSet::new();
        let mut pending = vec![parent.to_string()];
        while let Some(name) = pending.pop() {
            if name == classpath {
                return Err(GraphError::CircularDependency {
                    cycle: vec![classpath.clone(), parent.to_string(), classpath],
                    suggested_fix: None,
                }
                .into());
            }
            if reachable.insert(name.clone()) {
                if let Some(set) = self.dependency_sets.get(&name) {
                    pending.extend(set.extends_from.iter().cloned());
                }
            }
        }

        self.set_mut(&classpath)?
            .extends_from
            .insert(parent.to_string());
        Ok(())
    }

    fn task(&self, name: &str) -> Option<&Task> {
        self.task_index.get(name).map(|&idx| &self.tasks[idx])
    }

    fn set_release(&mut self, task: &str, release: u32) -> Result<()> {
        let idx = self.index_of(task)?;
        let node = &mut self.tasks[idx];
        match node.release {
            Some(existing) if existing != release => Err(GraphError::DirectiveConflict {
                task: task.to_string(),
                existing,
                requested: release,
            }
            .into()),
            _ => {
                node.release = Some(release);
                Ok(())
            }
        }
    }

    fn add_task_dependency(&mut self, task: &str, prerequisite: &str) -> Result<()> {
        let task_idx = self.index_of(task)?;
        let prereq_idx = self.index_of(prerequisite).map_err(|_| GraphError::UnknownTask {
            task: prerequisite.to_string(),
            suggestion: Some(format!("Declare '{prerequisite}' before making '{task}' depend on it")),
        })?;

        // An existing path task -> ... -> prerequisite would close a cycle
        let path = if task_idx == prereq_idx {
            Some(vec![task_idx])
        } else {
            astar(&self.tasks, task_idx, |n| n == prereq_idx, |_| 1, |_| 0).map(|(_, path)| path)
        };
        if let Some(path) = path {
            let mut cycle = vec![prerequisite.to_string()];
            cycle.extend(path.into_iter().map(|n| self.tasks[n].name.clone()));
            return Err(GraphError::CircularDependency {
                cycle,
                suggested_fix: Some("Remove one of the task dependencies to break the cycle".to_string()),
            }
            .into());
        }

        self.tasks.update_edge(prereq_idx, task_idx, ());
        Ok(())
    }

    fn set_manifest_attribute(&mut self, key: &str, value: &str) {
        self.archive
            .manifest
            .insert(key.to_string(), value.to_string());
    }

    fn add_archive_content(&mut self, unit: &str, into: &Path) -> Result<()> {
        let compile_task = self.unit_or_err(unit)?.compile_task.clone();
        let archive_task = self.archive.task.clone();
        self.add_task_dependency(&archive_task, &compile_task)?;

        self.archive.contents.insert(ArchiveContent {
            into: into.to_path_buf(),
            unit: unit.to_string(),
        });
        Ok(())
    }

    fn archive(&self) -> &ArchiveSpec {
        &self.archive
    }
}
