// Registration behaviour of the multi-release core against the in-memory graph

use mrjar::graph::BuildGraph;
use mrjar::{ClasspathEntry, LanguageVersion, Project, ProjectLayout, TaskKind};
use std::path::PathBuf;

fn project() -> Project {
    Project::new(ProjectLayout::new("simple")).unwrap()
}

fn versions(project: &Project) -> Vec<u32> {
    project
        .registered_versions()
        .into_iter()
        .map(LanguageVersion::get)
        .collect()
}

#[test]
fn test_single_registration_declares_everything_once() {
    let mut project = project();
    assert!(project.add_language_version(11).unwrap());

    let graph = project.graph();
    let unit = graph.unit("java11").expect("unit java11 should exist");
    assert_eq!(unit.source_root, PathBuf::from("src/main/java11"));

    // exactly one versioned unit next to the baseline
    assert_eq!(graph.units().count(), 2);

    // one compile-only edge onto the baseline output
    let compile_only = graph.dependency_set("java11CompileOnly").unwrap();
    assert_eq!(
        compile_only.entries.iter().cloned().collect::<Vec<_>>(),
        vec![ClasspathEntry::UnitOutput("main".to_string())]
    );

    // one classpath extension onto the baseline classpath
    let classpath = graph.dependency_set("java11CompileClasspath").unwrap();
    assert!(classpath.extends_from.contains("compileClasspath"));

    // one release directive pinned to the version
    let compile = graph.task("compileJava11Java").unwrap();
    assert_eq!(compile.kind, TaskKind::Compile);
    assert_eq!(compile.release, Some(11));

    // one archive rule under versions/11
    let archive = project.archive();
    assert_eq!(
        archive.versioned_paths(),
        vec![PathBuf::from("META-INF/versions/11")]
    );
    assert!(archive.is_multi_release());
}

#[test]
fn test_repeated_registration_changes_nothing() {
    let mut project = project();
    project.add_language_version(11).unwrap();
    let before = project.snapshot();

    assert!(!project.add_language_version(11).unwrap());

    assert_eq!(before, project.snapshot());
    assert_eq!(project.archive().versioned_paths().len(), 1);
    assert_eq!(versions(&project), vec![11]);
}

#[test]
fn test_registration_order_does_not_change_graph() {
    let mut forward = project();
    for v in [11, 17, 11] {
        forward.add_language_version(v).unwrap();
    }

    let mut backward = project();
    for v in [17, 11] {
        backward.add_language_version(v).unwrap();
    }

    assert_eq!(forward.snapshot(), backward.snapshot());
    assert_eq!(
        forward.snapshot().to_json().unwrap(),
        backward.snapshot().to_json().unwrap()
    );
}

#[test]
fn test_bulk_then_single_registration() {
    let mut project = project();
    assert_eq!(project.add_language_versions([9, 11, 17]).unwrap(), 3);
    assert!(!project.add_language_version(11).unwrap());

    assert_eq!(versions(&project), vec![9, 11, 17]);
    assert_eq!(project.graph().units().count(), 4);
    assert_eq!(
        project.archive().versioned_paths(),
        vec![
            PathBuf::from("META-INF/versions/11"),
            PathBuf::from("META-INF/versions/17"),
            PathBuf::from("META-INF/versions/9"),
        ]
    );
}

#[test]
fn test_bulk_registration_counts_only_new_versions() {
    let mut project = project();
    assert_eq!(project.add_language_versions([11, 11, 17, 17]).unwrap(), 2);
    assert_eq!(project.add_language_versions(vec![17, 21]).unwrap(), 1);
    assert_eq!(versions(&project), vec![11, 17, 21]);
}

#[test]
fn test_multi_release_flag_iff_versions_registered() {
    let mut project = project();
    assert!(!project.archive().is_multi_release());
    assert!(!project.archive().manifest_text().contains("Multi-Release"));

    project.add_language_versions(Vec::<i64>::new()).unwrap();
    assert!(!project.archive().is_multi_release());

    project.add_language_version(17).unwrap();
    assert!(project.archive().is_multi_release());
    assert_eq!(
        project.archive().manifest_text(),
        "Manifest-Version: 1.0\r\nMulti-Release: true\r\n"
    );
}

#[test]
fn test_distinct_versions_stay_disjoint() {
    let mut project = project();
    project.add_language_versions([11, 17]).unwrap();
    let graph = project.graph();

    let java11 = graph.resolve_classpath("java11CompileClasspath").unwrap();
    let java17 = graph.resolve_classpath("java17CompileClasspath").unwrap();
    assert!(!java11.contains(&ClasspathEntry::UnitOutput("java17".to_string())));
    assert!(!java17.contains(&ClasspathEntry::UnitOutput("java11".to_string())));

    let java11_set = graph.dependency_set("java11CompileClasspath").unwrap();
    assert!(!java11_set.extends_from.contains("java17CompileClasspath"));

    let layout = project.archive().layout();
    let java11_path = layout.iter().find(|(_, unit)| unit == "java11").unwrap();
    let java17_path = layout.iter().find(|(_, unit)| unit == "java17").unwrap();
    assert!(!java11_path.0.starts_with(&java17_path.0));
    assert!(!java17_path.0.starts_with(&java11_path.0));
}

#[test]
fn test_versioned_unit_inherits_baseline_libraries() {
    let layout = ProjectLayout::new("simple")
        .with_dependencies(vec!["org.jetbrains:annotations:23.0.0".to_string()]);
    let mut project = Project::new(layout).unwrap();
    project.add_language_version(11).unwrap();

    let resolved = project
        .graph()
        .resolve_classpath("java11CompileClasspath")
        .unwrap();
    assert!(resolved.contains(&ClasspathEntry::Library(
        "org.jetbrains:annotations:23.0.0".to_string()
    )));
    assert!(resolved.contains(&ClasspathEntry::UnitOutput("main".to_string())));
}

#[test]
fn test_validation_task_attached_to_check() {
    let mut project = project();
    project.add_language_versions([11, 17]).unwrap();

    assert_eq!(
        project.graph().prerequisites("check").unwrap(),
        vec!["licenseJava11", "licenseJava17", "licenseMain"]
    );
}

#[test]
fn test_archive_waits_for_every_versioned_compile() {
    let mut project = project();
    project.add_language_versions([11, 17]).unwrap();

    let prerequisites = project.graph().prerequisites("jar").unwrap();
    assert!(prerequisites.contains(&"compileJava".to_string()));
    assert!(prerequisites.contains(&"compileJava11Java".to_string()));
    assert!(prerequisites.contains(&"compileJava17Java".to_string()));

    assert_eq!(
        project.graph().prerequisites("compileJava11Java").unwrap(),
        vec!["compileJava"]
    );
}

#[test]
fn test_non_positive_versions_fail_fast() {
    let mut project = project();
    let before = project.snapshot();

    for bad in [0, -1, -17] {
        let err = project.add_language_version(bad).unwrap_err();
        assert!(err.is_configuration_time());
        assert!(err.to_string().contains("Invalid language version"));
    }

    assert!(project.add_language_versions([11, -1]).is_err());
    assert_eq!(before, project.snapshot());
    assert!(project.registered_versions().is_empty());
}

#[test]
fn test_versions_beyond_toolchain_are_not_rejected() {
    let mut project = project();
    assert!(project.add_language_version(99).unwrap());
    assert_eq!(
        project.graph().task("compileJava99Java").unwrap().release,
        Some(99)
    );
}

#[test]
fn test_baseline_release_kept_separate() {
    let mut project = Project::new(ProjectLayout::new("simple").with_baseline_release(8)).unwrap();
    project.add_language_version(11).unwrap();

    assert_eq!(project.graph().task("compileJava").unwrap().release, Some(8));
    assert_eq!(
        project.graph().task("compileJava11Java").unwrap().release,
        Some(11)
    );
}
