//! Parent chains that leave the batch
//!
//! A descriptor whose parent is neither in the batch nor resolvable must be
//! reported (missing-parents.xml and the capture descriptor) without stopping
//! the rest of the run.

mod support;

use pomalign::{LocalRepository, ProjectKey, VersionManager};
use std::fs;
use support::{catalog, Scratch};

const SERVICE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
    <modelVersion>4.0.0</modelVersion>
    <parent>
        <groupId>org.corp</groupId>
        <artifactId>corp-parent</artifactId>
        <version>12</version>
    </parent>
    <artifactId>billing-service</artifactId>
    <version>2.4.0</version>
    <dependencies>
        <dependency>
            <groupId>org.slf4j</groupId>
            <artifactId>slf4j-api</artifactId>
            <version>1.7.36</version>
        </dependency>
    </dependencies>
</project>
"#;

const CORP_PARENT: &str = r#"<project>
    <modelVersion>4.0.0</modelVersion>
    <groupId>org.corp</groupId>
    <artifactId>corp-parent</artifactId>
    <version>12</version>
    <packaging>pom</packaging>
</project>
"#;

const SERVICES_ROOT: &str = r#"<project>
    <modelVersion>4.0.0</modelVersion>
    <groupId>org.corp.services</groupId>
    <artifactId>services</artifactId>
    <version>1</version>
    <packaging>pom</packaging>
</project>
"#;

const ORDERS: &str = r#"<project>
    <modelVersion>4.0.0</modelVersion>
    <parent>
        <groupId>org.corp.services</groupId>
        <artifactId>services</artifactId>
        <version>1</version>
    </parent>
    <artifactId>orders-service</artifactId>
    <dependencies>
        <dependency>
            <groupId>org.slf4j</groupId>
            <artifactId>slf4j-api</artifactId>
            <version>1.7.36</version>
        </dependency>
    </dependencies>
</project>
"#;

/// BOM that does not manage the corporate parent
fn narrow_bom(scratch: &Scratch) -> String {
    let path = scratch.dir.path().join("narrow-bom.pom");
    fs::write(
        &path,
        r#"<project>
    <groupId>org.platform</groupId>
    <artifactId>narrow-bom</artifactId>
    <version>1</version>
    <dependencyManagement>
        <dependencies>
            <dependency>
                <groupId>org.slf4j</groupId>
                <artifactId>slf4j-api</artifactId>
                <version>2.0.9</version>
            </dependency>
        </dependencies>
    </dependencyManagement>
</project>
"#,
    )
    .unwrap();
    path.display().to_string()
}

#[test]
fn test_unresolvable_parent_is_reported_and_captured() {
    let scratch = Scratch::empty();
    scratch.write("pom.xml", SERVICES_ROOT);
    scratch.write("billing/pom.xml", SERVICE);
    scratch.write("orders/pom.xml", ORDERS);
    let capture = scratch.workspace.join("missing-info.pom");

    let mut config = scratch.config(&[narrow_bom(&scratch)]);
    config.capture = Some(capture.clone());
    let summary = VersionManager::new(config.clone()).unwrap().run().unwrap();

    assert_eq!(summary.missing_parents, vec!["org.corp:corp-parent:12".to_string()]);
    assert_eq!(summary.exit_code(), 2);
    // The descriptor is still realigned
    assert!(!scratch.read("billing/pom.xml").contains("1.7.36"));

    // A sibling whose parent resolves is unaffected by the broken one
    assert!(summary
        .written
        .iter()
        .any(|p| p.ends_with("orders/pom.xml")));
    let orders = scratch.read("orders/pom.xml");
    assert!(!orders.contains("1.7.36"));
    assert!(orders.contains("<artifactId>slf4j-api</artifactId>"));
    assert_eq!(summary.errors.len(), 1);
    assert!(summary.errors[0].scope.ends_with("billing/pom.xml"));

    let report =
        fs::read_to_string(config.reports_path().join("missing-parents.xml")).unwrap();
    let doc = roxmltree::Document::parse(&report).unwrap();
    let referenced: Vec<&str> = doc
        .descendants()
        .filter(|n| n.has_tag_name("pom"))
        .filter_map(|n| n.text())
        .collect();
    assert_eq!(referenced.len(), 1);
    assert!(referenced[0].ends_with("billing/pom.xml"));

    let errors = fs::read_to_string(config.reports_path().join("errors.log")).unwrap();
    assert!(errors.contains("Missing parent version for org.corp:corp-parent:12"));

    let captured = fs::read_to_string(&capture).unwrap();
    let model = pomalign::model::parse_model(&captured).unwrap();
    let parent = model
        .managed_dependencies
        .iter()
        .find(|d| d.artifact_id == "corp-parent")
        .expect("parent captured as a managed entry");
    assert_eq!(parent.version.as_deref(), Some("12"));
    assert_eq!(parent.dep_type.as_deref(), Some("pom"));
}

#[test]
fn test_shared_missing_parent_lists_every_child() {
    let scratch = Scratch::empty();
    scratch.write("billing/pom.xml", SERVICE);
    scratch.write(
        "ledger/pom.xml",
        &SERVICE.replace("billing-service", "ledger-service"),
    );

    let config = scratch.config(&[narrow_bom(&scratch)]);
    let summary = VersionManager::new(config.clone()).unwrap().run().unwrap();
    assert_eq!(summary.missing_parents.len(), 1);

    let report =
        fs::read_to_string(config.reports_path().join("missing-parents.xml")).unwrap();
    assert!(report.contains("billing/pom.xml"));
    assert!(report.contains("ledger/pom.xml"));
    assert_eq!(report.matches("<parent>").count(), 1);
}

#[test]
fn test_parent_from_local_repository_and_catalog_is_accepted() {
    let scratch = Scratch::empty();
    scratch.write("billing/pom.xml", SERVICE);
    let in_repo = scratch
        .repo
        .join(LocalRepository::relative_path(&ProjectKey::new("org.corp", "corp-parent", "12")));
    fs::create_dir_all(in_repo.parent().unwrap()).unwrap();
    fs::write(&in_repo, CORP_PARENT).unwrap();

    // platform-bom manages org.corp:corp-parent:12
    let summary = VersionManager::new(scratch.config(&[catalog("platform-bom.pom")]))
        .unwrap()
        .run()
        .unwrap();

    assert!(summary.missing_parents.is_empty());
    assert!(summary.errors.is_empty(), "errors: {:?}", summary.errors);
    assert_eq!(summary.exit_code(), 0);
}

#[test]
fn test_missing_parent_still_fails_a_rerun_with_nothing_to_change() {
    let scratch = Scratch::empty();
    scratch.write("billing/pom.xml", SERVICE);
    let config = scratch.config(&[narrow_bom(&scratch)]);

    let first = VersionManager::new(config.clone()).unwrap().run().unwrap();
    assert_eq!(first.exit_code(), 2);
    let realigned = scratch.read("billing/pom.xml");

    let second = VersionManager::new(config).unwrap().run().unwrap();
    assert_eq!(second.changed, 0);
    assert!(second.written.is_empty());
    assert_eq!(scratch.read("billing/pom.xml"), realigned);
    assert_eq!(second.missing_parents, vec!["org.corp:corp-parent:12".to_string()]);
    assert_eq!(second.error_count(), 1);
    assert!(second.errors[0].messages[0].contains("Missing parent version for org.corp:corp-parent:12"));
    assert_eq!(second.exit_code(), 2);
}
