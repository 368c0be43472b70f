use super::*;
use crate::format::OutputFormat;
use libreap::{KeepSet, PackageVersion, reconcile};

fn digest(c: char) -> Digest {
    format!("sha256:{}", c.to_string().repeat(64)).parse().unwrap()
}

fn fixture() -> (Inventory, DeletionPlan) {
    let mut inventory = Inventory::new();
    inventory.insert_tag("1.0.0", digest('1'));
    inventory.insert_tag("dev", digest('1'));
    inventory.insert_tag("legacy", digest('1'));
    inventory.insert_tag("old", digest('3'));
    let created = "2024-05-01T12:00:00Z".parse().unwrap();
    inventory.insert_version(PackageVersion::new(digest('4')).with_created_at(created));

    let plan = reconcile(&KeepSet::new(["1.0.0"], ["dev"]), &inventory);
    (inventory, plan)
}

#[test]
fn test_plan_pretty_lists_every_section() {
    let (inventory, plan) = fixture();
    let view = PlanView::new("ghcr.io/acme/app", "github", &inventory, &plan);
    let output = view.format_pretty();

    assert!(output.starts_with("Image: ghcr.io/acme/app (github)\n"));
    assert!(output.contains("Inventory: 4 tags, 3 versions"));
    assert!(output.contains("Keep set (2):\n  1.0.0\n  dev\n"));
    assert!(output.contains("Kept digests (1):"));
    assert!(output.contains("Untagged digests (1):\n  sha256:444444444444  2024-05-01\n"));
    assert!(output.contains("Deprecated tags (1):\n  old  -> sha256:333333333333\n"));
    assert!(output.contains("Shared tags (1):\n  legacy  (digest shared with a kept tag)\n"));
}

#[test]
fn test_plan_pretty_marks_empty_sections() {
    let inventory = Inventory::new();
    let plan = reconcile(&KeepSet::default(), &inventory);
    let view = PlanView::new("localhost:5000/app", "oci", &inventory, &plan);
    let output = view.format_pretty();

    assert!(output.contains("Deprecated tags (0):\n  (none)\n"));
    assert!(!output.contains("Shared tags"));
}

#[test]
fn test_plan_json_flattens_plan_fields() {
    let (inventory, plan) = fixture();
    let view = PlanView::new("ghcr.io/acme/app", "github", &inventory, &plan);
    let output = format::format_output(&view, OutputFormat::Json).unwrap();
    let json: serde_json::Value = serde_json::from_str(&output).unwrap();

    assert_eq!(json["image"], "ghcr.io/acme/app");
    assert_eq!(json["tag_count"], 4);
    assert_eq!(json["deprecated_tags"], serde_json::json!(["old"]));
    assert_eq!(json["shared_tags"], serde_json::json!(["legacy"]));
    assert!(json.get("inventory").is_none());
}

#[test]
fn test_terminated_adds_single_newline() {
    assert_eq!(terminated("{}".to_string()), "{}\n");
    assert_eq!(terminated("a\n".to_string()), "a\n");
}
