use super::*;
use crate::format::PlainFormatter;
use libreap::cleanup::ActionResult;
use libreap::{Digest, PackageVersion};
use std::collections::BTreeSet;

fn digest(c: char) -> Digest {
    format!("sha256:{}", c.to_string().repeat(64)).parse().unwrap()
}

fn delete(c: char, reason: Reason) -> Action {
    Action::DeleteVersion {
        version: PackageVersion::new(digest(c)),
        reason,
    }
}

#[test]
fn test_describe_untagged_version() {
    let line = describe_action(&delete('4', Reason::Untagged));
    assert_eq!(line, "delete version sha256:444444444444 (untagged)");
}

#[test]
fn test_describe_deprecated_version_lists_tags() {
    let tags: BTreeSet<String> = ["old", "older"].iter().map(|t| t.to_string()).collect();
    let line = describe_action(&delete('3', Reason::Deprecated(tags)));
    assert_eq!(line, "delete version sha256:333333333333 (tags: old, older)");
}

#[test]
fn test_describe_remove_tag() {
    let action = Action::RemoveTag {
        tag: "legacy".to_string(),
        digest: digest('1'),
    };
    assert_eq!(
        describe_action(&action),
        "remove tag legacy (keeps sha256:111111111111)"
    );
}

#[test]
fn test_is_confirmed() {
    assert!(is_confirmed("y\n"));
    assert!(is_confirmed("YES"));
    assert!(is_confirmed("  Yes  "));
    assert!(!is_confirmed("\n"));
    assert!(!is_confirmed("n"));
    assert!(!is_confirmed("yep"));
}

#[test]
fn test_preview_header_mentions_dry_run() {
    let actions = vec![delete('4', Reason::Untagged)];
    let header = preview_header("ghcr.io/acme/app", &actions, true);
    assert!(header.contains("1 actions"));
    assert!(header.contains("'ghcr.io/acme/app'"));
    assert!(header.contains("dry-run"));

    let header = preview_header("ghcr.io/acme/app", &actions, false);
    assert!(!header.contains("dry-run"));
}

fn report() -> CleanupReport {
    CleanupReport {
        backend: "oci".to_string(),
        dry_run: false,
        results: vec![
            ActionResult {
                action: delete('4', Reason::Untagged),
                outcome: Outcome::Done,
            },
            ActionResult {
                action: Action::RemoveTag {
                    tag: "legacy".to_string(),
                    digest: digest('1'),
                },
                outcome: Outcome::Skipped("tag deletion not supported".to_string()),
            },
            ActionResult {
                action: delete('3', Reason::Untagged),
                outcome: Outcome::Failed("HTTP 405".to_string()),
            },
        ],
    }
}

#[test]
fn test_render_report_rows() {
    let table = render_report(&report(), &PlainFormatter);
    let lines: Vec<&str> = table.lines().collect();

    assert_eq!(lines.len(), 4);
    assert!(lines[0].contains("ACTION"));
    assert!(lines[0].contains("TARGET"));
    assert!(lines[0].contains("RESULT"));
    assert!(lines[1].contains("✓"));
    assert!(lines[1].contains("sha256:444444444444"));
    assert!(lines[1].contains("done"));
    assert!(lines[2].contains("legacy"));
    assert!(lines[2].contains("skipped: tag deletion not supported"));
    assert!(lines[3].contains("✗"));
    assert!(lines[3].contains("failed: HTTP 405"));
}

#[test]
fn test_summary_counts() {
    let text = summary(&report());
    assert_eq!(text, "Deleted 1 versions, 0 tags removed, 1 skipped, 1 failed");

    let mut dry = report();
    dry.dry_run = true;
    assert!(summary(&dry).starts_with("Would delete"));
}
