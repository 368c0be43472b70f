use super::session::{self, BackendArgs, KeepArgs};
use crate::context::AppContext;
use crate::format::{self, OutputFormatter};
use libreap::cleanup::{self, Reason};
use libreap::{Action, CleanupOptions, CleanupReport, Outcome};
use std::io::{self, BufRead, Write};
use tabled::{Table, Tabled, settings::Style};

/// Handle the clean command
pub async fn handle_clean(
    ctx: &AppContext,
    image: &str,
    keep_args: &KeepArgs,
    backend_args: &BackendArgs,
    dry_run: bool,
    force: bool,
) {
    let mut config = ctx.config.clone();
    session::apply_keep_args(&mut config, keep_args);
    session::or_exit(ctx, session::apply_backend_args(&mut config, backend_args));

    let keep = session::or_exit(ctx, session::resolve_keep_set(ctx, &config));
    let reap = session::or_exit(ctx, session::open_session(&config, image));
    let formatter = ctx.formatter();

    let spinner = formatter.spinner(&format!("Fetching inventory for {}...", image));
    let result = reap.plan(&keep).await;
    spinner.finish_and_clear();
    let (inventory, plan) = session::or_exit(ctx, result.map_err(|e| e.to_string()));

    let actions = cleanup::actions(&plan, &inventory);
    if actions.is_empty() {
        format::success(ctx, &format!("Nothing to clean in {}", image));
        return;
    }

    println!("{}", preview_header(image, &actions, dry_run));
    for action in &actions {
        println!("  {}", describe_action(action));
    }
    println!();

    if !force && !dry_run {
        print!("Proceed with deletion? [y/N]: ");
        let _ = io::stdout().flush();

        let mut input = String::new();
        if io::stdin().lock().read_line(&mut input).is_err() || !is_confirmed(&input) {
            println!("Aborted.");
            return;
        }
    }

    let verb = if dry_run { "Simulating" } else { "Deleting" };
    let pb = formatter.progress_bar(actions.len() as u64, verb);
    let options = CleanupOptions { dry_run };
    let report = reap
        .execute_with(&inventory, &plan, options, |_, result| {
            pb.set_message(format!("{} {}", verb, result.action.target()));
            pb.inc(1);
        })
        .await;
    formatter.finish_progress(pb, &summary(&report));

    println!();
    println!("{}", render_report(&report, formatter.as_ref()));

    if report.has_failures() {
        format::error(
            ctx,
            &format!("{} of {} actions failed", report.failed(), report.results.len()),
        );
        std::process::exit(1);
    }
}

fn preview_header(image: &str, actions: &[Action], dry_run: bool) -> String {
    let mode = if dry_run {
        " (dry-run, nothing will be deleted)"
    } else {
        ""
    };
    format!(
        "The following {} actions will run against '{}'{}:",
        actions.len(),
        image,
        mode
    )
}

/// One-line description of an action for the preview.
pub fn describe_action(action: &Action) -> String {
    match action {
        Action::DeleteVersion { version, reason } => match reason {
            Reason::Untagged => format!("delete version {} (untagged)", version.digest.short()),
            Reason::Deprecated(tags) => format!(
                "delete version {} (tags: {})",
                version.digest.short(),
                tags.iter().cloned().collect::<Vec<_>>().join(", ")
            ),
        },
        Action::RemoveTag { tag, digest } => {
            format!("remove tag {} (keeps {})", tag, digest.short())
        }
    }
}

/// Accepts `y` or `yes` in any case.
pub fn is_confirmed(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}

fn summary(report: &CleanupReport) -> String {
    let prefix = if report.dry_run { "Would delete" } else { "Deleted" };
    format!(
        "{} {} versions, {} tags removed, {} skipped, {} failed",
        prefix,
        report.deleted_versions(),
        report.removed_tags(),
        report.skipped(),
        report.failed()
    )
}

#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "")]
    mark: String,
    #[tabled(rename = "ACTION")]
    action: String,
    #[tabled(rename = "TARGET")]
    target: String,
    #[tabled(rename = "RESULT")]
    result: String,
}

/// Renders the per-action report as a table.
pub fn render_report(report: &CleanupReport, formatter: &dyn OutputFormatter) -> String {
    let rows: Vec<ReportRow> = report
        .results
        .iter()
        .map(|r| {
            let action = match &r.action {
                Action::DeleteVersion { .. } => "delete version",
                Action::RemoveTag { .. } => "remove tag",
            };
            let (ok, result) = match &r.outcome {
                Outcome::Done => (true, "done".to_string()),
                Outcome::DryRun => (true, "dry-run".to_string()),
                Outcome::Skipped(reason) => (true, format!("skipped: {}", reason)),
                Outcome::Failed(message) => (false, format!("failed: {}", message)),
            };
            ReportRow {
                mark: formatter.mark(ok),
                action: action.to_string(),
                target: r.action.target(),
                result,
            }
        })
        .collect();

    Table::new(&rows).with(Style::empty()).to_string()
}

#[cfg(test)]
#[path = "clean_tests.rs"]
mod tests;
