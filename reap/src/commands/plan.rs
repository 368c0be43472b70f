use super::session::{self, BackendArgs, KeepArgs};
use crate::context::AppContext;
use crate::format::{self, Formattable};
use libreap::{DeletionPlan, Digest, Inventory};
use serde::Serialize;

/// A computed plan with enough context to print it.
#[derive(Debug, Serialize)]
pub struct PlanView<'a> {
    pub image: String,
    pub backend: String,
    pub tag_count: usize,
    pub version_count: usize,
    #[serde(flatten)]
    pub plan: &'a DeletionPlan,
    #[serde(skip)]
    pub inventory: &'a Inventory,
}

impl<'a> PlanView<'a> {
    pub fn new(image: &str, backend: &str, inventory: &'a Inventory, plan: &'a DeletionPlan) -> Self {
        Self {
            image: image.to_string(),
            backend: backend.to_string(),
            tag_count: inventory.tag_count(),
            version_count: inventory.version_count(),
            plan,
            inventory,
        }
    }

    fn digest_line(&self, digest: &Digest) -> String {
        match self
            .inventory
            .version(digest)
            .and_then(|v| v.created_at)
        {
            Some(created) => format!("  {}  {}", digest.short(), created.format("%Y-%m-%d")),
            None => format!("  {}", digest.short()),
        }
    }
}

fn section(output: &mut String, title: &str, lines: Vec<String>) {
    output.push_str(&format!("\n{} ({}):\n", title, lines.len()));
    if lines.is_empty() {
        output.push_str("  (none)\n");
    }
    for line in lines {
        output.push_str(&line);
        output.push('\n');
    }
}

impl Formattable for PlanView<'_> {
    fn format_pretty(&self) -> String {
        let mut output = format!(
            "Image: {} ({})\nInventory: {} tags, {} versions\n",
            self.image, self.backend, self.tag_count, self.version_count
        );

        let keep: Vec<String> = self.plan.keep_set.iter().map(|t| format!("  {}", t)).collect();
        section(&mut output, "Keep set", keep);

        let kept = self
            .plan
            .kept_digests
            .iter()
            .map(|d| self.digest_line(d))
            .collect();
        section(&mut output, "Kept digests", kept);

        let untagged = self
            .plan
            .untagged_digests
            .iter()
            .map(|d| self.digest_line(d))
            .collect();
        section(&mut output, "Untagged digests", untagged);

        let deprecated = self
            .plan
            .deprecated_tags
            .iter()
            .map(|t| match self.inventory.digest_of(t) {
                Some(d) => format!("  {}  -> {}", t, d.short()),
                None => format!("  {}", t),
            })
            .collect();
        section(&mut output, "Deprecated tags", deprecated);

        if !self.plan.shared_tags.is_empty() {
            let shared = self
                .plan
                .shared_tags
                .iter()
                .map(|t| format!("  {}  (digest shared with a kept tag)", t))
                .collect();
            section(&mut output, "Shared tags", shared);
        }

        output
    }
}

/// Handle the plan command
pub async fn handle_plan(
    ctx: &AppContext,
    image: &str,
    keep_args: &KeepArgs,
    backend_args: &BackendArgs,
    format_flag: Option<&str>,
) {
    let output_format = session::or_exit(ctx, ctx.output_format(format_flag));

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

    let view = PlanView::new(image, reap.backend_name(), &inventory, &plan);
    match format::format_output(&view, output_format) {
        Ok(output) => print!("{}", terminated(output)),
        Err(e) => {
            format::error(ctx, &format!("formatting output: {}", e));
            std::process::exit(1);
        }
    }
}

fn terminated(mut output: String) -> String {
    if !output.ends_with('\n') {
        output.push('\n');
    }
    output
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod tests;
