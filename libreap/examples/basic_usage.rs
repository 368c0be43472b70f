//! Plans a cleanup for one image without deleting anything.
//!
//! Run with: cargo run --example basic_usage -- ghcr.io/acme/app 1.0.0 1.1.0

use libreap::{BackendKind, CleanupOptions, Credentials, KeepSet, Outcome, Reap};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let image = args
        .next()
        .unwrap_or_else(|| "ghcr.io/acme/app".to_string());
    let releases: Vec<String> = args.collect();

    let backend = if image.starts_with("ghcr.io/") {
        BackendKind::Github
    } else {
        BackendKind::Oci
    };

    let reap = Reap::builder()
        .image(&image)
        .backend(backend)
        .with_credentials(Credentials::from_env())
        .build()?;

    let keep = KeepSet::new(releases, ["dev"]);
    let (inventory, plan) = reap.plan(&keep).await?;

    println!(
        "{}: {} tags across {} versions",
        image,
        inventory.tag_count(),
        inventory.version_count()
    );
    for tag in &plan.deprecated_tags {
        println!("  deprecated  {}", tag);
    }
    for tag in &plan.shared_tags {
        println!("  shared      {}", tag);
    }
    for digest in &plan.untagged_digests {
        println!("  untagged    {}", digest.short());
    }

    let report = reap
        .execute(&inventory, &plan, CleanupOptions::dry_run())
        .await;
    for result in &report.results {
        if let Outcome::Skipped(reason) = &result.outcome {
            println!("  skipped     {}", reason);
        }
    }

    Ok(())
}
