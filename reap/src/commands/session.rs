//! Arguments shared by `plan`, `clean` and `check`, and the code that turns
//! them into a [`Reap`] session and a [`KeepSet`].

use crate::context::AppContext;
use crate::format;
use clap::Args;
use libreap::config::{BackendKind, Config, OwnerKind};
use libreap::keep::parse_tag_list;
use libreap::{Credentials, KeepSet, Reap};
use std::path::PathBuf;

/// Where the keep set comes from.
#[derive(Args, Debug, Clone, Default)]
pub struct KeepArgs {
    /// Supported release tag to keep (repeatable)
    #[arg(long = "release", value_name = "TAG")]
    pub releases: Vec<String>,

    /// Extra tags to keep, separated by spaces or commas
    #[arg(long, value_name = "TAGS")]
    pub extra_tags: Option<String>,

    /// JSON build matrix listing supported releases
    #[arg(long, value_name = "FILE")]
    pub matrix: Option<PathBuf>,

    /// Field naming the release in matrix entries
    #[arg(long, value_name = "KEY")]
    pub matrix_key: Option<String>,
}

/// Which registry API to talk to.
#[derive(Args, Debug, Clone, Default)]
pub struct BackendArgs {
    /// Registry API: oci, github
    #[arg(long)]
    pub backend: Option<String>,

    /// Use plain HTTP for the OCI registry
    #[arg(long)]
    pub insecure: bool,

    /// Registry supports removing a single tag (OCI only)
    #[arg(long)]
    pub tag_deletion: bool,

    /// GitHub package owner kind: org, user, authenticated
    #[arg(long)]
    pub owner_kind: Option<String>,
}

/// Applies keep flags over the `keep` config section. Release and extra-tag
/// flags are appended to the configured lists; `--matrix` and
/// `--matrix-key` replace the configured values.
pub fn apply_keep_args(config: &mut Config, args: &KeepArgs) {
    config.keep.releases.extend(args.releases.iter().cloned());
    if let Some(extra) = &args.extra_tags {
        config.keep.extra_tags.extend(parse_tag_list(extra));
    }
    if let Some(matrix) = &args.matrix {
        config.keep.matrix_file = Some(matrix.clone());
    }
    if let Some(key) = &args.matrix_key {
        config.keep.matrix_key = key.clone();
    }
}

/// Applies backend flags over the `registry` and `github` sections.
pub fn apply_backend_args(config: &mut Config, args: &BackendArgs) -> Result<(), String> {
    if let Some(backend) = &args.backend {
        config.registry.backend = backend
            .parse::<BackendKind>()
            .map_err(|e| e.to_string())?;
    }
    if args.insecure {
        config.registry.insecure = true;
    }
    if args.tag_deletion {
        config.registry.tag_deletion = true;
    }
    if let Some(kind) = &args.owner_kind {
        config.github.owner_kind = kind.parse::<OwnerKind>().map_err(|e| e.to_string())?;
    }
    Ok(())
}

/// Resolves the keep set, warning when it is empty.
pub fn resolve_keep_set(ctx: &AppContext, config: &Config) -> Result<KeepSet, String> {
    let keep = KeepSet::from_config(&config.keep).map_err(|e| e.to_string())?;
    if keep.is_empty() {
        format::warning(
            ctx,
            "Keep set is empty: every tag will be treated as deprecated",
        );
    }
    Ok(keep)
}

/// Builds a session for `image` with credentials from the environment.
pub fn open_session(config: &Config, image: &str) -> Result<Reap, String> {
    tracing::debug!(image, backend = %config.registry.backend, "opening session");
    Reap::builder()
        .image(image)
        .with_config(config.clone())
        .with_credentials(Credentials::from_env())
        .build()
        .map_err(|e| e.to_string())
}

/// Unwraps `result` or prints the error and exits with status 1.
pub fn or_exit<T>(ctx: &AppContext, result: Result<T, String>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            format::error(ctx, &e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
