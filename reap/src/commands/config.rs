use crate::config;
use crate::context::AppContext;
use crate::format::{self, Formattable};
use libreap::Config;
use serde::Serialize;

/// The resolved configuration, for `config get` without a key.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct ConfigView<'a>(pub &'a Config);

impl Formattable for ConfigView<'_> {
    fn format_pretty(&self) -> String {
        let c = self.0;
        let mut output = format!(
            "[output]\nformat = {}\ncolor = {}\n",
            c.output.format, c.output.color
        );
        output.push_str(&format!(
            "\n[network]\ntimeout = {}\nmax_idle_per_host = {}\n",
            c.network.timeout, c.network.max_idle_per_host
        ));
        output.push_str(&format!(
            "\n[registry]\nbackend = {}\ninsecure = {}\ntag_deletion = {}\n",
            c.registry.backend, c.registry.insecure, c.registry.tag_deletion
        ));
        output.push_str(&format!(
            "\n[github]\napi_url = {}\nowner_kind = {}\n",
            c.github.api_url, c.github.owner_kind
        ));
        if let Some(registry_url) = &c.github.registry_url {
            output.push_str(&format!("registry_url = {}\n", registry_url));
        }

        output.push_str("\n[keep]\n");
        output.push_str(&format!("releases = [{}]\n", c.keep.releases.join(", ")));
        output.push_str(&format!("extra_tags = [{}]\n", c.keep.extra_tags.join(", ")));
        if let Some(matrix) = &c.keep.matrix_file {
            output.push_str(&format!("matrix_file = {}\n", matrix.display()));
        }
        output.push_str(&format!("matrix_key = {}\n", c.keep.matrix_key));

        output
    }
}

/// Handle the config init subcommand
pub fn handle_init(ctx: &AppContext) {
    let config_path = ctx
        .config_path
        .clone()
        .unwrap_or_else(config::get_config_path);

    match config::init_config(&config_path) {
        Ok(_) => {
            format::success(
                ctx,
                &format!("Initialized config file at: {}", config_path.display()),
            );
        }
        Err(e) => {
            format::error(ctx, &e);
            std::process::exit(1);
        }
    }
}

/// Handle the config get subcommand
pub fn handle_get(ctx: &AppContext, key: Option<&str>, format_flag: Option<&str>) {
    match key {
        Some(k) => match config::get_config_value(&ctx.config, k) {
            Ok(value) => println!("{}", value),
            Err(e) => {
                format::error(ctx, &e);
                std::process::exit(1);
            }
        },
        None => {
            let output_format = match ctx.output_format(format_flag) {
                Ok(f) => f,
                Err(e) => {
                    format::error(ctx, &e);
                    std::process::exit(1);
                }
            };
            match format::format_output(&ConfigView(&ctx.config), output_format) {
                Ok(output) => println!("{}", output.trim_end()),
                Err(e) => {
                    format::error(ctx, &format!("formatting output: {}", e));
                    std::process::exit(1);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
