use super::session::{self, BackendArgs};
use crate::context::AppContext;
use crate::format;

/// Handle the check command
pub async fn handle_check(ctx: &AppContext, image: &str, backend_args: &BackendArgs) {
    let mut config = ctx.config.clone();
    session::or_exit(ctx, session::apply_backend_args(&mut config, backend_args));
    let reap = session::or_exit(ctx, session::open_session(&config, image));

    let formatter = ctx.formatter();
    let spinner = formatter.spinner(&format!("Checking {}...", image));
    let result = reap.check().await;
    spinner.finish_and_clear();

    match result {
        Ok(()) => format::success(ctx, &check_message(image, reap.backend_name())),
        Err(e) => {
            format::error(ctx, &format!("{} is not reachable: {}", image, e));
            std::process::exit(1);
        }
    }
}

fn check_message(image: &str, backend: &str) -> String {
    format!("{} is reachable ({} backend)", image, backend)
}
