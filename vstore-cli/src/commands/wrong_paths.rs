pub fn execute(global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let policy = global.options()?.path_policy();
    let wrong = policy.compute_wrong_paths();
    for path in &wrong {
        tracing::warn!("Allow-list entry '{}' can never be used", path.display());
    }
    super::print_json(&wrong)
}
