//! Default English message catalog
//!
//! Messages are looked up by dotted key; `{0}`, `{1}`, ... are replaced by
//! the positional arguments. Unknown keys render as the key itself so a
//! missing translation never hides the information.

/// Look up the template for a key
pub fn template(key: &str) -> Option<&'static str> {
    let template = match key {
        "targets.defaultName" => "Target #{0}",
        "targets.noneDefined" => "Please define at least one TARGET in your settings!",
        "targets.select" => "Select the target to use...",
        "targets.notFound" => "No target named '{0}' was found!",
        "plugins.noneMatching" => "No matching plugins found for target '{0}'!",
        "pull.selectTarget" => "Select the target to pull from...",
        "pull.startBatch" => "Start pulling {0} files from '{1}'...",
        "pull.finishedBatch" => "Finished pulling from '{0}'.",
        "pull.file" => "Pulling file '{0}' from '{1}'... ",
        "pull.fileInBatch" => "  Pulling file '{0}'... ",
        "deploy.selectTarget" => "Select the target to deploy to...",
        "deploy.startBatch" => "Start deploying {0} files to '{1}'...",
        "deploy.finishedBatch" => "Finished deploying to '{0}'.",
        "deploy.file" => "Deploying file '{0}' to '{1}'... ",
        "deploy.fileInBatch" => "  Deploying file '{0}'... ",
        "deploy.canceledByOperation" => "Deployment to '{0}' has been canceled by a before-deploy operation.",
        "transfer.ok" => "[OK]",
        "transfer.error" => "[ERROR: {0}]",
        "transfer.unresolvedFile" => "Could not resolve '{0}' inside the workspace, skipped.",
        "transfer.pluginFailed" => "[ERROR] Plugin '{0}' failed: {1}",
        _ => return None,
    };
    Some(template)
}

/// Render a message, substituting positional arguments
pub fn translate(key: &str, args: &[String]) -> String {
    let Some(template) = template(key) else {
        return key.to_string();
    };

    args.iter()
        .enumerate()
        .fold(template.to_string(), |text, (i, arg)| {
            text.replace(&format!("{{{}}}", i), arg)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("targets.defaultName", vec!["3"], "Target #3")]
    #[case("transfer.error", vec!["disk full"], "[ERROR: disk full]")]
    #[case("pull.startBatch", vec!["2", "Prod"], "Start pulling 2 files from 'Prod'...")]
    #[case("transfer.ok", vec![], "[OK]")]
    fn test_translate(#[case] key: &str, #[case] args: Vec<&str>, #[case] expected: &str) {
        let args: Vec<String> = args.into_iter().map(String::from).collect();
        assert_eq!(translate(key, &args), expected);
    }

    #[test]
    fn test_unknown_key_renders_key() {
        assert_eq!(translate("does.not.exist", &[]), "does.not.exist");
    }
}
