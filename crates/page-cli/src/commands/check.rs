//! Layout check command

use colored::Colorize;
use page_sync::{CheckItem, CheckStatus, check_layout};

use crate::context::SiteContext;
use crate::error::{CliError, Result};

fn print_items(marker: colored::ColoredString, items: &[CheckItem]) {
    for item in items {
        println!(
            "   {} {} ({} {}): {}",
            marker,
            item.file.cyan(),
            item.kind,
            item.name.dimmed(),
            item.description
        );
    }
}

/// Run the check command
///
/// Exits with an error when the layout is not healthy so scripts can gate on
/// it.
pub fn run_check(site: &SiteContext, json: bool) -> Result<()> {
    let report = check_layout(site.synchronizer.fs().as_ref(), site.synchronizer.layout())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        match report.status {
            CheckStatus::Healthy => {
                println!("{} Every record has both files.", "OK".green().bold());
            }
            CheckStatus::Missing => {
                println!("{} Some files are missing:", "MISSING".yellow().bold());
                print_items("-".yellow(), &report.missing);
            }
            CheckStatus::Drifted => {
                println!("{} Staged files were left behind:", "DRIFTED".red().bold());
                print_items("!".red(), &report.drifted);
                if !report.missing.is_empty() {
                    println!();
                    println!("{} Also missing:", "MISSING".yellow().bold());
                    print_items("-".yellow(), &report.missing);
                }
            }
        }
    }

    match report.status {
        CheckStatus::Healthy => Ok(()),
        status => Err(CliError::user(format!("layout check failed: {status:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use page_test_utils::TestSite;

    #[test]
    fn empty_site_is_healthy() {
        let site = TestSite::with_layout();
        let context = SiteContext::open(site.root(), None, None).unwrap();
        run_check(&context, false).unwrap();
    }

    #[test]
    fn orphaned_data_fails_the_check() {
        let site = TestSite::with_layout();
        site.write("data/lonely.json", "{}");
        let context = SiteContext::open(site.root(), None, None).unwrap();

        assert!(run_check(&context, true).is_err());
    }
}
