//! Direct create, shift, update and delete

use colored::Colorize;
use page_sync::{RecordKey, ResourceKind, TemplateType};

use super::print_outcome;
use crate::context::SiteContext;
use crate::error::Result;

pub fn run_create_page(site: &SiteContext, slug: &str, template: &str) -> Result<()> {
    let key = RecordKey::parse(slug)?;
    let template = TemplateType::parse(template)?;
    if !template.is_builtin() {
        tracing::debug!(%template, "using a custom skeleton");
    }

    let outcome = site.synchronizer.create_webpage(&key, &template)?;
    println!("{} Created webpage {}", "OK".green().bold(), key.as_str().cyan());
    print_outcome(&outcome);
    Ok(())
}

pub fn run_create_template(site: &SiteContext, name: &str) -> Result<()> {
    let key = RecordKey::parse(name)?;
    let outcome = site.synchronizer.create_template(&key)?;
    println!("{} Created template {}", "OK".green().bold(), key.as_str().cyan());
    print_outcome(&outcome);
    Ok(())
}

pub fn run_shift(site: &SiteContext, kind: ResourceKind, id: &str, key: &str) -> Result<()> {
    let key = RecordKey::parse(key)?;
    let outcome = site.synchronizer.shift(kind, id, &key)?;
    println!(
        "{} Staged {} {} (record {})",
        "=>".blue().bold(),
        kind,
        key.as_str().cyan(),
        id
    );
    print_outcome(&outcome);
    Ok(())
}

pub fn run_update(site: &SiteContext, kind: ResourceKind, id: &str, key: &str) -> Result<()> {
    let key = RecordKey::parse(key)?;
    let outcome = site.synchronizer.update(kind, id, &key)?;
    println!(
        "{} Moved {} record {} to {}",
        "OK".green().bold(),
        kind,
        id,
        key.as_str().cyan()
    );
    print_outcome(&outcome);
    Ok(())
}

pub fn run_delete(site: &SiteContext, kind: ResourceKind, key: &str) -> Result<()> {
    let key = RecordKey::parse(key)?;
    let outcome = site.synchronizer.delete(kind, &key)?;
    println!("{} Deleted {} {}", "OK".green().bold(), kind, key.as_str().cyan());
    print_outcome(&outcome);
    Ok(())
}
