//! Layout checks
//!
//! Reports pairs that lost a partner and staged files nobody moved back.

use page_fs::PageFs;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::layout::{OWNER_EXTENSION, ResourceKind, STAGING_SUFFIX, SiteLayout};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckStatus {
    /// Every data file has its page file and vice versa
    Healthy,
    /// Some pairs are missing one side
    Missing,
    /// Staged files are left over from an unfinished update
    Drifted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckItem {
    pub kind: ResourceKind,
    pub name: String,
    pub file: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckReport {
    pub status: CheckStatus,
    pub missing: Vec<CheckItem>,
    pub drifted: Vec<CheckItem>,
}

impl CheckReport {
    pub fn healthy() -> Self {
        Self {
            status: CheckStatus::Healthy,
            missing: Vec::new(),
            drifted: Vec::new(),
        }
    }

    /// Combine two reports; the worse status wins (Drifted > Missing > Healthy).
    pub fn merge(mut self, other: CheckReport) -> Self {
        self.missing.extend(other.missing);
        self.drifted.extend(other.drifted);
        self.status = match (self.status, other.status) {
            (CheckStatus::Drifted, _) | (_, CheckStatus::Drifted) => CheckStatus::Drifted,
            (CheckStatus::Missing, _) | (_, CheckStatus::Missing) => CheckStatus::Missing,
            (CheckStatus::Healthy, CheckStatus::Healthy) => CheckStatus::Healthy,
        };
        self
    }
}

fn stems(names: Vec<String>, extension: &str) -> Vec<String> {
    let suffix = format!(".{}", extension);
    names
        .into_iter()
        .filter_map(|name| name.strip_suffix(&suffix).map(str::to_string))
        .collect()
}

/// Check one resource kind.
pub fn check_kind(fs: &dyn PageFs, layout: &SiteLayout, kind: ResourceKind) -> Result<CheckReport> {
    let data_names = fs.list(&layout.data_dir(kind))?;
    let owners = stems(data_names.clone(), OWNER_EXTENSION);
    let data = stems(data_names, "json");
    let pages = stems(fs.list(&layout.pages_dir(kind))?, layout.page_extension());
    let mut report = CheckReport::healthy();

    for stem in &owners {
        report.drifted.push(CheckItem {
            kind,
            name: stem.clone(),
            file: layout.data_dir(kind).join(&format!("{stem}.{OWNER_EXTENSION}")).to_string(),
            description: "staging slot still claimed".to_string(),
        });
    }

    let staged_data = data.iter().map(|s| (s, layout.data_file(kind, s)));
    let staged_pages = pages.iter().map(|s| (s, layout.page_file(kind, s)));
    for (stem, file) in staged_data.chain(staged_pages) {
        if stem.ends_with(STAGING_SUFFIX) {
            report.drifted.push(CheckItem {
                kind,
                name: stem.clone(),
                file: file.to_string(),
                description: "staged file left from an unfinished update".to_string(),
            });
        }
    }

    for stem in data.iter().filter(|s| !s.ends_with(STAGING_SUFFIX)) {
        // Skeletons share the template data directory and have no page
        let skeleton = kind == ResourceKind::Template && layout.is_skeleton(stem);
        if !skeleton && !pages.contains(stem) {
            report.missing.push(CheckItem {
                kind,
                name: stem.clone(),
                file: layout.page_file(kind, stem).to_string(),
                description: "data file has no page file".to_string(),
            });
        }
    }
    for stem in pages.iter().filter(|s| !s.ends_with(STAGING_SUFFIX)) {
        if !data.contains(stem) {
            report.missing.push(CheckItem {
                kind,
                name: stem.clone(),
                file: layout.data_file(kind, stem).to_string(),
                description: "page file has no data file".to_string(),
            });
        }
    }

    report.status = if !report.drifted.is_empty() {
        CheckStatus::Drifted
    } else if !report.missing.is_empty() {
        CheckStatus::Missing
    } else {
        CheckStatus::Healthy
    };
    Ok(report)
}

/// Check both resource kinds.
pub fn check_layout(fs: &dyn PageFs, layout: &SiteLayout) -> Result<CheckReport> {
    let mut report = CheckReport::healthy();
    for kind in ResourceKind::ALL {
        report = report.merge(check_kind(fs, layout, kind)?);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use page_fs::MemoryFs;

    #[test]
    fn complete_pairs_are_healthy() {
        let fs = MemoryFs::new();
        fs.insert("data/hello.json", "{}");
        fs.insert("pages/hello.tsx", "");

        let report = check_kind(&fs, &SiteLayout::default(), ResourceKind::Webpage).unwrap();
        assert_eq!(report.status, CheckStatus::Healthy);
    }

    #[test]
    fn staged_leftover_is_drift() {
        let fs = MemoryFs::new();
        fs.insert("data/name__switch.json", "{}");
        fs.insert("pages/name__switch.tsx", "");

        let report = check_layout(&fs, &SiteLayout::default()).unwrap();
        assert_eq!(report.status, CheckStatus::Drifted);
        assert_eq!(report.drifted.len(), 2);
        assert!(report.missing.is_empty());
    }

    #[test]
    fn claimed_slot_marker_is_drift() {
        let fs = MemoryFs::new();
        fs.insert("data/template/3__switch.owner", "{}");

        let report = check_layout(&fs, &SiteLayout::default()).unwrap();
        assert_eq!(report.status, CheckStatus::Drifted);
        assert_eq!(report.drifted[0].file, "data/template/3__switch.owner");
    }

    #[test]
    fn configured_skeleton_needs_no_page() {
        let fs = MemoryFs::new();
        fs.insert("data/template/landing.json", "{}");
        let layout = SiteLayout::default().with_skeletons(vec!["landing".to_string()]);

        let report = check_layout(&fs, &layout).unwrap();
        assert_eq!(report.status, CheckStatus::Healthy);
    }

    #[test]
    fn builtin_skeletons_need_no_page() {
        let fs = MemoryFs::new();
        fs.insert("data/template/product.json", "{}");
        fs.insert("data/template/none.json", "{}");

        let report = check_layout(&fs, &SiteLayout::default()).unwrap();
        assert_eq!(report.status, CheckStatus::Healthy);
    }

    #[test]
    fn lone_page_is_missing_data() {
        let fs = MemoryFs::new();
        fs.insert("pages/template/card.tsx", "");

        let report = check_layout(&fs, &SiteLayout::default()).unwrap();
        assert_eq!(report.status, CheckStatus::Missing);
        assert_eq!(report.missing[0].file, "data/template/card.json");
    }
}
