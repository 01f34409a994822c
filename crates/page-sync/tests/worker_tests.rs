//! Draining the outbox ledger

use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use page_fs::{DiskFs, MemoryFs, NormalizedPath, PageFs};
use page_sync::{
    HookDispatcher, HookItem, Intent, IntentStatus, Ledger, Operation, PageSynchronizer,
    ProjectionWorker, ResourceKind, RetryConfig, SiteConfig, TemplateType,
};
use page_test_utils::TestSite;
use pretty_assertions::assert_eq;

fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_attempts: 2,
        initial_interval_ms: 1,
        max_interval_ms: 2,
    }
}

fn disk_sync(site: &TestSite) -> Arc<PageSynchronizer> {
    let fs: Arc<dyn PageFs> = Arc::new(DiskFs::new(site.root()));
    Arc::new(PageSynchronizer::new(fs, &SiteConfig::default()))
}

#[test]
fn drain_applies_queued_lifecycle_in_order() {
    let site = TestSite::with_layout();
    site.seed_skeleton("none", "{}");
    let sync = disk_sync(&site);
    let hooks = HookDispatcher::outbox(sync.clone(), site.ledger_path());
    let kind = ResourceKind::Webpage;

    hooks
        .after_operation(kind, Operation::Create, &HookItem::new("1", "hello"))
        .unwrap();
    hooks
        .before_operation(kind, Operation::Update, &HookItem::new("1", "hello"))
        .unwrap();
    hooks
        .after_operation(kind, Operation::Update, &HookItem::new("1", "world"))
        .unwrap();

    let worker = ProjectionWorker::new(sync, site.ledger_path(), fast_retry());
    let report = worker.drain().unwrap();

    assert!(report.is_success());
    assert_eq!(report.applied.len(), 2);
    assert_eq!(site.read("data/world.json"), "{}");
    assert_eq!(site.read("pages/world.tsx").lines().count(), 3);
    site.assert_file_not_exists("data/hello.json");
    assert!(Ledger::load(&site.ledger_path()).unwrap().intents().is_empty());
}

#[test]
fn open_update_defers_later_intents_of_the_same_record() {
    let site = TestSite::with_layout();
    site.seed_skeleton("none", "{}");
    let sync = disk_sync(&site);
    let hooks = HookDispatcher::outbox(sync.clone(), site.ledger_path());
    let kind = ResourceKind::Webpage;

    sync.create_webpage(&page_sync::RecordKey::parse("hello").unwrap(), &TemplateType::default())
        .unwrap();
    hooks
        .before_operation(kind, Operation::Update, &HookItem::new("1", "hello"))
        .unwrap();
    hooks
        .before_operation(kind, Operation::Delete, &HookItem::new("1", "hello"))
        .unwrap();
    hooks
        .after_operation(kind, Operation::Create, &HookItem::new("2", "other"))
        .unwrap();

    let report = ProjectionWorker::new(sync, site.ledger_path(), fast_retry())
        .drain()
        .unwrap();

    assert_eq!(report.deferred.len(), 2);
    assert_eq!(report.applied.len(), 1);
    site.assert_file_exists("data/hello.json");
    site.assert_file_exists("data/other.json");
}

#[test]
fn failing_intent_is_kept_with_its_error() {
    let site = TestSite::with_layout();
    let sync = disk_sync(&site);
    let hooks = HookDispatcher::outbox(sync.clone(), site.ledger_path());

    hooks
        .after_operation(
            ResourceKind::Webpage,
            Operation::Create,
            &HookItem::new("9", "shop").with_template(TemplateType::parse("ecommerce").unwrap()),
        )
        .unwrap();

    let worker = ProjectionWorker::new(sync, site.ledger_path(), fast_retry());
    let report = worker.drain().unwrap();

    assert!(!report.is_success());
    assert_eq!(report.failed[0].attempts, 2);

    let ledger = Ledger::load(&site.ledger_path()).unwrap();
    let failed = ledger.find_by_status(IntentStatus::Failed);
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].attempts, 2);
    assert!(failed[0].last_error.as_deref().unwrap().contains("ecommerce"));

    // A plain drain leaves failed intents alone
    let report = worker.drain().unwrap();
    assert_eq!(report.deferred.len(), 1);
    assert!(report.failed.is_empty());
}

#[test]
fn retry_failed_picks_up_a_fixed_intent() {
    let site = TestSite::with_layout();
    let sync = disk_sync(&site);
    let hooks = HookDispatcher::outbox(sync.clone(), site.ledger_path());
    hooks
        .after_operation(
            ResourceKind::Webpage,
            Operation::Create,
            &HookItem::new("1", "hello").with_template(TemplateType::parse("product").unwrap()),
        )
        .unwrap();

    let worker = ProjectionWorker::new(sync, site.ledger_path(), fast_retry());
    assert_eq!(worker.drain().unwrap().failed.len(), 1);

    site.seed_skeleton("product", r#"{"b":2}"#);
    let report = worker.retry_failed(true).drain().unwrap();

    assert!(report.is_success());
    assert_eq!(site.read("data/hello.json"), r#"{"b":2}"#);
}

#[test]
fn changed_skeleton_is_reported_as_warning() {
    let fs = Arc::new(MemoryFs::new());
    fs.insert("data/template/product.json", "{}");
    let sync = Arc::new(PageSynchronizer::new(fs.clone(), &SiteConfig::default()));
    let dir = tempfile::tempdir().unwrap();
    let ledger_path = dir.path().join("ledger.toml");
    let hooks = HookDispatcher::outbox(sync.clone(), &ledger_path);

    hooks
        .after_operation(
            ResourceKind::Webpage,
            Operation::Create,
            &HookItem::new("1", "hello").with_template(TemplateType::parse("product").unwrap()),
        )
        .unwrap();
    fs.insert("data/template/product.json", r#"{"changed":true}"#);

    let report = ProjectionWorker::new(sync, &ledger_path, fast_retry())
        .drain()
        .unwrap();

    assert_eq!(report.outcome.warnings.len(), 1);
    assert!(report.outcome.warnings[0].contains("changed"));
    assert_eq!(
        fs.read_text(&"data/hello.json".into()).unwrap(),
        r#"{"changed":true}"#
    );
}

/// Put an already applied intent back, as if the commit after it was lost.
fn requeue(ledger_path: &std::path::Path, intent: Intent) {
    Ledger::transact(ledger_path, |ledger| {
        ledger.add_intent(intent);
        Ok(())
    })
    .unwrap();
}

#[test]
fn replayed_create_does_not_append_twice() {
    let site = TestSite::with_layout();
    site.seed_skeleton("none", "{}");
    let sync = disk_sync(&site);
    HookDispatcher::outbox(sync.clone(), site.ledger_path())
        .after_operation(ResourceKind::Webpage, Operation::Create, &HookItem::new("1", "hello"))
        .unwrap();
    let intent = Ledger::load(&site.ledger_path()).unwrap().intents()[0].clone();
    let worker = ProjectionWorker::new(sync, site.ledger_path(), fast_retry());

    worker.drain().unwrap();
    requeue(&site.ledger_path(), intent);
    let report = worker.drain().unwrap();

    assert!(report.is_success());
    assert_eq!(report.applied.len(), 1);
    assert_eq!(site.read("pages/hello.tsx").lines().count(), 3);
    assert!(Ledger::load(&site.ledger_path()).unwrap().intents().is_empty());
}

#[test]
fn replayed_delete_and_rename_succeed() {
    let site = TestSite::with_layout();
    let sync = disk_sync(&site);
    let key = |s: &str| page_sync::RecordKey::parse(s).unwrap();
    sync.create_template(&key("card")).unwrap();
    sync.create_template(&key("old")).unwrap();
    let kind = ResourceKind::Template;

    let hooks = HookDispatcher::outbox(sync.clone(), site.ledger_path());
    hooks
        .before_operation(kind, Operation::Delete, &HookItem::new("1", "card"))
        .unwrap();
    hooks
        .before_operation(kind, Operation::Update, &HookItem::new("2", "old"))
        .unwrap();
    hooks
        .after_operation(kind, Operation::Update, &HookItem::new("2", "new"))
        .unwrap();
    let applied = Ledger::load(&site.ledger_path()).unwrap().intents().to_vec();
    let worker = ProjectionWorker::new(sync, site.ledger_path(), fast_retry());

    assert!(worker.drain().unwrap().is_success());
    for intent in applied {
        requeue(&site.ledger_path(), intent);
    }
    let report = worker.drain().unwrap();

    assert!(report.is_success(), "failed: {:?}", report.failed);
    assert_eq!(report.applied.len(), 2);
    site.assert_file_not_exists("data/template/card.json");
    site.assert_file_not_exists("pages/template/card.tsx");
    site.assert_file_exists("data/template/new.json");
    site.assert_file_exists("pages/template/new.tsx");
}

/// In-memory site that fires an outbox hook from inside the first copy.
struct HookDuringApply {
    inner: MemoryFs,
    ledger_path: PathBuf,
    hook_finished: Mutex<Option<bool>>,
}

impl HookDuringApply {
    fn enqueue_elsewhere(&self) {
        let mut finished = self.hook_finished.lock().unwrap();
        if finished.is_some() {
            return;
        }
        let path = self.ledger_path.clone();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let result = Ledger::transact(&path, |ledger| {
                ledger.add_intent(Intent::delete(ResourceKind::Template, "99", "other"));
                Ok(())
            });
            let _ = tx.send(result.is_ok());
        });
        *finished = Some(rx.recv_timeout(Duration::from_secs(5)).unwrap_or(false));
    }
}

impl PageFs for HookDuringApply {
    fn read(&self, path: &NormalizedPath) -> page_fs::Result<Vec<u8>> {
        self.inner.read(path)
    }
    fn write(&self, path: &NormalizedPath, content: &[u8]) -> page_fs::Result<()> {
        self.inner.write(path, content)
    }
    fn append(&self, path: &NormalizedPath, content: &[u8]) -> page_fs::Result<()> {
        self.inner.append(path, content)
    }
    fn copy(&self, from: &NormalizedPath, to: &NormalizedPath) -> page_fs::Result<()> {
        self.enqueue_elsewhere();
        self.inner.copy(from, to)
    }
    fn rename(&self, from: &NormalizedPath, to: &NormalizedPath) -> page_fs::Result<()> {
        self.inner.rename(from, to)
    }
    fn remove(&self, path: &NormalizedPath) -> page_fs::Result<()> {
        self.inner.remove(path)
    }
    fn exists(&self, path: &NormalizedPath) -> bool {
        self.inner.exists(path)
    }
    fn list(&self, dir: &NormalizedPath) -> page_fs::Result<Vec<String>> {
        self.inner.list(dir)
    }
}

#[test]
fn hooks_are_not_blocked_while_effects_run() {
    let dir = tempfile::tempdir().unwrap();
    let ledger_path = dir.path().join("ledger.toml");
    let fs = Arc::new(HookDuringApply {
        inner: MemoryFs::new(),
        ledger_path: ledger_path.clone(),
        hook_finished: Mutex::new(None),
    });
    fs.inner.insert("data/template/none.json", "{}");
    let sync = Arc::new(PageSynchronizer::new(fs.clone(), &SiteConfig::default()));
    HookDispatcher::outbox(sync.clone(), &ledger_path)
        .after_operation(ResourceKind::Webpage, Operation::Create, &HookItem::new("1", "hello"))
        .unwrap();

    let report = ProjectionWorker::new(sync, &ledger_path, fast_retry())
        .drain()
        .unwrap();

    assert_eq!(report.applied.len(), 1);
    assert_eq!(*fs.hook_finished.lock().unwrap(), Some(true));
    // The intent added mid-drain survives the drain's own commits
    let ledger = Ledger::load(&ledger_path).unwrap();
    assert_eq!(ledger.intents().len(), 1);
    assert_eq!(ledger.intents()[0].record_id, "99");
}
