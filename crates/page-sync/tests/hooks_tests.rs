//! Hook dispatch in direct and outbox modes

use std::sync::Arc;

use page_fs::{DiskFs, PageFs};
use page_sync::{
    HookDispatcher, HookItem, HookOutcome, HookPhase, IntentStatus, Ledger, Operation,
    PageSynchronizer, ResourceKind, SiteConfig, TemplateType,
};
use page_test_utils::TestSite;
use rstest::rstest;

fn synchronizer(site: &TestSite) -> Arc<PageSynchronizer> {
    let fs: Arc<dyn PageFs> = Arc::new(DiskFs::new(site.root()));
    Arc::new(PageSynchronizer::new(fs, &SiteConfig::default()))
}

fn product_page(id: &str, slug: &str) -> HookItem {
    HookItem::new(id, slug).with_template(TemplateType::parse("product").unwrap())
}

#[rstest]
#[case(HookPhase::Before, Operation::Create)]
#[case(HookPhase::After, Operation::Delete)]
fn unmapped_phases_do_nothing(#[case] phase: HookPhase, #[case] operation: Operation) {
    let site = TestSite::with_layout();
    let hooks = HookDispatcher::direct(synchronizer(&site));

    let outcome = hooks
        .dispatch(ResourceKind::Webpage, phase, operation, &product_page("1", "hello"))
        .unwrap();

    assert_eq!(outcome, HookOutcome::Ignored);
    site.assert_file_not_exists("data/hello.json");
}

#[test]
fn direct_mode_follows_the_record_lifecycle() {
    let site = TestSite::with_layout();
    site.seed_skeleton("product", r#"{"a":1}"#);
    let hooks = HookDispatcher::direct(synchronizer(&site));
    let kind = ResourceKind::Webpage;

    hooks
        .after_operation(kind, Operation::Create, &product_page("1", "hello"))
        .unwrap();
    assert_eq!(site.read("data/hello.json"), r#"{"a":1}"#);

    hooks
        .before_operation(kind, Operation::Update, &product_page("1", "hello"))
        .unwrap();
    site.assert_file_not_exists("data/hello.json");

    hooks
        .after_operation(kind, Operation::Update, &product_page("1", "world"))
        .unwrap();
    assert_eq!(site.read("data/world.json"), r#"{"a":1}"#);

    let outcome = hooks
        .before_operation(kind, Operation::Delete, &product_page("1", "world"))
        .unwrap();
    assert!(matches!(outcome, HookOutcome::Applied(ref o) if o.is_clean()));
    site.assert_file_not_exists("data/world.json");
    site.assert_file_not_exists("pages/world.tsx");
}

#[test]
fn invalid_key_is_rejected_before_touching_files() {
    let site = TestSite::with_layout();
    let hooks = HookDispatcher::direct(synchronizer(&site));

    let result = hooks.after_operation(
        ResourceKind::Template,
        Operation::Create,
        &HookItem::new("1", "../escape"),
    );

    assert!(matches!(result, Err(page_sync::Error::InvalidKey { .. })));
    assert!(std::fs::read_dir(site.path("data/template")).unwrap().next().is_none());
}

#[test]
fn outbox_mode_records_intents_without_touching_files() {
    let site = TestSite::with_layout();
    site.seed_skeleton("product", "{}");
    let ledger_path = site.ledger_path();
    let hooks = HookDispatcher::outbox(synchronizer(&site), &ledger_path);
    let kind = ResourceKind::Webpage;

    hooks
        .after_operation(kind, Operation::Create, &product_page("1", "hello"))
        .unwrap();
    hooks
        .before_operation(kind, Operation::Update, &product_page("1", "hello"))
        .unwrap();

    site.assert_file_not_exists("data/hello.json");
    let ledger = Ledger::load(&ledger_path).unwrap();
    assert_eq!(ledger.intents().len(), 2);
    assert_eq!(ledger.find_by_status(IntentStatus::Open).len(), 1);
    let create = &ledger.intents()[0];
    assert_eq!(create.after_key.as_deref(), Some("hello"));
    assert!(create.payload_ref.as_deref().unwrap().starts_with("sha256:"));

    let completed = hooks
        .after_operation(kind, Operation::Update, &product_page("1", "world"))
        .unwrap();
    let HookOutcome::Enqueued(uuid) = completed else {
        panic!("expected an enqueued outcome, got {completed:?}");
    };

    let ledger = Ledger::load(&ledger_path).unwrap();
    let update = ledger.get_intent(uuid).unwrap();
    assert_eq!(update.status, IntentStatus::Pending);
    assert_eq!(update.before_key.as_deref(), Some("hello"));
    assert_eq!(update.after_key.as_deref(), Some("world"));
}

#[test]
fn after_update_without_before_update_is_an_error_in_outbox_mode() {
    let site = TestSite::with_layout();
    let hooks = HookDispatcher::outbox(synchronizer(&site), site.ledger_path());

    let result = hooks.after_operation(
        ResourceKind::Template,
        Operation::Update,
        &HookItem::new("4", "card"),
    );

    assert!(matches!(result, Err(page_sync::Error::IntentNotFound { .. })));
}
